//! Cloud Armor security policy: client IP allowlist and, optionally, the
//! preconfigured WAF rule set.

use crate::builders::StackContext;
use crate::component_span;
use crate::config::NetworkConfig;
use crate::errors::Result;
use crate::graph::{
    Expr, Output, Resource, ResourceGraph, ResourceSpec, RuleMatch, SecurityPolicy,
    SecurityPolicyRule, SourceRangeConfig,
};
use crate::naming::{firewall_suffix, SUFFIX_ARMOR};

/// Cloud Armor accepts at most this many ranges per rule
pub const MAX_RANGES_PER_RULE: usize = 10;
/// WAF deny rules run before the allowlist; rules stop at the first match.
pub const WAF_BASE_PRIORITY: u32 = 1000;
pub const ALLOWLIST_BASE_PRIORITY: u32 = 2000;
pub const DEFAULT_RULE_PRIORITY: u32 = 2_147_483_647;

pub const ACTION_ALLOW: &str = "allow";
pub const ACTION_DENY: &str = "deny(403)";
const SRC_IPS_V1: &str = "SRC_IPS_V1";

/// Preconfigured WAF rule sets applied when Cloud Armor is enabled
pub const WAF_RULE_SETS: [(&str, &str); 5] = [
    ("sqli-v33-stable", "SQL injection"),
    ("xss-v33-stable", "cross-site scripting"),
    ("lfi-v33-stable", "local file inclusion"),
    ("rce-v33-stable", "remote code execution"),
    ("scannerdetection-v33-stable", "scanner detection"),
];

/// Handle to the security policy attached to both backend services
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityPolicyRef {
    pub name: String,
    pub id: Output<String>,
}

/// Build the policy, or nothing when neither Cloud Armor nor an allowlist is
/// configured
pub(crate) fn build_security_policy(
    stack: &StackContext,
    network: &NetworkConfig,
    graph: &mut ResourceGraph,
) -> Result<Option<SecurityPolicyRef>> {
    let allowlist = network.allowlist_cidrs()?;
    if !network.enable_cloud_armor && allowlist.is_empty() {
        return Ok(None);
    }

    let name = if network.enable_cloud_armor {
        stack.resource_name(SUFFIX_ARMOR)
    } else {
        stack.resource_name(&firewall_suffix("allowlist"))
    };
    let _span = component_span!("security_policy", &name).entered();

    let mut rules = if network.enable_cloud_armor { waf_rules() } else { Vec::new() };
    rules.extend(allowlist_rules(&allowlist));
    rules.push(default_rule(!allowlist.is_empty()));

    let description = if network.enable_cloud_armor {
        format!("Cloud Armor policy for {}", stack.name)
    } else {
        format!("Client IP allowlist for {}", stack.name)
    };

    tracing::debug!(
        policy = %name,
        rules = rules.len(),
        allowlist_entries = allowlist.len(),
        "built security policy"
    );

    let id = graph.add(Resource::new(
        name.clone(),
        ResourceSpec::SecurityPolicy(SecurityPolicy {
            name: name.clone(),
            project: stack.project.clone(),
            description,
            rules,
        }),
    ))?;

    Ok(Some(SecurityPolicyRef { name, id }))
}

fn allowlist_rules(cidrs: &[String]) -> Vec<SecurityPolicyRule> {
    cidrs
        .chunks(MAX_RANGES_PER_RULE)
        .enumerate()
        .map(|(index, chunk)| SecurityPolicyRule {
            action: ACTION_ALLOW.to_string(),
            priority: ALLOWLIST_BASE_PRIORITY + index as u32,
            description: format!("client allowlist {}", index + 1),
            rule_match: source_ranges(chunk.to_vec()),
        })
        .collect()
}

fn waf_rules() -> Vec<SecurityPolicyRule> {
    WAF_RULE_SETS
        .iter()
        .enumerate()
        .map(|(index, (rule_set, label))| SecurityPolicyRule {
            action: ACTION_DENY.to_string(),
            priority: WAF_BASE_PRIORITY + index as u32,
            description: format!("block {}", label),
            rule_match: RuleMatch::Expression {
                expr: Expr { expression: format!("evaluatePreconfiguredWaf('{}')", rule_set) },
            },
        })
        .collect()
}

/// Lowest-priority rule: deny everything else when an allowlist is present
fn default_rule(deny: bool) -> SecurityPolicyRule {
    SecurityPolicyRule {
        action: if deny { ACTION_DENY } else { ACTION_ALLOW }.to_string(),
        priority: DEFAULT_RULE_PRIORITY,
        description: "default rule".to_string(),
        rule_match: source_ranges(vec!["*".to_string()]),
    }
}

fn source_ranges(src_ip_ranges: Vec<String>) -> RuleMatch {
    RuleMatch::SourceRanges {
        versioned_expr: SRC_IPS_V1.to_string(),
        config: SourceRangeConfig { src_ip_ranges },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackConfig;

    fn stack() -> StackContext {
        StackContext::new("shop", &StackConfig::new("p", "us-central1", "b", "f", "a.com"))
    }

    fn policy(graph: &ResourceGraph, name: &str) -> SecurityPolicy {
        match &graph.get(name).unwrap().properties {
            ResourceSpec::SecurityPolicy(policy) => policy.clone(),
            other => panic!("unexpected resource {:?}", other),
        }
    }

    #[test]
    fn nothing_configured_means_no_policy() {
        let mut graph = ResourceGraph::new();
        let result = build_security_policy(&stack(), &NetworkConfig::new("a.com"), &mut graph).unwrap();
        assert!(result.is_none());
        assert!(graph.is_empty());
    }

    #[test]
    fn allowlist_only_uses_firewall_name_and_default_deny() {
        let mut network = NetworkConfig::new("a.com");
        network.client_ip_allowlist = vec!["10.0.0.0/8".into(), "192.168.1.1".into()];
        let mut graph = ResourceGraph::new();
        let policy_ref = build_security_policy(&stack(), &network, &mut graph).unwrap().unwrap();
        assert_eq!(policy_ref.name, "shop-fw-allowlist");

        let policy = policy(&graph, "shop-fw-allowlist");
        assert_eq!(policy.rules.len(), 2);
        assert_eq!(policy.rules[0].priority, ALLOWLIST_BASE_PRIORITY);
        assert_eq!(
            policy.rules[0].rule_match,
            source_ranges(vec!["10.0.0.0/8".into(), "192.168.1.1/32".into()])
        );
        let last = policy.rules.last().unwrap();
        assert_eq!(last.priority, DEFAULT_RULE_PRIORITY);
        assert_eq!(last.action, ACTION_DENY);
    }

    #[test]
    fn large_allowlists_are_chunked_in_order() {
        let mut network = NetworkConfig::new("a.com");
        network.client_ip_allowlist = (0..25).map(|i| format!("10.0.{}.0/24", i)).collect();
        let mut graph = ResourceGraph::new();
        build_security_policy(&stack(), &network, &mut graph).unwrap();

        let policy = policy(&graph, "shop-fw-allowlist");
        let allow: Vec<_> = policy.rules.iter().filter(|r| r.action == ACTION_ALLOW).collect();
        assert_eq!(allow.len(), 3);
        assert_eq!(allow[2].priority, ALLOWLIST_BASE_PRIORITY + 2);
        match &allow[2].rule_match {
            RuleMatch::SourceRanges { config, .. } => {
                assert_eq!(config.src_ip_ranges, vec!["10.0.20.0/24", "10.0.21.0/24", "10.0.22.0/24", "10.0.23.0/24", "10.0.24.0/24"]);
            }
            other => panic!("unexpected match {:?}", other),
        }
    }

    #[test]
    fn armor_without_allowlist_defaults_to_allow() {
        let mut network = NetworkConfig::new("a.com");
        network.enable_cloud_armor = true;
        let mut graph = ResourceGraph::new();
        let policy_ref = build_security_policy(&stack(), &network, &mut graph).unwrap().unwrap();
        assert_eq!(policy_ref.name, "shop-armor");

        let policy = policy(&graph, "shop-armor");
        assert_eq!(policy.rules.len(), WAF_RULE_SETS.len() + 1);
        assert!(matches!(
            &policy.rules[0].rule_match,
            RuleMatch::Expression { expr } if expr.expression == "evaluatePreconfiguredWaf('sqli-v33-stable')"
        ));
        assert_eq!(policy.rules.last().unwrap().action, ACTION_ALLOW);
    }

    #[test]
    fn priorities_are_unique() {
        let mut network = NetworkConfig::new("a.com");
        network.enable_cloud_armor = true;
        network.client_ip_allowlist = (0..12).map(|i| format!("10.1.{}.0/24", i)).collect();
        let mut graph = ResourceGraph::new();
        build_security_policy(&stack(), &network, &mut graph).unwrap();

        let policy = policy(&graph, "shop-armor");
        let mut priorities: Vec<u32> = policy.rules.iter().map(|r| r.priority).collect();
        let total = priorities.len();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), total);
    }

    #[test]
    fn waf_rules_evaluate_before_allowlist() {
        let mut network = NetworkConfig::new("a.com");
        network.enable_cloud_armor = true;
        network.client_ip_allowlist = vec!["10.0.0.0/8".into()];
        let mut graph = ResourceGraph::new();
        build_security_policy(&stack(), &network, &mut graph).unwrap();

        let mut rules = policy(&graph, "shop-armor").rules;
        rules.sort_by_key(|rule| rule.priority);
        let actions: Vec<&str> = rules.iter().map(|rule| rule.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![ACTION_DENY, ACTION_DENY, ACTION_DENY, ACTION_DENY, ACTION_DENY, ACTION_ALLOW, ACTION_DENY]
        );

        let last_waf = rules
            .iter()
            .filter(|rule| matches!(rule.rule_match, RuleMatch::Expression { .. }))
            .map(|rule| rule.priority)
            .max()
            .unwrap();
        let first_allow = rules
            .iter()
            .filter(|rule| rule.action == ACTION_ALLOW)
            .map(|rule| rule.priority)
            .min()
            .unwrap();
        assert!(last_waf < first_allow);
        assert_eq!(rules.last().unwrap().priority, DEFAULT_RULE_PRIORITY);
    }
}
