//! # Resource Graph
//!
//! The builders do not talk to GCP. They append [`Resource`] descriptors to a
//! [`ResourceGraph`], which the orchestration engine later diffs and applies.
//!
//! The graph keeps resources in insertion order and only accepts a resource
//! once every resource it depends on has been added, so the stored order is
//! always a valid creation order.

pub mod output;
pub mod resources;

pub use output::Output;
pub use resources::*;

use serde::Serialize;
use std::collections::BTreeSet;

use crate::errors::{FullStackError, Result};

/// A named resource descriptor plus its explicit dependencies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub type_token: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub properties: ResourceSpec,
}

impl Resource {
    pub fn new(name: impl Into<String>, properties: ResourceSpec) -> Self {
        let type_token = properties.type_token();
        Self { name: name.into(), type_token, depends_on: Vec::new(), properties }
    }

    /// Add explicit dependencies, keeping the first occurrence of each name
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.depends_on.contains(&name) {
                self.depends_on.push(name);
            }
        }
        self
    }

    /// Deferred reference to an attribute of this resource
    pub fn output(&self, attribute: &str) -> Output<String> {
        Output::of(self.name.clone(), attribute)
    }
}

/// Ordered collection of resource descriptors for a single stack
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
    #[serde(skip)]
    names: BTreeSet<String>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource and return a deferred reference to its `id`.
    ///
    /// Fails if the name is already taken or if a dependency has not been
    /// added yet.
    pub fn add(&mut self, resource: Resource) -> Result<Output<String>> {
        if self.names.contains(&resource.name) {
            return Err(FullStackError::internal(format!(
                "resource name '{}' is used twice in the stack",
                resource.name
            )));
        }
        if let Some(missing) = resource.depends_on.iter().find(|dep| !self.names.contains(*dep)) {
            return Err(FullStackError::internal(format!(
                "resource '{}' depends on '{}', which is not in the graph",
                resource.name, missing
            )));
        }

        tracing::trace!(resource = %resource.name, kind = resource.type_token, "adding resource");
        let id = resource.output("id");
        self.names.insert(resource.name.clone());
        self.resources.push(resource);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources of one provider type, in creation order
    pub fn of_type<'a>(&'a self, type_token: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources.iter().filter(move |r| r.type_token == type_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> ResourceSpec {
        ResourceSpec::ServiceAccount(ServiceAccount {
            account_id: id.to_string(),
            project: "p".to_string(),
            display_name: id.to_string(),
        })
    }

    #[test]
    fn add_returns_id_output() {
        let mut graph = ResourceGraph::new();
        let id = graph.add(Resource::new("shop-frontend", account("shop-frontend"))).unwrap();
        assert_eq!(id.interpolation(), "${shop-frontend.id}");
        assert_eq!(graph.len(), 1);
        assert!(graph.contains("shop-frontend"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut graph = ResourceGraph::new();
        graph.add(Resource::new("a", account("a"))).unwrap();
        let err = graph.add(Resource::new("a", account("a"))).unwrap_err();
        assert!(err.to_string().contains("used twice"));
    }

    #[test]
    fn dependencies_must_exist_first() {
        let mut graph = ResourceGraph::new();
        let err = graph.add(Resource::new("b", account("b")).depends_on(["a"])).unwrap_err();
        assert!(err.to_string().contains("not in the graph"));

        graph.add(Resource::new("a", account("a"))).unwrap();
        graph.add(Resource::new("b", account("b")).depends_on(["a", "a"])).unwrap();
        assert_eq!(graph.get("b").unwrap().depends_on, vec!["a".to_string()]);
    }

    #[test]
    fn serializes_type_token_and_properties() {
        let resource = Resource::new("shop-frontend", account("shop-frontend"));
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], TYPE_SERVICE_ACCOUNT);
        assert_eq!(json["properties"]["accountId"], "shop-frontend");
        assert!(json.get("dependsOn").is_none());
    }
}
