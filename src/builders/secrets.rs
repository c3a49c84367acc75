//! Secret Manager bindings for Cloud Run services.
//!
//! Each binding becomes an environment variable whose value is read from a
//! secret version at revision start. When the service has an identity, the
//! binder also grants it `secretAccessor` on every distinct secret it reads.

use std::collections::{BTreeMap, BTreeSet};

use super::service::ServiceIdentity;
use super::StackContext;
use crate::component_span;
use crate::config::SecretBinding;
use crate::errors::{FullStackError, Result};
use crate::graph::{
    EnvVar, EnvVarSource, Resource, ResourceGraph, ResourceSpec, SecretIamMember, SecretKeyRef,
};
use crate::naming::{short_digest, SUFFIX_SECRETS};
use crate::validation::{validate_env_var_name, validate_secret_reference};

pub const SECRET_ACCESSOR_ROLE: &str = "roles/secretmanager.secretAccessor";
pub const LATEST_VERSION: &str = "latest";

/// Environment variables and IAM grants produced for one service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundSecrets {
    pub env: Vec<EnvVar>,
    /// Logical names of the IAM member resources, for `depends_on`
    pub iam_members: Vec<String>,
}

/// Binds secrets to the environment of one service
pub struct SecretBinder<'a> {
    stack: &'a StackContext,
    service_suffix: &'a str,
    field: String,
}

impl<'a> SecretBinder<'a> {
    /// `service_suffix` is the naming suffix of the consuming service
    /// (`backend` or `frontend`)
    pub fn new(stack: &'a StackContext, service_suffix: &'a str) -> Self {
        Self { stack, service_suffix, field: format!("{}.secrets", service_suffix) }
    }

    /// Env var descriptor pointing at a secret version (default `latest`)
    pub fn env_var_source(binding: &SecretBinding) -> EnvVar {
        let version = binding
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(LATEST_VERSION);

        EnvVar {
            name: binding.env_var.clone(),
            value: None,
            value_source: Some(EnvVarSource {
                secret_key_ref: SecretKeyRef {
                    secret: binding.secret.clone(),
                    version: version.to_string(),
                },
            }),
        }
    }

    /// Validate bindings against each other and the literal environment,
    /// then add accessor grants to the graph.
    ///
    /// An env var key may appear only once per service, whether it is
    /// literal or secret-sourced.
    pub fn bind(
        &self,
        bindings: &[SecretBinding],
        literal_env: &BTreeMap<String, String>,
        identity: Option<&ServiceIdentity>,
        graph: &mut ResourceGraph,
    ) -> Result<BoundSecrets> {
        let _span = component_span!("secrets", self.service_suffix).entered();

        let mut seen: BTreeSet<&str> = literal_env.keys().map(String::as_str).collect();
        let mut env = Vec::with_capacity(bindings.len());

        for binding in bindings {
            validate_secret_reference(&binding.secret, &self.field)?;
            validate_env_var_name(&binding.env_var, &self.field)?;
            if !seen.insert(binding.env_var.as_str()) {
                return Err(FullStackError::config_field(
                    format!(
                        "environment variable '{}' is bound more than once for the {} service",
                        binding.env_var, self.service_suffix
                    ),
                    self.field.clone(),
                ));
            }
            env.push(Self::env_var_source(binding));
        }

        let iam_members = match identity {
            Some(identity) => self.grant_access(bindings, identity, graph)?,
            None => {
                if !bindings.is_empty() {
                    tracing::warn!(
                        service = self.service_suffix,
                        "service runs as the project default identity; secret access must be granted outside this stack"
                    );
                }
                Vec::new()
            }
        };

        tracing::debug!(
            service = self.service_suffix,
            secrets = env.len(),
            grants = iam_members.len(),
            "bound secrets"
        );
        Ok(BoundSecrets { env, iam_members })
    }

    fn grant_access(
        &self,
        bindings: &[SecretBinding],
        identity: &ServiceIdentity,
        graph: &mut ResourceGraph,
    ) -> Result<Vec<String>> {
        let mut granted = BTreeSet::new();
        let mut names = Vec::new();

        for binding in bindings {
            let (project, secret_id) = split_secret(&binding.secret, &self.stack.project);
            if !granted.insert((project.clone(), secret_id.clone())) {
                continue;
            }

            let name = self.grant_name(&project, &secret_id);
            let resource = Resource::new(
                name.clone(),
                ResourceSpec::SecretIamMember(SecretIamMember {
                    project,
                    secret_id,
                    role: SECRET_ACCESSOR_ROLE.to_string(),
                    member: identity.member(),
                }),
            )
            .depends_on(identity.resource.clone());
            graph.add(resource)?;
            names.push(name);
        }

        Ok(names)
    }

    /// `{stack}-secrets-{service}-{secret_id}` for stack-project secrets that
    /// fit unabridged, otherwise a digest of `{project}/{secret_id}`
    fn grant_name(&self, project: &str, secret_id: &str) -> String {
        if project == self.stack.project {
            let readable = format!("{}-{}-{}", SUFFIX_SECRETS, self.service_suffix, secret_id);
            let name = self.stack.resource_name(&readable);
            if name == format!("{}-{}", self.stack.name, readable) {
                return name;
            }
        }
        let digest = short_digest(&format!("{}/{}", project, secret_id));
        self.stack.resource_name(&format!("{}-{}-{}", SUFFIX_SECRETS, self.service_suffix, digest))
    }
}

/// `projects/{p}/secrets/{id}` → `(p, id)`; a bare id uses the stack project
fn split_secret(secret: &str, default_project: &str) -> (String, String) {
    let parts: Vec<&str> = secret.split('/').collect();
    match parts.as_slice() {
        ["projects", project, "secrets", id] => (project.to_string(), id.to_string()),
        _ => (default_project.to_string(), secret.to_string()),
    }
}
