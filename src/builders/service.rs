//! # Cloud Run Service Builder
//!
//! Emits one Cloud Run v2 service plus the resources it needs to run:
//! a dedicated service account (unless configured otherwise), Secret Manager
//! access grants, and the public invoker binding the load balancer relies on.

use std::collections::BTreeMap;

use super::secrets::SecretBinder;
use super::StackContext;
use crate::component_span;
use crate::config::{IdentityMode, ServiceSettings};
use crate::errors::{FullStackError, Result};
use crate::graph::{
    CloudRunIamMember, CloudRunService, Container, ContainerPort, ContainerResources, EnvVar,
    Ingress, Output, Resource, ResourceGraph, ResourceSpec, Scaling, ServiceAccount,
    ServiceTemplate,
};
use crate::naming::{self, SUFFIX_BACKEND, SUFFIX_FRONTEND};
use crate::validation::{validate_env_var_name, validate_image, validate_region};

pub const INVOKER_ROLE: &str = "roles/run.invoker";
pub const ALL_USERS: &str = "allUsers";

/// Which half of the stack a service implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceRole {
    Backend,
    Frontend,
}

impl ServiceRole {
    pub fn suffix(&self) -> &'static str {
        match self {
            ServiceRole::Backend => SUFFIX_BACKEND,
            ServiceRole::Frontend => SUFFIX_FRONTEND,
        }
    }
}

impl std::fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// The identity a service runs as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub email: String,
    /// Logical name of the service account resource, when this stack owns it
    pub resource: Option<String>,
}

impl ServiceIdentity {
    /// IAM member string, `serviceAccount:{email}`
    pub fn member(&self) -> String {
        format!("serviceAccount:{}", self.email)
    }
}

/// Handle to a built service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRef {
    pub role: ServiceRole,
    /// Cloud Run service name (also its logical resource name)
    pub name: String,
    pub region: String,
    /// HTTPS URL assigned by Cloud Run
    pub url: Output<String>,
    /// Fully qualified service name, for NEGs and IAM bindings
    pub service: Output<String>,
    /// `None` when the service runs as the project default identity
    pub identity: Option<ServiceIdentity>,
}

/// Builder for one Cloud Run service
pub struct ServiceBuilder<'a> {
    stack: &'a StackContext,
    role: ServiceRole,
    image: &'a str,
    settings: &'a ServiceSettings,
    region: String,
    ingress: Ingress,
}

impl<'a> ServiceBuilder<'a> {
    pub fn new(
        stack: &'a StackContext,
        role: ServiceRole,
        image: &'a str,
        settings: &'a ServiceSettings,
    ) -> Self {
        Self {
            stack,
            role,
            image,
            settings,
            region: stack.region.clone(),
            ingress: Ingress::IngressTrafficAll,
        }
    }

    /// Restrict ingress to the internal load balancer
    pub fn private(mut self, private: bool) -> Self {
        self.ingress = if private {
            Ingress::IngressTrafficInternalLoadBalancer
        } else {
            Ingress::IngressTrafficAll
        };
        self
    }

    pub fn build(self, graph: &mut ResourceGraph) -> Result<ServiceRef> {
        let suffix = self.role.suffix();
        let name = self.stack.resource_name(suffix);
        let _span = component_span!("service", &name).entered();

        validate_image(self.image, &format!("{}_image", suffix))?;
        validate_region(&self.region, "region")?;
        for key in self.settings.env.keys() {
            validate_env_var_name(key, &format!("{}.env", suffix))?;
        }

        let identity = self.identity(graph)?;
        let secrets = SecretBinder::new(self.stack, suffix).bind(
            &self.settings.secrets,
            &self.settings.env,
            identity.as_ref(),
            graph,
        )?;

        let mut envs: Vec<EnvVar> = self
            .settings
            .env
            .iter()
            .map(|(key, value)| EnvVar { name: key.clone(), value: Some(value.clone()), value_source: None })
            .collect();
        envs.extend(secrets.env);

        let limits = &self.settings.limits;
        let service = CloudRunService {
            name: name.clone(),
            project: self.stack.project.clone(),
            location: self.region.clone(),
            ingress: self.ingress,
            labels: self.stack.labels.clone(),
            template: ServiceTemplate {
                service_account: identity.as_ref().map(|id| id.email.clone()),
                scaling: Scaling {
                    min_instance_count: limits.min_instances,
                    max_instance_count: limits.max_instances,
                },
                max_instance_request_concurrency: limits.concurrency,
                containers: vec![Container {
                    image: self.image.to_string(),
                    ports: vec![ContainerPort { container_port: self.settings.container_port }],
                    envs,
                    resources: ContainerResources {
                        limits: BTreeMap::from([
                            ("cpu".to_string(), limits.cpu.clone()),
                            ("memory".to_string(), limits.memory.clone()),
                        ]),
                    },
                }],
            },
        };

        let resource = Resource::new(name.clone(), ResourceSpec::CloudRunService(service))
            .depends_on(identity.as_ref().and_then(|id| id.resource.clone()))
            .depends_on(secrets.iam_members);
        let url = resource.output("uri");
        let service_output = resource.output("name");
        graph.add(resource)?;

        // Serverless NEG traffic arrives unauthenticated.
        let invoker = Resource::new(
            self.stack.resource_name(&format!("{}-invoker", suffix)),
            ResourceSpec::CloudRunIamMember(CloudRunIamMember {
                name: service_output.clone(),
                project: self.stack.project.clone(),
                location: self.region.clone(),
                role: INVOKER_ROLE.to_string(),
                member: ALL_USERS.to_string(),
            }),
        )
        .depends_on([name.as_str()]);
        graph.add(invoker)?;

        tracing::debug!(
            service = %name,
            region = %self.region,
            ingress = ?self.ingress,
            identity = identity.as_ref().map(|id| id.email.as_str()).unwrap_or("project-default"),
            "built Cloud Run service"
        );

        Ok(ServiceRef {
            role: self.role,
            name,
            region: self.region,
            url,
            service: service_output,
            identity,
        })
    }

    fn identity(&self, graph: &mut ResourceGraph) -> Result<Option<ServiceIdentity>> {
        let suffix = self.role.suffix();
        match &self.settings.identity {
            IdentityMode::Dedicated => {
                let account_id = naming::service_account_id(&self.stack.name, suffix);
                let logical = self.stack.resource_name(&format!("{}-sa", suffix));
                let account = Resource::new(
                    logical.clone(),
                    ResourceSpec::ServiceAccount(ServiceAccount {
                        account_id: account_id.clone(),
                        project: self.stack.project.clone(),
                        display_name: format!("{} {} service", self.stack.name, suffix),
                    }),
                );
                graph.add(account)?;

                Ok(Some(ServiceIdentity {
                    email: format!("{}@{}.iam.gserviceaccount.com", account_id, self.stack.project),
                    resource: Some(logical),
                }))
            }
            IdentityMode::Existing { email } => {
                let email = email.trim();
                if email.is_empty() || !email.contains('@') {
                    return Err(FullStackError::config_field(
                        format!("'{}' is not a service account email", email),
                        format!("{}.identity.email", suffix),
                    ));
                }
                Ok(Some(ServiceIdentity { email: email.to_string(), resource: None }))
            }
            IdentityMode::ProjectDefault => Ok(None),
        }
    }
}
