//! Access to the Remote Config service.
//!
//! Handlers only see [`RemoteConfigClient`]; the registry decides whether a
//! given environment talks to Firebase or to an in-memory template.

pub mod credentials;
pub mod error;
pub mod firebase;
pub mod memory;
pub mod template;

use async_trait::async_trait;

pub use credentials::{CredentialsError, ServiceAccount};
pub use error::RemoteConfigError;
pub use firebase::FirebaseClient;
pub use memory::InMemoryClient;
pub use template::{
    Condition, EditError, Parameter, ParameterValue, Template, TemplateEdit, ValueType, Version,
};

/// Options for [`RemoteConfigClient::publish_template`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Publish over whatever version is live, ignoring the template etag.
    pub force: bool,
}

impl PublishOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// A handle on one project's Remote Config template.
#[async_trait]
pub trait RemoteConfigClient: Send + Sync {
    /// Fetch the live template, including its etag.
    async fn get_template(&self) -> Result<Template, RemoteConfigError>;

    /// Publish `template` and return the template as stored by the service.
    async fn publish_template(
        &self,
        template: &Template,
        options: PublishOptions,
    ) -> Result<Template, RemoteConfigError>;
}
