//! Named environments and default-environment resolution.

use std::sync::Arc;

use crate::config::{ServerConfig, DEFAULT_ENVIRONMENT};
use crate::remote_config::{
    CredentialsError, FirebaseClient, RemoteConfigClient, RemoteConfigError, ServiceAccount,
};

/// One environment: a name bound to its own Remote Config client.
#[derive(Clone)]
pub struct Environment {
    name: String,
    client: Arc<dyn RemoteConfigClient>,
}

impl Environment {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &dyn RemoteConfigClient {
        self.client.as_ref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot load credentials for environment \"{env}\": {source}")]
    Credentials {
        env: String,
        #[source]
        source: CredentialsError,
    },
    #[error("cannot create Remote Config client for environment \"{env}\": {source}")]
    Client {
        env: String,
        #[source]
        source: RemoteConfigError,
    },
}

/// The environments available to tool calls, fixed after construction.
#[derive(Clone, Default)]
pub struct EnvironmentRegistry {
    startup: Vec<String>,
    environments: Vec<Environment>,
}

impl EnvironmentRegistry {
    /// An empty registry remembering the startup environment list.
    pub fn new(startup: Vec<String>) -> Self {
        Self {
            startup,
            environments: Vec::new(),
        }
    }

    /// Build one Firebase client per configured environment.
    ///
    /// Fails on the first environment whose key file is missing or
    /// unreadable; no partially-loaded registry is returned.
    pub fn load(config: &ServerConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new(config.environments.clone());

        for env in &config.environments {
            tracing::info!(env = %env, "loading Firebase config");

            let account = ServiceAccount::load(&config.credentials_dir, env).map_err(|source| {
                RegistryError::Credentials {
                    env: env.clone(),
                    source,
                }
            })?;
            let client = FirebaseClient::new(account, config.request_timeout).map_err(|source| {
                RegistryError::Client {
                    env: env.clone(),
                    source,
                }
            })?;

            tracing::debug!(env = %env, project_id = %client.project_id(), "environment ready");
            registry.insert(env.clone(), Arc::new(client));
        }

        Ok(registry)
    }

    /// Register `client` under `name`, replacing any client already there.
    pub fn insert(&mut self, name: impl Into<String>, client: Arc<dyn RemoteConfigClient>) {
        let name = name.into();
        match self.environments.iter_mut().find(|e| e.name == name) {
            Some(existing) => existing.client = client,
            None => self.environments.push(Environment { name, client }),
        }
    }

    pub fn with_environment(
        mut self,
        name: impl Into<String>,
        client: Arc<dyn RemoteConfigClient>,
    ) -> Self {
        self.insert(name, client);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Pick the environment a tool call should use.
    ///
    /// First match wins: the requested name if registered, the first
    /// startup environment, `dev`, the first registered environment.
    /// With an empty registry this returns `dev`, which callers then fail
    /// to look up.
    pub fn resolve(&self, requested: Option<&str>) -> String {
        if let Some(name) = requested.filter(|n| !n.is_empty() && self.contains(n)) {
            return name.to_string();
        }

        if let Some(first) = self.startup.first().filter(|n| !n.is_empty() && self.contains(n)) {
            return first.clone();
        }

        if self.contains(DEFAULT_ENVIRONMENT) {
            return DEFAULT_ENVIRONMENT.to_string();
        }

        self.names()
            .next()
            .unwrap_or(DEFAULT_ENVIRONMENT)
            .to_string()
    }
}
