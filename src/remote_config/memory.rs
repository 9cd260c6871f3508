use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    Condition, PublishOptions, RemoteConfigClient, RemoteConfigError, Template, Version,
};

/// A Remote Config "project" held in process memory.
///
/// Publishing bumps the version number and etag the way the real service
/// does, which makes it a drop-in client for tests and offline runs.
pub struct InMemoryClient {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    template: Template,
    version: u64,
    publishes: usize,
}

impl InMemoryClient {
    /// Start from `template`, stamped as version 1.
    pub fn new(template: Template) -> Self {
        let mut template = template;
        stamp(&mut template, 1);
        Self {
            state: Mutex::new(MemoryState {
                template,
                version: 1,
                publishes: 0,
            }),
        }
    }

    /// An empty template that defines the given condition names.
    pub fn with_conditions(names: &[&str]) -> Self {
        Self::new(Template {
            conditions: names.iter().map(|name| Condition::named(*name)).collect(),
            ..Template::default()
        })
    }

    /// The template as currently stored.
    pub fn snapshot(&self) -> Template {
        self.lock().template.clone()
    }

    /// Number of successful publishes since construction.
    pub fn publish_count(&self) -> usize {
        self.lock().publishes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stamp(template: &mut Template, version: u64) {
    template.version = Some(Version::numbered(version));
    template.etag = format!("etag-{version}");
}

#[async_trait]
impl RemoteConfigClient for InMemoryClient {
    async fn get_template(&self) -> Result<Template, RemoteConfigError> {
        Ok(self.snapshot())
    }

    async fn publish_template(
        &self,
        template: &Template,
        options: PublishOptions,
    ) -> Result<Template, RemoteConfigError> {
        let mut state = self.lock();

        if !options.force && template.etag != state.template.etag {
            return Err(RemoteConfigError::Conflict {
                expected: template.etag.clone(),
                actual: state.template.etag.clone(),
            });
        }

        state.version += 1;
        let mut stored = template.clone();
        stamp(&mut stored, state.version);
        state.template = stored.clone();
        state.publishes += 1;
        Ok(stored)
    }
}
