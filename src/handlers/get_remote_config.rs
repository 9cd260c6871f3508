use std::collections::BTreeMap;

use serde::Serialize;

use crate::protocol::{GetRemoteConfigArgs, ToolResult};
use crate::registry::EnvironmentRegistry;
use crate::remote_config::{Parameter, Version};

use super::{json_result, remote_failure, resolve_environment};

/// Whole-template view. Conditions are left out to keep the payload small.
#[derive(Debug, Serialize)]
struct TemplateSummary<'a> {
    version: Option<&'a Version>,
    etag: &'a str,
    parameters: &'a BTreeMap<String, Parameter>,
}

/// Handle a `remoteConfig` tool call.
///
/// Read-only: returns a single parameter as `{ key: parameter }` when a key
/// is given, otherwise the template version, etag and all parameters.
pub async fn handle(args: GetRemoteConfigArgs, registry: &EnvironmentRegistry) -> ToolResult {
    let env = match resolve_environment(registry, args.env()) {
        Ok(env) => env,
        Err(err) => return err.into(),
    };

    let template = match env.client().get_template().await {
        Ok(t) => t,
        Err(e) => return remote_failure(env.name(), "fetch", &e),
    };

    let Some(key) = args.key() else {
        return json_result(&TemplateSummary {
            version: template.version.as_ref(),
            etag: &template.etag,
            parameters: &template.parameters,
        });
    };

    match template.parameter(key) {
        Some(param) => json_result(&BTreeMap::from([(key, param)])),
        None => ToolResult::text(format!("Parameter \"{key}\" not found in Remote Config")),
    }
}
