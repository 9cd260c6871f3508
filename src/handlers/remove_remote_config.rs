use crate::protocol::{McpErrorResponse, RemoveRemoteConfigArgs, ToolResult};
use crate::registry::EnvironmentRegistry;
use crate::remote_config::{EditError, PublishOptions, TemplateEdit};

use super::{remote_failure, resolve_environment};

/// Handle a `removeRemoteConfig` tool call.
///
/// Removes the whole parameter, or only its override for one condition.
/// Nothing is published when there is nothing to remove.
pub async fn handle(args: RemoveRemoteConfigArgs, registry: &EnvironmentRegistry) -> ToolResult {
    if let Err(detail) = args.validate() {
        return McpErrorResponse::invalid_arguments("removeRemoteConfig", detail).into();
    }

    let env = match resolve_environment(registry, args.env()) {
        Ok(env) => env,
        Err(err) => return err.into(),
    };

    let template = match env.client().get_template().await {
        Ok(t) => t,
        Err(e) => return remote_failure(env.name(), "fetch", &e),
    };

    let key = args.key.as_str();
    let (edit, removed) = match args.condition() {
        None => (
            TemplateEdit::DeleteParameter { key: key.to_string() },
            format!("parameter \"{key}\""),
        ),
        Some(condition) => (
            TemplateEdit::DeleteOverride {
                key: key.to_string(),
                condition: condition.to_string(),
            },
            format!("override for condition \"{condition}\" on parameter \"{key}\""),
        ),
    };

    let updated = match template.apply(&[edit]) {
        Ok(t) => t,
        Err(EditError::UnknownParameter(_)) => {
            return ToolResult::text(format!(
                "Parameter \"{key}\" doesn't exist. Nothing removed."
            ));
        }
        Err(EditError::UnknownOverride { condition, .. }) => {
            return ToolResult::text(format!(
                "Parameter \"{key}\" has no override for condition \"{condition}\". Nothing removed."
            ));
        }
        Err(e) => {
            tracing::error!(env = %env.name(), key = %key, error = %e, "remove edit failed");
            return McpErrorResponse::internal().into();
        }
    };

    let published = match env
        .client()
        .publish_template(&updated, PublishOptions::forced())
        .await
    {
        Ok(t) => t,
        Err(e) => return remote_failure(env.name(), "publish", &e),
    };

    let version = published.version_number().unwrap_or("?");
    tracing::info!(env = %env.name(), key = %key, version, "published removal");

    ToolResult::text(format!("Removed {removed}. Template v{version} published."))
}
