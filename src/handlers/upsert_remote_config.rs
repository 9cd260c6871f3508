use crate::protocol::{McpErrorResponse, ToolResult, UpsertRemoteConfigArgs};
use crate::registry::EnvironmentRegistry;
use crate::remote_config::{EditError, PublishOptions, TemplateEdit};

use super::{remote_failure, resolve_environment};

/// Handle an `upsertRemoteConfig` tool call.
///
/// Creates the parameter as an empty string if needed, then sets either its
/// default value or its override for an existing condition, and
/// force-publishes. Conditions are never created here.
pub async fn handle(args: UpsertRemoteConfigArgs, registry: &EnvironmentRegistry) -> ToolResult {
    if let Err(detail) = args.validate() {
        return McpErrorResponse::invalid_arguments("upsertRemoteConfig", detail).into();
    }

    let env = match resolve_environment(registry, args.env()) {
        Ok(env) => env,
        Err(err) => return err.into(),
    };

    let template = match env.client().get_template().await {
        Ok(t) => t,
        Err(e) => return remote_failure(env.name(), "fetch", &e),
    };

    let key = args.key.clone();
    let value = args.value.clone();
    let change = match args.condition() {
        None => TemplateEdit::SetDefault {
            key: key.clone(),
            value: value.clone(),
        },
        Some(condition) => TemplateEdit::SetOverride {
            key: key.clone(),
            condition: condition.to_string(),
            value: value.clone(),
        },
    };

    let updated = match template.apply(&[TemplateEdit::EnsureParameter { key: key.clone() }, change]) {
        Ok(t) => t,
        Err(EditError::UnknownCondition(condition)) => {
            return McpErrorResponse::condition_missing(&condition).into();
        }
        Err(e) => {
            tracing::error!(env = %env.name(), key = %key, error = %e, "upsert edit failed");
            return McpErrorResponse::internal().into();
        }
    };

    // Last writer wins: the publish ignores edits made since the fetch.
    let published = match env
        .client()
        .publish_template(&updated, PublishOptions::forced())
        .await
    {
        Ok(t) => t,
        Err(e) => return remote_failure(env.name(), "publish", &e),
    };

    let version = published.version_number().unwrap_or("?");
    tracing::info!(env = %env.name(), key = %key, version, "published upsert");

    match args.condition() {
        Some(condition) => ToolResult::text(format!(
            "Updated \"{key}\" for condition \"{condition}\" to \"{value}\" (v{version})."
        )),
        None => ToolResult::text(format!(
            "Updated default \"{key}\" to \"{value}\" (v{version})."
        )),
    }
}
