use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Remote Config template as returned by the service.
///
/// Only the parts this server edits are modelled; every other field the
/// service sends (`parameterGroups`, condition expressions, descriptions)
/// is carried through `extra` so that a publish never drops remote state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Taken from the `ETag` response header, never part of the body.
    #[serde(skip)]
    pub etag: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ParameterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_values: Option<BTreeMap<String, ParameterValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A default or conditional value. `value` is absent for in-app defaults
/// and rollout/personalization values, which live in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameter value type. Types this server does not know are kept verbatim
/// in `Other` so a publish writes back exactly what was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    String,
    Boolean,
    Number,
    Json,
    Unspecified,
    Other(String),
}

impl From<String> for ValueType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "STRING" => Self::String,
            "BOOLEAN" => Self::Boolean,
            "NUMBER" => Self::Number,
            "JSON" => Self::Json,
            "PARAMETER_VALUE_TYPE_UNSPECIFIED" => Self::Unspecified,
            _ => Self::Other(raw),
        }
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::String => "STRING".into(),
            ValueType::Boolean => "BOOLEAN".into(),
            ValueType::Number => "NUMBER".into(),
            ValueType::Json => "JSON".into(),
            ValueType::Unspecified => "PARAMETER_VALUE_TYPE_UNSPECIFIED".into(),
            ValueType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterValue {
    pub fn explicit(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            extra: Map::new(),
        }
    }
}

impl Parameter {
    /// A fresh string parameter with an empty default value.
    pub fn empty_string() -> Self {
        Self {
            default_value: Some(ParameterValue::explicit("")),
            conditional_values: None,
            value_type: Some(ValueType::String),
            extra: Map::new(),
        }
    }

    pub fn has_override(&self, condition: &str) -> bool {
        self.conditional_values
            .as_ref()
            .is_some_and(|values| values.contains_key(condition))
    }
}

impl Condition {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

impl Version {
    pub fn numbered(number: u64) -> Self {
        Self {
            version_number: Some(number.to_string()),
            extra: Map::new(),
        }
    }
}

/// A single change to a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEdit {
    /// Create `key` as an empty string parameter unless it already exists.
    EnsureParameter { key: String },
    SetDefault { key: String, value: String },
    /// Requires `condition` to be defined in the template.
    SetOverride {
        key: String,
        condition: String,
        value: String,
    },
    /// Drops the override map entirely once its last entry is removed.
    DeleteOverride { key: String, condition: String },
    DeleteParameter { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("condition \"{0}\" does not exist in the template")]
    UnknownCondition(String),
    #[error("parameter \"{0}\" does not exist in the template")]
    UnknownParameter(String),
    #[error("parameter \"{key}\" has no override for condition \"{condition}\"")]
    UnknownOverride { key: String, condition: String },
}

impl Template {
    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.parameters.get(key)
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.iter().any(|c| c.name == name)
    }

    pub fn version_number(&self) -> Option<&str> {
        self.version.as_ref()?.version_number.as_deref()
    }

    /// Apply `edits` in order to a copy of this template.
    ///
    /// The receiver is left untouched whether or not the edits succeed, so
    /// a failed precondition never leaves a half-edited template around.
    pub fn apply(&self, edits: &[TemplateEdit]) -> Result<Template, EditError> {
        let mut next = self.clone();
        for edit in edits {
            next.apply_one(edit)?;
        }
        Ok(next)
    }

    fn apply_one(&mut self, edit: &TemplateEdit) -> Result<(), EditError> {
        match edit {
            TemplateEdit::EnsureParameter { key } => {
                self.parameters
                    .entry(key.clone())
                    .or_insert_with(Parameter::empty_string);
            }
            TemplateEdit::SetDefault { key, value } => {
                self.parameter_mut(key)?.default_value = Some(ParameterValue::explicit(value));
            }
            TemplateEdit::SetOverride {
                key,
                condition,
                value,
            } => {
                if !self.has_condition(condition) {
                    return Err(EditError::UnknownCondition(condition.clone()));
                }
                self.parameter_mut(key)?
                    .conditional_values
                    .get_or_insert_with(BTreeMap::new)
                    .insert(condition.clone(), ParameterValue::explicit(value));
            }
            TemplateEdit::DeleteOverride { key, condition } => {
                let param = self.parameter_mut(key)?;
                let values = param
                    .conditional_values
                    .as_mut()
                    .filter(|values| values.contains_key(condition))
                    .ok_or_else(|| EditError::UnknownOverride {
                        key: key.clone(),
                        condition: condition.clone(),
                    })?;
                values.remove(condition);
                if values.is_empty() {
                    param.conditional_values = None;
                }
            }
            TemplateEdit::DeleteParameter { key } => {
                if self.parameters.remove(key).is_none() {
                    return Err(EditError::UnknownParameter(key.clone()));
                }
            }
        }
        Ok(())
    }

    fn parameter_mut(&mut self, key: &str) -> Result<&mut Parameter, EditError> {
        self.parameters
            .get_mut(key)
            .ok_or_else(|| EditError::UnknownParameter(key.to_string()))
    }
}
