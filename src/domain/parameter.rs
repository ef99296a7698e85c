//! Agent parameter schema and the typed values that flow into agents.
//!
//! Callers send loosely-typed JSON; everything past the HTTP edge works with
//! [`ParameterValue`], a closed sum over the three declared parameter types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Declared type of an agent parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterType::String => write!(f, "string"),
            ParameterType::Number => write!(f, "number"),
            ParameterType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A runtime parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl ParameterValue {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterValue::String(_) => ParameterType::String,
            ParameterValue::Number(_) => ParameterType::Number,
            ParameterValue::Boolean(_) => ParameterType::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert a JSON value. Null, arrays and objects have no parameter form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ParameterValue::String(s.clone())),
            Value::Number(n) => n.as_f64().map(ParameterValue::Number),
            Value::Bool(b) => Some(ParameterValue::Boolean(*b)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::String(s) => Value::String(s.clone()),
            ParameterValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParameterValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::String(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::String(s)
    }
}

impl From<f64> for ParameterValue {
    fn from(n: f64) -> Self {
        ParameterValue::Number(n)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        ParameterValue::Boolean(b)
    }
}

/// Supplied parameters keyed by name
pub type ParameterMap = BTreeMap<String, ParameterValue>;

/// One input an agent declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParameterValue>,
}

impl ParameterDefinition {
    pub fn required(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: None,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<ParameterValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Convert a JSON object into a [`ParameterMap`].
///
/// `null` entries count as not supplied. Arrays and objects are rejected with
/// one message per offending key.
pub fn parameters_from_json(object: &Map<String, Value>) -> Result<ParameterMap, Vec<String>> {
    let mut params = ParameterMap::new();
    let mut errors = Vec::new();

    for (name, value) in object {
        if value.is_null() {
            continue;
        }
        match ParameterValue::from_json(value) {
            Some(v) => {
                params.insert(name.clone(), v);
            }
            None => errors.push(format!(
                "Parameter '{}' must be a string, number or boolean.",
                name
            )),
        }
    }

    if errors.is_empty() {
        Ok(params)
    } else {
        Err(errors)
    }
}

pub fn parameters_to_json(params: &ParameterMap) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Names of required parameters the caller did not supply
pub fn missing_required<'a>(
    definitions: &'a [ParameterDefinition],
    supplied: &ParameterMap,
) -> Vec<&'a str> {
    definitions
        .iter()
        .filter(|d| d.required && !supplied.contains_key(&d.name))
        .map(|d| d.name.as_str())
        .collect()
}

/// Messages for every supplied value whose runtime type differs from its declaration.
/// Keys with no matching definition are ignored.
pub fn type_violations(definitions: &[ParameterDefinition], supplied: &ParameterMap) -> Vec<String> {
    definitions
        .iter()
        .filter_map(|d| {
            let value = supplied.get(&d.name)?;
            if value.parameter_type() == d.param_type {
                None
            } else {
                Some(format!(
                    "Parameter '{}' must be of type {}.",
                    d.name, d.param_type
                ))
            }
        })
        .collect()
}

/// Full check: missing required parameters first, then type mismatches.
pub fn validate_parameters(
    definitions: &[ParameterDefinition],
    supplied: &ParameterMap,
) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = missing_required(definitions, supplied)
        .into_iter()
        .map(|name| format!("Parameter '{}' is required.", name))
        .collect();
    errors.extend(type_violations(definitions, supplied));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Fill in declared defaults for parameters the caller omitted
pub fn apply_defaults(definitions: &[ParameterDefinition], params: &mut ParameterMap) {
    for definition in definitions {
        if let Some(default) = &definition.default {
            params
                .entry(definition.name.clone())
                .or_insert_with(|| default.clone());
        }
    }
}
