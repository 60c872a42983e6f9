//! Serializable summaries of derived call types, for documentation and
//! UI generation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::anno::{Anno, AnnoDefault};
use crate::calltypes::CallTypes;
use crate::errors::{CallTypesError, Result};

/// One parameter or return descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub name: String,
    pub description: String,
    /// Declared type as text, e.g. `Array[float]`.
    #[serde(rename = "type")]
    pub typ: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    pub is_array: bool,
    pub is_mapping: bool,
}

impl ParameterSummary {
    pub fn from_anno(name: &str, anno: &Anno) -> Self {
        let (required, default) = match anno.default() {
            AnnoDefault::NoDefault => (true, None),
            AnnoDefault::Value(value) => (false, Some(value.to_json())),
        };
        Self {
            name: name.to_string(),
            description: anno.description().to_string(),
            typ: anno.full_type().to_string(),
            required,
            default,
            is_array: anno.is_array(),
            is_mapping: anno.is_mapping(),
        }
    }
}

/// Parameters in declaration order plus the return descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSummary {
    pub name: String,
    pub parameters: Vec<ParameterSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ParameterSummary>,
}

impl SignatureSummary {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CallTypesError::Serialization {
            message: e.to_string(),
        })
    }
}

/// Summarise the call types of the class or function `name`.
pub fn describe_call_types(
    name: &str,
    call_types: &CallTypes,
    return_type: Option<&Arc<Anno>>,
) -> SignatureSummary {
    SignatureSummary {
        name: name.to_string(),
        parameters: call_types
            .iter()
            .map(|(param, anno)| ParameterSummary::from_anno(param, anno))
            .collect(),
        returns: return_type.map(|anno| {
            ParameterSummary::from_anno(anno.name().unwrap_or("return"), anno)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTag;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_call_types() {
        let exposure = Anno::new("The exposure to be active for")
            .with_name("Exposure")
            .set_typ(TypeTag::Float)
            .unwrap();
        let path = Anno::new("The path to the file to write")
            .with_name("Path")
            .set_typ(TypeTag::Str)
            .unwrap()
            .with_default(AnnoDefault::Value(Value::from("/tmp/file.txt")))
            .unwrap();
        let mut call_types = CallTypes::new();
        call_types.insert("exposure".into(), Arc::new(exposure));
        call_types.insert("path".into(), Arc::new(path));

        let summary = describe_call_types("Simple", &call_types, None);
        assert_eq!(summary.parameters.len(), 2);
        assert!(summary.parameters[0].required);
        assert_eq!(
            summary.parameters[1].default,
            Some(serde_json::json!("/tmp/file.txt"))
        );

        let json: serde_json::Value =
            serde_json::from_str(&summary.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["parameters"][0]["type"], "float");
        assert_eq!(json["parameters"][1]["name"], "path");
        assert!(json.get("returns").is_none());
    }

    #[test]
    fn test_summary_round_trips() {
        let anno = Anno::new("Axes").set_typ(TypeTag::array_of(TypeTag::Str)).unwrap();
        let mut call_types = CallTypes::new();
        call_types.insert("axes".into(), Arc::new(anno));
        let summary = describe_call_types("ManyArgs", &call_types, None);
        let parsed: SignatureSummary =
            serde_json::from_str(&summary.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, summary);
        assert_eq!(parsed.parameters[0].typ, "Array[str]");
    }
}
