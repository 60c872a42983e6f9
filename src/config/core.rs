use serde::{Deserialize, Serialize};

/// Root configuration structure, read from `.calltypes.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CallTypesConfig {
    /// Implicit conversions performed when a descriptor validates a value
    #[serde(default)]
    pub coercion: CoercionConfig,

    /// Type comment scanning
    #[serde(default)]
    pub comments: CommentConfig,
}

/// Implicit conversions applied by scalar type tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoercionConfig {
    /// Text descriptors accept numbers, bools and enum members (`32` -> `"32"`)
    #[serde(default = "default_true")]
    pub stringify_scalars: bool,

    /// Float descriptors accept ints (`3` -> `3.0`)
    #[serde(default = "default_true")]
    pub widen_int_to_float: bool,

    /// Numeric descriptors parse numeric text (`"2.5"` -> `2.5`)
    #[serde(default = "default_true")]
    pub parse_numeric_text: bool,

    /// Int descriptors accept floats with no fractional part (`4.0` -> `4`)
    #[serde(default = "default_true")]
    pub narrow_integral_floats: bool,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            stringify_scalars: true,
            widen_int_to_float: true,
            parse_numeric_text: true,
            narrow_integral_floats: true,
        }
    }
}

/// Type comment scanning options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentConfig {
    /// Argument expression meaning "same arguments as before, nothing new"
    #[serde(default = "default_continuation_marker")]
    pub continuation_marker: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            continuation_marker: default_continuation_marker(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_continuation_marker() -> String {
    "(...)".to_string()
}
