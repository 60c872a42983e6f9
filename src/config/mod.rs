// Core configuration types
mod accessors;
mod core;
mod loader;

pub use core::{CallTypesConfig, CoercionConfig, CommentConfig};

pub use loader::{directory_ancestors, load_config, parse_config, CONFIG_FILE_NAME};

pub use accessors::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_enables_all_coercions() {
        let config = CallTypesConfig::default();
        assert!(config.coercion.stringify_scalars);
        assert!(config.coercion.widen_int_to_float);
        assert!(config.coercion.parse_numeric_text);
        assert!(config.coercion.narrow_integral_floats);
        assert_eq!(config.comments.continuation_marker, "(...)");
    }
}
