use std::sync::OnceLock;

use super::core::{CallTypesConfig, CoercionConfig, CommentConfig};

/// Cache the configuration
static CONFIG: OnceLock<CallTypesConfig> = OnceLock::new();

/// Get the installed configuration, or the defaults when none was installed.
///
/// Never reads the filesystem; callers that want `.calltypes.toml` pass the
/// result of [`super::load_config`] to [`set_config`].
pub fn get_config() -> &'static CallTypesConfig {
    CONFIG.get_or_init(CallTypesConfig::default)
}

/// Install a configuration before first use.
///
/// Returns `false` if a configuration was already installed or the defaults
/// were already in use.
pub fn set_config(config: CallTypesConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// Get the coercion rules
pub fn get_coercion_config() -> &'static CoercionConfig {
    &get_config().coercion
}

/// Get the type comment scanning options
pub fn get_comment_config() -> &'static CommentConfig {
    &get_config().comments
}
