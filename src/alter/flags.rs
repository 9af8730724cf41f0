use std::path::PathBuf;

const TUNING_LOG_ENV_PATH: &str = "CONV_ALTER_TUNING_LOG";
const TUNING_LOG_FILE_NAME: &str = ".conv_alter_tuning.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlterFlags {
    /// Verify the attributes of every rewritten node before returning it.
    pub debug_verify: bool,
    /// Write the tuning log back after the CLI runs the pass.
    pub persist_tuning: bool,
}

impl Default for AlterFlags {
    fn default() -> Self {
        Self {
            debug_verify: cfg!(debug_assertions),
            persist_tuning: false,
        }
    }
}

impl AlterFlags {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debug_verify: read_bool("CONV_ALTER_DEBUG_VERIFY", defaults.debug_verify),
            persist_tuning: read_bool("CONV_ALTER_PERSIST_TUNING", defaults.persist_tuning),
        }
    }
}

pub fn tuning_log_path() -> PathBuf {
    match std::env::var(TUNING_LOG_ENV_PATH) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(TUNING_LOG_FILE_NAME),
    }
}

fn read_bool(key: &str, default_value: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(default_value)
}

#[cfg(test)]
mod tests {
    use super::AlterFlags;

    #[test]
    fn flags_are_readable_from_environment_defaults() {
        let flags = AlterFlags::from_env();
        if cfg!(debug_assertions) && std::env::var("CONV_ALTER_DEBUG_VERIFY").is_err() {
            assert!(flags.debug_verify);
        }
    }
}
