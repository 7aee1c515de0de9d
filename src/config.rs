use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub(crate) const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_THROTTLE: Duration = Duration::from_millis(300);
pub(crate) const DEFAULT_RUNTIME_SECS: f64 = 1440.0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub(crate) allow_autoplay: bool,
    pub(crate) debounce: Duration,
    pub(crate) throttle: Duration,
    pub(crate) default_runtime: f64,
    pub(crate) db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_autoplay: false,
            debounce: DEFAULT_DEBOUNCE,
            throttle: DEFAULT_THROTTLE,
            default_runtime: DEFAULT_RUNTIME_SECS,
            db_path: None,
        }
    }
}

impl Config {
    pub(crate) fn from_env() -> Self {
        Self {
            allow_autoplay: resolve_flag_from_env(env::var_os("NEXTEP_ALLOW_AUTOPLAY")),
            debounce: resolve_millis_from_env(
                "NEXTEP_DEBOUNCE_MS",
                env::var_os("NEXTEP_DEBOUNCE_MS"),
                DEFAULT_DEBOUNCE,
            ),
            throttle: resolve_millis_from_env(
                "NEXTEP_THROTTLE_MS",
                env::var_os("NEXTEP_THROTTLE_MS"),
                DEFAULT_THROTTLE,
            ),
            default_runtime: resolve_runtime_from_env(env::var_os("NEXTEP_DEFAULT_RUNTIME")),
            db_path: resolve_db_path_from_env(env::var_os("NEXTEP_DB")),
        }
    }
}

pub(crate) fn resolve_flag_from_env(env_value: Option<OsString>) -> bool {
    let Some(value) = env_value else {
        return false;
    };
    matches!(
        value.to_string_lossy().trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub(crate) fn resolve_millis_from_env(
    name: &str,
    env_value: Option<OsString>,
    default: Duration,
) -> Duration {
    match env_value {
        Some(value) if !value.is_empty() => {
            match value.to_string_lossy().trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!(variable = name, value = ?value, "ignoring malformed duration");
                    default
                }
            }
        }
        _ => default,
    }
}

pub(crate) fn resolve_runtime_from_env(env_value: Option<OsString>) -> f64 {
    match env_value {
        Some(value) if !value.is_empty() => match value.to_string_lossy().trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs > 0.0 => secs,
            _ => {
                warn!(value = ?value, "ignoring malformed NEXTEP_DEFAULT_RUNTIME");
                DEFAULT_RUNTIME_SECS
            }
        },
        _ => DEFAULT_RUNTIME_SECS,
    }
}

pub(crate) fn resolve_db_path_from_env(env_value: Option<OsString>) -> Option<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_truthy_spellings() {
        for raw in ["1", "true", "YES", " on "] {
            assert!(resolve_flag_from_env(Some(OsString::from(raw))), "{raw}");
        }
        assert!(!resolve_flag_from_env(Some(OsString::from("0"))));
        assert!(!resolve_flag_from_env(Some(OsString::from("nope"))));
        assert!(!resolve_flag_from_env(None));
    }

    #[test]
    fn millis_fall_back_to_default_when_malformed() {
        let parsed = resolve_millis_from_env("X", Some(OsString::from("250")), DEFAULT_DEBOUNCE);
        assert_eq!(parsed, Duration::from_millis(250));

        let fallback = resolve_millis_from_env("X", Some(OsString::from("soon")), DEFAULT_THROTTLE);
        assert_eq!(fallback, DEFAULT_THROTTLE);

        let empty = resolve_millis_from_env("X", Some(OsString::new()), DEFAULT_THROTTLE);
        assert_eq!(empty, DEFAULT_THROTTLE);
    }

    #[test]
    fn runtime_rejects_non_positive_values() {
        assert_eq!(resolve_runtime_from_env(Some(OsString::from("600"))), 600.0);
        assert_eq!(
            resolve_runtime_from_env(Some(OsString::from("-3"))),
            DEFAULT_RUNTIME_SECS
        );
        assert_eq!(resolve_runtime_from_env(None), DEFAULT_RUNTIME_SECS);
    }

    #[test]
    fn db_path_override_ignores_empty_value() {
        assert_eq!(resolve_db_path_from_env(Some(OsString::new())), None);
        assert_eq!(
            resolve_db_path_from_env(Some(OsString::from("/tmp/x.db"))),
            Some(PathBuf::from("/tmp/x.db"))
        );
    }
}
