use std::path::PathBuf;

/// Default location of the committed configuration reference.
pub const DEFAULT_DOCS_PATH: &str = "docs/configuration.md";

/// Bootforge CLI runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Fallback filter when no level is passed and neither `BOOTFORGE_LOG`
    /// nor `RUST_LOG` is set
    pub log_level: String,
    /// Directory for rolling NDJSON logs
    pub log_dir: Option<PathBuf>,
    /// Where `docs` writes or checks the rendered reference
    pub docs_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            docs_path: PathBuf::from(DEFAULT_DOCS_PATH),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: defaults.log_level,
            log_dir: lookup("BOOTFORGE_LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            docs_path: lookup("BOOTFORGE_DOCS_PATH")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.docs_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn environment_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("RUST_LOG", "debug"),
            ("BOOTFORGE_LOG", "warn"),
            ("BOOTFORGE_LOG_DIR", "/var/log/bootforge"),
            ("BOOTFORGE_DOCS_PATH", "out/config.md"),
        ]));
        // filter variables are resolved by the logger, after --log-level
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/bootforge")));
        assert_eq!(config.docs_path, PathBuf::from("out/config.md"));
    }

    #[test]
    fn empty_paths_fall_back() {
        let config = Config::from_lookup(lookup(&[("BOOTFORGE_LOG_DIR", ""), ("BOOTFORGE_DOCS_PATH", "")]));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.docs_path, PathBuf::from(DEFAULT_DOCS_PATH));
    }
}
