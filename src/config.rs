use serde::Deserialize;
use crate::path::Path;

/// Per-validator settings; there is no process-wide switch.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// When false, every validation passes without walking the value.
    pub enabled: bool,
    /// Label of the root segment in error paths.
    pub root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self { enabled: true, root: Path::DEFAULT_ROOT.to_string() }
    }
}

impl Config {
    pub fn disabled() -> Self { Self { enabled: false, ..Self::default() } }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"root": "payload"}"#).unwrap();
        assert_eq!(cfg, Config::default().with_root("payload"));
        let cfg: Config = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(cfg, Config::disabled());
        assert!(serde_json::from_str::<Config>(r#"{"enable": false}"#).is_err());
    }
}
