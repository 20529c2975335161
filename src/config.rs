use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ShellError;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub external: ExternalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_input_buffer")]
    pub input_buffer: usize,
    #[serde(default = "default_output_buffer")]
    pub output_buffer: usize,
    /// 0 disables the timeout.
    #[serde(default)]
    pub drain_timeout_ms: u64,
}

fn default_prompt() -> String {
    crate::env::DEFAULT_PROMPT.to_string()
}

fn default_input_buffer() -> usize {
    8192
}

fn default_output_buffer() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            input_buffer: default_input_buffer(),
            output_buffer: default_output_buffer(),
            drain_timeout_ms: 0,
        }
    }
}

/// Initial session variables.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct EnvConfig {
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// Whether unknown commands may run as host processes.
#[derive(Debug, Deserialize, Serialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Copy the host `PATH` into the session when it has none.
    #[serde(default = "default_true")]
    pub inherit_path: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            inherit_path: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Log file; defaults to `~/.local/share/shellpipe/session.log`.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    session: SessionOverlay,
    #[serde(default)]
    env: EnvOverlay,
    #[serde(default)]
    external: ExternalOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SessionOverlay {
    prompt: Option<String>,
    input_buffer: Option<usize>,
    output_buffer: Option<usize>,
    drain_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct EnvOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    vars: BTreeMap<String, String>,
    #[serde(default)]
    remove: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ExternalOverlay {
    enabled: Option<bool>,
    inherit_path: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<PathBuf>,
}

// ── Merge logic ──

/// Merge a user table into a default table.
/// In replace mode: user table replaces default entirely.
/// In merge mode: remove keys first, then insert additions (overriding).
fn merge_map(
    base: &mut BTreeMap<String, String>,
    add: BTreeMap<String, String>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
    } else {
        base.retain(|key, _| !remove.contains(key));
        base.extend(add);
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/shellpipe/config.toml (if exists)
    ///
    /// User config merges with defaults: tables extend, scalars override.
    /// Set `replace = true` in `[env]` to replace its defaults entirely.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(path) = Self::user_config_path() {
            match Self::read_overlay(&path) {
                Ok(Some(overlay)) => config.apply_overlay(overlay),
                Ok(None) => {}
                Err(e) => eprintln!("shellpipe: {}: {e}", path.display()),
            }
        }
        config
    }

    /// Defaults merged with the overlay at `path`, which must exist and parse.
    pub fn load_from(path: &Path) -> Result<Self, ShellError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::default_config();
        config.apply_overlay(toml::from_str(&content)?);
        Ok(config)
    }

    fn user_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/shellpipe/config.toml"))
    }

    /// `Ok(None)` when the file does not exist.
    fn read_overlay(path: &Path) -> Result<Option<ConfigOverlay>, ShellError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(toml::from_str(&content)?))
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.session;
        override_with(&mut self.session.prompt, s.prompt);
        override_with(&mut self.session.input_buffer, s.input_buffer);
        override_with(&mut self.session.output_buffer, s.output_buffer);
        override_with(&mut self.session.drain_timeout_ms, s.drain_timeout_ms);

        let e = overlay.env;
        merge_map(&mut self.env.vars, e.vars, &e.remove, e.replace);

        let x = overlay.external;
        override_with(&mut self.external.enabled, x.enabled);
        override_with(&mut self.external.inherit_path, x.inherit_path);

        let l = overlay.logging;
        override_with(&mut self.logging.level, l.level);
        if l.file.is_some() {
            self.logging.file = l.file;
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.session.prompt, "$ ");
        assert_eq!(config.session.input_buffer, 8192);
        assert_eq!(config.session.output_buffer, 64);
        assert_eq!(config.session.drain_timeout_ms, 0);
        assert!(config.env.vars.is_empty());
        assert!(!config.external.enabled);
        assert!(config.external.inherit_path);
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn empty_document_uses_field_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.session.prompt, "$ ");
        assert!(config.external.inherit_path);
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_overrides_prompt() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [session]
            prompt = "> "
        "#,
        );
        assert_eq!(config.session.prompt, "> ");
        // Other scalars untouched
        assert_eq!(config.session.output_buffer, 64);
    }

    #[test]
    fn overlay_extends_env() {
        let mut config = Config::default_config();
        config.env.vars.insert("A".into(), "1".into());
        config.apply_overlay_str(
            r#"
            [env.vars]
            B = "2"
        "#,
        );
        assert_eq!(config.env.vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(config.env.vars.get("B").map(String::as_str), Some("2"));
    }

    #[test]
    fn overlay_overrides_env_value() {
        let mut config = Config::default_config();
        config.env.vars.insert("A".into(), "1".into());
        config.apply_overlay_str(
            r#"
            [env]
            vars = { A = "changed" }
        "#,
        );
        assert_eq!(config.env.vars.get("A").map(String::as_str), Some("changed"));
    }

    #[test]
    fn overlay_removes_env() {
        let mut config = Config::default_config();
        config.env.vars.insert("A".into(), "1".into());
        config.env.vars.insert("B".into(), "2".into());
        config.apply_overlay_str(
            r#"
            [env]
            remove = ["A"]
        "#,
        );
        assert!(!config.env.vars.contains_key("A"));
        assert!(config.env.vars.contains_key("B"));
    }

    #[test]
    fn overlay_replace_env() {
        let mut config = Config::default_config();
        config.env.vars.insert("A".into(), "1".into());
        config.apply_overlay_str(
            r#"
            [env]
            replace = true
            vars = { C = "3" }
        "#,
        );
        assert_eq!(config.env.vars.len(), 1);
        assert!(config.env.vars.contains_key("C"));
    }

    #[test]
    fn overlay_external_and_logging() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [external]
            enabled = true

            [logging]
            level = "debug"
            file = "/tmp/shellpipe.log"
        "#,
        );
        assert!(config.external.enabled);
        assert!(config.external.inherit_path);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/shellpipe.log")));
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.session.prompt, "$ ");
        assert_eq!(config.session.drain_timeout_ms, 0);
        assert!(!config.external.enabled);
    }

    #[test]
    fn load_from_missing_file_errors() {
        let err = Config::load_from(Path::new("/nonexistent/shellpipe.toml")).unwrap_err();
        assert!(matches!(err, ShellError::Io(_)));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("shellpipe-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[session]\ndrain_timeout_ms = 1500\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.session.drain_timeout_ms, 1500);
    }

    #[test]
    fn malformed_overlay_is_config_error() {
        let path = std::env::temp_dir().join(format!("shellpipe-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[session\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ShellError::Config(_)));
    }
}
