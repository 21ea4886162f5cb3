//! Configuration file management for aircot.
//!
//! Reads/writes `~/.aircot/config.yaml`: where to find each reference table
//! (null means the embedded copy) and which callsign rules are on.

use std::path::{Path, PathBuf};

use crate::classify::ClassifierOptions;
use crate::dataset::DatasetPaths;
use crate::types::{AircotError, Result};

/// Full configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub tables: TablesConfig,
    pub rules: RulesConfig,
}

/// Reference table files. `None` selects the embedded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablesConfig {
    pub ranges: Option<String>,
    pub known_craft: Option<String>,
    pub categories: Option<String>,
    pub emergency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    pub domestic_callsigns: bool,
    pub sar_callsigns: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            domestic_callsigns: true,
            sar_callsigns: true,
        }
    }
}

impl Config {
    pub fn dataset_paths(&self) -> DatasetPaths {
        DatasetPaths {
            ranges: self.tables.ranges.as_ref().map(PathBuf::from),
            known_craft: self.tables.known_craft.as_ref().map(PathBuf::from),
            categories: self.tables.categories.as_ref().map(PathBuf::from),
            emergency: self.tables.emergency.as_ref().map(PathBuf::from),
        }
    }

    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            domestic_callsigns: self.rules.domestic_callsigns,
            sar_callsigns: self.rules.sar_callsigns,
        }
    }
}

/// Get the config directory path (`~/.aircot/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".aircot")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.aircot/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
            return Config::default();
        }
    };

    parse_config(&text)
}

/// Save config to `~/.aircot/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| AircotError::Config(e.to_string()))?;
    }
    let text = serialize_config(config);
    std::fs::write(path, text).map_err(|e| AircotError::Config(e.to_string()))
}

/// Parse simple YAML-like config text. Unknown keys are ignored.
pub fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }
        let Some(section) = current_section.as_deref() else {
            continue;
        };

        match section {
            "tables" => match key {
                "ranges" => config.tables.ranges = parse_string_value(val),
                "known_craft" => config.tables.known_craft = parse_string_value(val),
                "categories" => config.tables.categories = parse_string_value(val),
                "emergency" => config.tables.emergency = parse_string_value(val),
                _ => {}
            },
            "rules" => match key {
                "domestic_callsigns" => {
                    if let Some(v) = parse_bool_value(val) {
                        config.rules.domestic_callsigns = v;
                    }
                }
                "sar_callsigns" => {
                    if let Some(v) = parse_bool_value(val) {
                        config.rules.sar_callsigns = v;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_bool_value(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn path_line(key: &str, value: &Option<String>) -> String {
    match value {
        Some(v) => format!("  {key}: \"{v}\""),
        None => format!("  {key}: null"),
    }
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# aircot configuration".to_string(), String::new()];

    lines.push("tables:".into());
    lines.push(path_line("ranges", &config.tables.ranges));
    lines.push(path_line("known_craft", &config.tables.known_craft));
    lines.push(path_line("categories", &config.tables.categories));
    lines.push(path_line("emergency", &config.tables.emergency));
    lines.push(String::new());

    lines.push("rules:".into());
    lines.push(format!(
        "  domestic_callsigns: {}",
        config.rules.domestic_callsigns
    ));
    lines.push(format!("  sar_callsigns: {}", config.rules.sar_callsigns));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.tables.ranges.is_none());
        assert!(config.rules.domestic_callsigns);
        assert!(config.rules.sar_callsigns);
        assert_eq!(config.dataset_paths(), DatasetPaths::default());
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
tables:
  ranges: "/srv/aircot/ranges.csv"
  known_craft: '/srv/aircot/known.json'
  categories: null

rules:
  domestic_callsigns: false
  sar_callsigns: yes
"#;
        let config = parse_config(text);
        assert_eq!(config.tables.ranges.as_deref(), Some("/srv/aircot/ranges.csv"));
        assert_eq!(config.tables.known_craft.as_deref(), Some("/srv/aircot/known.json"));
        assert!(config.tables.categories.is_none());
        assert!(config.tables.emergency.is_none());
        assert!(!config.rules.domestic_callsigns);
        assert!(config.rules.sar_callsigns);

        let paths = config.dataset_paths();
        assert_eq!(paths.ranges, Some(PathBuf::from("/srv/aircot/ranges.csv")));
        assert!(!config.classifier_options().domestic_callsigns);
    }

    #[test]
    fn test_parse_config_ignores_junk() {
        let text = r#"
# comment
orphan line without colon
  stray: "indented before any section"
rules:
  sar_callsigns: maybe
  unknown_rule: true
"#;
        let config = parse_config(text);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_roundtrip() {
        let config = Config {
            tables: TablesConfig {
                ranges: Some("ranges.json".into()),
                known_craft: None,
                categories: None,
                emergency: Some("/etc/aircot/emergency.json".into()),
            },
            rules: RulesConfig {
                domestic_callsigns: true,
                sar_callsigns: false,
            },
        };
        let text = serialize_config(&config);
        assert_eq!(parse_config(&text), config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.rules.domestic_callsigns = false;
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = load_config_from(Path::new("/nonexistent/aircot/config.yaml"));
        assert_eq!(config, Config::default());
    }
}
