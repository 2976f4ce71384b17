use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::normalize::NormalizeRules;

pub const APP_NAME: &str = "atlas-observer";
const CONFIG_FILE: &str = "config.toml";

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

/// Application settings read from `<config dir>/atlas-observer/config.toml`.
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub columns: ColumnsConfig,
    pub export: ExportConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Dataset shown when nothing has been uploaded.
    pub default_path: PathBuf,
}

/// Which columns drive which feature. Names not present in a loaded dataset
/// are skipped silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub search: Vec<String>,
    pub categorical: Vec<String>,
    pub chartable: Vec<String>,
    pub default_charts: Vec<String>,
    pub free_text: Vec<String>,
    pub boolean_text: Vec<String>,
    pub timestamp: Vec<String>,
    pub distinct_metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name of the export without extension.
    pub file_stem: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_title: String,
    pub table_row_height: f32,
    pub table_max_height: f32,
    pub chart_height: f32,
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from("data/3I_ATLAS_satellites_with_NORAD.csv"),
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            search: strings(&["Name", "Operator", "Notes"]),
            categorical: strings(&[
                "Mission_Type",
                "Operator",
                "Current_Location",
                "Earth_TLE_Available",
                "3I_ATLAS_View_Utility",
            ]),
            chartable: strings(&[
                "Mission_Type",
                "Operator",
                "Current_Location",
                "3I_ATLAS_View_Utility",
            ]),
            default_charts: strings(&["Mission_Type", "3I_ATLAS_View_Utility"]),
            free_text: strings(&["Name", "Operator", "Notes"]),
            boolean_text: strings(&["Earth_TLE_Available"]),
            timestamp: strings(&["Launch_Date_UTC"]),
            distinct_metrics: strings(&["Mission_Type", "Operator"]),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_stem: "3I_ATLAS_satellites_filtered".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "3I/ATLAS – Satellite Observer Set".to_string(),
            table_row_height: 20.0,
            table_max_height: 320.0,
            chart_height: 220.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Path of the user config file, if the platform has a config directory.
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load the user config file. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match Self::default_location() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("no config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.export.file_stem.trim().is_empty() {
            bail!("export.file_stem must not be empty");
        }
        for (name, value) in [
            ("ui.table_row_height", self.ui.table_row_height),
            ("ui.table_max_height", self.ui.table_max_height),
            ("ui.chart_height", self.ui.chart_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{name} must be positive, got {value}");
            }
        }
        Ok(())
    }

    pub fn normalize_rules(&self) -> NormalizeRules {
        NormalizeRules {
            timestamp_columns: self.columns.timestamp.clone(),
            boolean_text_columns: self.columns.boolean_text.clone(),
            free_text_columns: self.columns.free_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_named_fields_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[data]
default_path = "/srv/observers.csv"

[columns]
search = ["Name"]
"#,
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.data.default_path, PathBuf::from("/srv/observers.csv"));
        assert_eq!(config.columns.search, vec!["Name".to_string()]);
        assert_eq!(config.columns.categorical, ColumnsConfig::default().categorical);
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[data\ndefault_path = 3").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.export.file_stem = "  ".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ui.chart_height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
