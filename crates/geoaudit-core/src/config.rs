use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "geoaudit.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for an audit run
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub snap_tolerance: ConfigValue<f64>,
    pub min_overlap_area: ConfigValue<f64>,
    pub min_segment_length: ConfigValue<f64>,
    pub duplicate_tolerance: ConfigValue<f64>,
    pub error_field: ConfigValue<String>,
    pub apply_style: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            snap_tolerance: ConfigValue::new(0.001, ConfigSource::Default),
            min_overlap_area: ConfigValue::new(0.0001, ConfigSource::Default),
            min_segment_length: ConfigValue::new(0.01, ConfigSource::Default),
            duplicate_tolerance: ConfigValue::new(0.000001, ConfigSource::Default),
            error_field: ConfigValue::new("ERR_TYPE".to_string(), ConfigSource::Default),
            apply_style: ConfigValue::new(true, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| AuditError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| AuditError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(v) = file_config.snap_tolerance {
            self.snap_tolerance.update(parse_tolerance("snap_tolerance", v)?, ConfigSource::File);
        }
        if let Some(v) = file_config.min_overlap_area {
            self.min_overlap_area
                .update(parse_tolerance("min_overlap_area", v)?, ConfigSource::File);
        }
        if let Some(v) = file_config.min_segment_length {
            self.min_segment_length
                .update(parse_tolerance("min_segment_length", v)?, ConfigSource::File);
        }
        if let Some(v) = file_config.duplicate_tolerance {
            self.duplicate_tolerance
                .update(parse_tolerance("duplicate_tolerance", v)?, ConfigSource::File);
        }
        if let Some(field) = file_config.error_field {
            self.error_field.update(parse_field_name(&field)?, ConfigSource::File);
        }
        if let Some(apply_style) = file_config.apply_style {
            self.apply_style.update(apply_style, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load the file layer only if the file exists
    pub fn load_from_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        if path.as_ref().exists() {
            self.load_from_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let tolerances: [(&str, &str, &mut ConfigValue<f64>); 4] = [
            ("GEOAUDIT_SNAP_TOLERANCE", "snap_tolerance", &mut self.snap_tolerance),
            ("GEOAUDIT_MIN_OVERLAP_AREA", "min_overlap_area", &mut self.min_overlap_area),
            ("GEOAUDIT_MIN_SEGMENT_LENGTH", "min_segment_length", &mut self.min_segment_length),
            ("GEOAUDIT_DUPLICATE_TOLERANCE", "duplicate_tolerance", &mut self.duplicate_tolerance),
        ];
        for (var, key, slot) in tolerances {
            if let Ok(raw) = env::var(var) {
                match raw.parse::<f64>().map_err(|e| e.to_string()).and_then(|v| {
                    parse_tolerance(key, v).map_err(|e| e.to_string())
                }) {
                    Ok(v) => slot.update(v, ConfigSource::Environment),
                    Err(_) => tracing::warn!(
                        "Invalid {} value '{}': expected a non-negative number",
                        var,
                        raw
                    ),
                }
            }
        }

        // GEOAUDIT_ERROR_FIELD
        if let Ok(field) = env::var("GEOAUDIT_ERROR_FIELD") {
            match parse_field_name(&field) {
                Ok(field) => self.error_field.update(field, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOAUDIT_ERROR_FIELD value '{}': expected 1-10 ASCII characters",
                    field
                ),
            }
        }

        // GEOAUDIT_APPLY_STYLE
        if let Ok(raw) = env::var("GEOAUDIT_APPLY_STYLE") {
            match parse_bool(&raw) {
                Some(v) => self.apply_style.update(v, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOAUDIT_APPLY_STYLE value '{}': expected true or false",
                    raw
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) -> Result<()> {
        if let Some(v) = overrides.snap_tolerance {
            self.snap_tolerance.update(parse_tolerance("snap_tolerance", v)?, ConfigSource::Cli);
        }
        if let Some(v) = overrides.min_overlap_area {
            self.min_overlap_area
                .update(parse_tolerance("min_overlap_area", v)?, ConfigSource::Cli);
        }
        if let Some(v) = overrides.min_segment_length {
            self.min_segment_length
                .update(parse_tolerance("min_segment_length", v)?, ConfigSource::Cli);
        }
        if let Some(v) = overrides.duplicate_tolerance {
            self.duplicate_tolerance
                .update(parse_tolerance("duplicate_tolerance", v)?, ConfigSource::Cli);
        }
        if let Some(field) = overrides.error_field {
            self.error_field.update(parse_field_name(&field)?, ConfigSource::Cli);
        }
        if let Some(apply_style) = overrides.apply_style {
            self.apply_style.update(apply_style, ConfigSource::Cli);
        }
        Ok(())
    }

    /// Resolved values for the pipeline
    pub fn settings(&self) -> AuditSettings {
        AuditSettings {
            snap_tolerance: self.snap_tolerance.value,
            min_overlap_area: self.min_overlap_area.value,
            min_segment_length: self.min_segment_length.value,
            duplicate_tolerance: self.duplicate_tolerance.value,
            error_field: self.error_field.value.clone(),
            apply_style: self.apply_style.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "snap_tolerance".to_string(),
            (self.snap_tolerance.value.to_string(), self.snap_tolerance.source),
        );
        map.insert(
            "min_overlap_area".to_string(),
            (self.min_overlap_area.value.to_string(), self.min_overlap_area.source),
        );
        map.insert(
            "min_segment_length".to_string(),
            (self.min_segment_length.value.to_string(), self.min_segment_length.source),
        );
        map.insert(
            "duplicate_tolerance".to_string(),
            (self.duplicate_tolerance.value.to_string(), self.duplicate_tolerance.source),
        );
        map.insert(
            "error_field".to_string(),
            (self.error_field.value.clone(), self.error_field.source),
        );
        map.insert(
            "apply_style".to_string(),
            (self.apply_style.value.to_string(), self.apply_style.source),
        );

        map
    }
}

/// Plain configuration values consumed by the auditor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSettings {
    pub snap_tolerance: f64,
    pub min_overlap_area: f64,
    pub min_segment_length: f64,
    pub duplicate_tolerance: f64,
    pub error_field: String,
    pub apply_style: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        LayeredConfig::with_defaults().settings()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    snap_tolerance: Option<f64>,
    min_overlap_area: Option<f64>,
    min_segment_length: Option<f64>,
    duplicate_tolerance: Option<f64>,
    error_field: Option<String>,
    apply_style: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub snap_tolerance: Option<f64>,
    pub min_overlap_area: Option<f64>,
    pub min_segment_length: Option<f64>,
    pub duplicate_tolerance: Option<f64>,
    pub error_field: Option<String>,
    pub apply_style: Option<bool>,
}

/// Check a tolerance or threshold value
pub fn parse_tolerance(key: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AuditError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("{} must be a finite, non-negative number", value),
        });
    }
    Ok(value)
}

/// Check the tag column name against the dBase field name limits
pub fn parse_field_name(s: &str) -> Result<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.len() > 10 || !trimmed.is_ascii() {
        return Err(AuditError::ConfigInvalid {
            key: "error_field".to_string(),
            reason: format!("Invalid field name: '{}'. Use 1-10 ASCII characters", s),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.snap_tolerance.value, 0.001);
        assert_eq!(config.min_overlap_area.value, 0.0001);
        assert_eq!(config.min_segment_length.value, 0.01);
        assert_eq!(config.error_field.value, "ERR_TYPE");
        assert_eq!(config.snap_tolerance.source, ConfigSource::Default);
    }

    #[test]
    fn test_precedence() {
        let mut value = ConfigValue::new(1.0, ConfigSource::Environment);
        value.update(2.0, ConfigSource::File);
        assert_eq!(value.value, 1.0);
        value.update(3.0, ConfigSource::Cli);
        assert_eq!(value.value, 3.0);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_file_layer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "snap_tolerance = 0.05\nerror_field = \"ERRKIND\"").unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
        assert_eq!(config.snap_tolerance.value, 0.05);
        assert_eq!(config.snap_tolerance.source, ConfigSource::File);
        assert_eq!(config.error_field.value, "ERRKIND");
        assert_eq!(config.min_overlap_area.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_rejects_negative_tolerance() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "snap_tolerance = -1.0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(AuditError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();
        config
            .update_from_cli(CliConfigOverrides {
                min_overlap_area: Some(0.5),
                apply_style: Some(false),
                ..Default::default()
            })
            .unwrap();

        let settings = config.settings();
        assert_eq!(settings.min_overlap_area, 0.5);
        assert!(!settings.apply_style);
        assert_eq!(settings.snap_tolerance, 0.001);
    }

    #[test]
    fn test_parse_field_name() {
        assert_eq!(parse_field_name(" ERR ").unwrap(), "ERR");
        assert!(parse_field_name("").is_err());
        assert!(parse_field_name("ERROR_TYPE_X").is_err());
        assert!(parse_field_name("오류종류").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();
        assert_eq!(map.len(), 6);
        assert_eq!(map["error_field"].0, "ERR_TYPE");
    }
}
