//! Config command implementation

use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput, ConfigRow};
use anyhow::Result;
use geoaudit_core::config::DEFAULT_CONFIG_FILE;
use std::path::Path;

pub fn execute(output: &OutputWriter, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let values = config.to_inspection_map();

    let config_file = match config_path {
        Some(path) => Some(path.display().to_string()),
        None => Path::new(DEFAULT_CONFIG_FILE).exists().then(|| DEFAULT_CONFIG_FILE.to_string()),
    };

    if output.is_json() {
        return output.result(ConfigOutput {
            config_file,
            values: values
                .into_iter()
                .map(|(key, (value, source))| (key, ConfigEntry { value, source }))
                .collect(),
        });
    }

    output.section("Configuration");
    output.kv("Config file", config_file.as_deref().unwrap_or("(none)"));
    output.table(
        values
            .into_iter()
            .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
            .collect(),
    );
    Ok(())
}
