use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use watcher_core::{ModelPricing, PriceTable};
use watcher_engine::{BackendSettings, EngineConfig, DEFAULT_RATE_URL};
use watcher_logging::{watch_info, watch_warn};

pub const DEFAULT_SETTINGS_FILE: &str = "./watcher_settings.ron";

/// Price of one model, per million tokens in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub id: String,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    /// Overrides the service default when set.
    pub default_min_days: Option<u32>,
    /// Starting exchange rate before a live quote arrives.
    pub usd_brl: Option<f64>,
    pub rate_url: String,
    pub models: Vec<ModelPrice>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: BackendSettings::default().base_url,
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            default_min_days: None,
            usd_brl: None,
            rate_url: DEFAULT_RATE_URL.to_string(),
            models: vec![
                ModelPrice {
                    id: "sonar".to_string(),
                    input_per_million: 1.0,
                    output_per_million: 1.0,
                },
                ModelPrice {
                    id: "sonar-pro".to_string(),
                    input_per_million: 3.0,
                    output_per_million: 15.0,
                },
            ],
        }
    }
}

impl Settings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            backend: BackendSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
                request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            },
            rate_url: self.rate_url.clone(),
        }
    }

    pub fn price_table(&self) -> PriceTable {
        PriceTable::new(
            self.models
                .iter()
                .map(|model| {
                    (
                        model.id.clone(),
                        ModelPricing::new(model.input_per_million, model.output_per_million),
                    )
                })
                .collect(),
        )
    }
}

/// Reads settings from `path`. A missing file yields defaults silently; an
/// unreadable or malformed one yields defaults with a warning.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Settings::default();
        }
        Err(err) => {
            watch_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            watch_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            watch_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("absent.ron"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_omitted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watcher_settings.ron");
        fs::write(
            &path,
            r#"(
                base_url: "http://collector.local:9000",
                default_min_days: Some(45),
                models: [(id: "big", input_per_million: 5.0, output_per_million: 25.0)],
            )"#,
        )
        .unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.base_url, "http://collector.local:9000");
        assert_eq!(settings.default_min_days, Some(45));
        assert_eq!(settings.connect_timeout_secs, 10);
        assert_eq!(settings.rate_url, DEFAULT_RATE_URL);

        let table = settings.price_table();
        assert_eq!(table.pricing_for("big"), ModelPricing::new(5.0, 25.0));
        assert_eq!(table.pricing_for("unknown"), ModelPricing::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(base_url: 12").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn engine_config_carries_timeouts() {
        let settings = Settings {
            request_timeout_secs: Some(90),
            ..Settings::default()
        };
        let config = settings.engine_config();
        assert_eq!(config.backend.request_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.backend.connect_timeout, Duration::from_secs(10));
    }
}
