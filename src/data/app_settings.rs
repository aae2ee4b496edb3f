use crate::data::Persistable;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Increment applied by Up/Down on the distance field.
    pub distance_step: f64,
    /// How long the event loop waits for input before redrawing.
    pub poll_interval_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            distance_step: 0.1,
            poll_interval_ms: 16,
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
}

impl AppSettings {
    pub fn load() -> Result<Self> {
        Ok(SettingsWrapper::load()?.settings.sanitized())
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(SettingsWrapper::load_from(dir)?.settings.sanitized())
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let wrapper = SettingsWrapper {
            settings: self.clone(),
        };
        wrapper.save_to(dir)
    }

    /// Replaces values the form cannot work with by their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = AppSettings::default();
        if !self.distance_step.is_finite() || self.distance_step <= 0.0 {
            warn!(
                "distance_step {} is not a positive number, using {}",
                self.distance_step, defaults.distance_step
            );
            self.distance_step = defaults.distance_step;
        }
        if self.poll_interval_ms == 0 {
            warn!("poll_interval_ms must be > 0, using {}", defaults.poll_interval_ms);
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        self
    }
}
