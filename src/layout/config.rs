//! Configuration for the layout engine

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors loading a layout configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for sizing, placement and repair
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Multiplier on plot area allowed for the sum of element areas
    pub area_slack: f64,

    /// Width / height ratio used to turn a target area into a rectangle
    pub aspect_ratio: f64,

    /// Dimensions are rounded to multiples of this step
    pub grid: f64,

    /// Repair never shrinks a dimension below this
    pub min_dimension: f64,

    /// Fraction removed from a dimension per shrink
    pub shrink_step: f64,

    /// Maximum number of repair rounds
    pub repair_rounds: usize,

    /// How far the entrance's adjacency zone extends beyond its rectangle
    pub privacy_buffer: f64,

    /// Keep bedrooms off living areas and kitchens, and join kitchens to a
    /// living area when one is placed
    pub room_adjacency: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            area_slack: 1.0,
            aspect_ratio: 1.2,
            grid: 1.0,
            min_dimension: 4.0,
            shrink_step: 0.1,
            repair_rounds: 3,
            privacy_buffer: 0.0,
            room_adjacency: true,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("area_slack", self.area_slack),
            ("aspect_ratio", self.aspect_ratio),
            ("grid", self.grid),
            ("min_dimension", self.min_dimension),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }
        if !(self.shrink_step > 0.0 && self.shrink_step < 1.0) {
            return Err(ConfigError::Invalid {
                field: "shrink_step",
                reason: format!("must be between 0 and 1, got {}", self.shrink_step),
            });
        }
        if !(self.privacy_buffer.is_finite() && self.privacy_buffer >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "privacy_buffer",
                reason: format!("must not be negative, got {}", self.privacy_buffer),
            });
        }
        Ok(())
    }

    /// Set the area slack factor
    pub fn with_area_slack(mut self, slack: f64) -> Self {
        self.area_slack = slack;
        self
    }

    /// Set the aspect ratio used for area-only elements
    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Set the grid step
    pub fn with_grid(mut self, grid: f64) -> Self {
        self.grid = grid;
        self
    }

    /// Set the smallest dimension repair may shrink to
    pub fn with_min_dimension(mut self, min: f64) -> Self {
        self.min_dimension = min;
        self
    }

    /// Set the shrink fraction per repair step
    pub fn with_shrink_step(mut self, step: f64) -> Self {
        self.shrink_step = step;
        self
    }

    /// Set the number of repair rounds
    pub fn with_repair_rounds(mut self, rounds: usize) -> Self {
        self.repair_rounds = rounds;
        self
    }

    /// Set the entrance adjacency buffer
    pub fn with_privacy_buffer(mut self, buffer: f64) -> Self {
        self.privacy_buffer = buffer;
        self
    }

    /// Enable or disable the room adjacency rules
    pub fn with_room_adjacency(mut self, enabled: bool) -> Self {
        self.room_adjacency = enabled;
        self
    }

    /// Round a length to the grid, never below one grid step
    pub fn snap(&self, value: f64) -> f64 {
        ((value / self.grid).round() * self.grid).max(self.grid)
    }

    /// Round a length down to the grid
    pub fn snap_down(&self, value: f64) -> f64 {
        // the small bias keeps 4.999999 from flooring to 4
        ((value / self.grid + 1e-9).floor() * self.grid).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.area_slack, 1.0);
        assert_eq!(config.aspect_ratio, 1.2);
        assert_eq!(config.grid, 1.0);
        assert_eq!(config.min_dimension, 4.0);
        assert_eq!(config.shrink_step, 0.1);
        assert_eq!(config.repair_rounds, 3);
        assert_eq!(config.privacy_buffer, 0.0);
        assert!(config.room_adjacency);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_repair_rounds(5)
            .with_min_dimension(3.0);

        assert_eq!(config.repair_rounds, 5);
        assert_eq!(config.min_dimension, 3.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LayoutConfig::from_toml_str("repair_rounds = 1\ngrid = 0.5\n").unwrap();
        assert_eq!(config.repair_rounds, 1);
        assert_eq!(config.grid, 0.5);
        assert_eq!(config.aspect_ratio, 1.2);
    }

    #[test]
    fn test_room_adjacency_from_toml() {
        let config = LayoutConfig::from_toml_str("room_adjacency = false\n").unwrap();
        assert!(!config.room_adjacency);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            LayoutConfig::from_toml_str("spacing = 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_value_rejected() {
        assert!(matches!(
            LayoutConfig::from_toml_str("shrink_step = 1.5\n"),
            Err(ConfigError::Invalid {
                field: "shrink_step",
                ..
            })
        ));
    }

    #[test]
    fn test_snap() {
        let config = LayoutConfig::default();
        assert_eq!(config.snap(10.95), 11.0);
        assert_eq!(config.snap(0.2), 1.0);
        assert_eq!(config.snap_down(4.5), 4.0);
        assert_eq!(config.snap_down(4.9999999999), 5.0);
    }
}
