//! Server configuration loaded from TOML.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::core::{ProjectionAssumptions, ProjectionFieldNames};
use crate::error::InputError;

const PROJECTION_KEYS: ProjectionFieldNames = ProjectionFieldNames {
    years: "projection.years",
    rent_growth: "projection.rent_growth_pct",
    expense_inflation: "projection.expense_inflation_pct",
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: InputError,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub projection: ProjectionConfig,
}

/// Defaults applied to API requests that omit projection fields.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub years: u32,
    pub rent_growth_pct: f64,
    pub expense_inflation_pct: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            projection: ProjectionConfig::default(),
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let defaults = ProjectionAssumptions::default();
        Self {
            years: defaults.years,
            rent_growth_pct: defaults.rent_growth_pct,
            expense_inflation_pct: defaults.expense_inflation_pct,
        }
    }
}

impl From<ProjectionConfig> for ProjectionAssumptions {
    fn from(value: ProjectionConfig) -> Self {
        Self {
            years: value.years,
            rent_growth_pct: value.rent_growth_pct,
            expense_inflation_pct: value.expense_inflation_pct,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate().map_err(|source| ConfigError::Invalid {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// Parses only; `from_file` also runs `validate`.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Projection defaults get the same range checks as per-request values.
    pub fn validate(&self) -> Result<(), InputError> {
        ProjectionAssumptions::from(self.projection).validate(&PROJECTION_KEYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = AppConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.projection.years, 10);
        assert_eq!(config.projection.rent_growth_pct, 3.0);
        assert_eq!(config.projection.expense_inflation_pct, 2.0);
    }

    #[test]
    fn partial_projection_table_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            port = 9000

            [projection]
            years = 25
            "#,
        )
        .expect("valid config");
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");

        let assumptions = ProjectionAssumptions::from(config.projection);
        assert_eq!(assumptions.years, 25);
        assert_eq!(assumptions.rent_growth_pct, 3.0);
        assert_eq!(assumptions.expense_inflation_pct, 2.0);
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        assert!(AppConfig::from_toml_str("port = \"eighty\"").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::from_file("does/not/exist.toml").expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.toml"));
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_projection_years_fail_validation() {
        let config = AppConfig::from_toml_str("[projection]\nyears = 0\n").expect("parses");
        let err = config.validate().expect_err("zero years");
        assert_eq!(err.to_string(), "projection.years must be between 1 and 50");
    }

    #[test]
    fn total_rent_collapse_fails_validation() {
        let config = AppConfig::from_toml_str("[projection]\nrent_growth_pct = -100.0\n")
            .expect("parses");
        assert_eq!(
            config.validate(),
            Err(InputError::RateBelowFloor {
                field: "projection.rent_growth_pct"
            })
        );
    }

    #[test]
    fn from_file_rejects_out_of_range_projection() {
        let path = std::env::temp_dir().join(format!(
            "rental-yield-invalid-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[projection]\nyears = 51\n").expect("write temp config");

        let result = AppConfig::from_file(&path);
        let _ = std::fs::remove_file(&path);

        let err = result.expect_err("51 years is out of range");
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("projection.years"));
    }
}
