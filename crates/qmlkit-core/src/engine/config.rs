use super::error::EngineError;
use super::kernels::{KernelMode, KernelParams};
use crate::core::representations::RepresentationConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Everything needed to train a kernel ridge regression model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegressionConfig {
    pub representation: RepresentationConfig,
    pub kernel: KernelParams,
    pub lambdas: Vec<f64>,
}

impl RegressionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Checks every parameter and that the kernel mode fits the
    /// representation kind. ARAD atoms are only comparable in ARAD mode,
    /// and ARAD mode needs ARAD atoms.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.representation.validate()?;
        self.kernel.validate()?;
        if self.representation.kind() != self.kernel.mode.representation_kind() {
            return Err(EngineError::invalid(
                "kernel.mode",
                format!(
                    "{:?} mode cannot be used with the {} representation",
                    self.kernel.mode,
                    self.representation.name()
                ),
            ));
        }
        let arad_representation = matches!(self.representation, RepresentationConfig::Arad(_));
        let arad_mode = matches!(self.kernel.mode, KernelMode::Arad(_));
        if arad_representation != arad_mode {
            return Err(EngineError::invalid(
                "kernel.mode",
                "the arad representation and the arad kernel mode must be used together",
            ));
        }
        if self.lambdas.is_empty() {
            return Err(EngineError::invalid("lambdas", "at least one value is required"));
        }
        if let Some(bad) = self.lambdas.iter().find(|l| !(l.is_finite() && **l >= 0.0)) {
            return Err(EngineError::invalid(
                "lambdas",
                format!("values must be finite and non-negative, got {bad}"),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RegressionConfigBuilder {
    representation: Option<RepresentationConfig>,
    kernel: Option<KernelParams>,
    lambdas: Option<Vec<f64>>,
}

impl RegressionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn representation(mut self, representation: RepresentationConfig) -> Self {
        self.representation = Some(representation);
        self
    }
    pub fn kernel(mut self, kernel: KernelParams) -> Self {
        self.kernel = Some(kernel);
        self
    }
    pub fn lambdas(mut self, lambdas: Vec<f64>) -> Self {
        self.lambdas = Some(lambdas);
        self
    }
    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambdas.get_or_insert_with(Vec::new).push(lambda);
        self
    }

    pub fn build(self) -> Result<RegressionConfig, ConfigError> {
        Ok(RegressionConfig {
            representation: self
                .representation
                .ok_or(ConfigError::MissingParameter("representation"))?,
            kernel: self
                .kernel
                .ok_or(ConfigError::MissingParameter("kernel"))?,
            lambdas: self
                .lambdas
                .ok_or(ConfigError::MissingParameter("lambdas"))?,
        })
    }
}
