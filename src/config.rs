//! Planner configuration.
//!
//! Load tuning knobs from TOML so a deployment can change strategy,
//! weights, and suggestion limits without code changes.
//!
//! ```
//! use u_placement::config::PlannerConfig;
//! use u_placement::placement::Strategy;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     strategy = "academic_focus"
//!     max_suggestions = 3
//!
//!     [weights]
//!     academic = 2.0
//! "#).unwrap();
//!
//! assert_eq!(config.strategy, Strategy::AcademicFocus);
//! assert_eq!(config.weights.academic, 2.0);
//! assert_eq!(config.weights.gender, 1.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balance::BalanceWeights;
use crate::placement::{
    PlacementEngine, Strategy, DEFAULT_EMPHASIS_MULTIPLIER, DEFAULT_SIZE_TOLERANCE,
};
use crate::suggestions::SuggestionGenerator;
use crate::validation::validate_weights;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Planner-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PlannerConfig {
    /// Strategy used when a request does not name one.
    pub strategy: Strategy,

    pub weights: BalanceWeights,

    /// Seats above the even split before a class counts as full.
    pub size_tolerance: usize,

    /// Weight multiplier for factors named by `balanced_distribution`.
    pub emphasis_multiplier: f64,

    pub max_suggestions: usize,

    /// Largest size gap between two classes still worth a swap.
    pub suggestion_max_size_gap: usize,

    /// Minimum mean-level gap that triggers a level swap.
    pub level_gap_threshold: f64,

    /// Minimum special-needs count gap that triggers a move.
    pub special_needs_gap: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Balanced,
            weights: BalanceWeights::default(),
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            emphasis_multiplier: DEFAULT_EMPHASIS_MULTIPLIER,
            max_suggestions: 5,
            suggestion_max_size_gap: 3,
            level_gap_threshold: 0.5,
            special_needs_gap: 2,
        }
    }
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_weights(mut self, weights: BalanceWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_size_tolerance(mut self, tolerance: usize) -> Self {
        self.size_tolerance = tolerance;
        self
    }

    pub fn with_emphasis_multiplier(mut self, multiplier: f64) -> Self {
        self.emphasis_multiplier = multiplier;
        self
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn with_suggestion_max_size_gap(mut self, gap: usize) -> Self {
        self.suggestion_max_size_gap = gap;
        self
    }

    pub fn with_level_gap_threshold(mut self, gap: f64) -> Self {
        self.level_gap_threshold = gap;
        self
    }

    pub fn with_special_needs_gap(mut self, gap: usize) -> Self {
        self.special_needs_gap = gap;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(errors) = validate_weights(&self.weights) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(ConfigError::Invalid(messages.join("; ")));
        }
        if self.max_suggestions == 0 {
            return Err(ConfigError::Invalid(
                "max_suggestions must be at least 1".into(),
            ));
        }
        if !self.emphasis_multiplier.is_finite() || self.emphasis_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "emphasis_multiplier must be >= 1, got {}",
                self.emphasis_multiplier
            )));
        }
        if !self.level_gap_threshold.is_finite() || self.level_gap_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "level_gap_threshold must be >= 0, got {}",
                self.level_gap_threshold
            )));
        }
        Ok(())
    }

    /// Builds a placement engine with these settings.
    pub fn engine(&self) -> PlacementEngine {
        PlacementEngine::new()
            .with_strategy(self.strategy)
            .with_weights(self.weights)
            .with_size_tolerance(self.size_tolerance)
            .with_emphasis_multiplier(self.emphasis_multiplier)
    }

    /// Builds a suggestion generator with these settings.
    pub fn suggestion_generator(&self) -> SuggestionGenerator {
        SuggestionGenerator::new()
            .with_max_suggestions(self.max_suggestions)
            .with_max_size_gap(self.suggestion_max_size_gap)
            .with_level_gap(self.level_gap_threshold)
            .with_special_needs_gap(self.special_needs_gap)
            .with_weights(self.weights)
    }
}
