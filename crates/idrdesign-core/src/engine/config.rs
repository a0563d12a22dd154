use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PRECISION: f64 = 1e-4;
pub const DEFAULT_GOOD_QUOTA: usize = 2;
pub const DEFAULT_MARGINAL_QUOTA: usize = 14;
pub const DEFAULT_MAX_START_ATTEMPTS: usize = 1000;
/// Upper bound on `good_quota + marginal_quota`. A multi-point round proposes
/// `2^(retained moves)` candidates.
pub const MAX_RETAINED_MOVES: usize = 20;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyConfig {
    /// Every single-residue substitution, every round.
    Exhaustive,
    /// Randomly sampled substitutions combined into a power set of multi-point
    /// candidates.
    RandomMultiPoint {
        good_quota: usize,
        marginal_quota: usize,
    },
}

impl StrategyConfig {
    pub fn random_multi_point() -> Self {
        Self::RandomMultiPoint {
            good_quota: DEFAULT_GOOD_QUOTA,
            marginal_quota: DEFAULT_MARGINAL_QUOTA,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::RandomMultiPoint { .. } => "multipoint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedConfig {
    pub seed: Option<u64>,
    /// Mix the target sequence into the seed, so one seed gives independent
    /// streams for different targets.
    pub bind_to_target: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed: None,
            bind_to_target: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceConfig {
    pub precision: f64,
    pub max_iterations: usize,
    pub time_budget: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignConfig {
    pub strategy: StrategyConfig,
    pub convergence: ConvergenceConfig,
    pub seed: SeedConfig,
    pub max_start_attempts: usize,
}

#[derive(Default)]
pub struct DesignConfigBuilder {
    strategy: Option<StrategyConfig>,
    precision: Option<f64>,
    max_iterations: Option<usize>,
    time_budget: Option<Duration>,
    seed: Option<u64>,
    bind_seed_to_target: Option<bool>,
    max_start_attempts: Option<usize>,
}

impl DesignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn precision(mut self, precision: f64) -> Self {
        self.precision = Some(precision);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn bind_seed_to_target(mut self, bind: bool) -> Self {
        self.bind_seed_to_target = Some(bind);
        self
    }
    pub fn max_start_attempts(mut self, attempts: usize) -> Self {
        self.max_start_attempts = Some(attempts);
        self
    }

    pub fn build(self) -> Result<DesignConfig, ConfigError> {
        let strategy = self
            .strategy
            .ok_or(ConfigError::MissingParameter("strategy"))?;
        if let StrategyConfig::RandomMultiPoint {
            good_quota,
            marginal_quota,
        } = strategy
        {
            if good_quota == 0 {
                return Err(ConfigError::InvalidParameter {
                    name: "good_quota",
                    reason: "must be at least 1".to_string(),
                });
            }
            if good_quota.saturating_add(marginal_quota) > MAX_RETAINED_MOVES {
                return Err(ConfigError::InvalidParameter {
                    name: "marginal_quota",
                    reason: format!(
                        "good and marginal quotas together must not exceed {MAX_RETAINED_MOVES}, got {good_quota} + {marginal_quota}"
                    ),
                });
            }
        }

        let precision = self
            .precision
            .ok_or(ConfigError::MissingParameter("precision"))?;
        if !precision.is_finite() || precision < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "precision",
                reason: format!("must be finite and non-negative, got {precision}"),
            });
        }

        let max_start_attempts = self.max_start_attempts.unwrap_or(DEFAULT_MAX_START_ATTEMPTS);
        if max_start_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_start_attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(DesignConfig {
            strategy,
            convergence: ConvergenceConfig {
                precision,
                max_iterations: self
                    .max_iterations
                    .ok_or(ConfigError::MissingParameter("max_iterations"))?,
                time_budget: self.time_budget,
            },
            seed: SeedConfig {
                seed: self.seed,
                bind_to_target: self.bind_seed_to_target.unwrap_or(true),
            },
            max_start_attempts,
        })
    }
}
