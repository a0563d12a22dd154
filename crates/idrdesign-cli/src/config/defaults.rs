use idrdesign::engine::config::{
    DEFAULT_GOOD_QUOTA, DEFAULT_MARGINAL_QUOTA, DEFAULT_MAX_START_ATTEMPTS, DEFAULT_PRECISION,
};

pub struct DefaultsConfig {
    pub strategy: String,
    pub precision: f64,
    pub max_iterations: usize,
    pub time_budget_secs: Option<f64>,
    pub max_start_attempts: usize,
    pub good_quota: usize,
    pub marginal_quota: usize,
    pub bind_seed_to_target: bool,
    pub random_starts: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            strategy: "multipoint".to_string(),
            precision: DEFAULT_PRECISION,
            max_iterations: 10_000,
            time_budget_secs: None,
            max_start_attempts: DEFAULT_MAX_START_ATTEMPTS,
            good_quota: DEFAULT_GOOD_QUOTA,
            marginal_quota: DEFAULT_MARGINAL_QUOTA,
            bind_seed_to_target: true,
            random_starts: 1,
        }
    }
}
