use super::config::DesignConfig;
use super::progress::ProgressReporter;
use crate::core::distance::DistanceCalculator;
use crate::core::features::FeatureRegistry;

/// Read-only collaborators shared by every search of a design run.
#[derive(Clone, Copy)]
pub struct DesignContext<'a> {
    pub registry: &'a FeatureRegistry,
    pub distance: &'a DistanceCalculator,
    pub reporter: &'a ProgressReporter<'a>,
    pub config: &'a DesignConfig,
}

impl<'a> DesignContext<'a> {
    pub fn new(
        registry: &'a FeatureRegistry,
        distance: &'a DistanceCalculator,
        reporter: &'a ProgressReporter<'a>,
        config: &'a DesignConfig,
    ) -> Self {
        Self {
            registry,
            distance,
            reporter,
            config,
        }
    }
}
