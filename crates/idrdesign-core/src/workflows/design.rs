use crate::core::alphabet::ALPHABET;
use crate::core::distance::{DistanceCalculator, ReferenceVariance};
use crate::core::features::FeatureRegistry;
use crate::core::sequence::Sequence;
use crate::engine::config::DesignConfig;
use crate::engine::context::DesignContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::rng::{SearchRng, SeedScope};
use crate::engine::scoring::Scorer;
use crate::engine::search::run_search;
use crate::engine::state::DesignOutcome;
use crate::engine::strategy::build_strategy;
use rand::Rng;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where the searches of a design run begin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartSpec {
    /// A single search from this sequence.
    Sequence(Sequence),
    /// This many searches from random sequences of the target's length.
    Random(usize),
}

/// Designs sequences whose features approach those of `target`, one search
/// per start. Outcomes are returned in start order.
#[instrument(skip_all, name = "design_workflow", fields(target = %target))]
pub fn run(
    target: &Sequence,
    start: &StartSpec,
    context: &DesignContext<'_>,
) -> Result<Vec<DesignOutcome>, EngineError> {
    let config = context.config;
    let target_features = context
        .registry
        .evaluate_all(target)
        .map_err(|e| EngineError::from_feature(e, target.as_str()))?;
    let seeds = SeedScope::new(&config.seed, target);
    info!(
        seed = seeds.seed(),
        strategy = config.strategy.name(),
        features = context.registry.len(),
        "Design run started"
    );

    let starts = match start {
        StartSpec::Sequence(sequence) => vec![sequence.clone()],
        StartSpec::Random(count) => {
            let starts = random_starts(
                context.registry,
                target.len(),
                *count,
                config.max_start_attempts,
                &mut seeds.start_stream(),
            )?;
            context.reporter.report(Progress::Message(format!(
                "Generated {} random start sequence(s).",
                starts.len()
            )));
            starts
        }
    };

    let strategy = build_strategy(&config.strategy, config.convergence.precision);
    let scorer = Scorer::new(context.registry, context.distance, &target_features);
    let total = starts.len();

    #[cfg(not(feature = "parallel"))]
    let iterator = starts.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = starts.par_iter().enumerate();

    let outcomes = iterator
        .map(|(i, start)| {
            let mut rng = seeds.search_stream(i);
            run_search(i, total, start, &scorer, strategy.as_ref(), context, &mut rng)
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    info!(searches = outcomes.len(), "Design run complete");
    Ok(outcomes)
}

/// Builds the distance metric from `reference` and runs [`run`].
pub fn design(
    target: &Sequence,
    start: &StartSpec,
    registry: &FeatureRegistry,
    reference: &ReferenceVariance,
    config: &DesignConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<DesignOutcome>, EngineError> {
    let distance = DistanceCalculator::new(registry, reference)?;
    let context = DesignContext::new(registry, &distance, reporter, config);
    run(target, start, &context)
}

/// Uniform random sequences of `length`, each redrawn until every feature is
/// defined for it.
fn random_starts(
    registry: &FeatureRegistry,
    length: usize,
    count: usize,
    max_attempts: usize,
    rng: &mut SearchRng,
) -> Result<Vec<Sequence>, EngineError> {
    let mut starts = Vec::with_capacity(count);
    for _ in 0..count {
        let mut accepted = None;
        for attempt in 1..=max_attempts {
            let candidate = Sequence::from_residues(
                (0..length)
                    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                    .collect(),
            );
            let values = registry.evaluate_all_skip_failures(&candidate)?;
            if values.iter().all(Option::is_some) {
                debug!(attempt, start = %candidate, "Accepted random start");
                accepted = Some(candidate);
                break;
            }
        }
        let start = accepted.ok_or_else(|| {
            EngineError::Initialization(format!(
                "no random sequence of length {length} had every feature defined after {max_attempts} attempts"
            ))
        })?;
        starts.push(start);
    }
    Ok(starts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::composition::{Pattern, PatternScore};
    use crate::core::features::feature_fn;
    use crate::engine::config::{DesignConfigBuilder, StrategyConfig};

    fn fraction_k_and_e() -> (FeatureRegistry, ReferenceVariance) {
        let mut registry = FeatureRegistry::new();
        registry
            .register("frac_k", PatternScore::count(Pattern::new("K").unwrap(), true))
            .unwrap();
        registry
            .register("frac_e", PatternScore::count(Pattern::new("E").unwrap(), true))
            .unwrap();
        let reference = ReferenceVariance::new(vec![
            ("frac_k".to_string(), 1.0),
            ("frac_e".to_string(), 1.0),
        ])
        .unwrap();
        (registry, reference)
    }

    fn config(strategy: StrategyConfig, seed: u64) -> DesignConfig {
        DesignConfigBuilder::new()
            .strategy(strategy)
            .precision(1e-4)
            .max_iterations(200)
            .seed(Some(seed))
            .max_start_attempts(5)
            .build()
            .unwrap()
    }

    fn seq(s: &str) -> Sequence {
        Sequence::new(s).unwrap()
    }

    #[test]
    fn design_from_given_start_matches_recorded_result() {
        let (registry, reference) = fraction_k_and_e();
        let outcomes = design(
            &seq("KRTAE"),
            &StartSpec::Sequence(seq("AAAAA")),
            &registry,
            &reference,
            &config(StrategyConfig::Exhaustive, 1),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].start.as_str(), "AAAAA");
        assert_eq!(outcomes[0].sequence.as_str(), "EKAAA");
        assert_eq!(outcomes[0].iterations, 3);
    }

    #[test]
    fn random_starts_are_reproducible_for_a_fixed_seed() {
        let (registry, reference) = fraction_k_and_e();
        let run_with = |seed| {
            design(
                &seq("KRTAEGGSKE"),
                &StartSpec::Random(3),
                &registry,
                &reference,
                &config(StrategyConfig::random_multi_point(), seed),
                &ProgressReporter::new(),
            )
            .unwrap()
        };
        let first = run_with(11);
        let second = run_with(11);
        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.start, b.start);
            assert_eq!(a.sequence, b.sequence);
            assert_eq!(a.start.len(), 10);
            assert_eq!(a.sequence.len(), 10);
        }
        assert_ne!(first[0].start, run_with(12)[0].start);
    }

    #[test]
    fn zero_random_starts_yield_no_outcomes() {
        let (registry, reference) = fraction_k_and_e();
        let outcomes = design(
            &seq("KRTAE"),
            &StartSpec::Random(0),
            &registry,
            &reference,
            &config(StrategyConfig::Exhaustive, 1),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn undefined_target_is_fatal() {
        let (registry, reference) = fraction_k_and_e();
        let err = design(
            &seq(""),
            &StartSpec::Random(1),
            &registry,
            &reference,
            &config(StrategyConfig::Exhaustive, 1),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::FeatureUndefined { .. }));
    }

    #[test]
    fn random_start_generation_gives_up_after_max_attempts() {
        let mut registry = FeatureRegistry::new();
        registry
            .register(
                "tryptophan_only",
                feature_fn(|input| {
                    if input.target.sequence().as_str().chars().all(|c| c == 'W') {
                        Ok(1.0)
                    } else {
                        Err(input.undefined("not all W"))
                    }
                }),
            )
            .unwrap();
        let reference = ReferenceVariance::new(vec![("tryptophan_only".to_string(), 1.0)]).unwrap();
        let err = design(
            &seq("WWWWWWWWWWWW"),
            &StartSpec::Random(1),
            &registry,
            &reference,
            &config(StrategyConfig::Exhaustive, 1),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Initialization(_)));
    }

    #[test]
    fn missing_variance_entry_is_a_distance_error() {
        let (registry, _) = fraction_k_and_e();
        let reference = ReferenceVariance::new(vec![("frac_k".to_string(), 1.0)]).unwrap();
        let err = design(
            &seq("KRTAE"),
            &StartSpec::Sequence(seq("AAAAA")),
            &registry,
            &reference,
            &config(StrategyConfig::Exhaustive, 1),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Distance(_)));
    }
}
