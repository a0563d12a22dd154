use super::context::DesignContext;
use super::error::EngineError;
use super::progress::Progress;
use super::rng::SearchRng;
use super::scoring::{Scored, Scorer, select_best};
use super::state::{DesignOutcome, SearchState};
use super::strategy::SearchStrategy;
use crate::core::sequence::Sequence;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Runs one local search from `start` until a round moves the feature vector
/// by no more than the configured precision.
#[instrument(skip_all, name = "search", fields(search = search, start = %start))]
pub fn run_search(
    search: usize,
    total: usize,
    start: &Sequence,
    scorer: &Scorer<'_>,
    strategy: &dyn SearchStrategy,
    context: &DesignContext<'_>,
    rng: &mut SearchRng,
) -> Result<DesignOutcome, EngineError> {
    let convergence = &context.config.convergence;
    let started = Instant::now();

    let mut initial = context.registry.extend(start.clone());
    context
        .registry
        .fill(&mut initial)
        .map_err(|e| EngineError::from_feature(e, start.as_str()))?;
    let features = initial
        .feature_vector()
        .ok_or_else(|| EngineError::Internal("start memo not filled".to_string()))?;
    let distance = scorer.distance_to_target(&features);
    let mut state = SearchState::new(initial, distance, convergence.precision + 1.0)
        .ok_or_else(|| EngineError::Internal("start memo not filled".to_string()))?;

    context.reporter.report(Progress::SearchStart {
        search,
        total,
        start: start.to_string(),
        distance,
    });
    info!(strategy = strategy.name(), distance, "Search started");

    let mut trajectory = vec![distance];
    while state.step_size() > convergence.precision {
        let elapsed = started.elapsed();
        let out_of_time = convergence
            .time_budget
            .is_some_and(|budget| elapsed >= budget);
        if state.iteration() >= convergence.max_iterations || out_of_time {
            return Err(EngineError::ConvergenceTimeout {
                iterations: state.iteration(),
                elapsed,
            });
        }

        let chosen = run_round(&state, scorer, strategy, rng)?;
        let step_size = scorer.distance_between(&chosen.features()?, state.features());
        let distance = chosen.distance;
        if !state.adopt(chosen.sequence, distance, step_size) {
            return Err(EngineError::Internal(
                "selected candidate has an incomplete memo".to_string(),
            ));
        }
        trajectory.push(distance);

        debug!(
            iteration = state.iteration(),
            sequence = %state.sequence(),
            distance,
            step_size,
            "Round complete"
        );
        context.reporter.report(Progress::Round {
            search,
            iteration: state.iteration(),
            sequence: state.sequence().to_string(),
            distance,
            step_size,
            elapsed: started.elapsed(),
        });
    }

    context.reporter.report(Progress::SearchFinish {
        search,
        iterations: state.iteration(),
        distance: state.distance(),
    });
    info!(
        iterations = state.iteration(),
        result = %state.sequence(),
        distance = state.distance(),
        "Search converged"
    );

    Ok(DesignOutcome {
        start: start.clone(),
        sequence: state.sequence().clone(),
        features: state.features().to_vec(),
        distance: state.distance(),
        iterations: state.iteration(),
        elapsed: started.elapsed(),
        trajectory,
    })
}

/// Proposes, scores and selects one round's candidate.
fn run_round(
    state: &SearchState,
    scorer: &Scorer<'_>,
    strategy: &dyn SearchStrategy,
    rng: &mut SearchRng,
) -> Result<Scored, EngineError> {
    let proposal = strategy.propose_round(state, scorer, rng)?;
    let mut scored = scorer.score_round(state, proposal)?;
    let undefined = scored.iter().filter(|s| s.is_none()).count();
    if undefined > 0 {
        debug!(undefined, total = scored.len(), "Skipped undefined candidates");
    }
    let best = select_best(&scored).ok_or(EngineError::AllCandidatesUndefined {
        iteration: state.iteration() + 1,
    })?;
    scored[best]
        .take()
        .ok_or_else(|| EngineError::Internal(format!("selected candidate {best} has no score")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::AminoAcid;
    use crate::core::features::composition::{Pattern, PatternScore};
    use crate::core::features::{FeatureRegistry, feature_fn};
    use crate::core::sequence::PointMutation;
    use crate::engine::config::{DesignConfig, DesignConfigBuilder, StrategyConfig};
    use crate::engine::progress::ProgressReporter;
    use crate::engine::scoring::test_support::Fixture;
    use crate::engine::strategy::{Candidate, Exhaustive, Proposal, RandomMultiPoint};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays fixed substitutions against whatever the current sequence is.
    struct FixedRound(Vec<Option<(usize, AminoAcid)>>);

    impl SearchStrategy for FixedRound {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn propose_round(
            &self,
            state: &SearchState,
            _scorer: &Scorer<'_>,
            _rng: &mut SearchRng,
        ) -> Result<Proposal, EngineError> {
            self.0
                .iter()
                .map(|m| match *m {
                    None => Ok(Candidate::identity()),
                    Some((position, to)) => Ok(Candidate::from_current(PointMutation::new(
                        state.sequence(),
                        position,
                        to,
                    )?)),
                })
                .collect::<Result<Vec<_>, EngineError>>()
                .map(Proposal::from)
        }
    }

    fn config(strategy: StrategyConfig, max_iterations: usize) -> DesignConfig {
        DesignConfigBuilder::new()
            .strategy(strategy)
            .precision(1e-4)
            .max_iterations(max_iterations)
            .seed(Some(7))
            .build()
            .unwrap()
    }

    fn search(
        fixture: &Fixture,
        start: &str,
        strategy: &dyn SearchStrategy,
        config: &DesignConfig,
    ) -> Result<DesignOutcome, EngineError> {
        let reporter = ProgressReporter::new();
        let context = DesignContext::new(&fixture.registry, &fixture.distance, &reporter, config);
        let mut rng = fixture.rng();
        run_search(
            0,
            1,
            &Sequence::new(start).unwrap(),
            &fixture.scorer(),
            strategy,
            &context,
            &mut rng,
        )
    }

    #[test]
    fn exhaustive_search_reaches_recorded_result_for_krtae() {
        let fixture = Fixture::fraction_k_and_e();
        let config = config(StrategyConfig::Exhaustive, 100);
        let outcome = search(&fixture, "AAAAA", &Exhaustive, &config).unwrap();
        assert_eq!(outcome.sequence.as_str(), "EKAAA");
        assert_eq!(outcome.iterations, 3);
        assert!(outcome.distance.abs() < 1e-12);
        assert_eq!(outcome.trajectory.len(), 4);
        assert!((outcome.trajectory[0] - 0.08).abs() < 1e-12);
        assert!((outcome.trajectory[1] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn trajectory_never_increases() {
        let fixture = Fixture::fraction_k_and_e();
        let config = config(StrategyConfig::random_multi_point(), 100);
        let strategy = RandomMultiPoint::new(2, 14, 1e-4);
        let outcome = search(&fixture, "GGPGGSG", &strategy, &config).unwrap();
        assert!(outcome.trajectory.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(outcome.sequence.len(), 7);
        assert_eq!(outcome.iterations + 1, outcome.trajectory.len());
    }

    #[test]
    fn starting_at_target_returns_target_after_one_round() {
        let fixture = Fixture::fraction_k_and_e();
        let config = config(StrategyConfig::Exhaustive, 100);
        let outcome = search(&fixture, "KRTAE", &Exhaustive, &config).unwrap();
        assert_eq!(outcome.sequence.as_str(), "KRTAE");
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.distance, 0.0);
    }

    #[test]
    fn exhausted_round_budget_is_a_timeout() {
        let fixture = Fixture::fraction_k_and_e();
        let config = config(StrategyConfig::Exhaustive, 1);
        let err = search(&fixture, "AAAAA", &Exhaustive, &config).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ConvergenceTimeout { iterations: 1, .. }
        ));
    }

    #[test]
    fn exhausted_time_budget_is_a_timeout() {
        let fixture = Fixture::fraction_k_and_e();
        let mut config = config(StrategyConfig::Exhaustive, 100);
        config.convergence.time_budget = Some(Duration::ZERO);
        let err = search(&fixture, "AAAAA", &Exhaustive, &config).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ConvergenceTimeout { iterations: 0, .. }
        ));
    }

    #[test]
    fn undefined_start_is_fatal() {
        let fixture = Fixture::fraction_k_and_e();
        let config = config(StrategyConfig::Exhaustive, 100);
        let err = search(&fixture, "", &Exhaustive, &config).unwrap_err();
        assert!(matches!(err, EngineError::FeatureUndefined { .. }));
    }

    fn alanine_unless_charge_free() -> Fixture {
        let mut registry = FeatureRegistry::new();
        registry
            .register(
                "alanine",
                feature_fn(|input| {
                    if input.target.charged().is_empty() {
                        return Err(input.undefined("no charged residues"));
                    }
                    Ok(input.target.count(AminoAcid::Ala) as f64 / input.nonempty_len()?)
                }),
            )
            .unwrap();
        Fixture::new(registry, "AAAAE")
    }

    #[test]
    fn charge_free_candidate_is_skipped() {
        let fixture = alanine_unless_charge_free();
        let state = fixture.state("KGGGG");
        // AGGGG would be closest to the target, but has no charged residue.
        let strategy = FixedRound(vec![
            None,
            Some((0, AminoAcid::Ala)),
            Some((1, AminoAcid::Ala)),
        ]);
        let mut rng = fixture.rng();
        let chosen = run_round(&state, &fixture.scorer(), &strategy, &mut rng).unwrap();
        assert_eq!(chosen.sequence.sequence().as_str(), "KAGGG");
    }

    #[test]
    fn round_without_defined_candidates_fails() {
        let fixture = alanine_unless_charge_free();
        let state = fixture.state("KGGGG");
        let strategy = FixedRound(vec![Some((0, AminoAcid::Ala))]);
        let mut rng = fixture.rng();
        let err = run_round(&state, &fixture.scorer(), &strategy, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            EngineError::AllCandidatesUndefined { iteration: 1 }
        ));
    }

    #[test]
    fn reports_start_each_round_and_finish() {
        let fixture = Fixture::fraction_k_and_e();
        let config = config(StrategyConfig::Exhaustive, 100);
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let tag = match event {
                Progress::SearchStart { .. } => "start",
                Progress::Round { .. } => "round",
                Progress::SearchFinish { .. } => "finish",
                Progress::Message(_) => "message",
            };
            events.lock().unwrap().push(tag);
        }));
        let context = DesignContext::new(&fixture.registry, &fixture.distance, &reporter, &config);
        let mut rng = fixture.rng();
        run_search(
            0,
            1,
            &Sequence::new("AAAAA").unwrap(),
            &fixture.scorer(),
            &Exhaustive,
            &context,
            &mut rng,
        )
        .unwrap();
        drop(reporter);
        assert_eq!(
            events.into_inner().unwrap(),
            vec!["start", "round", "round", "round", "finish"]
        );
    }

    #[test]
    fn pattern_features_are_usable_in_a_search() {
        let mut registry = FeatureRegistry::new();
        registry
            .register("frac_p", PatternScore::count(Pattern::new("P").unwrap(), true))
            .unwrap();
        let fixture = Fixture::new(registry, "PPAA");
        let config = config(StrategyConfig::Exhaustive, 100);
        let outcome = search(&fixture, "AAAA", &Exhaustive, &config).unwrap();
        assert_eq!(outcome.sequence.as_str(), "PPAA");
    }
}
