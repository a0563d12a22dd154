use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileSearchConfig};
use super::models::{AppConfig, TargetInput, VarianceSource};
use crate::cli::{DesignArgs, StrategyArg};
use crate::error::{CliError, Result};
use idrdesign::core::sequence::Sequence;
use idrdesign::engine::config::{DesignConfigBuilder, StrategyConfig};
use idrdesign::workflows::design::StartSpec;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Merges built-in defaults, the config file, `--set` overrides and flags,
/// in increasing order of precedence.
pub fn build_config(args: &DesignArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    let search_file = file_config.search.take().unwrap_or_default();
    let seed_file = file_config.seed.take().unwrap_or_default();

    let target = match (&args.target, &args.target_fasta) {
        (Some(text), _) => TargetInput::Literal(text.clone()),
        (None, Some(path)) => TargetInput::Fasta(path.clone()),
        (None, None) => {
            return Err(CliError::Argument(
                "a target is required: pass --target or --target-fasta".to_string(),
            ));
        }
    };

    let start = match (&args.start, args.count) {
        (Some(text), _) => StartSpec::Sequence(
            Sequence::new(text).map_err(|e| CliError::Argument(format!("--start: {e}")))?,
        ),
        (None, Some(count)) => StartSpec::Random(count),
        (None, None) => StartSpec::Random(defaults.random_starts),
    };

    let variance = resolve_variance(args, &file_config)?;
    let strategy = resolve_strategy(args.strategy, &search_file, &defaults)?;

    let time_budget = args
        .time_budget
        .or(search_file.time_budget_secs)
        .or(defaults.time_budget_secs)
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|e| {
                CliError::Config(format!("Invalid time budget {secs}: {e}"))
            })
        })
        .transpose()?;

    let core_config = DesignConfigBuilder::new()
        .strategy(strategy)
        .precision(
            args.precision
                .or(search_file.precision)
                .unwrap_or(defaults.precision),
        )
        .max_iterations(
            args.max_iterations
                .or(search_file.max_iterations)
                .unwrap_or(defaults.max_iterations),
        )
        .time_budget(time_budget)
        .max_start_attempts(
            search_file
                .max_start_attempts
                .unwrap_or(defaults.max_start_attempts),
        )
        .seed(args.seed.or(seed_file.value))
        .bind_seed_to_target(
            seed_file
                .bind_to_target
                .unwrap_or(defaults.bind_seed_to_target),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        target,
        start,
        features_path: args.features.clone().or(file_config.features),
        variance,
        output_path: args.output.clone(),
        core_config,
    })
}

fn resolve_variance(args: &DesignArgs, file_config: &FileConfig) -> Result<VarianceSource> {
    if let Some(path) = &args.variance {
        return Ok(VarianceSource::Table(path.clone()));
    }
    if let Some(path) = &args.reference {
        return Ok(VarianceSource::Reference(path.clone()));
    }
    match (&file_config.variance, &file_config.reference) {
        (Some(path), _) => Ok(VarianceSource::Table(path.clone())),
        (None, Some(path)) => Ok(VarianceSource::Reference(path.clone())),
        (None, None) => Err(CliError::Config(
            "a reference variance is required: pass --variance or --reference, or set `variance` or `reference` in the config file".to_string(),
        )),
    }
}

fn resolve_strategy(
    cli_arg: Option<StrategyArg>,
    file: &FileSearchConfig,
    defaults: &DefaultsConfig,
) -> Result<StrategyConfig> {
    let name = match cli_arg {
        Some(StrategyArg::Exhaustive) => "exhaustive",
        Some(StrategyArg::Multipoint) => "multipoint",
        None => file.strategy.as_deref().unwrap_or(&defaults.strategy),
    };
    match name {
        "exhaustive" => Ok(StrategyConfig::Exhaustive),
        "multipoint" => Ok(StrategyConfig::RandomMultiPoint {
            good_quota: file.good_quota.unwrap_or(defaults.good_quota),
            marginal_quota: file.marginal_quota.unwrap_or(defaults.marginal_quota),
        }),
        other => Err(CliError::Config(format!(
            "Unknown strategy '{other}'. Expected 'exhaustive' or 'multipoint'."
        ))),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {key}: {value}")))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{kv_pair}'. Expected KEY=VALUE."
            )));
        };
        match key {
            "features" => config.features = Some(PathBuf::from(value)),
            "variance" => config.variance = Some(PathBuf::from(value)),
            "reference" => config.reference = Some(PathBuf::from(value)),
            "search.strategy" => {
                config.search.get_or_insert_with(Default::default).strategy = Some(value.to_string());
            }
            "search.precision" => {
                config.search.get_or_insert_with(Default::default).precision = Some(parse_value(key, value)?);
            }
            "search.max-iterations" => {
                config.search.get_or_insert_with(Default::default).max_iterations =
                    Some(parse_value(key, value)?);
            }
            "search.time-budget-secs" => {
                config.search.get_or_insert_with(Default::default).time_budget_secs =
                    Some(parse_value(key, value)?);
            }
            "search.max-start-attempts" => {
                config.search.get_or_insert_with(Default::default).max_start_attempts =
                    Some(parse_value(key, value)?);
            }
            "search.good-quota" => {
                config.search.get_or_insert_with(Default::default).good_quota =
                    Some(parse_value(key, value)?);
            }
            "search.marginal-quota" => {
                config.search.get_or_insert_with(Default::default).marginal_quota =
                    Some(parse_value(key, value)?);
            }
            "seed.value" => {
                config.seed.get_or_insert_with(Default::default).value =
                    Some(parse_value(key, value)?);
            }
            "seed.bind-to-target" => {
                config.seed.get_or_insert_with(Default::default).bind_to_target =
                    Some(parse_value(key, value)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{key}'"
                )));
            }
        }
    }
    Ok(config)
}
