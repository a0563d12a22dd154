use super::Feature;
use super::charge::{IsoelectricPoint, Scd};
use super::composition::{Complexity, Fcr, LogRatio, Pattern, PatternLength, PatternScore};
use super::patterning::{CustomKappa, CustomOmega};
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFeature {
    IsoelectricPoint,
    Scd,
    CustomKappa,
    CustomOmega,
    Complexity,
    Fcr,
}

pub static BUILTIN_FEATURES: Map<&'static str, BuiltinFeature> = phf_map! {
    "isoelectric_point" => BuiltinFeature::IsoelectricPoint,
    "scd" => BuiltinFeature::Scd,
    "custom_kappa" => BuiltinFeature::CustomKappa,
    "custom_omega" => BuiltinFeature::CustomOmega,
    "complexity" => BuiltinFeature::Complexity,
    "fcr" => BuiltinFeature::Fcr,
};

/// Builtin names in their canonical order.
pub const BUILTIN_ORDER: [&str; 6] = [
    "isoelectric_point",
    "scd",
    "custom_kappa",
    "custom_omega",
    "complexity",
    "fcr",
];

impl BuiltinFeature {
    pub fn instantiate(self) -> Box<dyn Feature> {
        match self {
            Self::IsoelectricPoint => Box::new(IsoelectricPoint),
            Self::Scd => Box::new(Scd),
            Self::CustomKappa => Box::new(CustomKappa::default()),
            Self::CustomOmega => Box::new(CustomOmega::default()),
            Self::Complexity => Box::new(Complexity),
            Self::Fcr => Box::new(Fcr),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeatureConfigError {
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
    #[error("Unknown builtin feature '{0}'")]
    UnknownBuiltin(String),
    #[error("Count feature '{0}' must specify exactly one of `pattern` or `scores`")]
    AmbiguousPattern(String),
    #[error("Invalid pattern for feature '{feature}': {source}")]
    Regex {
        feature: String,
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CountSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub average: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LengthSpec {
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LogRatioSpec {
    pub numerator: String,
    pub denominator: String,
}

/// The set of features to evaluate.
///
/// Features are registered in this order: `non-modular` builtins as listed,
/// then `count`, `length` and `log-ratio` sections, each sorted by name.
///
/// ```toml
/// non-modular = ["isoelectric_point", "scd"]
///
/// [count.fraction-proline]
/// pattern = "P"
/// average = true
///
/// [length.poly-q]
/// pattern = "Q{3,}"
///
/// [log-ratio.k-over-r]
/// numerator = "K"
/// denominator = "R"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FeatureConfig {
    #[serde(default)]
    pub non_modular: Vec<String>,
    #[serde(default)]
    pub count: BTreeMap<String, CountSpec>,
    #[serde(default)]
    pub length: BTreeMap<String, LengthSpec>,
    #[serde(default)]
    pub log_ratio: BTreeMap<String, LogRatioSpec>,
}

const KYTE_DOOLITTLE: [(&str, f64); 20] = [
    ("A", 1.8),
    ("C", 2.5),
    ("D", -3.5),
    ("E", -3.5),
    ("F", 2.8),
    ("G", -0.4),
    ("H", -3.2),
    ("I", 4.5),
    ("K", -3.9),
    ("L", 3.8),
    ("M", 1.9),
    ("N", -3.5),
    ("P", -1.6),
    ("Q", -3.5),
    ("R", -4.5),
    ("S", -0.8),
    ("T", -0.7),
    ("V", 4.2),
    ("W", -0.9),
    ("Y", -1.3),
];

impl Default for FeatureConfig {
    fn default() -> Self {
        let fraction = |pattern: &str| CountSpec {
            pattern: Some(pattern.to_string()),
            scores: None,
            average: true,
        };
        let mut count = BTreeMap::new();
        count.insert("fraction-aromatic".to_string(), fraction("[FWY]"));
        count.insert("fraction-aliphatic".to_string(), fraction("[AILMV]"));
        count.insert("fraction-polar".to_string(), fraction("[NQST]"));
        count.insert("fraction-proline".to_string(), fraction("P"));
        count.insert("fraction-glycine".to_string(), fraction("G"));
        count.insert("fraction-histidine".to_string(), fraction("H"));
        count.insert(
            "hydropathy".to_string(),
            CountSpec {
                pattern: None,
                scores: Some(
                    KYTE_DOOLITTLE
                        .iter()
                        .map(|&(aa, v)| (aa.to_string(), v))
                        .collect(),
                ),
                average: true,
            },
        );
        count.insert(
            "rg-repeats".to_string(),
            CountSpec {
                pattern: Some("RG".to_string()),
                scores: None,
                average: false,
            },
        );

        let mut length = BTreeMap::new();
        for (name, pattern) in [
            ("poly-q", "Q{3,}"),
            ("poly-p", "P{3,}"),
            ("poly-charged", "[DEKR]{3,}"),
        ] {
            length.insert(
                name.to_string(),
                LengthSpec {
                    pattern: pattern.to_string(),
                },
            );
        }

        let mut log_ratio = BTreeMap::new();
        for (name, numerator, denominator) in [("k-over-r", "K", "R"), ("e-over-d", "E", "D")] {
            log_ratio.insert(
                name.to_string(),
                LogRatioSpec {
                    numerator: numerator.to_string(),
                    denominator: denominator.to_string(),
                },
            );
        }

        Self {
            non_modular: BUILTIN_ORDER.iter().map(|s| s.to_string()).collect(),
            count,
            length,
            log_ratio,
        }
    }
}

impl FeatureConfig {
    pub fn load(path: &Path) -> Result<Self, FeatureConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| FeatureConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| FeatureConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Instantiates every configured feature, in registration order.
    pub fn build(&self) -> Result<Vec<(String, Box<dyn Feature>)>, FeatureConfigError> {
        let mut features: Vec<(String, Box<dyn Feature>)> = Vec::new();

        for name in &self.non_modular {
            let builtin = BUILTIN_FEATURES
                .get(name.as_str())
                .ok_or_else(|| FeatureConfigError::UnknownBuiltin(name.clone()))?;
            features.push((name.clone(), builtin.instantiate()));
        }

        for (name, spec) in &self.count {
            let feature = match (&spec.pattern, &spec.scores) {
                (Some(pattern), None) => {
                    PatternScore::count(compile(name, pattern)?, spec.average)
                }
                (None, Some(scores)) => {
                    let weighted = scores
                        .iter()
                        .map(|(pattern, &weight)| Ok((compile(name, pattern)?, weight)))
                        .collect::<Result<Vec<_>, FeatureConfigError>>()?;
                    PatternScore::weighted(weighted, spec.average)
                }
                _ => return Err(FeatureConfigError::AmbiguousPattern(name.clone())),
            };
            features.push((name.clone(), Box::new(feature)));
        }

        for (name, spec) in &self.length {
            let feature = PatternLength::new(compile(name, &spec.pattern)?);
            features.push((name.clone(), Box::new(feature)));
        }

        for (name, spec) in &self.log_ratio {
            let feature = LogRatio::new(
                compile(name, &spec.numerator)?,
                compile(name, &spec.denominator)?,
            );
            features.push((name.clone(), Box::new(feature)));
        }

        Ok(features)
    }

    pub fn len(&self) -> usize {
        self.non_modular.len() + self.count.len() + self.length.len() + self.log_ratio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile(feature: &str, pattern: &str) -> Result<Pattern, FeatureConfigError> {
    Pattern::new(pattern).map_err(|e| FeatureConfigError::Regex {
        feature: feature.to_string(),
        source: e,
    })
}
