//! Correlation-based feature ranking
//!
//! Candidates whose values are all 0 or 1 are treated as binary and scored
//! with the point-biserial coefficient; everything else is scored with
//! Pearson. Each group is ordered by descending absolute coefficient.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::Dataset;
use crate::error::Result;
use crate::stats;

/// Correlation of one feature with the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub coefficient: f64,
}

/// Ranked continuous and binary candidates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRanking {
    pub continuous: Vec<FeatureScore>,
    pub binary: Vec<FeatureScore>,
}

impl FeatureRanking {
    /// Feature names in rank order, continuous first
    pub fn ordered_features(&self) -> Vec<String> {
        self.continuous
            .iter()
            .chain(self.binary.iter())
            .map(|s| s.feature.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.continuous.is_empty() && self.binary.is_empty()
    }
}

impl fmt::Display for FeatureRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<32} {:>12}", "Continuous feature", "Pearson")?;
        for score in &self.continuous {
            writeln!(f, "{:<32} {:>12.6}", score.feature, score.coefficient)?;
        }
        writeln!(f, "{:<32} {:>12}", "Binary feature", "Point-biserial")?;
        for score in &self.binary {
            writeln!(f, "{:<32} {:>12.6}", score.feature, score.coefficient)?;
        }
        Ok(())
    }
}

fn is_binary(values: &[f64]) -> bool {
    values.iter().all(|&v| v == 0.0 || v == 1.0)
}

fn sort_by_strength(scores: &mut [FeatureScore]) {
    scores.sort_by(|a, b| {
        b.coefficient
            .abs()
            .partial_cmp(&a.coefficient.abs())
            .unwrap_or(Ordering::Equal)
    });
}

/// Score every candidate against `target` and rank each group
pub fn rank_features(data: &Dataset, target: &str, candidates: &[String]) -> Result<FeatureRanking> {
    let ys = data.column_values(target)?;
    let mut ranking = FeatureRanking::default();

    for feature in candidates {
        let xs = data.column_values(feature)?;
        if is_binary(&xs) {
            let coefficient = stats::point_biserial(&xs, &ys)?;
            debug!(feature = feature.as_str(), coefficient, "point-biserial");
            ranking.binary.push(FeatureScore {
                feature: feature.clone(),
                coefficient,
            });
        } else {
            let coefficient = stats::pearson(&xs, &ys)?;
            debug!(feature = feature.as_str(), coefficient, "pearson");
            ranking.continuous.push(FeatureScore {
                feature: feature.clone(),
                coefficient,
            });
        }
    }

    sort_by_strength(&mut ranking.continuous);
    sort_by_strength(&mut ranking.binary);
    Ok(ranking)
}
