//! Regression observations
//!
//! Projects the subject summary table onto the observed data of a linear model
//! relating body weight to the maximal mean inter-pulse gap:
//!
//! - `alpha ~ Normal(0, 1)`
//! - `beta ~ Normal(1, 1)`
//! - `gamma ~ Exponential(1)`
//! - `max_mean_gap ~ Normal(alpha + beta * weight, gamma)`
//!
//! Fitting the model is left to an external sampler; this module only prepares
//! what the sampler consumes.

use crate::types::{SubjectId, SubjectSummary};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normal prior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalPrior {
    pub mu: f64,
    pub sigma: f64,
}

/// Exponential prior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialPrior {
    pub lambda: f64,
}

/// Priors of the weight → mean gap linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelSpec {
    /// Intercept
    pub alpha: NormalPrior,
    /// Slope on weight
    pub beta: NormalPrior,
    /// Observation noise standard deviation
    pub gamma: ExponentialPrior,
    /// Name of the predictor column
    pub predictor: String,
    /// Name of the observed column
    pub observed: String,
}

impl Default for LinearModelSpec {
    fn default() -> Self {
        Self {
            alpha: NormalPrior { mu: 0.0, sigma: 1.0 },
            beta: NormalPrior { mu: 1.0, sigma: 1.0 },
            gamma: ExponentialPrior { lambda: 1.0 },
            predictor: "weight".to_string(),
            observed: "max_mean_gap".to_string(),
        }
    }
}

/// One observed `(weight, max_mean_gap)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub pet_id: SubjectId,
    pub weight: f64,
    pub max_mean_gap: f64,
}

/// Observed data for the linear model, together with its priors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionObservations {
    pub model: LinearModelSpec,
    pub observations: Vec<Observation>,
    /// Subjects left out because they have no `max_mean_gap`
    pub skipped_subjects: Vec<SubjectId>,
}

impl RegressionObservations {
    /// Build observations from subject summaries using the default priors
    pub fn from_summaries(summaries: &[SubjectSummary]) -> Self {
        Self::with_model(summaries, LinearModelSpec::default())
    }

    /// Build observations from subject summaries with explicit priors
    pub fn with_model(summaries: &[SubjectSummary], model: LinearModelSpec) -> Self {
        let mut observations = Vec::with_capacity(summaries.len());
        let mut skipped_subjects = Vec::new();

        for summary in summaries {
            match summary.max_mean_gap {
                Some(max_mean_gap) => observations.push(Observation {
                    pet_id: summary.pet_id.clone(),
                    weight: summary.attributes.weight,
                    max_mean_gap,
                }),
                None => skipped_subjects.push(summary.pet_id.clone()),
            }
        }

        debug!(
            observations = observations.len(),
            skipped = skipped_subjects.len(),
            "prepared regression observations"
        );

        Self {
            model,
            observations,
            skipped_subjects,
        }
    }

    /// Predictor column
    pub fn weights(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.weight).collect()
    }

    /// Observed column
    pub fn mean_gaps(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.max_mean_gap).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubjectAttributes;
    use pretty_assertions::assert_eq;

    fn summary(id: &str, weight: f64, max_mean_gap: Option<f64>) -> SubjectSummary {
        SubjectSummary {
            pet_id: SubjectId::new(id),
            attributes: SubjectAttributes {
                breeds: "Labrador".to_string(),
                weight,
                age: 5.0,
            },
            recordings: 2,
            max_mean_gap,
        }
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let summaries = vec![
            summary("1", 30.0, Some(0.52)),
            summary("2", 8.0, None),
            summary("3", 12.0, Some(0.41)),
        ];

        let obs = RegressionObservations::from_summaries(&summaries);

        assert_eq!(obs.weights(), vec![30.0, 12.0]);
        assert_eq!(obs.mean_gaps(), vec![0.52, 0.41]);
        assert_eq!(obs.skipped_subjects, vec![SubjectId::new("2")]);
    }

    #[test]
    fn test_default_priors() {
        let model = LinearModelSpec::default();
        assert_eq!(model.alpha, NormalPrior { mu: 0.0, sigma: 1.0 });
        assert_eq!(model.beta, NormalPrior { mu: 1.0, sigma: 1.0 });
        assert_eq!(model.gamma.lambda, 1.0);
    }
}
