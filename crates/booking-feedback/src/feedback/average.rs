use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::UserFeedback;

/// Average overall and per-term ratings across a user's feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageRating {
    /// `None` when no record carried a non-zero overall value.
    pub value: Option<f64>,
    pub terms: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RunningTotal {
    total: f64,
    count: u32,
}

impl RunningTotal {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.total / f64::from(self.count))
    }
}

/// Accumulates running totals for the overall value and each term slug.
#[derive(Debug, Clone, Default)]
pub struct RatingAccumulator {
    value: RunningTotal,
    terms: BTreeMap<String, RunningTotal>,
}

impl RatingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, feedback: &UserFeedback) {
        // Zero overall values are skipped; term values are always counted.
        if let Some(value) = feedback.value.filter(|value| *value != 0.0 && !value.is_nan()) {
            self.value.add(value);
        }

        for (slug, value) in &feedback.terms {
            self.terms.entry(slug.clone()).or_default().add(*value);
        }
    }

    pub fn finish(self) -> AverageRating {
        let terms = self
            .terms
            .into_iter()
            .filter_map(|(slug, running)| running.mean().map(|mean| (slug, mean)))
            .collect();

        AverageRating {
            value: self.value.mean(),
            terms,
        }
    }
}

impl<'a> Extend<&'a UserFeedback> for RatingAccumulator {
    fn extend<I: IntoIterator<Item = &'a UserFeedback>>(&mut self, iter: I) {
        for feedback in iter {
            self.record(feedback);
        }
    }
}

/// Average a set of feedback records.
pub fn average<'a, I>(feedback: I) -> AverageRating
where
    I: IntoIterator<Item = &'a UserFeedback>,
{
    let mut accumulator = RatingAccumulator::new();
    accumulator.extend(feedback);
    accumulator.finish()
}
