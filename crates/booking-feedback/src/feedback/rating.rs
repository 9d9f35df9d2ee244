use serde::{Deserialize, Serialize};

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

/// Rating as sent by a client. Some clients send numbers as strings, so both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    Number(f64),
    Text(String),
}

impl RatingValue {
    /// Numeric view of the rating; NaN when it does not look like a number.
    pub fn coerce(&self) -> f64 {
        match self {
            RatingValue::Number(value) => *value,
            RatingValue::Text(raw) => coerce_str(raw),
        }
    }

    /// Coerced rating clamped into the rating scale, or `None` when it is not numeric.
    pub fn capped(&self) -> Option<f64> {
        let capped = cap_value(self.coerce());
        (!capped.is_nan()).then_some(capped)
    }
}

impl From<f64> for RatingValue {
    fn from(value: f64) -> Self {
        RatingValue::Number(value)
    }
}

impl From<i32> for RatingValue {
    fn from(value: i32) -> Self {
        RatingValue::Number(f64::from(value))
    }
}

impl From<&str> for RatingValue {
    fn from(value: &str) -> Self {
        RatingValue::Text(value.to_string())
    }
}

/// Coerce an optional client rating; a missing rating is NaN.
pub fn coerce(value: Option<&RatingValue>) -> f64 {
    value.map_or(f64::NAN, RatingValue::coerce)
}

fn coerce_str(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // `f64::from_str` also reads "inf", "infinity" and "nan" in any case; those are not ratings.
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => f64::NAN,
    }
}

/// Clamp a rating into `[0, 5]`. NaN passes through unchanged.
pub fn cap_value(value: f64) -> f64 {
    value.clamp(MIN_RATING, MAX_RATING)
}
