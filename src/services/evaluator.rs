/// Outcome of comparing a fresh price against the stored baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub alert: bool,
    pub percent_change: Option<f64>,
}

/// Pure threshold check.
///
/// A missing baseline only establishes one: no alert, no change. A zero (or
/// otherwise unusable) baseline is treated the same way, since a real price
/// is always positive and the percentage would be undefined.
pub fn evaluate(last_price: Option<f64>, current_price: f64, threshold_percent: f64) -> Evaluation {
    let Some(last) = last_price.filter(|p| p.is_finite() && *p > 0.0) else {
        return Evaluation {
            alert: false,
            percent_change: None,
        };
    };

    let percent_change = (current_price - last) / last * 100.0;

    Evaluation {
        alert: percent_change.abs() >= threshold_percent,
        percent_change: Some(percent_change),
    }
}
