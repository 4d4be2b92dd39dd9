use crate::algorithm::registry::EmployeeRegistry;
use crate::config::DeviationThresholds;
use crate::models::Deviation;

/// Buckets the relative gap between predicted and accumulated hours.
///
/// Missing values count as zero. 0/0 is `NotApplicable`; one side zero and
/// the other not is always a full deviation of 1.0. The strong threshold is
/// checked first and both comparisons are inclusive.
pub fn classify_deviation(
    predicted: Option<f64>,
    accumulated: Option<f64>,
    thresholds: &DeviationThresholds,
) -> Deviation {
    let p = predicted.unwrap_or(0.0).abs();
    let a = accumulated.unwrap_or(0.0).abs();
    if p == 0.0 && a == 0.0 {
        return Deviation::NotApplicable;
    }
    let deviation = 1.0 - p.min(a) / p.max(a);
    if deviation >= thresholds.strong_dev {
        Deviation::Strong
    } else if deviation >= thresholds.weak_dev {
        Deviation::Weak
    } else {
        Deviation::Negligible
    }
}

/// Classifies every selected employee in place.
pub fn classify_registry(registry: &mut EmployeeRegistry, thresholds: &DeviationThresholds) {
    for employee in registry.selected_mut() {
        employee.hours.deviation = Some(classify_deviation(
            employee.hours.predicted,
            employee.hours.accumulated,
            thresholds,
        ));
    }
}
