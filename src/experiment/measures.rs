use super::ProcedureKind;
use std::collections::BTreeMap;
use tracing::warn;

/// Named results reported by an evaluator for one split, e.g. `Percent_correct`.
pub type SplitResults = BTreeMap<String, f64>;

/// Maps an evaluator result onto a measure attached to the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserMeasure {
    pub measure: &'static str,
    pub source: &'static str,
    pub factor: f64,
}

const fn measure(measure: &'static str, source: &'static str, factor: f64) -> UserMeasure {
    UserMeasure {
        measure,
        source,
        factor,
    }
}

pub const USER_MEASURES: &[UserMeasure] = &[
    measure("predictive_accuracy", "Percent_correct", 0.01),
    measure("kappa", "Kappa_statistic", 1.0),
    measure("root_mean_squared_error", "Root_mean_squared_error", 1.0),
    measure("root_relative_squared_error", "Root_relative_squared_error", 0.01),
    measure("usercpu_time_millis_training", "UserCPU_Time_millis_training", 1.0),
    measure("usercpu_time_millis_testing", "UserCPU_Time_millis_testing", 1.0),
    measure("usercpu_time_millis", "UserCPU_Time_millis", 1.0),
    measure("wall_clock_time_millis_training", "Elapsed_Time_training", 1000.0),
    measure("wall_clock_time_millis_testing", "Elapsed_Time_testing", 1000.0),
    measure("wall_clock_time_millis", "Elapsed_Time", 1000.0),
];

const TIMING_TOTALS: &[(&str, &str, &str)] = &[
    (
        "UserCPU_Time_millis",
        "UserCPU_Time_millis_training",
        "UserCPU_Time_millis_testing",
    ),
    ("Elapsed_Time", "Elapsed_Time_training", "Elapsed_Time_testing"),
];

/// Adds the combined training plus testing times when both parts are present.
pub fn add_timing_totals(results: &mut SplitResults) {
    for &(total, training, testing) in TIMING_TOTALS {
        if let (Some(train), Some(test)) = (results.get(training), results.get(testing)) {
            let sum = train + test;
            results.insert(total.to_string(), sum);
        }
    }
}

/// The per-split measures attached to a run.
///
/// Leave-one-out splits report none, and neither do tasks whose target has missing values. Timing
/// totals are added to `results` in every other case.
pub fn user_measures(
    results: &mut SplitResults,
    procedure: ProcedureKind,
    missing_labels: bool,
) -> BTreeMap<String, f64> {
    let mut measures = BTreeMap::new();
    if procedure == ProcedureKind::LeaveOneOut {
        return measures;
    }

    add_timing_totals(results);
    if missing_labels {
        return measures;
    }

    for user_measure in USER_MEASURES {
        match results.get(user_measure.source) {
            Some(value) => {
                measures.insert(user_measure.measure.to_string(), value * user_measure.factor);
            }
            None => warn!(measure = user_measure.source, "Missing measure"),
        }
    }
    measures
}
