//! Running configured classifiers on tasks.
//!
//! A [`Task`] names a dataset, a target feature and an [`EstimationProcedure`]. [`DataSplits`]
//! materializes the train/test partition of every (repeat, fold, sample) triple, the
//! [`ExperimentDriver`] walks them through a [`SplitEvaluator`], and the [`TaskResultListener`]
//! gathers the prediction batches into a run that is uploaded once complete.

use serde::{Deserialize, Serialize};
use std::fmt;

mod driver;
mod listener;
mod measures;
mod predictions;
mod splits;
mod trace;

pub use driver::{ExperimentDriver, SplitEvaluation, SplitEvaluator, TaskOutcome};
pub use listener::{FullModel, ResultBatch, TaskResultListener};
pub use measures::{SplitResults, USER_MEASURES, UserMeasure, add_timing_totals, user_measures};
pub use predictions::{Prediction, PredictionTable};
pub use splits::{DataSplits, SplitAssignment, SplitRole, read_assignments, write_assignments};
pub use trace::{OptimizationTrace, TraceIteration};

/// Names of the files attached to an uploaded run.
pub const PREDICTIONS_FILE: &str = "predictions";
pub const TRACE_FILE: &str = "trace";
pub const READABLE_MODEL_FILE: &str = "model_readable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
    LearningCurve,
}

impl TaskType {
    /// The numeric task type id used by tracking services.
    pub fn id(&self) -> u32 {
        match self {
            TaskType::Classification => 1,
            TaskType::Regression => 2,
            TaskType::LearningCurve => 3,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(TaskType::Classification),
            2 => Some(TaskType::Regression),
            3 => Some(TaskType::LearningCurve),
            _ => None,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskType::Classification => "classification",
            TaskType::Regression => "regression",
            TaskType::LearningCurve => "learning curve",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    Holdout,
    CrossValidation,
    LeaveOneOut,
}

/// How a task partitions its dataset into training and test sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationProcedure {
    pub id: u32,
    pub kind: ProcedureKind,
    pub repeats: usize,
    /// Ignored for holdout (one fold) and leave-one-out (one fold per row).
    pub folds: usize,
}

impl EstimationProcedure {
    pub fn holdout(id: u32, repeats: usize) -> Self {
        Self {
            id,
            kind: ProcedureKind::Holdout,
            repeats,
            folds: 1,
        }
    }

    pub fn cross_validation(id: u32, repeats: usize, folds: usize) -> Self {
        Self {
            id,
            kind: ProcedureKind::CrossValidation,
            repeats,
            folds,
        }
    }

    pub fn leave_one_out(id: u32) -> Self {
        Self {
            id,
            kind: ProcedureKind::LeaveOneOut,
            repeats: 1,
            folds: 0,
        }
    }

    /// Repeat and fold counts on a dataset of `num_rows` rows.
    pub fn dimensions(&self, num_rows: usize) -> (usize, usize) {
        match self.kind {
            ProcedureKind::Holdout => (self.repeats, 1),
            ProcedureKind::CrossValidation => (self.repeats, self.folds),
            ProcedureKind::LeaveOneOut => (1, num_rows),
        }
    }
}

/// A supervised learning task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub task_type: TaskType,
    pub estimation_procedure: EstimationProcedure,
    pub dataset_id: u32,
    pub target_feature: String,
    /// Values of the nominal target, in class-index order.
    pub class_labels: Vec<String>,
    /// Whether some rows of the dataset have no target value.
    #[serde(default)]
    pub missing_labels: bool,
}

impl Task {
    pub fn has_samples(&self) -> bool {
        self.task_type == TaskType::LearningCurve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_dimensions() {
        assert_eq!(EstimationProcedure::holdout(1, 3).dimensions(100), (3, 1));
        assert_eq!(EstimationProcedure::cross_validation(2, 2, 10).dimensions(100), (2, 10));
        assert_eq!(EstimationProcedure::leave_one_out(3).dimensions(42), (1, 42));
    }

    #[test]
    fn task_type_ids() {
        for task_type in [
            TaskType::Classification,
            TaskType::Regression,
            TaskType::LearningCurve,
        ] {
            assert_eq!(TaskType::from_id(task_type.id()), Some(task_type));
        }
        assert_eq!(TaskType::from_id(9), None);
    }
}
