//! Common test utilities for configuring components, tasks and evaluators.
use kiroku::experiment::{
    FullModel, Prediction, SplitAssignment, SplitEvaluation, SplitResults, SplitRole,
};
use kiroku::prelude::*;

/// Converts string literals into owned option tokens.
#[allow(dead_code)]
pub fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Creates a catalog component configured with `options`.
#[allow(dead_code)]
pub fn configure(
    serializer: &FlowSerializer,
    type_name: &str,
    options: &[&str],
) -> Box<dyn OptionHandler> {
    serializer
        .registry()
        .create_with_options(type_name, &tokens(options))
        .expect("Failed to configure component")
}

/// Serializes, registers, extracts the setup and rebuilds `component`.
///
/// Returns the stored flow, the extracted settings and the rebuilt component.
#[allow(dead_code)]
pub fn round_trip(
    serializer: &FlowSerializer,
    tracker: &mut LocalTracker,
    component: &dyn OptionHandler,
) -> (FlowNode, Vec<ParameterSetting>, Box<dyn OptionHandler>) {
    let flow = serializer
        .serialize(component, &[])
        .expect("Failed to serialize component");
    let flow_id = register_flow(tracker, &flow).expect("Failed to register flow");
    let stored = tracker.flow_get(flow_id).expect("Failed to fetch flow");
    let settings = serializer
        .extract_setup(&component.get_options(), &stored)
        .expect("Failed to extract setup");
    let rebuilt = serializer
        .deserialize_setup(&settings, &stored)
        .expect("Failed to rebuild component");
    (stored, settings, rebuilt)
}

/// The encoded value of setting `name` on the flow node with `component_id`.
#[allow(dead_code)]
pub fn setting_value<'a>(
    settings: &'a [ParameterSetting],
    component_id: u32,
    name: &str,
) -> Option<&'a str> {
    settings
        .iter()
        .find(|s| s.component_id == component_id && s.name == name)
        .map(|s| s.value.as_str())
}

/// A two-class classification task.
#[allow(dead_code)]
pub fn classification_task(id: u32, procedure: EstimationProcedure) -> Task {
    Task {
        id,
        task_type: TaskType::Classification,
        estimation_procedure: procedure,
        dataset_id: 61,
        target_feature: "class".to_string(),
        class_labels: vec!["positive".to_string(), "negative".to_string()],
        missing_labels: false,
    }
}

/// Cross-validation assignments that test row `i` in fold `i % folds`.
#[allow(dead_code)]
pub fn cv_assignments(rows: usize, repeats: usize, folds: usize) -> Vec<SplitAssignment> {
    let mut assignments = Vec::new();
    for repeat in 0..repeats {
        for fold in 0..folds {
            for row_id in 0..rows {
                let role = if row_id % folds == fold {
                    SplitRole::Test
                } else {
                    SplitRole::Train
                };
                assignments.push(SplitAssignment::new(role, row_id, repeat, fold, 0));
            }
        }
    }
    assignments
}

/// Leave-one-out assignments for `rows` rows.
#[allow(dead_code)]
pub fn loo_assignments(rows: usize) -> Vec<SplitAssignment> {
    let mut assignments = Vec::new();
    for fold in 0..rows {
        for row_id in 0..rows {
            let role = if row_id == fold {
                SplitRole::Test
            } else {
                SplitRole::Train
            };
            assignments.push(SplitAssignment::new(role, row_id, 0, fold, 0));
        }
    }
    assignments
}

/// An evaluator that predicts the first class for every test row.
///
/// Even rows belong to the first class. With `fail_on_call` set, the n-th call to `evaluate`
/// (starting at 0) fails; with `short_on_call` set, it returns no predictions.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct MajorityEvaluator {
    pub calls: usize,
    pub full_models: usize,
    pub fail_on_call: Option<usize>,
    pub short_on_call: Option<usize>,
}

#[allow(dead_code)]
impl MajorityEvaluator {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub fn short_on(call: usize) -> Self {
        Self {
            short_on_call: Some(call),
            ..Self::default()
        }
    }
}

impl SplitEvaluator for MajorityEvaluator {
    fn evaluate(
        &mut self,
        _task: &Task,
        _component: &dyn OptionHandler,
        _train: &[usize],
        test: &[usize],
    ) -> std::result::Result<SplitEvaluation, ExperimentError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(ExperimentError::Evaluation(
                "Cannot handle string attributes".to_string(),
            ));
        }

        let mut predictions: Vec<Prediction> = test
            .iter()
            .map(|row| Prediction::new(0, vec![1.0, 0.0], Some(row % 2)))
            .collect();
        if self.short_on_call == Some(call) {
            predictions.clear();
        }
        let correct = test.iter().filter(|row| *row % 2 == 0).count();
        let mut results = SplitResults::new();
        results.insert(
            "Percent_correct".to_string(),
            100.0 * correct as f64 / test.len().max(1) as f64,
        );
        results.insert("Kappa_statistic".to_string(), 0.0);
        results.insert("UserCPU_Time_millis_training".to_string(), 2.0);
        results.insert("UserCPU_Time_millis_testing".to_string(), 1.0);

        Ok(SplitEvaluation {
            predictions,
            results,
            trace: None,
        })
    }

    fn train_full(
        &mut self,
        _task: &Task,
        component: &dyn OptionHandler,
        rows: &[usize],
    ) -> std::result::Result<FullModel, ExperimentError> {
        self.full_models += 1;
        let mut results = SplitResults::new();
        results.insert("UserCPU_Time_millis_training".to_string(), 5.0);
        results.insert("UserCPU_Time_millis_testing".to_string(), 0.5);
        Ok(FullModel {
            results,
            readable: Some(format!(
                "{} trained on {} rows",
                component.type_name(),
                rows.len()
            )),
        })
    }
}
