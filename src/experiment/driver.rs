use super::{
    DataSplits, FullModel, Prediction, ResultBatch, SplitResults, Task, TaskResultListener,
    TaskType, TraceIteration, user_measures,
};
use crate::component::OptionHandler;
use crate::config::Config;
use crate::error::ExperimentError;
use crate::flow::FlowSerializer;
use crate::tracker::{TrackingService, find_setup_id};
use tracing::{debug, error, info, warn};

/// The output of training on one split and predicting its test rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitEvaluation {
    /// One prediction per test row, in test-row order.
    pub predictions: Vec<Prediction>,
    pub results: SplitResults,
    pub trace: Option<Vec<TraceIteration>>,
}

/// Trains and evaluates configured components on rows of a task's dataset.
///
/// An error from either method fails the run for that task and configuration.
pub trait SplitEvaluator {
    fn evaluate(
        &mut self,
        task: &Task,
        component: &dyn OptionHandler,
        train: &[usize],
        test: &[usize],
    ) -> Result<SplitEvaluation, ExperimentError>;

    /// Trains on every row of the dataset.
    fn train_full(
        &mut self,
        task: &Task,
        component: &dyn OptionHandler,
        rows: &[usize],
    ) -> Result<FullModel, ExperimentError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Uploaded { run_id: u32 },
    /// The setup has already been run on the task.
    Skipped { setup_id: u32, run_ids: Vec<u32> },
    /// `run_id` is `None` when the failure had already been reported.
    Failed { run_id: Option<u32>, message: String },
}

/// Runs configured components on tasks and reports the results.
pub struct ExperimentDriver<S, E> {
    listener: TaskResultListener<S>,
    evaluator: E,
    avoid_duplicate_runs: bool,
    model_full_dataset: bool,
}

impl<S: TrackingService, E: SplitEvaluator> ExperimentDriver<S, E> {
    pub fn new(service: S, evaluator: E, config: &Config) -> Self {
        let serializer = FlowSerializer::builder().with_config(config).build();
        Self::with_serializer(service, evaluator, serializer, config)
    }

    pub fn with_serializer(
        service: S,
        evaluator: E,
        serializer: FlowSerializer,
        config: &Config,
    ) -> Self {
        Self {
            listener: TaskResultListener::new(service, serializer, &config.tags),
            evaluator,
            avoid_duplicate_runs: config.avoid_duplicate_runs,
            model_full_dataset: config.model_full_dataset,
        }
    }

    pub fn listener(&self) -> &TaskResultListener<S> {
        &self.listener
    }

    pub fn service(&self) -> &S {
        self.listener.service()
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn into_parts(self) -> (S, E) {
        (self.listener.into_service(), self.evaluator)
    }

    /// Runs `component` on every split of `task` and uploads the run.
    ///
    /// A failing split, whether the evaluator fails or its batch does not fit the split, is
    /// uploaded as an error run and ends the task with [`TaskOutcome::Failed`]. Tracking-service
    /// errors are returned.
    pub fn run(
        &mut self,
        task: &Task,
        splits: &DataSplits,
        component: &dyn OptionHandler,
    ) -> Result<TaskOutcome, ExperimentError> {
        if task.task_type == TaskType::Regression {
            return Err(ExperimentError::UnsupportedTask {
                task_id: task.id,
                task_type: task.task_type.to_string(),
            });
        }

        if self.avoid_duplicate_runs {
            if let Some(outcome) = self.find_existing_runs(task, component)? {
                return Ok(outcome);
            }
        }

        let expected = splits.num_runs();
        let procedure = splits.procedure().kind;
        let mut batches = 0;
        info!(
            task_id = task.id,
            component = component.type_name(),
            splits = expected,
            "Starting run"
        );

        for (repeat, fold, sample) in splits.indices() {
            let train = splits.train_rows(repeat, fold, sample)?;
            let test = splits.test_rows(repeat, fold, sample)?;
            debug!(repeat, fold, sample, train = train.len(), test = test.len(), "Evaluating split");

            let evaluation = match self.evaluator.evaluate(task, component, train, test) {
                Ok(evaluation) => evaluation,
                Err(e) => return self.fail(task, component, e),
            };

            let mut results = evaluation.results;
            let measures = user_measures(&mut results, procedure, task.missing_labels);
            let batch = ResultBatch {
                repeat,
                fold,
                sample: splits.has_samples().then_some(sample),
                row_ids: test.to_vec(),
                predictions: evaluation.predictions,
                measures,
                trace: evaluation.trace,
            };
            batches += 1;
            let accepted = self.listener.accept_results(
                task,
                expected,
                component,
                batch,
                self.model_full_dataset,
            );
            match accepted {
                Ok(Some(run_id)) => return Ok(TaskOutcome::Uploaded { run_id }),
                Ok(None) => {}
                Err(ExperimentError::Tracker(e)) => return Err(e.into()),
                Err(e) => return self.fail(task, component, e),
            }
        }

        if self.model_full_dataset {
            let rows: Vec<usize> = (0..splits.num_rows()).collect();
            let model = match self.evaluator.train_full(task, component, &rows) {
                Ok(model) => model,
                Err(e) => return self.fail(task, component, e),
            };
            match self.listener.accept_full_model(task, expected, component, model) {
                Ok(Some(run_id)) => return Ok(TaskOutcome::Uploaded { run_id }),
                Ok(None) => {}
                Err(ExperimentError::Tracker(e)) => return Err(e.into()),
                Err(e) => return self.fail(task, component, e),
            }
        }

        Err(ExperimentError::Incomplete { batches, expected })
    }

    fn find_existing_runs(
        &self,
        task: &Task,
        component: &dyn OptionHandler,
    ) -> Result<Option<TaskOutcome>, ExperimentError> {
        let service = self.listener.service();
        let Some(setup_id) = find_setup_id(service, self.listener.serializer(), component)? else {
            return Ok(None);
        };
        let run_ids = service.runs_for(task.id, setup_id)?;
        if run_ids.is_empty() {
            return Ok(None);
        }
        warn!(
            task_id = task.id,
            setup_id,
            runs = run_ids.len(),
            "Setup already run on task, skipping"
        );
        Ok(Some(TaskOutcome::Skipped { setup_id, run_ids }))
    }

    fn fail(
        &mut self,
        task: &Task,
        component: &dyn OptionHandler,
        cause: ExperimentError,
    ) -> Result<TaskOutcome, ExperimentError> {
        let message = match cause {
            ExperimentError::Evaluation(message) => message,
            other => other.to_string(),
        };
        error!(
            task_id = task.id,
            component = component.type_name(),
            error = %message,
            "Unable to finish run"
        );
        let run_id = self.listener.accept_error(task, component, &message)?;
        Ok(TaskOutcome::Failed { run_id, message })
    }
}
