use super::{
    OptimizationTrace, PREDICTIONS_FILE, Prediction, PredictionTable, READABLE_MODEL_FILE,
    SplitResults, TRACE_FILE, Task, TraceIteration,
};
use crate::component::OptionHandler;
use crate::error::ExperimentError;
use crate::flow::FlowSerializer;
use crate::options::join_options;
use crate::tracker::{EvaluationScore, RunDescriptor, TrackingService, register_flow};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything produced by evaluating one split.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBatch {
    pub repeat: usize,
    pub fold: usize,
    /// Set only for tasks with samples.
    pub sample: Option<usize>,
    pub row_ids: Vec<usize>,
    pub predictions: Vec<Prediction>,
    pub measures: BTreeMap<String, f64>,
    pub trace: Option<Vec<TraceIteration>>,
}

/// A model trained on the full dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullModel {
    pub results: SplitResults,
    /// Human-readable rendering of the model.
    pub readable: Option<String>,
}

const TRAINING_TIME: &str = "UserCPU_Time_millis_training";
const TESTING_TIME: &str = "UserCPU_Time_millis_testing";

#[derive(Debug)]
struct ExecutedTask {
    run: RunDescriptor,
    predictions: PredictionTable,
    trace: OptimizationTrace,
    batches: usize,
    expected_batches: usize,
    wait_for_full_model: bool,
    has_full_model: bool,
    readable_model: Option<String>,
}

impl ExecutedTask {
    fn add_batch(&mut self, batch: ResultBatch) -> Result<(), ExperimentError> {
        self.predictions.add_batch(
            batch.repeat,
            batch.fold,
            batch.sample,
            &batch.row_ids,
            batch.predictions,
        )?;
        if let Some(iterations) = batch.trace {
            self.trace.add_fold(batch.repeat, batch.fold, iterations)?;
        }
        self.run.evaluations.extend(batch.measures.into_iter().map(|(name, value)| {
            EvaluationScore::for_split(name, value, batch.repeat, batch.fold, batch.sample)
        }));
        self.batches += 1;
        Ok(())
    }

    fn add_full_model(&mut self, model: FullModel) {
        self.has_full_model = true;
        if let (Some(&training), Some(&testing)) =
            (model.results.get(TRAINING_TIME), model.results.get(TESTING_TIME))
        {
            self.run.evaluations.extend([
                EvaluationScore::total(TESTING_TIME.to_lowercase(), testing),
                EvaluationScore::total(TRAINING_TIME.to_lowercase(), training),
                EvaluationScore::total("usercpu_time_millis", training + testing),
            ]);
        }
        if model.readable.is_none() {
            warn!(task_id = self.run.task_id, "No readable model available");
        }
        self.readable_model = model.readable;
    }

    fn is_complete(&self) -> bool {
        let all_batches = self.batches == self.expected_batches;
        if self.wait_for_full_model {
            all_batches && self.has_full_model
        } else {
            all_batches
        }
    }

    fn files(&self) -> Result<BTreeMap<String, String>, ExperimentError> {
        let mut files = BTreeMap::new();
        files.insert(PREDICTIONS_FILE.to_string(), self.predictions.to_csv()?);
        if !self.trace.is_empty() {
            files.insert(TRACE_FILE.to_string(), self.trace.to_csv()?);
        }
        if let Some(readable) = &self.readable_model {
            files.insert(READABLE_MODEL_FILE.to_string(), readable.clone());
        }
        Ok(files)
    }
}

/// Collects the prediction batches of runs and uploads each run once it is complete.
///
/// Runs are keyed by task, component type with revision, and option string. A key's entry is
/// created by its first batch and removed when the run is uploaded. Failed runs are uploaded as
/// error runs, once per key.
#[derive(Debug)]
pub struct TaskResultListener<S> {
    service: S,
    serializer: FlowSerializer,
    tags: Vec<String>,
    collecting: AHashMap<String, ExecutedTask>,
    reported_errors: AHashSet<String>,
    run_ids: Vec<u32>,
}

impl<S: TrackingService> TaskResultListener<S> {
    /// `tags` are attached to every run in addition to the toolkit tags.
    pub fn new(service: S, serializer: FlowSerializer, tags: &[String]) -> Self {
        let tags = serializer
            .toolkit()
            .tags
            .iter()
            .chain(tags)
            .unique()
            .cloned()
            .collect();
        Self {
            service,
            serializer,
            tags,
            collecting: AHashMap::new(),
            reported_errors: AHashSet::new(),
            run_ids: Vec::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn into_service(self) -> S {
        self.service
    }

    pub fn serializer(&self) -> &FlowSerializer {
        &self.serializer
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Ids of every run uploaded so far, error runs included.
    pub fn run_ids(&self) -> &[u32] {
        &self.run_ids
    }

    /// Number of runs still waiting for batches.
    pub fn pending(&self) -> usize {
        self.collecting.len()
    }

    fn key(task: &Task, component: &dyn OptionHandler) -> String {
        format!(
            "{}_{}({})_{}",
            task.id,
            component.type_name(),
            component.revision().unwrap_or("undefined"),
            join_options(&component.get_options())
        )
    }

    fn describe_run(
        &mut self,
        task: &Task,
        component: &dyn OptionHandler,
        error_message: Option<String>,
    ) -> Result<RunDescriptor, ExperimentError> {
        let options = component.get_options();
        let flow = self.serializer.serialize(component, &self.tags)?;
        let flow_id = register_flow(&mut self.service, &flow)?;
        let stored = self.service.flow_get(flow_id)?;
        let settings = self.serializer.extract_setup(&options, &stored)?;

        Ok(RunDescriptor {
            task_id: task.id,
            flow_id,
            setup_string: format!("{} {}", component.type_name(), join_options(&options)),
            settings,
            tags: self.tags.clone(),
            evaluations: Vec::new(),
            error_message,
        })
    }

    fn collecting_entry(
        &mut self,
        key: &str,
        task: &Task,
        expected_batches: usize,
        component: &dyn OptionHandler,
        wait_for_full_model: bool,
    ) -> Result<&mut ExecutedTask, ExperimentError> {
        if !self.collecting.contains_key(key) {
            let run = self.describe_run(task, component, None)?;
            debug!(key, expected_batches, "Collecting run");
            self.collecting.insert(
                key.to_string(),
                ExecutedTask {
                    run,
                    predictions: PredictionTable::new(task.class_labels.clone(), task.has_samples()),
                    trace: OptimizationTrace::new(),
                    batches: 0,
                    expected_batches,
                    wait_for_full_model,
                    has_full_model: false,
                    readable_model: None,
                },
            );
        }
        self.collecting
            .get_mut(key)
            .ok_or_else(|| ExperimentError::Evaluation(format!("Run '{}' is not collected", key)))
    }

    fn upload_if_complete(&mut self, key: &str) -> Result<Option<u32>, ExperimentError> {
        let complete = self
            .collecting
            .get(key)
            .is_some_and(|executed| executed.is_complete());
        if !complete {
            return Ok(None);
        }
        let Some(executed) = self.collecting.remove(key) else {
            return Ok(None);
        };

        let files = executed.files()?;
        let run_id = self.service.run_upload(&executed.run, &files)?;
        info!(
            run_id,
            task_id = executed.run.task_id,
            flow_id = executed.run.flow_id,
            batches = executed.batches,
            files = files.len(),
            "Uploaded run"
        );
        self.run_ids.push(run_id);
        Ok(Some(run_id))
    }

    /// Adds the results of one split. Returns the run id once the run is complete and uploaded.
    ///
    /// A batch that does not fit its test rows discards everything collected for the run.
    pub fn accept_results(
        &mut self,
        task: &Task,
        expected_batches: usize,
        component: &dyn OptionHandler,
        batch: ResultBatch,
        want_full_model: bool,
    ) -> Result<Option<u32>, ExperimentError> {
        let key = Self::key(task, component);
        let executed =
            self.collecting_entry(&key, task, expected_batches, component, want_full_model)?;
        let added = executed
            .add_batch(batch)
            .map(|()| (executed.batches, executed.expected_batches));
        let (batches, expected) = match added {
            Ok(counts) => counts,
            Err(e) => {
                self.collecting.remove(&key);
                return Err(e);
            }
        };
        debug!(key, batches, expected, "Accepted prediction batch");
        self.upload_if_complete(&key)
    }

    /// Adds the model trained on the full dataset.
    pub fn accept_full_model(
        &mut self,
        task: &Task,
        expected_batches: usize,
        component: &dyn OptionHandler,
        model: FullModel,
    ) -> Result<Option<u32>, ExperimentError> {
        let key = Self::key(task, component);
        let executed = self.collecting_entry(&key, task, expected_batches, component, true)?;
        executed.add_full_model(model);
        self.upload_if_complete(&key)
    }

    /// Uploads an error run. Returns `None` when this configuration already failed on the task.
    pub fn accept_error(
        &mut self,
        task: &Task,
        component: &dyn OptionHandler,
        message: &str,
    ) -> Result<Option<u32>, ExperimentError> {
        let key = Self::key(task, component);
        self.collecting.remove(&key);
        if !self.reported_errors.insert(key.clone()) {
            debug!(key, "Error already reported");
            return Ok(None);
        }

        let run = self.describe_run(task, component, Some(message.to_string()))?;
        let run_id = self.service.run_upload(&run, &BTreeMap::new())?;
        warn!(run_id, task_id = task.id, error = message, "Uploaded error run");
        self.run_ids.push(run_id);
        Ok(Some(run_id))
    }
}
