//! The experiment-tracking service boundary.
//!
//! [`TrackingService`] is the contract the rest of the crate talks to; [`LocalTracker`] is an
//! in-process implementation that stores everything in memory and can persist itself to disk.

use crate::error::TrackerError;
use crate::flow::{FlowNode, ParameterSetting, SetupDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod local;
mod lookup;

pub use local::LocalTracker;
pub use lookup::{find_setup_id, register_flow};

/// One named score attached to a run, optionally scoped to a repeat, fold and sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub name: String,
    pub value: f64,
    pub repeat: Option<usize>,
    pub fold: Option<usize>,
    pub sample: Option<usize>,
}

impl EvaluationScore {
    /// A score that covers the whole run.
    pub fn total(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            repeat: None,
            fold: None,
            sample: None,
        }
    }

    pub fn for_split(
        name: impl Into<String>,
        value: f64,
        repeat: usize,
        fold: usize,
        sample: Option<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            repeat: Some(repeat),
            fold: Some(fold),
            sample,
        }
    }
}

/// Everything uploaded for one run apart from its output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDescriptor {
    pub task_id: u32,
    pub flow_id: u32,
    /// Type name followed by the option string the run was configured with.
    pub setup_string: String,
    pub settings: Vec<ParameterSetting>,
    pub tags: Vec<String>,
    pub evaluations: Vec<EvaluationScore>,
    /// Set for runs that failed; such runs carry no output files.
    pub error_message: Option<String>,
}

impl RunDescriptor {
    pub fn setup(&self) -> SetupDescriptor {
        SetupDescriptor {
            flow_id: self.flow_id,
            settings: self.settings.clone(),
        }
    }
}

/// Operations the crate needs from an experiment-tracking service.
///
/// Failures are reported as errors; an absent flow or setup is `Ok(None)`.
pub trait TrackingService {
    /// Id of the flow with this structural name and external version, if stored.
    fn flow_exists(&self, name: &str, external_version: &str) -> Result<Option<u32>, TrackerError>;

    /// Stores a flow tree and returns the id of its root.
    fn flow_upload(&mut self, flow: &FlowNode) -> Result<u32, TrackerError>;

    /// The stored flow tree, with ids on every node.
    fn flow_get(&self, id: u32) -> Result<FlowNode, TrackerError>;

    fn setup_exists(&self, setup: &SetupDescriptor) -> Result<Option<u32>, TrackerError>;

    /// The setup's settings, in the order they were first uploaded.
    fn setup_parameters(&self, setup_id: u32) -> Result<SetupDescriptor, TrackerError>;

    /// Stores a run with its output files (name to content) and returns the run id.
    fn run_upload(
        &mut self,
        run: &RunDescriptor,
        files: &BTreeMap<String, String>,
    ) -> Result<u32, TrackerError>;

    /// Ids of the runs of `setup_id` on `task_id`.
    fn runs_for(&self, task_id: u32, setup_id: u32) -> Result<Vec<u32>, TrackerError>;
}
