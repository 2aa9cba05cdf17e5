use super::{RunDescriptor, TrackingService};
use crate::error::TrackerError;
use crate::flow::markup::{from_markup, to_markup};
use crate::flow::{FlowNode, ParameterSetting, SetupDescriptor};
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Settings are kept in the order they were uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSetup {
    flow_id: u32,
    settings: Vec<ParameterSetting>,
}

impl StoredSetup {
    fn matches(&self, flow_id: u32, canonical: &[ParameterSetting]) -> bool {
        let mut settings = self.settings.clone();
        settings.sort();
        self.flow_id == flow_id && settings == canonical
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRun {
    task_id: u32,
    setup_id: u32,
    markup: String,
    files: BTreeMap<String, String>,
}

/// An in-memory tracking service.
///
/// Flows are content-addressed by (structural name, external version); every nested node is
/// stored as a flow of its own, so equal sub-structures share ids. Setups are deduplicated by
/// flow id and their settings compared in sorted order. The whole store can be written to and read from a bincode
/// snapshot.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LocalTracker {
    flows: BTreeMap<u32, String>,
    flow_index: BTreeMap<(String, String), u32>,
    setups: BTreeMap<u32, StoredSetup>,
    runs: BTreeMap<u32, StoredRun>,
    next_id: u32,
}

impl LocalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    pub fn setup_count(&self) -> usize {
        self.setups.len()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// The stored run and its output files.
    pub fn run(&self, run_id: u32) -> Result<(RunDescriptor, &BTreeMap<String, String>), TrackerError> {
        let stored = self
            .runs
            .get(&run_id)
            .ok_or_else(|| TrackerError::Storage(format!("Run {} not found", run_id)))?;
        Ok((from_markup(&stored.markup)?, &stored.files))
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn store_flow(&mut self, flow: &FlowNode) -> Result<FlowNode, TrackerError> {
        let key = (flow.name.clone(), flow.external_version.clone());
        if let Some(&id) = self.flow_index.get(&key) {
            return self.flow_get(id);
        }

        let mut stored = flow.clone();
        for (slot, component) in &flow.components {
            let component = self.store_flow(component)?;
            stored.components.insert(slot.clone(), component);
        }
        let id = self.allocate_id();
        stored.id = Some(id);

        self.flows.insert(id, to_markup(&stored)?);
        self.flow_index.insert(key, id);
        debug!(flow = %stored.name, id, "Stored flow");
        Ok(stored)
    }

    fn find_setup(&self, setup: &SetupDescriptor) -> Option<u32> {
        let wanted = setup.canonical_settings();
        self.setups
            .iter()
            .find(|(_, stored)| stored.matches(setup.flow_id, &wanted))
            .map(|(&id, _)| id)
    }

    /// Writes the store to a bincode snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TrackerError> {
        let path = path.as_ref();
        let bytes = encode_to_vec(self, standard())
            .map_err(|e| TrackerError::Storage(format!("Serialization failed: {}", e)))?;
        fs::write(path, bytes).map_err(|e| {
            TrackerError::Storage(format!("Could not write '{}': {}", path.display(), e))
        })
    }

    /// Reads a store from a bincode snapshot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            TrackerError::Storage(format!("Could not read '{}': {}", path.display(), e))
        })?;
        decode_from_slice(&bytes, standard())
            .map(|(tracker, _)| tracker)
            .map_err(|e| TrackerError::Storage(format!("Deserialization failed: {}", e)))
    }
}

impl TrackingService for LocalTracker {
    fn flow_exists(&self, name: &str, external_version: &str) -> Result<Option<u32>, TrackerError> {
        Ok(self
            .flow_index
            .get(&(name.to_string(), external_version.to_string()))
            .copied())
    }

    fn flow_upload(&mut self, flow: &FlowNode) -> Result<u32, TrackerError> {
        if let Some(id) = self.flow_exists(&flow.name, &flow.external_version)? {
            return Err(TrackerError::Storage(format!(
                "Flow '{}' ({}) already exists with id {}",
                flow.name, flow.external_version, id
            )));
        }
        let stored = self.store_flow(flow)?;
        let id = stored.require_id()?;
        info!(flow = %stored.name, id, components = stored.count_components(), "Uploaded flow");
        Ok(id)
    }

    fn flow_get(&self, id: u32) -> Result<FlowNode, TrackerError> {
        let markup = self.flows.get(&id).ok_or(TrackerError::FlowNotFound(id))?;
        from_markup(markup)
    }

    fn setup_exists(&self, setup: &SetupDescriptor) -> Result<Option<u32>, TrackerError> {
        Ok(self.find_setup(setup))
    }

    fn setup_parameters(&self, setup_id: u32) -> Result<SetupDescriptor, TrackerError> {
        let stored = self
            .setups
            .get(&setup_id)
            .ok_or(TrackerError::SetupNotFound(setup_id))?;
        Ok(SetupDescriptor {
            flow_id: stored.flow_id,
            settings: stored.settings.clone(),
        })
    }

    fn run_upload(
        &mut self,
        run: &RunDescriptor,
        files: &BTreeMap<String, String>,
    ) -> Result<u32, TrackerError> {
        if !self.flows.contains_key(&run.flow_id) {
            return Err(TrackerError::FlowNotFound(run.flow_id));
        }

        let setup = run.setup();
        let setup_id = match self.find_setup(&setup) {
            Some(id) => id,
            None => {
                let id = self.allocate_id();
                self.setups.insert(
                    id,
                    StoredSetup {
                        flow_id: setup.flow_id,
                        settings: setup.settings,
                    },
                );
                id
            }
        };

        let run_id = self.allocate_id();
        self.runs.insert(
            run_id,
            StoredRun {
                task_id: run.task_id,
                setup_id,
                markup: to_markup(run)?,
                files: files.clone(),
            },
        );
        info!(
            run_id,
            task_id = run.task_id,
            setup_id,
            failed = run.error_message.is_some(),
            "Uploaded run"
        );
        Ok(run_id)
    }

    fn runs_for(&self, task_id: u32, setup_id: u32) -> Result<Vec<u32>, TrackerError> {
        Ok(self
            .runs
            .iter()
            .filter(|(_, run)| run.task_id == task_id && run.setup_id == setup_id)
            .map(|(&id, _)| id)
            .collect())
    }
}
