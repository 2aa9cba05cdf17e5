use super::{FlowNode, FlowSerializer, ParameterKind, encode_values, indexed_slot};
use crate::error::ReconstructionError;
use crate::options::{OptionCursor, split_component};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One concrete parameter value of a setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterSetting {
    /// Id of the flow node that declares the parameter.
    pub component_id: u32,
    pub name: String,
    /// JSON array of strings.
    pub value: String,
}

impl ParameterSetting {
    pub fn new(component_id: u32, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            component_id,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A flow id and the flat list of settings configuring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupDescriptor {
    pub flow_id: u32,
    pub settings: Vec<ParameterSetting>,
}

impl SetupDescriptor {
    /// Settings sorted into a canonical order for equality checks.
    pub fn canonical_settings(&self) -> Vec<ParameterSetting> {
        let mut settings = self.settings.clone();
        settings.sort();
        settings
    }
}

impl FlowSerializer {
    /// Extracts the settings of a configured component from its option tokens.
    ///
    /// `flow` must be the id-carrying flow that structurally matches the tokens. Settings of
    /// nested components precede the settings of the component that holds them.
    ///
    /// Equal sub-flows share an id, so a setting repeated under the same (component id, name)
    /// is kept once. Repeats with different values cannot be told apart and are rejected.
    pub fn extract_setup(
        &self,
        options: &[String],
        flow: &FlowNode,
    ) -> Result<Vec<ParameterSetting>, ReconstructionError> {
        let mut collected = Vec::new();
        let mut cursor = OptionCursor::new(options.iter().cloned());
        self.collect_settings(&mut cursor, flow, &mut collected)?;

        let mut seen: AHashMap<(u32, String), String> = AHashMap::new();
        let mut settings = Vec::with_capacity(collected.len());
        for setting in collected {
            let key = (setting.component_id, setting.name.clone());
            match seen.get(&key) {
                Some(value) if *value == setting.value => continue,
                Some(_) => {
                    return Err(ReconstructionError::ConflictingSettings {
                        component_id: setting.component_id,
                        parameter: setting.name,
                    });
                }
                None => {
                    seen.insert(key, setting.value.clone());
                    settings.push(setting);
                }
            }
        }
        Ok(settings)
    }

    fn collect_settings(
        &self,
        cursor: &mut OptionCursor,
        flow: &FlowNode,
        settings: &mut Vec<ParameterSetting>,
    ) -> Result<(), ReconstructionError> {
        let id = flow.require_id()?;
        let mut own = Vec::with_capacity(flow.parameters.len());

        for parameter in flow.parameters.values() {
            let name = parameter.name.as_str();
            let values = match parameter.kind {
                ParameterKind::Flag => vec![cursor.take_flag(name).to_string()],
                ParameterKind::Option => cursor.take_option(name)?.into_iter().collect(),
                ParameterKind::ParameterFreeClass => {
                    let value = cursor.take_option(name)?;
                    if value.is_some() {
                        let child = flow.require_component(name)?;
                        self.collect_settings(&mut OptionCursor::default(), child, settings)?;
                    }
                    value.into_iter().collect()
                }
                ParameterKind::Array => cursor.take_all(name)?,
                ParameterKind::Classifier => {
                    let value = cursor.take_option(name)?;
                    let mut trailing = OptionCursor::new(cursor.take_trailing());
                    let child = flow.require_component(&indexed_slot(name, 0))?;
                    self.collect_settings(&mut trailing, child, settings)?;
                    value.into_iter().collect()
                }
                ParameterKind::OptionHandler => {
                    let values = cursor.take_all(name)?;
                    for (i, value) in values.iter().enumerate() {
                        let child = flow.require_component(&indexed_slot(name, i))?;
                        let options = split_component(value)?
                            .map(|(_, options)| options)
                            .unwrap_or_default();
                        self.collect_settings(&mut OptionCursor::new(options), child, settings)?;
                    }
                    values
                }
            };

            if !values.is_empty() {
                let value = encode_values(&values).map_err(|e| ReconstructionError::InvalidValue {
                    flow: flow.name.clone(),
                    parameter: name.to_string(),
                    message: e.to_string(),
                })?;
                let limit = self.config.max_value_length;
                if value.len() > limit {
                    return Err(ReconstructionError::ValueTooLong {
                        flow: flow.name.clone(),
                        parameter: name.to_string(),
                        length: value.len(),
                        limit,
                    });
                }
                own.push(ParameterSetting::new(id, name, value));
            }
        }

        settings.append(&mut own);
        Ok(())
    }
}
