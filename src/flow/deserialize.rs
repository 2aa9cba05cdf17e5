use super::{FlowNode, FlowSerializer, ParameterKind, ParameterSetting, decode_values, indexed_slot};
use crate::component::OptionHandler;
use crate::error::ReconstructionError;
use crate::options::{SEPARATOR, embed_component, split_component};
use ahash::AHashMap;
use tracing::debug;

/// Option tokens split into the component's own options and the options of its base learner.
#[derive(Default)]
struct Tokens {
    primary: Vec<String>,
    trailing: Vec<String>,
}

impl Tokens {
    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.primary.push(format!("-{}", name));
        self.primary.push(value.into());
    }

    fn push_learner(&mut self, name: &str, type_name: String, options: Vec<String>) {
        self.push(name, type_name);
        if !options.is_empty() {
            self.trailing.push(SEPARATOR.to_string());
            self.trailing.extend(options);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.primary.append(&mut self.trailing);
        self.primary
    }
}

/// Settings grouped by component id, then by parameter name.
type SettingIndex<'s> = AHashMap<u32, AHashMap<&'s str, &'s ParameterSetting>>;

impl FlowSerializer {
    /// Option tokens that configure a flow's default configuration.
    pub fn default_options(&self, flow: &FlowNode) -> Result<Vec<String>, ReconstructionError> {
        let mut tokens = Tokens::default();

        for parameter in flow.parameters.values() {
            let name = parameter.name.as_str();
            let values = parameter.default_values(&flow.name)?;
            match parameter.kind {
                ParameterKind::Flag => {
                    if values.first().is_some_and(|v| v == "true") {
                        tokens.primary.push(format!("-{}", name));
                    }
                }
                ParameterKind::Option | ParameterKind::ParameterFreeClass => {
                    if let Some(value) = values.into_iter().next() {
                        tokens.push(name, value);
                    }
                }
                ParameterKind::Array => {}
                ParameterKind::Classifier => {
                    let child = flow.require_component(&indexed_slot(name, 0))?;
                    tokens.push_learner(name, child.class_name.clone(), self.default_options(child)?);
                }
                ParameterKind::OptionHandler => {
                    for i in 0..values.len() {
                        let child = flow.require_component(&indexed_slot(name, i))?;
                        let options = self.default_options(child)?;
                        tokens.push(name, embed_component(&child.class_name, &options));
                    }
                }
            }
        }

        Ok(tokens.finish())
    }

    /// Instantiates a component configured with a flow's defaults.
    pub fn deserialize_flow(
        &self,
        flow: &FlowNode,
    ) -> Result<Box<dyn OptionHandler>, ReconstructionError> {
        let options = self.default_options(flow)?;
        debug!(flow = %flow.name, options = ?options, "Reconstructing flow defaults");
        Ok(self.registry.create_with_options(&flow.class_name, &options)?)
    }

    /// Option tokens that reproduce the configuration recorded in a setup.
    ///
    /// Every node of `flow` must carry an id: settings are matched to nodes by
    /// (component id, parameter name). A pair listed twice must carry the same value.
    pub fn setup_to_options(
        &self,
        settings: &[ParameterSetting],
        flow: &FlowNode,
    ) -> Result<Vec<String>, ReconstructionError> {
        let mut index: SettingIndex<'_> = AHashMap::new();
        for setting in settings {
            let own = index.entry(setting.component_id).or_default();
            match own.get(setting.name.as_str()) {
                Some(existing) if existing.value != setting.value => {
                    return Err(ReconstructionError::ConflictingSettings {
                        component_id: setting.component_id,
                        parameter: setting.name.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    own.insert(setting.name.as_str(), setting);
                }
            }
        }
        Self::setup_tokens(&index, flow)
    }

    /// Instantiates a component configured as recorded in a setup.
    pub fn deserialize_setup(
        &self,
        settings: &[ParameterSetting],
        flow: &FlowNode,
    ) -> Result<Box<dyn OptionHandler>, ReconstructionError> {
        let options = self.setup_to_options(settings, flow)?;
        debug!(flow = %flow.name, options = ?options, "Reconstructing setup");
        Ok(self.registry.create_with_options(&flow.class_name, &options)?)
    }

    fn setup_tokens(
        index: &SettingIndex<'_>,
        flow: &FlowNode,
    ) -> Result<Vec<String>, ReconstructionError> {
        let id = flow.require_id()?;
        let empty = AHashMap::new();
        let own = index.get(&id).unwrap_or(&empty);

        if let Some(unknown) = own.keys().find(|name| !flow.parameters.contains_key(**name)) {
            return Err(ReconstructionError::UnknownParameter {
                flow: flow.name.clone(),
                parameter: unknown.to_string(),
            });
        }

        let mut tokens = Tokens::default();

        for parameter in flow.parameters.values() {
            let name = parameter.name.as_str();
            let Some(setting) = own.get(name) else {
                continue;
            };
            let values = decode_values(&setting.value).map_err(|message| {
                ReconstructionError::InvalidValue {
                    flow: flow.name.clone(),
                    parameter: parameter.name.clone(),
                    message,
                }
            })?;
            if values.len() > 1 && !parameter.kind.allows_multiple_values() {
                return Err(ReconstructionError::MultipleValues {
                    flow: flow.name.clone(),
                    parameter: parameter.name.clone(),
                });
            }

            match parameter.kind {
                ParameterKind::Flag => {
                    if values.first().is_some_and(|v| v == "true") {
                        tokens.primary.push(format!("-{}", name));
                    }
                }
                ParameterKind::Option | ParameterKind::ParameterFreeClass => {
                    if let Some(value) = values.into_iter().next() {
                        tokens.push(name, value);
                    }
                }
                ParameterKind::Array => {
                    for value in values {
                        tokens.push(name, value);
                    }
                }
                ParameterKind::Classifier => {
                    if let Some(value) = values.first() {
                        let type_name = Self::type_of(flow, name, value)?;
                        let child = flow.require_component(&indexed_slot(name, 0))?;
                        let options = Self::setup_tokens(index, child)?;
                        tokens.push_learner(name, type_name, options);
                    }
                }
                ParameterKind::OptionHandler => {
                    for (i, value) in values.iter().enumerate() {
                        let type_name = Self::type_of(flow, name, value)?;
                        let child = flow.require_component(&indexed_slot(name, i))?;
                        let options = Self::setup_tokens(index, child)?;
                        tokens.push(name, embed_component(&type_name, &options));
                    }
                }
            }
        }

        Ok(tokens.finish())
    }

    fn type_of(flow: &FlowNode, parameter: &str, value: &str) -> Result<String, ReconstructionError> {
        split_component(value)?
            .map(|(type_name, _)| type_name)
            .ok_or_else(|| ReconstructionError::InvalidValue {
                flow: flow.name.clone(),
                parameter: parameter.to_string(),
                message: "empty component specification".to_string(),
            })
    }
}
