use super::{
    FlowNode, FlowParameter, ParameterClassifier, ParameterKind, encode_values, indexed_slot,
};
use crate::component::{ComponentEntry, ComponentRegistry, OptionHandler};
use crate::config::{Config, SerializationConfig, ToolkitConfig};
use crate::error::SerializationError;
use crate::options::OptionCursor;
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

/// Converts between live components and flows.
///
/// Serialization lives here; flow and setup reconstruction and setup extraction are implemented in
/// the sibling modules on the same type.
#[derive(Debug, Clone)]
pub struct FlowSerializer {
    pub(super) registry: ComponentRegistry,
    pub(super) config: SerializationConfig,
    pub(super) toolkit: ToolkitConfig,
}

pub struct FlowSerializerBuilder {
    registry: ComponentRegistry,
    config: SerializationConfig,
    toolkit: ToolkitConfig,
}

impl Default for FlowSerializerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowSerializerBuilder {
    /// Starts from the reference catalog and default configuration.
    pub fn new() -> Self {
        Self {
            registry: ComponentRegistry::with_default_components(),
            config: SerializationConfig::default(),
            toolkit: ToolkitConfig::default(),
        }
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.config = config.serialization.clone();
        self.toolkit = config.toolkit.clone();
        self
    }

    pub fn with_serialization_config(mut self, config: SerializationConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the registry, dropping the reference catalog.
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_component(mut self, entry: ComponentEntry) -> Self {
        self.registry.register(entry);
        self
    }

    pub fn build(self) -> FlowSerializer {
        FlowSerializer {
            registry: self.registry,
            config: self.config,
            toolkit: self.toolkit,
        }
    }
}

impl Default for FlowSerializer {
    fn default() -> Self {
        FlowSerializerBuilder::new().build()
    }
}

impl FlowSerializer {
    pub fn builder() -> FlowSerializerBuilder {
        FlowSerializerBuilder::new()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SerializationConfig {
        &self.config
    }

    pub fn toolkit(&self) -> &ToolkitConfig {
        &self.toolkit
    }

    /// Builds the flow of a configured component.
    ///
    /// A fresh instance of the same type supplies the default tokens and the declared parameters.
    /// Declared parameters are read up to the first sentinel descriptor; the options behind it
    /// belong to a nested component and are serialized with that component.
    pub fn serialize(
        &self,
        component: &dyn OptionHandler,
        tags: &[String],
    ) -> Result<FlowNode, SerializationError> {
        let type_name = component.type_name();
        let fresh = self.registry.create(type_name)?;
        let classifier = ParameterClassifier::new(&self.registry, &self.config.kind_precedence);

        let mut defaults = OptionCursor::new(fresh.get_options());
        let mut current = OptionCursor::new(component.get_options());
        let mut parameters: IndexMap<String, FlowParameter> = IndexMap::new();
        let mut components: IndexMap<String, FlowNode> = IndexMap::new();

        for descriptor in fresh.list_options() {
            if descriptor.is_sentinel() {
                break;
            }
            let name = descriptor.name.clone();
            if parameters.contains_key(&name) {
                return Err(SerializationError::DuplicateParameter {
                    component: type_name.to_string(),
                    parameter: name,
                });
            }
            if name.trim().is_empty() {
                return Err(SerializationError::EmptyParameterName {
                    component: type_name.to_string(),
                });
            }

            let (default_values, current_values) = if descriptor.num_arguments == 0 {
                (
                    vec![defaults.take_flag(&name).to_string()],
                    vec![current.take_flag(&name).to_string()],
                )
            } else {
                (defaults.take_all(&name)?, current.take_all(&name)?)
            };

            let kind = classifier.classify(type_name, &descriptor, &default_values, &current_values)?;
            debug!(
                component = type_name,
                parameter = %name,
                kind = %kind,
                defaults = ?default_values,
                current = ?current_values,
                "Classified parameter"
            );

            let default_value = match kind {
                ParameterKind::Flag | ParameterKind::Option => Some(encode_values(&default_values)?),
                ParameterKind::Array => None,
                ParameterKind::Classifier => Some(encode_values(&current_values[..1])?),
                ParameterKind::OptionHandler | ParameterKind::ParameterFreeClass => {
                    Some(encode_values(&current_values)?)
                }
            };
            if let Some(encoded) = &default_value {
                if encoded.len() > self.config.max_value_length {
                    return Err(SerializationError::ValueTooLong {
                        component: type_name.to_string(),
                        parameter: name,
                        length: encoded.len(),
                        limit: self.config.max_value_length,
                    });
                }
            }

            match kind {
                ParameterKind::Classifier => {
                    let trailing = current.take_trailing();
                    let child = self
                        .registry
                        .create_with_options(&current_values[0], &trailing)?;
                    components.insert(indexed_slot(&name, 0), self.serialize(child.as_ref(), tags)?);
                }
                ParameterKind::OptionHandler => {
                    for (i, value) in current_values.iter().enumerate() {
                        let child = self.registry.create_from_spec(value)?;
                        components
                            .insert(indexed_slot(&name, i), self.serialize(child.as_ref(), tags)?);
                    }
                }
                ParameterKind::ParameterFreeClass => {
                    if current_values.len() != 1 {
                        return Err(SerializationError::AmbiguousParameter {
                            component: type_name.to_string(),
                            parameter: name,
                            message: format!(
                                "expected exactly one parameter-free component, got {}",
                                current_values.len()
                            ),
                        });
                    }
                    let child = self.registry.create_from_spec(&current_values[0])?;
                    components.insert(name.clone(), self.serialize(child.as_ref(), tags)?);
                }
                ParameterKind::Flag | ParameterKind::Option | ParameterKind::Array => {}
            }

            parameters.insert(
                name.clone(),
                FlowParameter {
                    name,
                    kind,
                    default_value,
                    description: descriptor.description.clone(),
                },
            );
        }

        let flow = self.assemble(fresh.as_ref(), parameters, components, tags)?;
        debug!(
            flow = %flow.name,
            parameters = flow.parameters.len(),
            components = flow.components.len(),
            "Serialized flow"
        );
        Ok(flow)
    }

    /// Builds a flow for a component given by type name and option tokens.
    pub fn serialize_options(
        &self,
        type_name: &str,
        options: &[String],
        tags: &[String],
    ) -> Result<FlowNode, SerializationError> {
        let component = self.registry.create_with_options(type_name, options)?;
        self.serialize(component.as_ref(), tags)
    }

    fn assemble(
        &self,
        fresh: &dyn OptionHandler,
        parameters: IndexMap<String, FlowParameter>,
        components: IndexMap<String, FlowNode>,
        tags: &[String],
    ) -> Result<FlowNode, SerializationError> {
        let class_name = fresh.type_name().to_string();
        let name = if components.is_empty() {
            class_name.clone()
        } else {
            format!(
                "{}({})",
                class_name,
                components.values().map(|c| c.name.as_str()).join(",")
            )
        };

        let length = name.chars().count();
        if length > self.config.max_name_length {
            return Err(SerializationError::NameTooLong {
                name,
                length,
                limit: self.config.max_name_length,
            });
        }
        if parameters.len() > self.config.max_parameters {
            return Err(SerializationError::TooManyParameters {
                component: name,
                count: parameters.len(),
                limit: self.config.max_parameters,
            });
        }

        let revision = fresh
            .revision()
            .filter(|r| !r.is_empty() && r.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("undefined");
        let dependencies = self.toolkit.dependency();

        Ok(FlowNode {
            id: None,
            name,
            class_name,
            external_version: format!("{}_{}", dependencies, revision),
            description: fresh
                .technical_information()
                .unwrap_or_else(|| self.config.description.clone()),
            language: self.config.language.clone(),
            dependencies,
            tags: self.toolkit.tags.iter().chain(tags).unique().cloned().collect(),
            parameters,
            components,
        })
    }
}
