use super::{Capability, ComponentRegistry, OptionDescriptor, OptionHandler};
use crate::error::ComponentError;
use crate::options::{OptionCursor, SEPARATOR, embed_component};

/// One option of a [`ComponentSchema`].
#[derive(Debug, Clone, Copy)]
pub enum OptionSpec {
    /// A 0-argument switch, off by default.
    Flag {
        name: &'static str,
        description: &'static str,
    },
    /// A single value. `None` means the option is omitted from the tokens until set.
    Value {
        name: &'static str,
        default: Option<&'static str>,
        description: &'static str,
    },
    /// A value that may be given several times under the same name.
    Repeated {
        name: &'static str,
        defaults: &'static [&'static str],
        description: &'static str,
    },
    /// One or more embedded components, each held as a single `"Type opts..."` token.
    Embedded {
        name: &'static str,
        defaults: &'static [&'static str],
        repeated: bool,
        description: &'static str,
    },
    /// A base learner named by type; its options trail after the separator.
    BaseLearner {
        name: &'static str,
        default: &'static str,
        description: &'static str,
    },
}

impl OptionSpec {
    pub const fn flag(name: &'static str, description: &'static str) -> Self {
        Self::Flag { name, description }
    }

    pub const fn value(name: &'static str, default: &'static str, description: &'static str) -> Self {
        Self::Value {
            name,
            default: Some(default),
            description,
        }
    }

    pub const fn unset(name: &'static str, description: &'static str) -> Self {
        Self::Value {
            name,
            default: None,
            description,
        }
    }

    pub const fn repeated(
        name: &'static str,
        defaults: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self::Repeated {
            name,
            defaults,
            description,
        }
    }

    pub const fn embedded(
        name: &'static str,
        defaults: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self::Embedded {
            name,
            defaults,
            repeated: false,
            description,
        }
    }

    pub const fn embedded_list(
        name: &'static str,
        defaults: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self::Embedded {
            name,
            defaults,
            repeated: true,
            description,
        }
    }

    pub const fn learner(name: &'static str, default: &'static str, description: &'static str) -> Self {
        Self::BaseLearner {
            name,
            default,
            description,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Flag { name, .. }
            | Self::Value { name, .. }
            | Self::Repeated { name, .. }
            | Self::Embedded { name, .. }
            | Self::BaseLearner { name, .. } => name,
        }
    }

    fn descriptor(&self) -> OptionDescriptor {
        match *self {
            Self::Flag { name, description } => {
                OptionDescriptor::new(name, 0, format!("-{}", name), description)
            }
            Self::Value {
                name, description, ..
            } => OptionDescriptor::new(name, 1, format!("-{} <value>", name), description),
            Self::Repeated {
                name, description, ..
            } => OptionDescriptor::new(name, 1, format!("-{} <value>", name), description)
                .repeatable(),
            Self::Embedded {
                name,
                description,
                repeated,
                ..
            } => {
                let descriptor = OptionDescriptor::new(
                    name,
                    1,
                    format!("-{} <component specification>", name),
                    description,
                );
                if repeated { descriptor.repeatable() } else { descriptor }
            }
            Self::BaseLearner {
                name, description, ..
            } => OptionDescriptor::new(name, 1, format!("-{} <classifier name>", name), description),
        }
    }
}

/// Static description of a component type: its name, capabilities and options.
#[derive(Debug)]
pub struct ComponentSchema {
    pub type_name: &'static str,
    pub revision: Option<&'static str>,
    pub capabilities: &'static [Capability],
    pub technical_information: Option<&'static str>,
    pub options: &'static [OptionSpec],
}

#[derive(Debug, Clone)]
enum Slot {
    Flag(bool),
    Value(Option<String>),
    Values(Vec<String>),
    Components(Vec<Box<dyn OptionHandler>>),
    Learner(Box<dyn OptionHandler>),
}

/// A component whose behaviour is fully described by a [`ComponentSchema`].
///
/// `set_options` resets every option to its default before applying the given tokens, and rejects
/// tokens that no option claims.
#[derive(Debug, Clone)]
pub struct SchemaComponent {
    schema: &'static ComponentSchema,
    slots: Vec<Slot>,
}

impl SchemaComponent {
    /// Creates a component holding the schema's defaults.
    pub fn new(
        schema: &'static ComponentSchema,
        registry: &ComponentRegistry,
    ) -> Result<Self, ComponentError> {
        let slots = Self::read_slots(schema, OptionCursor::default(), registry)?;
        Ok(Self { schema, slots })
    }

    pub fn schema(&self) -> &'static ComponentSchema {
        self.schema
    }

    fn read_slots(
        schema: &'static ComponentSchema,
        mut cursor: OptionCursor,
        registry: &ComponentRegistry,
    ) -> Result<Vec<Slot>, ComponentError> {
        let mut slots = Vec::with_capacity(schema.options.len());

        for spec in schema.options {
            let slot = match *spec {
                OptionSpec::Flag { name, .. } => Slot::Flag(cursor.take_flag(name)),
                OptionSpec::Value { name, default, .. } => Slot::Value(
                    cursor
                        .take_option(name)?
                        .or_else(|| default.map(str::to_string)),
                ),
                OptionSpec::Repeated { name, defaults, .. } => {
                    let values = cursor.take_all(name)?;
                    if values.is_empty() {
                        Slot::Values(defaults.iter().map(|d| d.to_string()).collect())
                    } else {
                        Slot::Values(values)
                    }
                }
                OptionSpec::Embedded {
                    name,
                    defaults,
                    repeated,
                    ..
                } => {
                    let mut specs = if repeated {
                        cursor.take_all(name)?
                    } else {
                        cursor.take_option(name)?.into_iter().collect()
                    };
                    if specs.is_empty() {
                        specs = defaults.iter().map(|d| d.to_string()).collect();
                    }
                    let components = specs
                        .iter()
                        .map(|spec| registry.create_from_spec(spec))
                        .collect::<Result<Vec<_>, _>>()?;
                    Slot::Components(components)
                }
                OptionSpec::BaseLearner { name, default, .. } => {
                    let type_name = cursor
                        .take_option(name)?
                        .unwrap_or_else(|| default.to_string());
                    let is_classifier = registry
                        .resolve(&type_name)
                        .ok_or_else(|| ComponentError::UnknownType(type_name.clone()))?
                        .has(Capability::Classifier);
                    if !is_classifier {
                        return Err(ComponentError::WrongComponentFamily {
                            type_name: schema.type_name.to_string(),
                            option: name.to_string(),
                            expected: "classifier".to_string(),
                            found: type_name,
                        });
                    }
                    let trailing = cursor.take_trailing();
                    Slot::Learner(registry.create_with_options(&type_name, &trailing)?)
                }
            };
            slots.push(slot);
        }

        if !cursor.is_exhausted() {
            return Err(ComponentError::IllegalOptions {
                type_name: schema.type_name.to_string(),
                remaining: cursor.remaining(),
            });
        }

        Ok(slots)
    }
}

impl OptionHandler for SchemaComponent {
    fn type_name(&self) -> &str {
        self.schema.type_name
    }

    fn list_options(&self) -> Vec<OptionDescriptor> {
        let mut descriptors: Vec<OptionDescriptor> =
            self.schema.options.iter().map(OptionSpec::descriptor).collect();

        // Options of single nested objects follow their own sentinel.
        for (spec, slot) in self.schema.options.iter().zip(&self.slots) {
            let nested = match (spec, slot) {
                (OptionSpec::BaseLearner { .. }, Slot::Learner(learner)) => {
                    Some(("classifier", learner))
                }
                (OptionSpec::Embedded { repeated: false, .. }, Slot::Components(components)) => {
                    components.first().map(|c| ("component", c))
                }
                _ => None,
            };
            if let Some((role, component)) = nested {
                descriptors.push(OptionDescriptor::sentinel(&format!(
                    "{} {}",
                    role,
                    component.type_name()
                )));
                descriptors.extend(component.list_options());
            }
        }

        descriptors
    }

    fn get_options(&self) -> Vec<String> {
        let mut primary = Vec::new();
        let mut trailing = Vec::new();

        for (spec, slot) in self.schema.options.iter().zip(&self.slots) {
            let flag = format!("-{}", spec.name());
            match slot {
                Slot::Flag(true) => primary.push(flag),
                Slot::Flag(false) | Slot::Value(None) => {}
                Slot::Value(Some(value)) => {
                    primary.push(flag);
                    primary.push(value.clone());
                }
                Slot::Values(values) => {
                    for value in values {
                        primary.push(flag.clone());
                        primary.push(value.clone());
                    }
                }
                Slot::Components(components) => {
                    for component in components {
                        primary.push(flag.clone());
                        primary.push(embed_component(
                            component.type_name(),
                            &component.get_options(),
                        ));
                    }
                }
                Slot::Learner(learner) => {
                    primary.push(flag);
                    primary.push(learner.type_name().to_string());
                    let options = learner.get_options();
                    if !options.is_empty() {
                        trailing.push(SEPARATOR.to_string());
                        trailing.extend(options);
                    }
                }
            }
        }

        primary.extend(trailing);
        primary
    }

    fn set_options(
        &mut self,
        options: &[String],
        registry: &ComponentRegistry,
    ) -> Result<(), ComponentError> {
        let cursor = OptionCursor::new(options.iter().cloned());
        self.slots = Self::read_slots(self.schema, cursor, registry)?;
        Ok(())
    }

    fn revision(&self) -> Option<&str> {
        self.schema.revision
    }

    fn technical_information(&self) -> Option<String> {
        self.schema.technical_information.map(str::to_string)
    }

    fn clone_box(&self) -> Box<dyn OptionHandler> {
        Box::new(self.clone())
    }
}
