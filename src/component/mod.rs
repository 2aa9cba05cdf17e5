//! The component model: option-handling objects, the capabilities they advertise, and the
//! registry that instantiates them by type name.

use crate::error::ComponentError;
use crate::options::embed_component;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;
mod registry;
mod schema;

pub use registry::{ComponentEntry, ComponentFactory, ComponentRegistry};
pub use schema::{ComponentSchema, OptionSpec, SchemaComponent};

/// Synopsis prefix of the descriptor that introduces the options of an embedded sub-object.
pub const SENTINEL_PREFIX: &str = "\nOptions specific to";

/// A structural capability a registered component type advertises.
///
/// The parameter classifier decides a parameter's kind by looking these tags up for the types
/// named in the parameter's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Describes one dimension of a parameter sweep; stored verbatim, never expanded.
    SweepDescriptor,
    /// A learner that can wrap or be wrapped by other learners.
    Classifier,
    /// Accepts its own option tokens.
    OptionHandling,
    /// A marker type without configurable options.
    ParameterFree,
}

/// One declared hyperparameter, as listed by [`OptionHandler::list_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub name: String,
    /// 0 for boolean switches, otherwise the number of tokens the option consumes.
    pub num_arguments: usize,
    pub synopsis: String,
    pub description: String,
    /// The option may be given several times under the same name.
    pub repeatable: bool,
}

impl OptionDescriptor {
    pub fn new(
        name: impl Into<String>,
        num_arguments: usize,
        synopsis: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            num_arguments,
            synopsis: synopsis.into(),
            description: description.into(),
            repeatable: false,
        }
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// The marker after which all listed options belong to an embedded sub-object.
    pub fn sentinel(subject: &str) -> Self {
        Self::new("", 0, format!("{} {}:", SENTINEL_PREFIX, subject), "")
    }

    pub fn is_sentinel(&self) -> bool {
        self.name.is_empty() && self.synopsis.starts_with(SENTINEL_PREFIX)
    }
}

/// An object configured through option tokens.
pub trait OptionHandler: fmt::Debug + Send + Sync {
    /// The registered type name, e.g. `"J48"`.
    fn type_name(&self) -> &str;

    /// Declared hyperparameters in the order the type exposes them.
    fn list_options(&self) -> Vec<OptionDescriptor>;

    /// The current configuration as option tokens.
    fn get_options(&self) -> Vec<String>;

    /// Replaces the configuration. Options that are not mentioned fall back to their defaults.
    fn set_options(
        &mut self,
        options: &[String],
        registry: &ComponentRegistry,
    ) -> Result<(), ComponentError>;

    fn revision(&self) -> Option<&str> {
        None
    }

    fn technical_information(&self) -> Option<String> {
        None
    }

    fn clone_box(&self) -> Box<dyn OptionHandler>;

    /// The type name followed by the joined option tokens.
    fn to_command_line(&self) -> String {
        embed_component(self.type_name(), &self.get_options())
    }
}

impl Clone for Box<dyn OptionHandler> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
