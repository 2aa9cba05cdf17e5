//! Flows: canonical descriptions of configured, possibly composite, components.
//!
//! A [`FlowNode`] is built by the [`FlowSerializer`] from a live component, can be turned back into
//! option tokens (with default or concrete values), and is the structure setups are extracted
//! against.

use crate::error::{ReconstructionError, SerializationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod builder;
mod classify;
mod deserialize;
pub mod markup;
mod setup;

pub use builder::{FlowSerializer, FlowSerializerBuilder};
pub use classify::ParameterClassifier;
pub use setup::{ParameterSetting, SetupDescriptor};

/// The semantic kind of a flow parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    /// A 0-argument switch with value `"true"` or `"false"`.
    #[serde(rename = "flag")]
    Flag,
    /// A single scalar value.
    #[serde(rename = "option")]
    Option,
    /// Zero or more values under the same name, stored verbatim.
    #[serde(rename = "array")]
    Array,
    /// A base learner whose options trail after the separator.
    #[serde(rename = "classifier")]
    Classifier,
    /// One or more embedded components, each carried as one token.
    #[serde(rename = "optionhandler")]
    OptionHandler,
    /// A reference to a component type without options.
    #[serde(rename = "parameterfree_class")]
    ParameterFreeClass,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Option => "option",
            Self::Array => "array",
            Self::Classifier => "classifier",
            Self::OptionHandler => "optionhandler",
            Self::ParameterFreeClass => "parameterfree_class",
        }
    }

    /// Kinds that are decided by resolving values to component types.
    pub fn is_nested_candidate(&self) -> bool {
        !matches!(self, Self::Flag | Self::Option)
    }

    pub fn allows_multiple_values(&self) -> bool {
        matches!(self, Self::Array | Self::OptionHandler)
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(Self::Flag),
            "option" => Ok(Self::Option),
            "array" => Ok(Self::Array),
            "classifier" => Ok(Self::Classifier),
            "optionhandler" => Ok(Self::OptionHandler),
            "parameterfree_class" => Ok(Self::ParameterFreeClass),
            other => Err(format!("unknown parameter kind '{}'", other)),
        }
    }
}

/// One declared parameter of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowParameter {
    pub name: String,
    pub kind: ParameterKind,
    /// JSON array of strings; `None` for array-kind parameters.
    pub default_value: Option<String>,
    pub description: String,
}

impl FlowParameter {
    /// Decoded default values, empty when there is no default.
    pub fn default_values(&self, flow: &str) -> Result<Vec<String>, ReconstructionError> {
        match &self.default_value {
            Some(json) => decode_values(json).map_err(|message| ReconstructionError::InvalidValue {
                flow: flow.to_string(),
                parameter: self.name.clone(),
                message,
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// One configured component instance and, recursively, its nested components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Assigned by the tracking service once the flow is stored.
    pub id: Option<u32>,
    /// Structural name: `Type(child1,child2,...)`.
    pub name: String,
    pub class_name: String,
    pub external_version: String,
    pub description: String,
    pub language: String,
    pub dependencies: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub parameters: IndexMap<String, FlowParameter>,
    /// Child flows keyed by slot (`name` or `name_<index>`).
    #[serde(default)]
    pub components: IndexMap<String, FlowNode>,
}

impl FlowNode {
    /// The type name without the parenthesized component list.
    pub fn base_name(&self) -> &str {
        self.name.split('(').next().unwrap_or(&self.name)
    }

    pub fn parameter(&self, name: &str) -> Option<&FlowParameter> {
        self.parameters.get(name)
    }

    pub fn component(&self, slot: &str) -> Option<&FlowNode> {
        self.components.get(slot)
    }

    /// The child at `slot`, or a reconstruction error naming this flow.
    pub(crate) fn require_component(&self, slot: &str) -> Result<&FlowNode, ReconstructionError> {
        self.component(slot)
            .ok_or_else(|| ReconstructionError::MissingComponent {
                flow: self.name.clone(),
                slot: slot.to_string(),
            })
    }

    pub(crate) fn require_id(&self) -> Result<u32, ReconstructionError> {
        self.id
            .ok_or_else(|| ReconstructionError::MissingFlowId(self.name.clone()))
    }

    /// Number of nodes in this tree, including this one.
    pub fn count_components(&self) -> usize {
        1 + self
            .components
            .values()
            .map(FlowNode::count_components)
            .sum::<usize>()
    }

    /// True when this node and every nested node carry an id.
    pub fn has_ids(&self) -> bool {
        self.id.is_some() && self.components.values().all(FlowNode::has_ids)
    }

    /// Finds the node with `id` in this tree.
    pub fn find(&self, id: u32) -> Option<&FlowNode> {
        if self.id == Some(id) {
            return Some(self);
        }
        self.components.values().find_map(|c| c.find(id))
    }

    /// Clears every id in the tree.
    pub fn strip_ids(&mut self) {
        self.id = None;
        for component in self.components.values_mut() {
            component.strip_ids();
        }
    }
}

/// Encodes values as a JSON array of strings.
pub fn encode_values<S: AsRef<str>>(values: &[S]) -> Result<String, SerializationError> {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&values).map_err(|e| SerializationError::Encoding(e.to_string()))
}

/// Decodes a JSON array of strings.
pub fn decode_values(json: &str) -> Result<Vec<String>, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// Slot key of the `index`-th component held by parameter `name`.
pub fn indexed_slot(name: &str, index: usize) -> String {
    format!("{}_{}", name, index)
}
