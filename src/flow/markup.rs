//! The markup documents exchanged with the tracking service.
//!
//! Flows, setups and runs travel as JSON documents. Every field of a [`FlowNode`] tree survives a
//! `to_markup` / `from_markup` round trip, including ids and the declaration order of parameters
//! and components.
//!
//! [`FlowNode`]: super::FlowNode

use crate::error::TrackerError;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn to_markup<T: Serialize>(document: &T) -> Result<String, TrackerError> {
    serde_json::to_string_pretty(document).map_err(|e| TrackerError::Markup(e.to_string()))
}

pub fn from_markup<T: DeserializeOwned>(markup: &str) -> Result<T, TrackerError> {
    serde_json::from_str(markup).map_err(|e| TrackerError::Markup(e.to_string()))
}
