//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kiroku crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use kiroku::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let config = Config::load("kiroku.toml")?;
//! let serializer = FlowSerializer::builder().with_config(&config).build();
//!
//! let bagging = serializer
//!     .registry()
//!     .create_from_spec("Bagging -I 25 -W REPTree -- -M 4")?;
//! let flow = serializer.serialize(bagging.as_ref(), &config.tags)?;
//! println!("{} has {} nested components", flow.name, flow.count_components());
//! # Ok(())
//! # }
//! ```

// Components and options
pub use crate::component::{
    Capability, ComponentRegistry, OptionDescriptor, OptionHandler, SchemaComponent,
};
pub use crate::options::{OptionCursor, join_options, split_options};

// Flows and setups
pub use crate::flow::markup::{from_markup, to_markup};
pub use crate::flow::{
    FlowNode, FlowParameter, FlowSerializer, ParameterKind, ParameterSetting, SetupDescriptor,
};

// Tracking
pub use crate::tracker::{LocalTracker, TrackingService, find_setup_id, register_flow};

// Experiments
pub use crate::experiment::{
    DataSplits, EstimationProcedure, ExperimentDriver, SplitEvaluator, Task, TaskOutcome, TaskType,
};

pub use crate::config::Config;
pub use crate::error::{
    ComponentError, ExperimentError, ReconstructionError, SerializationError, TrackerError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
