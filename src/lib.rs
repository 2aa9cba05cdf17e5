//! # Kiroku - Flow and Setup Serialization Engine
//!
//! **Kiroku** bridges option-configured learning components and experiment-tracking services.
//! A configured component, possibly nested (an ensemble wrapping a base learner, a classifier
//! holding a kernel, a filter chain), is described by a flat array of option tokens. Kiroku turns
//! that array into a canonical, structured **flow** that describes the component type, and a flat
//! **setup** that records the concrete values of one configuration. Both can be turned back into
//! an equivalent live component.
//!
//! ## Core Workflow
//!
//! 1.  **Register Components**: A [`component::ComponentRegistry`] maps type names to factories and
//!     capability tags. The reference catalog covers common trees, ensembles, kernels and filters.
//! 2.  **Serialize**: [`flow::FlowSerializer::serialize`] classifies every declared option of a
//!     configured component and recursively builds a [`flow::FlowNode`] tree.
//! 3.  **Register and Extract**: upload the flow to a [`tracker::TrackingService`], then extract the
//!     setup of the configured component against the id-carrying flow.
//! 4.  **Reconstruct**: [`flow::FlowSerializer::deserialize_setup`] rebuilds a component whose
//!     option tokens equal the original's.
//! 5.  **Experiment**: the [`experiment::ExperimentDriver`] evaluates a component on every split of
//!     a task and uploads the resulting run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kiroku::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let serializer = FlowSerializer::default();
//!     let mut tracker = LocalTracker::new();
//!
//!     // 1. Configure a component from its command line.
//!     let options = split_options("-C 0.03 -M 10")?;
//!     let j48 = serializer.registry().create_with_options("J48", &options)?;
//!
//!     // 2. Serialize it into a flow and register the flow.
//!     let flow = serializer.serialize(j48.as_ref(), &[])?;
//!     let flow_id = register_flow(&mut tracker, &flow)?;
//!     let stored = tracker.flow_get(flow_id)?;
//!
//!     // 3. Extract the setup and rebuild the component from it.
//!     let settings = serializer.extract_setup(&j48.get_options(), &stored)?;
//!     let rebuilt = serializer.deserialize_setup(&settings, &stored)?;
//!     assert_eq!(rebuilt.get_options(), j48.get_options());
//!
//!     println!("{}", to_markup(&stored)?);
//!     Ok(())
//! }
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod experiment;
pub mod flow;
pub mod options;
pub mod prelude;
pub mod tracker;
