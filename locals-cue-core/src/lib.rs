//! locals-cue-core: pipeline for turning Terraform locals maps into a generated CUE package.
//!
//! The pipeline has three stages, each in its own module:
//! - [`fetch`]: retrieve the upstream Terraform file
//! - [`extract`]: parse it as HCL and collect the `to_display_name`, `to_fixed` and
//!   `to_short` maps from its `locals` blocks
//! - [`emit`]: stream the maps as JSON through a schema importer ([`import`]) into a
//!   licensed output file
//!
//! [`generate`] wires the stages together; [`contract`] holds the traits at the seams.

pub mod config;
pub mod contract;
pub mod emit;
pub mod extract;
pub mod fetch;
pub mod generate;
pub mod import;
