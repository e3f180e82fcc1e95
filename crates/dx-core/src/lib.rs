//! dx core library.
//!
//! Exact inference over Bayesian networks of Boolean variables:
//! - [`network`]: immutable arena-backed network with dense CPTs
//! - [`inference`]: stateless enumeration queries
//! - [`diagnosis`]: ranking candidate causes from labelled findings
//! - [`config`]: loading networks from files or presets
//! - [`logging`] and [`exit_codes`] for the CLI
//!
//! The binary entry point is in `main.rs`.
//!
//! ```no_run
//! use dx_core::config::{get_preset, build_model, PresetName};
//! use dx_core::inference::{enumeration_ask, Evidence};
//!
//! let network = build_model(&get_preset(PresetName::Asia)).unwrap();
//! let evidence = Evidence::new().with("Xray", true).with("Smoking", true);
//! let posterior = enumeration_ask("LungCancer", &evidence, &network).unwrap();
//! println!("P(LungCancer) = {:.4}", posterior.p_true);
//! ```

pub mod config;
pub mod diagnosis;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod network;

pub use diagnosis::{Diagnoser, Diagnosis, Observation};
pub use inference::{enumeration_ask, Distribution, Enumerator, Evidence};
pub use network::{NetworkModel, VariableDef};
