//! Configuration types and loading.
//!
//! All tunables live in explicit config structs passed into constructors;
//! nothing reads environment variables or global state.

mod settings;

pub use settings::{
    ClassifierConfig, EncoderConfig, EvaluatorConfig, MedicConfig, PolicyConfig, SimulatorConfig,
};
