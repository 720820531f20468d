//! Command line interface and runtime settings

mod settings;

pub use settings::*;
