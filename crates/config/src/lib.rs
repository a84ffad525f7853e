//! Node configuration, loaded from TOML.

mod config;

pub use config::*;
