//! Pieces shared by the node binaries.

pub mod logging;
