// ABOUTME: Library root for localinfra - lifecycle managers for kind cluster sidecars.
// ABOUTME: The main binary is in main.rs.

pub mod archive;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod converge;
pub mod diagnostics;
pub mod error;
pub mod inject;
pub mod mirror;
pub mod network;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod types;
