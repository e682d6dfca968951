//! permlens - application permission inspector
//!
//! This library exposes the data model and the reactive filter / search /
//! sort / presentation pipeline behind the `permlens` binary.

pub mod apps;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod models;
pub mod output;
pub mod permissions;
pub mod pipeline;
pub mod presentation;
pub mod session;
pub mod sort;
pub mod source;
