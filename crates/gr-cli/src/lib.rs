//! git-report CLI library.
//!
//! This crate provides the command-line interface, configuration loading and
//! report rendering on top of `gr-core` and `gr-git`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, OutputFormat, ReportType};
pub use config::Config;
