//! genorank-cli: configuration, gene-list input, result files and batch
//! execution behind the `genorank` binary.

pub mod batch;
pub mod commands;
pub mod config;
pub mod input;
pub mod output;
