//! # qpmu command-line support
//!
//! Library half of the `qpmu` binary: configuration layering and the line-oriented
//! stream driver that feeds sample lines through an `Estimator`.
//!
//! ## Key Components
//!
//! - `config`: JSON file, environment and command-line layers of `EstimatorConfig`.
//! - `stream`: `run_stream`, Arrow IPC output and synthetic sample output.

pub mod config;
pub mod stream;
