//! Energy Market Client - Library Root
//!
//! Re-exports all modules for integration tests and benchmarks.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

pub use error::ClientError;
