//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies. The only infrastructure concern is the ledger
//! node, reached through alloy-rs.

pub mod chain;
