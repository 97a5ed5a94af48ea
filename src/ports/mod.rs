//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the contracts and use-case
//! layers require from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainGateway`: Transaction submission, confirmation and views
//! - `Clock`: Current UTC time

pub mod chain_gateway;
pub mod clock;
