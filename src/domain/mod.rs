//! Domain layer - Core market model.
//!
//! Pure logic for the energy market client: market types and start-time
//! derivation, the forward-only lifecycle phases, and role/account
//! resolution. No I/O here (hexagonal architecture inner ring).

pub mod actors;
pub mod market;

// Re-export core types for convenience
pub use actors::{AccountBook, Actors, RoleIndices, normalize_address};
pub use market::{MarketParameters, MarketPhase, MarketStart, MarketType, TrackedMarket};
