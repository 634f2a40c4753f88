/// The proposal data model
pub mod types;

/// Error taxonomy for a verification run
pub mod errors;

/// Proposal shape detection and normalization
pub mod normalize;

/// MultiSend batch encoding and contract resolution
pub mod multisend;

/// The on-chain hash oracle and contract-suite version queries
pub mod oracle;

/// Client for the proposal metadata service
pub mod hub;

/// Pipeline orchestration and digest aggregation
pub mod verifier;

/// ABI bindings for the module, MultiSend and Safe contracts
pub mod contracts;

/// Configuration management
pub mod config;

/// Application telemetry and logging
pub mod telemetry;

/// Crate version information
pub mod version;
