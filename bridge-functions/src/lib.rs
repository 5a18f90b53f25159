//! Bridge Functions Library
//!
//! Compute routines for a pool-based cross-chain bridge: verifying that a
//! transfer event exists and is final on its source chain, aggregating pool
//! liquidity across chains, and rebalancing liquidity when a pool joins or a
//! withdrawal is collected. Each invocation is stateless and receives its
//! arguments and secrets from the host.

pub mod aggregator;
pub mod args;
pub mod commitment;
pub mod config;
pub mod connector;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod rebalancer;
pub mod routines;
pub mod secrets;
pub mod submitter;
pub mod verifier;

// Re-export commonly used types
pub use commitment::BridgeSentEvent;
pub use config::{ChainDescriptor, ChainSelector, Config, FunctionsSettings, NetworkConfig};
pub use connector::ChainConnector;
pub use crypto::EvmSigner;
pub use dispatch::Routine;
pub use error::FunctionError;
pub use routines::FunctionContext;
pub use secrets::Secrets;
