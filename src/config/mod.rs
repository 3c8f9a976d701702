//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RideConfig (validated, immutable)
//!     → handed by value to the workflow, ledger and blockchain client
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    BlockchainConfig, LedgerConfig, ObservabilityConfig, ProfileConfig, RideConfig,
    StorageConfig, WorkflowConfig,
};
