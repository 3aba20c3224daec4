//! # vigil-collateral
//!
//! Health and pricing engine for a single collateral token.
//!
//! Each [`refresh`](collateral::Collateral::refresh) reads the oracle feeds
//! and the pool's exchange rate, ratchets the exposed reference rate, composes
//! a conservative price interval and advances the SOUND / IFFY / DISABLED
//! state machine.
//!
//! ## Modules
//!
//! - [`config`] — Immutable collateral parameters and validation
//! - [`refrate`] — Reference-rate ratchet with revenue hiding
//! - [`price`] — Price composition
//! - [`monitor`] — Default detection state machine
//! - [`collateral`] — The public facade

pub mod collateral;
pub mod config;
pub mod monitor;
pub mod price;
pub mod refrate;

pub use collateral::{Collateral, EngineState};
pub use config::CollateralConfig;

use vigil_fixed::FixedError;
use vigil_oracle::OracleError;

/// Error types for collateral operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollateralError {
    /// Configuration violates an invariant. Raised at construction only.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Arithmetic failure. The refresh that hit it changed nothing.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] FixedError),

    /// An external source failed where no fallback exists.
    #[error("oracle error: {0}")]
    Oracle(OracleError),
}

impl From<OracleError> for CollateralError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Arithmetic(e) => CollateralError::Arithmetic(e),
            other => CollateralError::Oracle(other),
        }
    }
}

/// Convenience result type for collateral operations.
pub type Result<T> = std::result::Result<T, CollateralError>;
