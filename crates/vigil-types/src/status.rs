//! Collateral status as observed by consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health of a collateral unit.
///
/// `Disabled` is terminal: a consumer reading it must treat the collateral as
/// permanently untrustworthy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CollateralStatus {
    /// Feeds and reference rate are healthy and on peg.
    Sound,
    /// Something looks wrong; a default deadline is armed.
    Iffy,
    /// Defaulted. No recovery.
    Disabled,
}

impl fmt::Display for CollateralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollateralStatus::Sound => write!(f, "SOUND"),
            CollateralStatus::Iffy => write!(f, "IFFY"),
            CollateralStatus::Disabled => write!(f, "DISABLED"),
        }
    }
}
