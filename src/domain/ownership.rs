//! Parts-per-million ownership shares and protocol constants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage scale: 1_000_000 parts per million = 100%.
pub const PERCENTAGE_SCALE: u32 = 1_000_000;

/// Token supply minted by the liquid-split factory. Each unit is 0.1%.
pub const FIXED_SUPPLY: u32 = 1_000;

/// An ownership share or fee in parts per million of [`PERCENTAGE_SCALE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ownership(pub u32);

impl Ownership {
    pub const ZERO: Ownership = Ownership(0);
    pub const FULL: Ownership = Ownership(PERCENTAGE_SCALE);

    pub fn new(ppm: u32) -> Self {
        Ownership(ppm)
    }

    pub fn ppm(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Ownership) -> Option<Ownership> {
        self.0.checked_add(rhs.0).map(Ownership)
    }

    pub fn checked_sub(self, rhs: Ownership) -> Option<Ownership> {
        self.0.checked_sub(rhs.0).map(Ownership)
    }

    /// Share expressed as a percentage, e.g. 600_000 ppm -> 60.0000.
    pub fn as_percent(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent().normalize())
    }
}
