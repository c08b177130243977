use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Player-visible status of a single cell.
///
/// `MarkedSafe` is a solver-only annotation: the cell is proven not to be a
/// mine but its number has not been revealed by a query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Unseen,
    Revealed(u8),
    Flagged,
    Exploded,
    MarkedSafe,
}

impl Tile {
    /// Numeric code used by the plain nested-array interchange form.
    pub const fn code(self) -> i8 {
        match self {
            Self::Revealed(count) => count as i8,
            Self::Unseen => -1,
            Self::Exploded => -2,
            Self::Flagged => -3,
            Self::MarkedSafe => -4,
        }
    }

    pub fn from_code(code: i8) -> Result<Self> {
        match code {
            0..=8 => Ok(Self::Revealed(code as u8)),
            -1 => Ok(Self::Unseen),
            -2 => Ok(Self::Exploded),
            -3 => Ok(Self::Flagged),
            -4 => Ok(Self::MarkedSafe),
            _ => Err(GameError::InvalidCellValue(code)),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::Unseen
    }
}
