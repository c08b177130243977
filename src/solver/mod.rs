pub use deduction::*;
pub use exhaustive::*;

mod deduction;
mod exhaustive;

use ndarray::Array2;

/// Per-cell record of the pass at which the deduction solver resolved a
/// cell: `-1` for cells that were never candidates or stayed unresolved,
/// `0` for cells that were unseen when solving started, `pass + 1` once a
/// cell is flagged or marked safe in that pass.
pub type StepMatrix = Array2<i32>;

pub const UNRESOLVED: i32 = -1;
