//! Cell budget: the upper bound on concurrent (column × row) work inside one
//! request (spec §3 GLOSSARY, §4.B).

use serde::{Deserialize, Serialize};

/// The default cell budget `C` when a request does not override it.
pub const DEFAULT_CELL_BUDGET: u32 = 15;

/// The per-request cell budget `C`, bounding `column_batch * row_batch`.
///
/// # Examples
///
/// ```
/// use gentable_core::CellBudget;
///
/// let default = CellBudget::default();
/// assert_eq!(default.value(), 15);
///
/// let custom = CellBudget::new(30).unwrap();
/// assert_eq!(custom.value(), 30);
///
/// assert!(CellBudget::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBudget(u32);

impl CellBudget {
    /// Construct a cell budget, rejecting zero (a zero budget can never
    /// admit any generator dispatch).
    pub fn new(value: u32) -> Result<Self, String> {
        if value == 0 {
            return Err("cell budget must be at least 1".to_string());
        }
        Ok(Self(value))
    }

    /// The raw budget value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for CellBudget {
    fn default() -> Self {
        Self(DEFAULT_CELL_BUDGET)
    }
}

impl std::fmt::Display for CellBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
