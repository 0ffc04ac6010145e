//! Columns (spec §3 "Column").

use crate::{DType, GenConfig};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A single column in a table schema.
///
/// An "input column" has no generation config; an "output column" has
/// exactly one. `column_order` is dense and 1-based over data columns
/// (invariant 2); the two implicit columns `ID` and `UpdatedAt` are not
/// assigned a `column_order`.
///
/// # Examples
///
/// ```
/// use gentable_core::{Column, DType};
///
/// let col = Column::input("title".to_string(), DType::Str, 1);
/// assert!(col.is_input());
/// assert_eq!(col.state_column_name(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Column {
    /// Unique column identifier (also its user-visible name).
    id: String,
    /// The column's data type.
    dtype: DType,
    /// The generation config, if this is an output column.
    gen_config: Option<GenConfig>,
    /// 1-based position among data columns, used to enforce the
    /// "reference only to the left" invariant.
    column_order: u32,
}

impl Column {
    /// Construct an input column (no generation config).
    pub fn input(id: String, dtype: DType, column_order: u32) -> Self {
        Self {
            id,
            dtype,
            gen_config: None,
            column_order,
        }
    }

    /// Construct an output column with the given generation config.
    pub fn output(id: String, dtype: DType, gen_config: GenConfig, column_order: u32) -> Self {
        Self {
            id,
            dtype,
            gen_config: Some(gen_config),
            column_order,
        }
    }

    /// Whether this column has no generation config.
    pub fn is_input(&self) -> bool {
        self.gen_config.is_none()
    }

    /// Whether this column has a generation config.
    pub fn is_output(&self) -> bool {
        self.gen_config.is_some()
    }

    /// The name of this column's auxiliary state column (`<id>_`), if it
    /// has one. Every output column has one (invariant 3).
    pub fn state_column_name(&self) -> Option<String> {
        self.gen_config.as_ref().map(|_| format!("{}_", self.id))
    }

    /// Whether this is a "state" column by naming convention (trailing `_`).
    /// State columns never carry their own generation config.
    pub fn is_state_column_name(name: &str) -> bool {
        name.ends_with('_')
    }

    /// The columns this column's generation config depends on, empty for
    /// input columns.
    pub fn referenced_columns(&self) -> Vec<String> {
        self.gen_config
            .as_ref()
            .map(|cfg| cfg.referenced_columns())
            .unwrap_or_default()
    }

    /// Reassign this column's id, used by [`crate::Schema::rename_column`].
    pub(crate) fn rename(&mut self, new_id: String) {
        self.id = new_id;
    }

    /// Reassign this column's position, used by the `Schema` lifecycle
    /// methods to keep `column_order` dense after an add/drop/reorder.
    pub(crate) fn set_column_order(&mut self, order: u32) {
        self.column_order = order;
    }
}
