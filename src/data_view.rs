//! A bound view: two axis projectors plus an optional color column over a
//! shared table.
//!
//! Construction is strict-apply: the spec is validated fully and the view
//! built fully before the caller swaps it in, so a bad spec never disturbs
//! the live view. Per-frame readers take the shared table's read lock once
//! and pass the guard down through every accessor.

use crate::error::SpecError;
use crate::palette::{self, Palette};
use crate::projection::AxisProjector;
use crate::table::{SharedTable, Table};
use crate::view_spec::ViewSpec;

#[derive(Debug)]
pub struct DataView {
    table: SharedTable,
    x: AxisProjector,
    y: AxisProjector,
    color: Option<ColorBinding>,
}

#[derive(Debug)]
struct ColorBinding {
    column: usize,
    palette: Palette,
}

impl DataView {
    /// Validates `spec` against the table and binds projectors and palette.
    /// Any error leaves the caller's existing view untouched.
    pub fn build(table: SharedTable, spec: &ViewSpec) -> Result<Self, SpecError> {
        let (x, y, color) = {
            let t = table.read();
            let derived = spec.validate(&t)?;
            let x = AxisProjector::new(&spec.x, &t, &derived)?;
            let y = AxisProjector::new(&spec.y, &t, &derived)?;
            let color = match &spec.color_field {
                None => None,
                Some(name) => {
                    // validate() already guaranteed resolution and kind.
                    let (column, col) = t
                        .column_by_name(name)
                        .ok_or_else(|| SpecError::UnknownColumn(name.clone()))?;
                    Some(ColorBinding {
                        column,
                        palette: palette::classify(col),
                    })
                }
            };
            (x, y, color)
        };
        Ok(Self { table, x, y, color })
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    pub fn x_value(&self, t: &Table, row: usize) -> i64 {
        self.x.value(t, row)
    }

    pub fn y_value(&self, t: &Table, row: usize) -> i64 {
        self.y.value(t, row)
    }

    /// Raw color value for `row` (stored integer or dictionary code); 0
    /// when no color column is bound.
    pub fn color_value(&self, t: &Table, row: usize) -> i32 {
        match &self.color {
            Some(binding) => t.column(binding.column).value(row),
            None => 0,
        }
    }

    /// Palette color for `row`, or `None` when no color column is bound.
    pub fn color_rgba(&self, t: &Table, row: usize) -> Option<u32> {
        let binding = self.color.as_ref()?;
        Some(binding.palette.color(t.column(binding.column).value(row)))
    }

    pub fn palette(&self) -> Option<Palette> {
        self.color.as_ref().map(|b| b.palette)
    }

    /// First row of the half-open range covering a Y window.
    pub fn start_index(&self, t: &Table, y_from: i64) -> usize {
        self.y.lower_bound(t, y_from)
    }

    /// One past the last row of the range, clamped to the row count.
    pub fn end_index(&self, t: &Table, y_to: i64) -> usize {
        self.y.lower_bound(t, y_to).min(t.row_count())
    }

    pub fn max_x(&self) -> i64 {
        self.x.max()
    }

    pub fn min_y(&self) -> i64 {
        self.y.min()
    }

    pub fn max_y(&self) -> i64 {
        self.y.max()
    }
}
