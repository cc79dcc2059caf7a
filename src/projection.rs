//! Axis projection: linearizing one or two columns (or the virtual row
//! index) into a single ordered coordinate.
//!
//! Two bounded integers compose into one via mixed-radix placement,
//! `value = a * base_b + b`, invertible within the declared bases. It is
//! the same construction used to flatten multi-dimensional array indices.

use crate::error::SpecError;
use crate::table::{ColumnKind, Table};
use crate::view_spec::{AxisSpec, DerivedColumn, DerivedColumns, ROW_INDEX_FIELD};

#[derive(Debug)]
enum SourceKind {
    Column(usize),
    Derived(DerivedColumn),
    /// Virtual column whose value at row `i` is `i`.
    Index,
}

#[derive(Debug)]
struct AxisSource {
    kind: SourceKind,
    multiplier: i64,
    /// 0 disables wraparound.
    modulo: i64,
}

#[derive(Debug)]
pub struct AxisProjector {
    sources: Vec<AxisSource>,
    min: i64,
    max: i64,
}

impl AxisProjector {
    /// Resolves the axis against the table: picks sources, computes bases
    /// (explicit radix, else `column.max + 1`), mixed-radix multipliers and
    /// the cached linear bounds.
    pub fn new(
        axis: &AxisSpec,
        table: &Table,
        derived: &DerivedColumns,
    ) -> Result<Self, SpecError> {
        if axis.columns.is_empty() {
            return Err(SpecError::EmptyAxis);
        }
        if axis.columns.len() > 2 {
            return Err(SpecError::TooManySources);
        }

        let rows = table.row_count();
        let mut kinds = Vec::new();
        let mut stats = Vec::new();
        let mut bases = Vec::new();
        let mut moduli = Vec::new();

        for col in &axis.columns {
            let (kind, lo, hi) = resolve_source(&col.name, table, derived, rows)?;
            let base = col.radix.unwrap_or(hi + 1).max(1);
            kinds.push(kind);
            stats.push((lo, hi));
            bases.push(base);
            moduli.push(col.modulo.max(0));
        }

        // Big-endian placement: the last source is the fastest-varying digit.
        let n = kinds.len();
        let mut multipliers = vec![1i64; n];
        for k in (0..n.saturating_sub(1)).rev() {
            multipliers[k] = multipliers[k + 1] * bases[k + 1];
        }

        let mut sources = Vec::with_capacity(n);
        let mut min = 0i64;
        let mut max = 0i64;
        for (k, kind) in kinds.into_iter().enumerate() {
            let (stat_lo, stat_hi) = stats[k];
            let modulo = moduli[k];
            let (lo, hi) = if modulo > 0 {
                if stat_lo >= 0 && stat_hi < modulo {
                    (stat_lo, stat_hi)
                } else {
                    (0, modulo - 1)
                }
            } else {
                (stat_lo, stat_hi)
            };
            min += lo * multipliers[k];
            max += hi * multipliers[k];
            sources.push(AxisSource {
                kind,
                multiplier: multipliers[k],
                modulo,
            });
        }

        Ok(Self { sources, min, max })
    }

    /// Projected coordinate for row `i`.
    pub fn value(&self, table: &Table, i: usize) -> i64 {
        let mut acc = 0i64;
        for source in &self.sources {
            let mut raw = raw_value(&source.kind, table, i);
            if source.modulo > 0 {
                raw = raw.rem_euclid(source.modulo);
            }
            acc += raw * source.multiplier;
        }
        acc
    }

    /// Cached linear lower bound over the declared source extents.
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Cached linear upper bound over the declared source extents.
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Smallest `i` with `value(i) >= target`, by binary search.
    ///
    /// Precondition: `value(i)` is non-decreasing in row order. Trace rows
    /// are time-ordered upstream; the projector does not enforce this, and a
    /// violation silently degrades range-query results.
    pub fn lower_bound(&self, table: &Table, target: i64) -> usize {
        let mut lo = 0usize;
        let mut hi = table.row_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.value(table, mid) < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

fn raw_value(kind: &SourceKind, table: &Table, i: usize) -> i64 {
    match kind {
        SourceKind::Column(idx) => table.column(*idx).value(i) as i64,
        SourceKind::Index => i as i64,
        SourceKind::Derived(derived) => derived.eval(table, i) as i64,
    }
}

fn resolve_source(
    name: &str,
    table: &Table,
    derived: &DerivedColumns,
    rows: usize,
) -> Result<(SourceKind, i64, i64), SpecError> {
    if name == ROW_INDEX_FIELD {
        let hi = rows.saturating_sub(1) as i64;
        return Ok((SourceKind::Index, 0, hi));
    }
    if let Some(d) = derived.get(name) {
        let (lo, hi) = derived_extent(d, table);
        return Ok((SourceKind::Derived(d.clone()), lo, hi));
    }
    match table.column_by_name(name) {
        Some((idx, col)) => match col.kind() {
            ColumnKind::Integer | ColumnKind::StringCode => {
                let stats = col.stats();
                let (lo, hi) = if col.is_empty() {
                    (0, 0)
                } else {
                    (stats.min as i64, stats.max as i64)
                };
                Ok((SourceKind::Column(idx), lo, hi))
            }
            ColumnKind::RawString => Err(SpecError::Unprojectable(name.to_string())),
        },
        None => Err(SpecError::UnknownColumn(name.to_string())),
    }
}

// One pass over the rows; derived columns have no running stats.
fn derived_extent(d: &DerivedColumn, table: &Table) -> (i64, i64) {
    let rows = table.row_count();
    if rows == 0 {
        return (0, 0);
    }
    let mut lo = i64::MAX;
    let mut hi = i64::MIN;
    for i in 0..rows {
        let v = d.eval(table, i) as i64;
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo, hi)
}
