//! Pluggable schema recognition: an ordered strategy list mapping a loaded
//! table to a sensible default view. The first strategy whose `matches`
//! accepts the headers wins; the generic fallback sits last.

use crate::table::{ColumnKind, Table};
use crate::view_spec::{AxisSpec, ViewSpec};

pub trait ViewStrategy {
    fn name(&self) -> &'static str;
    fn matches(&self, headers: &[String]) -> bool;
    fn build(&self, table: &Table) -> ViewSpec;
}

/// Per-cycle wave occupancy trace: `cycle  cu  wf  state`. X packs the
/// compute-unit / wavefront pair into one composite coordinate, Y is the
/// cycle, color is the state.
pub struct WaveTraceStrategy;

impl ViewStrategy for WaveTraceStrategy {
    fn name(&self) -> &'static str {
        "wave-trace"
    }

    fn matches(&self, headers: &[String]) -> bool {
        headers.len() == 4
            && headers[0].eq_ignore_ascii_case("cycle")
            && headers[1].eq_ignore_ascii_case("cu")
            && headers[2].eq_ignore_ascii_case("wf")
            && headers[3].eq_ignore_ascii_case("state")
    }

    fn build(&self, table: &Table) -> ViewSpec {
        let h = table.headers();
        ViewSpec {
            x: AxisSpec::pair(h[1].clone(), h[2].clone()),
            y: AxisSpec::single(h[0].clone()),
            color_field: Some(h[3].clone()),
            derived: Default::default(),
        }
    }
}

/// Fallback for any tabular data: Y is the first projectable column
/// (assumed time-ordered), X the second, the row index filling in when the
/// table is too narrow.
pub struct GenericStrategy;

impl ViewStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, headers: &[String]) -> bool {
        !headers.is_empty()
    }

    fn build(&self, table: &Table) -> ViewSpec {
        let projectable: Vec<&String> = table
            .headers()
            .iter()
            .enumerate()
            .filter(|(i, _)| table.column(*i).kind() != ColumnKind::RawString)
            .map(|(_, h)| h)
            .collect();

        match projectable.as_slice() {
            [] => ViewSpec {
                x: AxisSpec::row_index(),
                y: AxisSpec::row_index(),
                ..Default::default()
            },
            [only] => ViewSpec {
                x: AxisSpec::single((*only).clone()),
                y: AxisSpec::row_index(),
                ..Default::default()
            },
            [first, second, ..] => ViewSpec {
                x: AxisSpec::single((*second).clone()),
                y: AxisSpec::single((*first).clone()),
                ..Default::default()
            },
        }
    }
}

pub fn default_strategies() -> Vec<Box<dyn ViewStrategy>> {
    vec![Box::new(WaveTraceStrategy), Box::new(GenericStrategy)]
}

/// Picks the first matching strategy and builds its view spec.
pub fn select_view(table: &Table) -> ViewSpec {
    select_view_with(&default_strategies(), table)
}

pub fn select_view_with(strategies: &[Box<dyn ViewStrategy>], table: &Table) -> ViewSpec {
    for strategy in strategies {
        if strategy.matches(table.headers()) {
            return strategy.build(table);
        }
    }
    ViewSpec::default()
}
