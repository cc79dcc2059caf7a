//! Declarative view specification and its JSON wire format.
//!
//! A spec names up to two columns per axis (or the row-index sentinel for
//! Y), an optional color column, and any derived columns. Validation is
//! strict-apply: a spec is checked fully before any live view is replaced.
//!
//! Wire format:
//! `{ "view": { "axisXField", "axisYField", "colorField" }, "columns": { name: expr } }`
//! where an axis field carries up to two comma-separated names, each with
//! optional `:radix` and `%modulo` suffixes, e.g. `"cu:4%16,wf"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::expr::ParsedExpr;
use crate::table::{ColumnKind, Table};

/// Sentinel selecting the virtual row-index column.
pub const ROW_INDEX_FIELD: &str = "$index";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisColumn {
    pub name: String,
    /// Composite-key base override; `None` derives the base from column
    /// stats.
    pub radix: Option<i64>,
    /// Wrap-around modulus; 0 disables.
    pub modulo: i64,
}

impl AxisColumn {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            radix: None,
            modulo: 0,
        }
    }

    pub fn with_radix(name: impl Into<String>, radix: i64) -> Self {
        Self {
            name: name.into(),
            radix: Some(radix),
            modulo: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AxisSpec {
    pub columns: Vec<AxisColumn>,
}

impl AxisSpec {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            columns: vec![AxisColumn::plain(name)],
        }
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            columns: vec![AxisColumn::plain(first), AxisColumn::plain(second)],
        }
    }

    pub fn row_index() -> Self {
        Self::single(ROW_INDEX_FIELD)
    }

    fn parse_field(field: &str) -> Result<Self, SpecError> {
        let mut columns = Vec::new();
        for part in field.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(SpecError::BadAxisField(field.to_string()));
            }
            let (head, modulo) = match part.split_once('%') {
                Some((head, m)) => {
                    let modulo: i64 = m
                        .trim()
                        .parse()
                        .map_err(|_| SpecError::BadAxisField(field.to_string()))?;
                    (head, modulo)
                }
                None => (part, 0),
            };
            let (name, radix) = match head.split_once(':') {
                Some((name, r)) => {
                    let radix: i64 = r
                        .trim()
                        .parse()
                        .map_err(|_| SpecError::BadAxisField(field.to_string()))?;
                    (name, Some(radix))
                }
                None => (head, None),
            };
            columns.push(AxisColumn {
                name: name.trim().to_string(),
                radix,
                modulo,
            });
        }
        Ok(Self { columns })
    }

    fn to_field(&self) -> String {
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut s = c.name.clone();
                if let Some(r) = c.radix {
                    s.push_str(&format!(":{r}"));
                }
                if c.modulo > 0 {
                    s.push_str(&format!("%{}", c.modulo));
                }
                s
            })
            .collect();
        parts.join(",")
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ViewSpec {
    pub x: AxisSpec,
    pub y: AxisSpec,
    pub color_field: Option<String>,
    /// Derived column name -> expression source.
    pub derived: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct WireSpec {
    view: WireView,
    #[serde(default)]
    columns: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct WireView {
    #[serde(rename = "axisXField")]
    axis_x_field: String,
    #[serde(rename = "axisYField")]
    axis_y_field: String,
    #[serde(rename = "colorField", default)]
    color_field: Option<String>,
}

impl ViewSpec {
    pub fn to_json(&self) -> String {
        let wire = WireSpec {
            view: WireView {
                axis_x_field: self.x.to_field(),
                axis_y_field: self.y.to_field(),
                color_field: self.color_field.clone(),
            },
            columns: self.derived.clone(),
        };
        serde_json::to_string_pretty(&wire).expect("view spec serializes")
    }

    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let wire: WireSpec =
            serde_json::from_str(json).map_err(|e| SpecError::Json(e.to_string()))?;
        Ok(Self {
            x: AxisSpec::parse_field(&wire.view.axis_x_field)?,
            y: AxisSpec::parse_field(&wire.view.axis_y_field)?,
            color_field: wire.view.color_field,
            derived: wire.columns,
        })
    }

    /// Full validation against a table: every referenced name must resolve,
    /// derived columns may not chain, the color column must be a real
    /// numeric column. Returns the resolved derived columns for reuse.
    pub fn validate(&self, table: &Table) -> Result<DerivedColumns, SpecError> {
        let derived = resolve_derived(&self.derived, table)?;
        for axis in [&self.x, &self.y] {
            if axis.columns.is_empty() {
                return Err(SpecError::EmptyAxis);
            }
            if axis.columns.len() > 2 {
                return Err(SpecError::TooManySources);
            }
            for col in &axis.columns {
                if col.name == ROW_INDEX_FIELD || derived.contains_key(&col.name) {
                    continue;
                }
                match table.column_by_name(&col.name) {
                    Some((_, c)) if c.kind() == ColumnKind::RawString => {
                        return Err(SpecError::Unprojectable(col.name.clone()));
                    }
                    Some(_) => {}
                    None => return Err(SpecError::UnknownColumn(col.name.clone())),
                }
            }
        }
        if let Some(name) = &self.color_field {
            match table.column_by_name(name) {
                Some((_, c)) if c.kind() == ColumnKind::RawString => {
                    return Err(SpecError::Unprojectable(name.clone()));
                }
                Some(_) => {}
                None => return Err(SpecError::UnknownColumn(name.clone())),
            }
        }
        Ok(derived)
    }
}

/// A validated derived column: the parsed expression plus the resolved
/// argument bindings for its (at most two) identifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedColumn {
    expr: ParsedExpr,
    args: Vec<DerivedArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivedArg {
    Column(usize),
    Index,
}

impl DerivedColumn {
    pub fn eval(&self, table: &Table, row: usize) -> f64 {
        self.expr.eval(&|k| match self.args[k] {
            DerivedArg::Column(idx) => table.column(idx).value(row) as f64,
            DerivedArg::Index => row as f64,
        })
    }
}

pub type DerivedColumns = BTreeMap<String, DerivedColumn>;

/// Parses every derived definition and binds its identifiers. Identifiers
/// must be real columns or the index sentinel; naming another derived
/// column is rejected (no transitive chains).
pub fn resolve_derived(
    specs: &BTreeMap<String, String>,
    table: &Table,
) -> Result<DerivedColumns, SpecError> {
    let mut out = BTreeMap::new();
    for (name, source) in specs {
        let expr = ParsedExpr::parse(source).map_err(|source| SpecError::Expr {
            name: name.clone(),
            source,
        })?;
        let mut args = Vec::with_capacity(expr.idents.len());
        for ident in &expr.idents {
            if ident == ROW_INDEX_FIELD {
                args.push(DerivedArg::Index);
                continue;
            }
            if specs.contains_key(ident) {
                return Err(SpecError::DerivedChain(name.clone(), ident.clone()));
            }
            match table.column_by_name(ident) {
                Some((idx, col)) => {
                    if col.kind() == ColumnKind::RawString {
                        return Err(SpecError::Unprojectable(ident.clone()));
                    }
                    args.push(DerivedArg::Column(idx));
                }
                None => return Err(SpecError::UnknownColumn(ident.clone())),
            }
        }
        out.insert(name.clone(), DerivedColumn { expr, args });
    }
    Ok(out)
}
