use rand::prelude::*;

use trace_chart::projection::AxisProjector;
use trace_chart::table::{Column, ColumnKind, Table};
use trace_chart::view_spec::{AxisColumn, AxisSpec};

fn table_of(columns: Vec<(&str, Vec<i32>)>) -> Table {
    let mut table = Table::new();
    table.set_headers(columns.iter().map(|(n, _)| n.to_string()).collect());
    let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    table.set_columns(
        columns
            .iter()
            .map(|_| Column::new(ColumnKind::Integer))
            .collect(),
    );
    for row in 0..rows {
        for (i, (_, values)) in columns.iter().enumerate() {
            table.column_mut(i).push_int(values[row]);
        }
        table.commit_row();
    }
    table
}

fn no_derived() -> trace_chart::view_spec::DerivedColumns {
    Default::default()
}

#[test]
fn test_mixed_radix_two_columns() {
    // wf max is 1, so its auto base is 2 and value = cu * 2 + wf.
    let table = table_of(vec![("cu", vec![0, 0, 1]), ("wf", vec![0, 1, 0])]);
    let proj = AxisProjector::new(&AxisSpec::pair("cu", "wf"), &table, &no_derived()).unwrap();
    assert_eq!(proj.value(&table, 0), 0);
    assert_eq!(proj.value(&table, 1), 1);
    assert_eq!(proj.value(&table, 2), 2);
}

#[test]
fn test_mixed_radix_bijectivity() {
    let mut cu = Vec::new();
    let mut wf = Vec::new();
    for a in 0..5 {
        for b in 0..7 {
            cu.push(a);
            wf.push(b);
        }
    }
    let table = table_of(vec![("cu", cu.clone()), ("wf", wf.clone())]);
    let proj = AxisProjector::new(&AxisSpec::pair("cu", "wf"), &table, &no_derived()).unwrap();

    let mut seen = std::collections::HashSet::new();
    for i in 0..table.row_count() {
        let v = proj.value(&table, i);
        assert_eq!(v, cu[i] as i64 * 7 + wf[i] as i64);
        assert!(seen.insert(v), "composite keys must stay distinct");
    }
}

#[test]
fn test_equal_pairs_project_equal() {
    let table = table_of(vec![("a", vec![3, 1, 3]), ("b", vec![4, 0, 4])]);
    let proj = AxisProjector::new(&AxisSpec::pair("a", "b"), &table, &no_derived()).unwrap();
    assert_eq!(proj.value(&table, 0), proj.value(&table, 2));
}

#[test]
fn test_explicit_radix_override() {
    let table = table_of(vec![("hi", vec![1, 2]), ("lo", vec![3, 4])]);
    let spec = AxisSpec {
        columns: vec![
            AxisColumn::plain("hi"),
            AxisColumn::with_radix("lo", 100),
        ],
    };
    let proj = AxisProjector::new(&spec, &table, &no_derived()).unwrap();
    assert_eq!(proj.value(&table, 0), 103);
    assert_eq!(proj.value(&table, 1), 204);
}

#[test]
fn test_modulo_wraps_values() {
    let table = table_of(vec![("v", vec![0, 5, 13, 27])]);
    let spec = AxisSpec {
        columns: vec![AxisColumn {
            name: "v".into(),
            radix: None,
            modulo: 8,
        }],
    };
    let proj = AxisProjector::new(&spec, &table, &no_derived()).unwrap();
    assert_eq!(proj.value(&table, 0), 0);
    assert_eq!(proj.value(&table, 1), 5);
    assert_eq!(proj.value(&table, 2), 5);
    assert_eq!(proj.value(&table, 3), 3);
    // Bounds shrink to the modulus range.
    assert!(proj.max() <= 7);
}

#[test]
fn test_row_index_axis() {
    let table = table_of(vec![("v", vec![9, 9, 9, 9])]);
    let proj = AxisProjector::new(&AxisSpec::row_index(), &table, &no_derived()).unwrap();
    for i in 0..4 {
        assert_eq!(proj.value(&table, i), i as i64);
    }
    assert_eq!(proj.min(), 0);
    assert_eq!(proj.max(), 3);
}

#[test]
fn test_cached_bounds_from_stats() {
    let table = table_of(vec![("a", vec![2, 5]), ("b", vec![1, 3])]);
    let proj = AxisProjector::new(&AxisSpec::pair("a", "b"), &table, &no_derived()).unwrap();
    // Base of b is 4; extremes compose from per-column stats.
    assert_eq!(proj.min(), 2 * 4 + 1);
    assert_eq!(proj.max(), 5 * 4 + 3);
}

#[test]
fn test_lower_bound_matches_linear_scan() {
    let mut rng = rand::rng();
    for _ in 0..20 {
        let rows = rng.random_range(1..400usize);
        let mut values = Vec::with_capacity(rows);
        let mut v = 0i32;
        for _ in 0..rows {
            v += rng.random_range(0..5);
            values.push(v);
        }
        let table = table_of(vec![("y", values.clone())]);
        let proj =
            AxisProjector::new(&AxisSpec::single("y"), &table, &no_derived()).unwrap();

        for _ in 0..50 {
            let target = rng.random_range(-2..(v as i64 + 3));
            let expect = values
                .iter()
                .position(|&x| x as i64 >= target)
                .unwrap_or(rows);
            assert_eq!(proj.lower_bound(&table, target), expect);
        }
    }
}

#[test]
fn test_lower_bound_clamps_to_row_count() {
    let table = table_of(vec![("y", vec![0, 1, 2])]);
    let proj = AxisProjector::new(&AxisSpec::single("y"), &table, &no_derived()).unwrap();
    assert_eq!(proj.lower_bound(&table, 100), 3);
    assert_eq!(proj.lower_bound(&table, -5), 0);
}

#[test]
fn test_unknown_and_unprojectable_sources_rejected() {
    use trace_chart::error::SpecError;

    let mut cols = vec![
        Column::new(ColumnKind::Integer),
        Column::new(ColumnKind::RawString),
    ];
    cols[0].push_int(1);
    cols[1].push_text("free text");
    let mut table = Table::new();
    table.set_headers(vec!["n".into(), "txt".into()]);
    table.set_columns(cols);
    table.commit_row();

    let err = AxisProjector::new(&AxisSpec::single("nope"), &table, &no_derived()).unwrap_err();
    assert!(matches!(err, SpecError::UnknownColumn(_)));
    let err = AxisProjector::new(&AxisSpec::single("txt"), &table, &no_derived()).unwrap_err();
    assert!(matches!(err, SpecError::Unprojectable(_)));
}
