use trace_chart::error::ExprError;
use trace_chart::expr::ParsedExpr;

fn eval_consts(source: &str) -> f64 {
    ParsedExpr::parse(source).unwrap().eval(&|_| 0.0)
}

#[test]
fn test_precedence_and_parens() {
    assert_eq!(eval_consts("2 + 3 * 4"), 14.0);
    assert_eq!(eval_consts("(2 + 3) * 4"), 20.0);
    assert_eq!(eval_consts("10 - 4 - 3"), 3.0);
    assert_eq!(eval_consts("20 / 4 / 5"), 1.0);
}

#[test]
fn test_modulo_and_unary_minus() {
    assert_eq!(eval_consts("17 % 5"), 2.0);
    assert_eq!(eval_consts("-3 + 10"), 7.0);
    assert_eq!(eval_consts("-(2 * 3)"), -6.0);
}

#[test]
fn test_hex_literals() {
    assert_eq!(eval_consts("0x10 + 1"), 17.0);
    assert_eq!(eval_consts("0Xff"), 255.0);
}

#[test]
fn test_division_by_zero_yields_zero() {
    assert_eq!(eval_consts("5 / 0"), 0.0);
    assert_eq!(eval_consts("5 % 0"), 0.0);
    assert_eq!(eval_consts("1 + 4 / (2 - 2)"), 1.0);
}

#[test]
fn test_identifiers_resolve_in_first_seen_order() {
    let expr = ParsedExpr::parse("cu * 4 + wf").unwrap();
    assert_eq!(expr.idents, vec!["cu".to_string(), "wf".to_string()]);
    let v = expr.eval(&|k| if k == 0 { 3.0 } else { 2.0 });
    assert_eq!(v, 14.0);
}

#[test]
fn test_repeated_identifier_counts_once() {
    let expr = ParsedExpr::parse("a * a + a").unwrap();
    assert_eq!(expr.idents.len(), 1);
    assert_eq!(expr.eval(&|_| 3.0), 12.0);
}

#[test]
fn test_three_identifiers_rejected() {
    let err = ParsedExpr::parse("a + b + c").unwrap_err();
    assert_eq!(err, ExprError::TooManyIdentifiers);
}

#[test]
fn test_index_sentinel_is_an_identifier() {
    let expr = ParsedExpr::parse("$index % 64").unwrap();
    assert_eq!(expr.idents, vec!["$index".to_string()]);
    assert_eq!(expr.eval(&|_| 130.0), 2.0);
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(
        ParsedExpr::parse("2 +"),
        Err(ExprError::UnexpectedEnd)
    ));
    assert!(matches!(
        ParsedExpr::parse("(1 + 2"),
        Err(ExprError::UnexpectedEnd)
    ));
    assert!(matches!(
        ParsedExpr::parse("1 ^ 2"),
        Err(ExprError::UnexpectedChar('^'))
    ));
    assert!(matches!(
        ParsedExpr::parse("1 2"),
        Err(ExprError::UnexpectedToken(_))
    ));
}
