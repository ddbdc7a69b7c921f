use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::ast::BinaryOp;

/// Applies a comparison operator. `None` stands for NOTHING.
pub fn compare(op: BinaryOp, left: Option<&Value>, right: Option<&Value>) -> bool {
    match op {
        BinaryOp::Eq => equal(left, right),
        BinaryOp::Ne => !equal(left, right),
        BinaryOp::Lt => less(left, right),
        BinaryOp::Le => less(left, right) || equal(left, right),
        BinaryOp::Gt => less(right, left),
        BinaryOp::Ge => less(right, left) || equal(left, right),
        BinaryOp::And | BinaryOp::Or => false,
    }
}

fn equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

// Only numbers and strings are ordered; every other pairing is simply false
fn less(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            number_cmp(a, b) == Some(Ordering::Less)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a < b,
        _ => false,
    }
}

pub fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Structural equality where numbers compare by value, so `1 == 1.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y) == Some(Ordering::Equal),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| values_equal(l, r)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nothing_equals_only_nothing() {
        assert!(compare(BinaryOp::Eq, None, None));
        assert!(!compare(BinaryOp::Eq, None, Some(&json!(null))));
        assert!(compare(BinaryOp::Ne, None, Some(&json!("a"))));
        assert!(!compare(BinaryOp::Lt, None, Some(&json!(1))));
        assert!(compare(BinaryOp::Le, None, None));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(compare(BinaryOp::Eq, Some(&json!(1)), Some(&json!(1.0))));
        assert!(compare(BinaryOp::Lt, Some(&json!(-1)), Some(&json!(0.5))));
        assert!(compare(BinaryOp::Ge, Some(&json!(2)), Some(&json!(2))));
        assert!(!compare(BinaryOp::Eq, Some(&json!(1)), Some(&json!("1"))));
    }

    #[test]
    fn strings_order_by_code_point() {
        assert!(compare(BinaryOp::Lt, Some(&json!("a")), Some(&json!("b"))));
        assert!(compare(BinaryOp::Gt, Some(&json!("é")), Some(&json!("z"))));
    }

    #[test]
    fn mismatched_types_are_unordered() {
        assert!(!compare(BinaryOp::Lt, Some(&json!({})), Some(&json!([]))));
        assert!(!compare(BinaryOp::Ge, Some(&json!(1)), Some(&json!("1"))));
        assert!(!compare(BinaryOp::Lt, Some(&json!(true)), Some(&json!(false))));
        assert!(compare(BinaryOp::Le, Some(&json!({"a": [1]})), Some(&json!({"a": [1.0]}))));
    }
}
