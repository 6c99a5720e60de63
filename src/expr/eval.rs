//! Evaluation of predicate patterns to literal values.

use std::cmp::Ordering;

use crate::data::DataValue;
use crate::error::{LexiqError, Result};
use crate::expr::ir::ScalarKind;
use crate::expr::node::{BinaryOp, Expr, Method, UnaryOp};

/// True when `expr` can be evaluated without a document.
///
/// Query annotations are never values, even on a constant target.
pub fn is_evaluable(expr: &Expr) -> bool {
    !expr.references_document()
        && !expr.contains(&|e| {
            matches!(
                e,
                Expr::Call {
                    method: Method::Boost | Method::AllowSpecialCharacters,
                    ..
                }
            )
        })
}

/// Evaluate a closed expression to a literal.
pub fn evaluate(expr: &Expr) -> Result<DataValue> {
    match expr {
        Expr::Constant(value) => Ok(value.clone()),
        Expr::Captured(captured) => Ok(captured.get()),
        Expr::Convert { operand, kind } => convert(evaluate(operand)?, *kind),
        Expr::Unary { op, operand } => unary(*op, evaluate(operand)?),
        Expr::Binary { op, left, right } => match op {
            BinaryOp::AndAlso => {
                if expect_bool(evaluate(left)?)? {
                    Ok(DataValue::Bool(expect_bool(evaluate(right)?)?))
                } else {
                    Ok(DataValue::Bool(false))
                }
            }
            BinaryOp::OrElse => {
                if expect_bool(evaluate(left)?)? {
                    Ok(DataValue::Bool(true))
                } else {
                    Ok(DataValue::Bool(expect_bool(evaluate(right)?)?))
                }
            }
            BinaryOp::Coalesce => {
                let value = evaluate(left)?;
                if value.is_null() {
                    evaluate(right)
                } else {
                    Ok(value)
                }
            }
            _ => binary(*op, evaluate(left)?, evaluate(right)?),
        },
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => {
            if expect_bool(evaluate(test)?)? {
                evaluate(if_true)
            } else {
                evaluate(if_false)
            }
        }
        Expr::Call {
            target: Some(target),
            method: method @ (Method::ToLowercase | Method::ToUppercase),
            args,
        } if args.is_empty() => match evaluate(target)? {
            DataValue::Text(text) if *method == Method::ToLowercase => {
                Ok(DataValue::Text(text.to_lowercase()))
            }
            DataValue::Text(text) => Ok(DataValue::Text(text.to_uppercase())),
            DataValue::Null => Ok(DataValue::Null),
            other => Err(LexiqError::evaluation(format!(
                "{method} expects text, got {}",
                other.kind_name()
            ))),
        },
        other => Err(LexiqError::evaluation(format!("cannot evaluate `{other}`"))),
    }
}

fn expect_bool(value: DataValue) -> Result<bool> {
    value.as_boolean().ok_or_else(|| {
        LexiqError::evaluation(format!("expected bool, got {}", value.kind_name()))
    })
}

fn convert(value: DataValue, kind: ScalarKind) -> Result<DataValue> {
    if value.is_null() {
        return Ok(value);
    }
    let converted = match (kind, &value) {
        (ScalarKind::Int64, DataValue::Float64(f)) => DataValue::Int64(*f as i64),
        (ScalarKind::Int64, DataValue::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(DataValue::Int64)
            .map_err(|e| LexiqError::evaluation(format!("cannot convert {value} to int64: {e}")))?,
        (ScalarKind::Float64, DataValue::Int64(i)) => DataValue::Float64(*i as f64),
        (ScalarKind::Float64, DataValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(DataValue::Float64)
            .map_err(|e| {
                LexiqError::evaluation(format!("cannot convert {value} to float64: {e}"))
            })?,
        (ScalarKind::Text, DataValue::Text(_)) => value.clone(),
        (ScalarKind::Text, DataValue::DateTime(dt)) => DataValue::Text(dt.to_rfc3339()),
        (ScalarKind::Text, other) => DataValue::Text(other.to_string()),
        (ScalarKind::DateTime, DataValue::Text(s)) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| DataValue::DateTime(dt.with_timezone(&chrono::Utc)))
            .map_err(|e| {
                LexiqError::evaluation(format!("cannot convert {value} to datetime: {e}"))
            })?,
        _ => value.clone(),
    };
    Ok(converted)
}

fn unary(op: UnaryOp, value: DataValue) -> Result<DataValue> {
    match (op, value) {
        (_, DataValue::Null) => Ok(DataValue::Null),
        (UnaryOp::Not, DataValue::Bool(b)) => Ok(DataValue::Bool(!b)),
        (UnaryOp::Negate, DataValue::Int64(i)) => i
            .checked_neg()
            .map(DataValue::Int64)
            .ok_or_else(|| LexiqError::evaluation("integer overflow")),
        (UnaryOp::Negate, DataValue::Float64(f)) => Ok(DataValue::Float64(-f)),
        (op, other) => Err(LexiqError::evaluation(format!(
            "cannot apply {op:?} to {}",
            other.kind_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: DataValue, right: DataValue) -> Result<DataValue> {
    match op {
        BinaryOp::Equal => Ok(DataValue::Bool(values_equal(&left, &right))),
        BinaryOp::NotEqual => Ok(DataValue::Bool(!values_equal(&left, &right))),
        BinaryOp::LessThan
        | BinaryOp::LessOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterOrEqual => {
            let ordering = compare_values(&left, &right)?;
            Ok(DataValue::Bool(match op {
                BinaryOp::LessThan => ordering == Ordering::Less,
                BinaryOp::LessOrEqual => ordering != Ordering::Greater,
                BinaryOp::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Add if matches!(left, DataValue::Text(_)) || matches!(right, DataValue::Text(_)) => {
            Ok(DataValue::Text(format!("{}{}", plain(&left), plain(&right))))
        }
        BinaryOp::BitAnd | BinaryOp::BitOr => match (&left, &right) {
            (DataValue::Bool(a), DataValue::Bool(b)) => Ok(DataValue::Bool(if op == BinaryOp::BitAnd {
                *a & *b
            } else {
                *a | *b
            })),
            (DataValue::Int64(a), DataValue::Int64(b)) => {
                Ok(DataValue::Int64(if op == BinaryOp::BitAnd { a & b } else { a | b }))
            }
            _ => Err(mismatch(op, &left, &right)),
        },
        _ => arithmetic(op, left, right),
    }
}

fn arithmetic(op: BinaryOp, left: DataValue, right: DataValue) -> Result<DataValue> {
    if left.is_null() || right.is_null() {
        return Ok(DataValue::Null);
    }
    if let (DataValue::Int64(a), DataValue::Int64(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Subtract => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
                return Err(LexiqError::evaluation("division by zero"));
            }
            BinaryOp::Divide => a.checked_div(b),
            BinaryOp::Modulo => a.checked_rem(b),
            _ => return Err(mismatch(op, &left, &right)),
        };
        return result
            .map(DataValue::Int64)
            .ok_or_else(|| LexiqError::evaluation("integer overflow"));
    }
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => {
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide => a / b,
                BinaryOp::Modulo => a % b,
                _ => return Err(mismatch(op, &left, &right)),
            };
            Ok(DataValue::Float64(result))
        }
        _ => Err(mismatch(op, &left, &right)),
    }
}

fn mismatch(op: BinaryOp, left: &DataValue, right: &DataValue) -> LexiqError {
    LexiqError::evaluation(format!(
        "cannot apply `{}` to {} and {}",
        op.symbol(),
        left.kind_name(),
        right.kind_name()
    ))
}

fn plain(value: &DataValue) -> String {
    match value {
        DataValue::Null => String::new(),
        DataValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

fn values_equal(left: &DataValue, right: &DataValue) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return left.as_float() == right.as_float();
    }
    left == right
}

/// Total order between two literals of compatible kinds.
pub fn compare_values(left: &DataValue, right: &DataValue) -> Result<Ordering> {
    match (left, right) {
        (DataValue::Int64(a), DataValue::Int64(b)) => Ok(a.cmp(b)),
        (DataValue::Text(a), DataValue::Text(b)) => Ok(a.cmp(b)),
        (DataValue::Bool(a), DataValue::Bool(b)) => Ok(a.cmp(b)),
        (DataValue::DateTime(a), DataValue::DateTime(b)) => Ok(a.cmp(b)),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(a.total_cmp(&b)),
            _ => Err(LexiqError::evaluation(format!(
                "cannot compare {} with {}",
                left.kind_name(),
                right.kind_name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::node::Expr;

    #[test]
    fn test_evaluate_arithmetic_and_concat() {
        let sum = Expr::binary(BinaryOp::Add, Expr::constant(2), Expr::constant(3));
        assert_eq!(evaluate(&sum).unwrap(), DataValue::Int64(5));

        let mixed = Expr::binary(BinaryOp::Multiply, Expr::constant(2), Expr::constant(1.5));
        assert_eq!(evaluate(&mixed).unwrap(), DataValue::Float64(3.0));

        let concat = Expr::binary(BinaryOp::Add, Expr::constant("ab"), Expr::constant(1));
        assert_eq!(evaluate(&concat).unwrap(), DataValue::from("ab1"));
    }

    #[test]
    fn test_evaluate_captured_is_lazy() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

        let cell = Arc::new(AtomicI64::new(1));
        let reader = Arc::clone(&cell);
        let expr = Expr::captured("n", move || {
            DataValue::Int64(reader.load(AtomicOrdering::SeqCst))
        });

        cell.store(7, AtomicOrdering::SeqCst);
        assert_eq!(evaluate(&expr).unwrap(), DataValue::Int64(7));
    }

    #[test]
    fn test_evaluate_conditional_and_case() {
        let expr = Expr::conditional(
            Expr::constant(1).less_than(2),
            Expr::constant("Yes").to_lowercase(),
            Expr::constant("no"),
        );
        assert_eq!(evaluate(&expr).unwrap(), DataValue::from("yes"));
    }

    #[test]
    fn test_evaluate_errors() {
        let doc = Expr::source("doc").member("title", ScalarKind::Text);
        assert!(matches!(evaluate(&doc), Err(LexiqError::Evaluation(_))));
        assert!(!is_evaluable(&doc));

        let div = Expr::binary(BinaryOp::Divide, Expr::constant(1), Expr::constant(0));
        assert!(matches!(evaluate(&div), Err(LexiqError::Evaluation(_))));
    }

    #[test]
    fn test_annotated_values_are_not_evaluable() {
        assert!(is_evaluable(&Expr::constant(1)));
        assert!(!is_evaluable(&Expr::constant(1).boost(3.0)));
        assert!(!is_evaluable(
            &Expr::constant("a*").allow_special_characters()
        ));
    }

    #[test]
    fn test_convert() {
        let expr = Expr::constant("42").convert(ScalarKind::Int64);
        assert_eq!(evaluate(&expr).unwrap(), DataValue::Int64(42));
        let expr = Expr::constant(3).convert(ScalarKind::Text);
        assert_eq!(evaluate(&expr).unwrap(), DataValue::from("3"));
    }
}
