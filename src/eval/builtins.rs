//! The fixed table of built-in functions.

use crate::algebra::{Interval, Set};
use crate::eval::value::Value;
use crate::utils::errors::{malformed, MalformedKind, SbgError, SbgResult, UnsupportedOperation};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A built-in function.
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    func: fn(&[Value]) -> SbgResult<Value>,
}

impl Builtin {
    pub fn apply(&self, args: &[Value]) -> SbgResult<Value> {
        if args.len() != self.arity {
            return Err(UnsupportedOperation::new(
                self.name,
                format!("{} arguments (expected {})", args.len(), self.arity),
            ).into());
        }
        (self.func)(args)
    }
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    let table = [
        Builtin { name: "cardinality", arity: 1, func: cardinality },
        Builtin { name: "isEmpty", arity: 1, func: is_empty },
        Builtin { name: "isMember", arity: 2, func: is_member },
        Builtin { name: "intersection", arity: 2, func: intersection },
        Builtin { name: "difference", arity: 2, func: difference },
    ];
    table.into_iter().map(|b| (b.name, b)).collect()
});

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

/// Names of all built-ins, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Call built-in `name` on `args`.
pub fn call(name: &str, args: &[Value]) -> SbgResult<Value> {
    match lookup(name) {
        Some(builtin) => builtin.apply(args),
        None => Err(UnsupportedOperation::new(name, "any operand (unknown built-in)").into()),
    }
}

fn unsupported(operation: &str, args: &[Value]) -> SbgError {
    let kinds: Vec<_> = args.iter().map(|a| a.kind_name()).collect();
    UnsupportedOperation::new(operation, kinds.join(" and ")).into()
}

fn cardinality(args: &[Value]) -> SbgResult<Value> {
    let n = match &args[0] {
        Value::Interval(i) => i.cardinality(),
        Value::MultiInterval(mi) => mi.cardinality(),
        Value::Set(s) => s.cardinality(),
        _ => return Err(unsupported("cardinality", args)),
    };
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn is_empty(args: &[Value]) -> SbgResult<Value> {
    let empty = match &args[0] {
        Value::Interval(i) => i.is_empty(),
        Value::MultiInterval(mi) => mi.is_empty(),
        Value::Set(s) => s.is_empty(),
        Value::AtomicMap(m) => m.is_empty(),
        Value::PiecewiseMap(m) => m.is_empty(),
        _ => return Err(unsupported("isEmpty", args)),
    };
    Ok(Value::Bool(empty))
}

fn is_member(args: &[Value]) -> SbgResult<Value> {
    let x = match &args[0] {
        Value::Int(x) => *x,
        _ => return Err(unsupported("isMember", args)),
    };
    let member = match &args[1] {
        Value::Interval(i) => i.is_member(x),
        Value::MultiInterval(_) | Value::Set(_) => {
            let set = args[1].as_set().ok_or_else(|| unsupported("isMember", args))?;
            if set.dim() != 1 {
                return Err(malformed(
                    MalformedKind::DimensionMismatch,
                    format!("isMember of a scalar in {}-dimensional {}", set.dim(), set),
                ));
            }
            set.is_member(&[x])
        }
        _ => return Err(unsupported("isMember", args)),
    };
    Ok(Value::Bool(member))
}

fn set_operands(operation: &str, args: &[Value]) -> SbgResult<(Set, Set)> {
    match (args[0].as_set(), args[1].as_set()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(operation, args)),
    }
}

fn intersection(args: &[Value]) -> SbgResult<Value> {
    match (&args[0], &args[1]) {
        (Value::Interval(a), Value::Interval(b)) => Ok(Value::Interval(a.intersection(b))),
        (Value::MultiInterval(a), Value::MultiInterval(b)) if a.dim() == b.dim() => {
            Ok(Value::MultiInterval(a.intersection(b)))
        }
        _ => {
            let (a, b) = set_operands("intersection", args)?;
            Ok(Value::Set(a.intersection(&b)?))
        }
    }
}

fn difference(args: &[Value]) -> SbgResult<Value> {
    if let (Value::Interval(a), Value::Interval(b)) = (&args[0], &args[1]) {
        let pieces = a.difference(b);
        if pieces.len() <= 1 {
            return Ok(Value::Interval(pieces.first().copied().unwrap_or_else(Interval::empty)));
        }
    }
    let (a, b) = set_operands("difference", args)?;
    Ok(Value::Set(a.difference(&b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(b: i64, s: i64, e: i64) -> Value {
        Value::Interval(Interval::new(b, s, e).unwrap())
    }

    #[test]
    fn test_cardinality_and_membership() {
        assert_eq!(call("cardinality", &[iv(0, 3, 10)]).unwrap(), Value::Int(4));
        assert_eq!(call("isMember", &[Value::Int(9), iv(0, 3, 10)]).unwrap(), Value::Bool(true));
        assert_eq!(call("isMember", &[Value::Int(8), iv(0, 3, 10)]).unwrap(), Value::Bool(false));
        assert_eq!(call("isEmpty", &[iv(5, 1, 4)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_set_operations() {
        let a = iv(1, 1, 10);
        let b = iv(5, 1, 15);
        assert_eq!(call("intersection", &[a.clone(), b.clone()]).unwrap(), iv(5, 1, 10));
        assert_eq!(call("difference", &[a, b]).unwrap(), iv(1, 1, 4));

        let hole = call("difference", &[iv(0, 1, 10), iv(5, 1, 5)]).unwrap();
        match hole {
            Value::Set(s) => {
                assert_eq!(s.cardinality(), 10);
                assert!(!s.is_member(&[5]));
            }
            other => panic!("expected a set, got {}", other),
        }
    }

    #[test]
    fn test_scalar_operands_unsupported() {
        let err = call("isEmpty", &[Value::Int(3)]).unwrap_err();
        assert!(matches!(err, SbgError::Unsupported(_)));
        let err = call("isMember", &[Value::Int(3), Value::Int(4)]).unwrap_err();
        assert!(matches!(err, SbgError::Unsupported(_)));
        let err = call("cardinality", &[Value::Bool(true)]).unwrap_err();
        assert!(err.to_string().contains("cardinality"));
    }

    #[test]
    fn test_unknown_name_and_arity() {
        assert!(matches!(call("union", &[]).unwrap_err(), SbgError::Unsupported(_)));
        assert!(matches!(call("isEmpty", &[]).unwrap_err(), SbgError::Unsupported(_)));
        assert_eq!(names(), vec!["cardinality", "difference", "intersection", "isEmpty", "isMember"]);
    }
}
