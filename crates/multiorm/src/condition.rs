//! Query condition types for dynamic queries.
//!
//! Conditions form a small predicate tree: leaf comparisons over a single
//! column, AND/OR composites, and negation. The tree is backend-agnostic;
//! rendering happens in [`crate::qb::Translator`] against a chosen dialect.
//!
//! # Example
//! ```
//! use multiorm::condition::{and, eq, gt, not, or};
//!
//! let cond = and(vec![
//!     eq("status", "active"),
//!     or(vec![gt("age", 18), not(eq("role", "guest"))]),
//! ]);
//! ```

use crate::value::Value;

/// Comparison operator carried by a simple condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `IN (…)`
    In,
    /// `BETWEEN … AND …`
    Between,
    /// `LIKE`
    Like,
}

impl CmpOp {
    /// SQL token for this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Gte => ">=",
            CmpOp::Lte => "<=",
            CmpOp::In => "IN",
            CmpOp::Between => "BETWEEN",
            CmpOp::Like => "LIKE",
        }
    }
}

/// Logical connective for composite conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    /// SQL keyword for this connective.
    pub fn keyword(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// Value shape carried by a simple condition.
///
/// The shape is not checked at construction; a mismatch between operator and
/// shape (e.g. `Between` without a `Pair`) is reported when the condition is
/// translated.
#[derive(Debug, Clone, PartialEq)]
pub enum CondValue {
    /// One scalar (comparison operators, LIKE).
    Single(Value),
    /// Exactly two scalars in (min, max) order (BETWEEN).
    Pair(Value, Value),
    /// Ordered list of scalars (IN).
    List(Vec<Value>),
}

/// A predicate tree node.
///
/// Conditions are immutable values; clone and share them freely across
/// builders.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Leaf comparison: `field <op> value`.
    Simple {
        field: String,
        op: CmpOp,
        value: CondValue,
    },
    /// AND/OR over one or more child conditions.
    Composite {
        op: BoolOp,
        conditions: Vec<Condition>,
    },
    /// Negation of the inner condition.
    Not(Box<Condition>),
}

impl Condition {
    /// Build a simple condition with an explicit value shape.
    ///
    /// This is the dynamic escape hatch; the typed factory functions below
    /// are the normal construction path. Construction never fails; shape
    /// errors surface at translation time.
    pub fn simple(field: impl Into<String>, op: CmpOp, value: CondValue) -> Self {
        Condition::Simple {
            field: field.into(),
            op,
            value,
        }
    }

    /// Structural type tag: `"simple"`, `"composite"`, or `"not"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::Simple { .. } => "simple",
            Condition::Composite { .. } => "composite",
            Condition::Not(_) => "not",
        }
    }

    /// Collect every comparison operator used anywhere in the tree.
    pub fn operators(&self) -> Vec<CmpOp> {
        let mut ops = Vec::new();
        self.collect_operators(&mut ops);
        ops
    }

    fn collect_operators(&self, ops: &mut Vec<CmpOp>) {
        match self {
            Condition::Simple { op, .. } => ops.push(*op),
            Condition::Composite { conditions, .. } => {
                for cond in conditions {
                    cond.collect_operators(ops);
                }
            }
            Condition::Not(inner) => inner.collect_operators(ops),
        }
    }
}

/// Equality condition: `field = value`.
pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Eq, CondValue::Single(value.into()))
}

/// Inequality condition: `field != value`.
pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Ne, CondValue::Single(value.into()))
}

/// Greater-than condition: `field > value`.
pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Gt, CondValue::Single(value.into()))
}

/// Less-than condition: `field < value`.
pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Lt, CondValue::Single(value.into()))
}

/// Greater-than-or-equal condition: `field >= value`.
pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Gte, CondValue::Single(value.into()))
}

/// Less-than-or-equal condition: `field <= value`.
pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Lte, CondValue::Single(value.into()))
}

/// Membership condition: `field IN (values…)`, preserving input order.
///
/// An empty list translates to an always-false predicate (`1=0`).
pub fn in_list<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Condition
where
    V: Into<Value>,
{
    Condition::simple(
        field,
        CmpOp::In,
        CondValue::List(values.into_iter().map(Into::into).collect()),
    )
}

/// Range condition: `field BETWEEN min AND max`.
///
/// The bounds are bound in (min, max) order exactly as given, never sorted.
pub fn between(
    field: impl Into<String>,
    min: impl Into<Value>,
    max: impl Into<Value>,
) -> Condition {
    Condition::simple(field, CmpOp::Between, CondValue::Pair(min.into(), max.into()))
}

/// Pattern condition: `field LIKE pattern`.
///
/// Wildcards are supplied by the caller inside the pattern string.
pub fn like(field: impl Into<String>, pattern: impl Into<Value>) -> Condition {
    Condition::simple(field, CmpOp::Like, CondValue::Single(pattern.into()))
}

/// AND composite over the given conditions.
pub fn and(conditions: Vec<Condition>) -> Condition {
    Condition::Composite {
        op: BoolOp::And,
        conditions,
    }
}

/// OR composite over the given conditions.
pub fn or(conditions: Vec<Condition>) -> Condition {
    Condition::Composite {
        op: BoolOp::Or,
        conditions,
    }
}

/// Negation of a condition.
pub fn not(condition: Condition) -> Condition {
    Condition::Not(Box::new(condition))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_build_expected_shapes() {
        let c = eq("name", "John");
        assert_eq!(c.kind(), "simple");
        assert_eq!(
            c,
            Condition::Simple {
                field: "name".into(),
                op: CmpOp::Eq,
                value: CondValue::Single(Value::Text("John".into())),
            }
        );

        let c = between("age", 18, 65);
        assert_eq!(
            c,
            Condition::Simple {
                field: "age".into(),
                op: CmpOp::Between,
                value: CondValue::Pair(Value::Int(18), Value::Int(65)),
            }
        );

        let c = in_list("id", vec![1i64, 2, 3]);
        match c {
            Condition::Simple {
                value: CondValue::List(vals),
                ..
            } => assert_eq!(vals, vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn composite_and_not_tags() {
        let c = and(vec![eq("a", 1), eq("b", 2)]);
        assert_eq!(c.kind(), "composite");
        assert_eq!(not(c).kind(), "not");
    }

    #[test]
    fn conditions_are_shareable() {
        let c = eq("status", "active");
        let c2 = c.clone();
        assert_eq!(c, c2);
    }
}
