//! Condition translation: predicate tree → SQL fragment + ordered params.
//!
//! The translator carries the one piece of per-build mutable state: the
//! parameter accumulator. A fresh [`Translator`] is allocated for every
//! build, so placeholder numbering can never leak between concurrent builds.

use crate::condition::{BoolOp, CmpOp, CondValue, Condition};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::value::Value;

/// Ordered parameter accumulator.
///
/// `push` returns the 1-based index of the stored value; for numbered
/// dialects that index is baked into the placeholder token.
#[derive(Debug, Clone, Default)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// View the accumulated values in bind order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the list, yielding values in bind order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Converts a [`Condition`] tree into a SQL fragment plus ordered arguments,
/// using a [`Dialect`] for quoting and placeholders.
///
/// Not shareable across builds: create one per `build()` call.
pub struct Translator<'a> {
    dialect: &'a dyn Dialect,
    params: ParamList,
}

impl<'a> Translator<'a> {
    /// Create a translator with a fresh parameter accumulator.
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            params: ParamList::new(),
        }
    }

    /// Translate any condition node.
    pub fn translate_condition(&mut self, cond: &Condition) -> OrmResult<String> {
        match cond {
            Condition::Simple { field, op, value } => self.translate_simple(field, *op, value),
            Condition::Composite { op, conditions } => self.translate_composite(*op, conditions),
            Condition::Not(inner) => {
                let sql = self.translate_condition(inner)?;
                Ok(format!("NOT ({sql})"))
            }
        }
    }

    /// Translate a composite node: children joined by the connective, the
    /// whole group wrapped in one pair of parentheses.
    ///
    /// An empty child list is a contract violation and fails fast.
    pub fn translate_composite(
        &mut self,
        op: BoolOp,
        conditions: &[Condition],
    ) -> OrmResult<String> {
        if conditions.is_empty() {
            return Err(OrmError::translation(format!(
                "empty {} group",
                op.keyword()
            )));
        }
        let mut parts = Vec::with_capacity(conditions.len());
        for cond in conditions {
            parts.push(self.translate_condition(cond)?);
        }
        Ok(format!("({})", parts.join(&format!(" {} ", op.keyword()))))
    }

    fn translate_simple(
        &mut self,
        field: &str,
        op: CmpOp,
        value: &CondValue,
    ) -> OrmResult<String> {
        let col = Ident::parse(field)
            .map_err(|e| OrmError::translation(format!("invalid field '{field}': {e}")))?
            .to_sql(self.dialect);

        match (op, value) {
            (
                CmpOp::Eq | CmpOp::Ne | CmpOp::Gt | CmpOp::Lt | CmpOp::Gte | CmpOp::Lte,
                CondValue::Single(v),
            ) => {
                let ph = self.bind(v.clone());
                Ok(format!("{col} {} {ph}", op.symbol()))
            }
            (CmpOp::Like, CondValue::Single(v)) => {
                let ph = self.bind(v.clone());
                Ok(format!("{col} LIKE {ph}"))
            }
            (CmpOp::In, CondValue::List(vals)) => {
                if vals.is_empty() {
                    // Empty IN list can never match.
                    return Ok("1=0".to_string());
                }
                let placeholders: Vec<String> =
                    vals.iter().map(|v| self.bind(v.clone())).collect();
                Ok(format!("{col} IN ({})", placeholders.join(", ")))
            }
            (CmpOp::Between, CondValue::Pair(from, to)) => {
                let p1 = self.bind(from.clone());
                let p2 = self.bind(to.clone());
                Ok(format!("{col} BETWEEN {p1} AND {p2}"))
            }
            (op, value) => Err(OrmError::translation(format!(
                "operator {} does not accept a {} value",
                op.symbol(),
                cond_value_shape(value)
            ))),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        let idx = self.params.push(value);
        self.dialect.placeholder(idx)
    }

    /// Parameters accumulated so far, in bind order.
    pub fn params(&self) -> &[Value] {
        self.params.values()
    }

    /// Consume the translator, yielding the ordered argument list.
    pub fn into_params(self) -> Vec<Value> {
        self.params.into_values()
    }
}

fn cond_value_shape(value: &CondValue) -> &'static str {
    match value {
        CondValue::Single(_) => "single",
        CondValue::Pair(_, _) => "pair",
        CondValue::List(_) => "list",
    }
}
