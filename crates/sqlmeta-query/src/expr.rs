//! Predicate expressions and SQL functions.
//!
//! Expressions are plain data. They never execute anything; the
//! [`Renderer`](crate::dialect::Renderer) turns them into SQL text and
//! positional parameters.

use serde::{Deserialize, Serialize};
use sqlmeta_core::{Entity, SqlFunction, TableTarget, Value};

/// A column of some table, addressed by attribute name.
#[derive(Debug, Clone, PartialEq)]
pub struct Col {
    pub table: TableTarget,
    pub attr: String,
}

impl Col {
    /// Column `attr` of entity `E`.
    pub fn of<E: Entity>(attr: &str) -> Self {
        Self {
            table: TableTarget::of::<E>(),
            attr: attr.to_string(),
        }
    }

    /// Column `attr` of the table registered as `table` in the statement's
    /// database.
    pub fn named(table: &str, attr: &str) -> Self {
        Self {
            table: TableTarget::Named(table.to_string()),
            attr: attr.to_string(),
        }
    }

    fn compare(self, op: CmpOp, operand: impl Into<Operand>) -> Expr {
        Expr::Compare {
            column: self,
            op,
            operand: operand.into(),
        }
    }

    /// `column = operand`
    pub fn eq(self, operand: impl Into<Operand>) -> Expr {
        self.compare(CmpOp::Eq, operand)
    }

    /// `column > operand`
    pub fn gt(self, operand: impl Into<Operand>) -> Expr {
        self.compare(CmpOp::Gt, operand)
    }

    /// `column >= operand`
    pub fn ge(self, operand: impl Into<Operand>) -> Expr {
        self.compare(CmpOp::Ge, operand)
    }

    /// `column < operand`
    pub fn lt(self, operand: impl Into<Operand>) -> Expr {
        self.compare(CmpOp::Lt, operand)
    }

    /// `column <= operand`
    pub fn le(self, operand: impl Into<Operand>) -> Expr {
        self.compare(CmpOp::Le, operand)
    }

    /// `column IN (values...)`; an empty list matches nothing.
    pub fn in_<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::In {
            column: self,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Ascending order on this column.
    pub fn asc(self) -> Order {
        Order {
            column: self,
            descending: false,
        }
    }

    /// Descending order on this column.
    pub fn desc(self) -> Order {
        Order {
            column: self,
            descending: true,
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound as a positional parameter.
    Value(Value),
    /// Another column, e.g. in an explicit join condition.
    Column(Col),
    /// Rendered inline.
    Function(SqlFunction),
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<Col> for Operand {
    fn from(c: Col) -> Self {
        Operand::Column(c)
    }
}

impl From<SqlFunction> for Operand {
    fn from(f: SqlFunction) -> Self {
        Operand::Function(f)
    }
}

macro_rules! operand_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

operand_from_value!(bool, i32, i64, f64, &str, String);

/// A predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        column: Col,
        op: CmpOp,
        operand: Operand,
    },
    In {
        column: Col,
        values: Vec<Value>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// All of `exprs`.
pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::And(exprs.into_iter().collect())
}

/// Any of `exprs`.
pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Or(exprs.into_iter().collect())
}

/// Current UTC time, evaluated by the database.
pub fn utc_now() -> SqlFunction {
    SqlFunction::UtcNow
}

/// A sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: Col,
    pub descending: bool,
}

impl From<Col> for Order {
    fn from(column: Col) -> Self {
        column.asc()
    }
}
