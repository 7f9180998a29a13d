//! Statement modifiers and the chain they form.
//!
//! Every statement owns a [`Chain`] of modifiers attached through the
//! [`Chained`] builder methods. The renderer emits them in clause order
//! (joins, `WHERE`, `GROUP BY`, `ORDER BY`, `LIMIT`) regardless of the
//! order they were attached in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlmeta_core::{Entity, Error, TableTarget};

use crate::expr::{Col, Expr, Order};

/// Closed set of statement modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Join,
    LeftJoin,
    Where,
    GroupBy,
    OrderBy,
    Limit,
}

impl ModifierKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ModifierKind::Join => "join",
            ModifierKind::LeftJoin => "left_join",
            ModifierKind::Where => "where",
            ModifierKind::GroupBy => "group_by",
            ModifierKind::OrderBy => "order_by",
            ModifierKind::Limit => "limit",
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModifierKind {
    type Err = Error;

    /// Accepts `left_join` and `LeftJoin` spellings.
    fn from_str(s: &str) -> Result<Self, Error> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "join" => Ok(ModifierKind::Join),
            "leftjoin" => Ok(ModifierKind::LeftJoin),
            "where" => Ok(ModifierKind::Where),
            "groupby" => Ok(ModifierKind::GroupBy),
            "orderby" => Ok(ModifierKind::OrderBy),
            "limit" => Ok(ModifierKind::Limit),
            _ => Err(Error::UnsupportedStatement {
                name: s.to_string(),
            }),
        }
    }
}

/// A join target and its condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableTarget,
    /// Explicit condition; inferred from foreign keys when `None`.
    pub on: Option<Vec<Expr>>,
}

/// One modifier in a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Join(Join),
    LeftJoin(Join),
    Where(Vec<Expr>),
    GroupBy(Vec<Col>),
    OrderBy(Vec<Order>),
    Limit { limit: u64, offset: Option<u64> },
}

impl Modifier {
    pub fn kind(&self) -> ModifierKind {
        match self {
            Modifier::Join(_) => ModifierKind::Join,
            Modifier::LeftJoin(_) => ModifierKind::LeftJoin,
            Modifier::Where(_) => ModifierKind::Where,
            Modifier::GroupBy(_) => ModifierKind::GroupBy,
            Modifier::OrderBy(_) => ModifierKind::OrderBy,
            Modifier::Limit { .. } => ModifierKind::Limit,
        }
    }

    /// Clause position; joins share one slot so their order is kept.
    fn rank(&self) -> u8 {
        match self.kind() {
            ModifierKind::Join | ModifierKind::LeftJoin => 0,
            ModifierKind::Where => 1,
            ModifierKind::GroupBy => 2,
            ModifierKind::OrderBy => 3,
            ModifierKind::Limit => 4,
        }
    }
}

/// Modifiers attached to a statement, in attachment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    modifiers: Vec<Modifier>,
}

impl Chain {
    pub fn push(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Modifiers sorted into clause order. Stable, so repeated modifiers
    /// of one kind keep their relative order.
    pub fn in_clause_order(&self) -> Vec<&Modifier> {
        let mut ordered: Vec<&Modifier> = self.modifiers.iter().collect();
        ordered.sort_by_key(|m| m.rank());
        ordered
    }
}

/// Chainable modifier builders shared by every reading statement.
pub trait Chained: Sized {
    fn chain_mut(&mut self) -> &mut Chain;

    /// Attach a raw modifier.
    fn modify(mut self, modifier: Modifier) -> Self {
        self.chain_mut().push(modifier);
        self
    }

    /// `INNER JOIN` entity `T` on inferred foreign keys.
    fn join<T: Entity>(self) -> Self {
        self.modify(Modifier::Join(Join {
            table: TableTarget::of::<T>(),
            on: None,
        }))
    }

    /// `INNER JOIN` entity `T` on an explicit condition.
    fn join_on<T: Entity>(self, on: impl IntoIterator<Item = Expr>) -> Self {
        self.modify(Modifier::Join(Join {
            table: TableTarget::of::<T>(),
            on: Some(on.into_iter().collect()),
        }))
    }

    /// `INNER JOIN` a table by name on inferred foreign keys.
    fn join_table(self, table: &str) -> Self {
        self.modify(Modifier::Join(Join {
            table: TableTarget::Named(table.to_string()),
            on: None,
        }))
    }

    /// `LEFT JOIN` entity `T` on inferred foreign keys.
    fn left_join<T: Entity>(self) -> Self {
        self.modify(Modifier::LeftJoin(Join {
            table: TableTarget::of::<T>(),
            on: None,
        }))
    }

    fn left_join_on<T: Entity>(self, on: impl IntoIterator<Item = Expr>) -> Self {
        self.modify(Modifier::LeftJoin(Join {
            table: TableTarget::of::<T>(),
            on: Some(on.into_iter().collect()),
        }))
    }

    /// Add a `WHERE` predicate; predicates from repeated calls are ANDed.
    fn filter(self, expr: Expr) -> Self {
        self.modify(Modifier::Where(vec![expr]))
    }

    /// Add several ANDed `WHERE` predicates.
    fn filter_all(self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.modify(Modifier::Where(exprs.into_iter().collect()))
    }

    fn group_by(self, columns: impl IntoIterator<Item = Col>) -> Self {
        self.modify(Modifier::GroupBy(columns.into_iter().collect()))
    }

    fn order_by<O: Into<Order>>(self, orders: impl IntoIterator<Item = O>) -> Self {
        self.modify(Modifier::OrderBy(orders.into_iter().map(Into::into).collect()))
    }

    fn limit(self, limit: u64) -> Self {
        self.modify(Modifier::Limit {
            limit,
            offset: None,
        })
    }

    fn limit_offset(self, limit: u64, offset: u64) -> Self {
        self.modify(Modifier::Limit {
            limit,
            offset: Some(offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_kind_from_str() {
        assert_eq!("left_join".parse::<ModifierKind>().unwrap(), ModifierKind::LeftJoin);
        assert_eq!("LeftJoin".parse::<ModifierKind>().unwrap(), ModifierKind::LeftJoin);
        assert_eq!("group_by".parse::<ModifierKind>().unwrap(), ModifierKind::GroupBy);
        assert_eq!(
            "having".parse::<ModifierKind>().unwrap_err(),
            Error::UnsupportedStatement {
                name: "having".into()
            }
        );
    }

    #[test]
    fn test_modifier_kind_serde_names() {
        let json = serde_json::to_string(&ModifierKind::LeftJoin).unwrap();
        assert_eq!(json, "\"left_join\"");
        let kind: ModifierKind = serde_json::from_str("\"order_by\"").unwrap();
        assert_eq!(kind, ModifierKind::OrderBy);
    }

    #[test]
    fn test_clause_order_is_stable() {
        let mut chain = Chain::default();
        chain.push(Modifier::Limit {
            limit: 1,
            offset: None,
        });
        chain.push(Modifier::Where(vec![Col::named("a", "x").eq(1)]));
        chain.push(Modifier::Join(Join {
            table: TableTarget::Named("b".into()),
            on: None,
        }));
        chain.push(Modifier::Where(vec![Col::named("a", "y").eq(2)]));
        let kinds: Vec<ModifierKind> = chain.in_clause_order().iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            [
                ModifierKind::Join,
                ModifierKind::Where,
                ModifierKind::Where,
                ModifierKind::Limit
            ]
        );
        match chain.in_clause_order()[1] {
            Modifier::Where(exprs) => assert_eq!(exprs[0], Col::named("a", "x").eq(1)),
            other => panic!("unexpected modifier {other:?}"),
        }
    }
}
