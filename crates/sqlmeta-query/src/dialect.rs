//! SQL rendering for the reference (PostgreSQL) dialect.
//!
//! A [`Renderer`] is created per statement. It appends to one query buffer
//! and one parameter list in a single left-to-right pass, so parameter
//! order always matches placeholder order. Identifiers are double-quoted
//! and qualified with the table alias; values are `%s` placeholders.

use sqlmeta_core::{
    Entity, Error, FieldValue, Namespace, Reference, Result, Slots, SqlFunction, TableDef,
    Value, quote_ident,
};

use crate::expr::{Col, Expr, Operand, Order};
use crate::statement::{Chain, Join, Modifier};

const PLACEHOLDER: &str = "%s";

/// Renders statements against the tables of one [`Namespace`].
#[derive(Debug)]
pub struct Renderer<'ns> {
    ns: &'ns Namespace,
    root: &'ns TableDef,
    /// Root table first, then joined tables in join order.
    scope: Vec<&'ns TableDef>,
    query: String,
    params: Vec<Value>,
    where_open: bool,
}

impl<'ns> Renderer<'ns> {
    /// Renderer whose root (`FROM`/target) table is `root`.
    pub fn new(ns: &'ns Namespace, root: &'ns TableDef) -> Self {
        Self {
            ns,
            root,
            scope: vec![root],
            query: String::new(),
            params: Vec::new(),
            where_open: false,
        }
    }

    /// Renderer rooted at entity `E`'s table; fails if the table still has
    /// unresolved references.
    pub fn for_entity<E: Entity>(ns: &'ns Namespace) -> Result<Self> {
        let table = ns.table_of::<E>()?;
        table.ensure_resolved()?;
        Ok(Self::new(ns, table))
    }

    pub fn root(&self) -> &'ns TableDef {
        self.root
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &[Value] {
        &self.params
    }

    /// Rendered SQL text and parameters.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.query, self.params)
    }

    pub const fn render_begin_transaction() -> &'static str {
        "BEGIN"
    }

    pub const fn render_commit_transaction() -> &'static str {
        "COMMIT"
    }

    pub const fn render_rollback_transaction() -> &'static str {
        "ROLLBACK"
    }

    /// Inline SQL for a deferred function.
    pub const fn render_function(function: SqlFunction) -> &'static str {
        match function {
            SqlFunction::UtcNow => "(NOW() at time zone 'utc')",
        }
    }

    fn bind(&mut self, value: Value) {
        self.params.push(value);
        self.query.push_str(PLACEHOLDER);
    }

    fn qualified(table: &TableDef, column: &str) -> String {
        format!("{}.{}", table.alias(), quote_ident(column))
    }

    fn select_list(table: &TableDef) -> String {
        table
            .columns()
            .iter()
            .map(|c| Self::qualified(table, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn returning_list(table: &TableDef) -> String {
        table
            .columns()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_from(&mut self) {
        self.query.push_str(&format!(
            " FROM {} AS {}",
            quote_ident(self.root.name()),
            self.root.alias()
        ));
    }

    /// `SELECT <all columns> FROM <root> <modifiers>`
    pub fn render_select(&mut self, chain: &Chain) -> Result<()> {
        self.query.push_str("SELECT ");
        self.query.push_str(&Self::select_list(self.root));
        self.render_from();
        self.render_modifiers(chain, &[])
    }

    /// Primary-key lookup. `key` holds `(column, value)` pairs already
    /// checked against the table's key columns.
    pub fn render_get(&mut self, key: &[(String, Value)], chain: &Chain) -> Result<()> {
        self.query.push_str("SELECT ");
        self.query.push_str(&Self::select_list(self.root));
        self.render_from();
        self.render_modifiers(chain, key)
    }

    /// `SELECT COUNT(<column>|*) FROM <root> <modifiers>`
    pub fn render_count(&mut self, column: Option<&Col>, chain: &Chain) -> Result<()> {
        let counted = match column {
            Some(col) => self.render_column(col)?,
            None => "*".to_string(),
        };
        self.query.push_str(&format!("SELECT COUNT({counted})"));
        self.render_from();
        self.render_modifiers(chain, &[])
    }

    /// `INSERT ... RETURNING` for an instance. Generated columns are left
    /// out; function defaults render inline.
    pub fn render_insert(&mut self, slots: &Slots) -> Result<()> {
        let table = self.root;
        let mut names = Vec::new();
        let mut values = Vec::new();
        for column in table.columns() {
            let field = table.field_by_column(column).ok_or_else(|| Error::UnknownField {
                table: table.name().to_string(),
                field: column.clone(),
            })?;
            if field.autoincrement {
                continue;
            }
            names.push(quote_ident(column));
            match field.value_for(slots) {
                FieldValue::Literal(value) => {
                    self.params.push(value);
                    values.push(PLACEHOLDER.to_string());
                }
                FieldValue::Function(function) => {
                    values.push(Self::render_function(function).to_string());
                }
            }
        }

        self.query
            .push_str(&format!("INSERT INTO {}", quote_ident(table.name())));
        if names.is_empty() {
            self.query.push_str(" DEFAULT VALUES");
        } else {
            self.query.push_str(&format!(
                " ({}) VALUES ({})",
                names.join(", "),
                values.join(", ")
            ));
        }
        self.query
            .push_str(&format!(" RETURNING {}", Self::returning_list(table)));
        Ok(())
    }

    /// `UPDATE ... WHERE <primary key> RETURNING`. Immutable and generated
    /// columns are never written. Unset columns with a function default
    /// are left untouched.
    pub fn render_update(&mut self, slots: &Slots) -> Result<()> {
        let table = self.root;
        let keys = table.key_values(slots)?;
        let mut sets = Vec::new();
        for column in table.columns() {
            let Some(field) = table.field_by_column(column) else {
                continue;
            };
            if field.immutable || field.autoincrement {
                continue;
            }
            match field.value_for(slots) {
                FieldValue::Literal(value) => {
                    self.params.push(value);
                    sets.push(format!("{} = {PLACEHOLDER}", quote_ident(column)));
                }
                FieldValue::Function(_) => {}
            }
        }
        if sets.is_empty() {
            return Err(Error::UnsupportedOperation(format!(
                "{} has no mutable columns to update",
                table.name()
            )));
        }

        self.query.push_str(&format!(
            "UPDATE {} SET {}",
            quote_ident(table.name()),
            sets.join(", ")
        ));
        self.render_key_filter(keys);
        self.query
            .push_str(&format!(" RETURNING {}", Self::returning_list(table)));
        Ok(())
    }

    /// `DELETE ... WHERE <primary key>`
    pub fn render_delete(&mut self, slots: &Slots) -> Result<()> {
        let table = self.root;
        let keys = table.key_values(slots)?;
        self.query
            .push_str(&format!("DELETE FROM {}", quote_ident(table.name())));
        self.render_key_filter(keys);
        Ok(())
    }

    fn render_key_filter(&mut self, keys: Vec<(String, Value)>) {
        self.query.push_str(" WHERE ");
        for (idx, (column, value)) in keys.into_iter().enumerate() {
            if idx > 0 {
                self.query.push_str(" AND ");
            }
            self.query.push_str(&format!("{} = ", quote_ident(&column)));
            self.bind(value);
        }
    }

    /// Joins first, then the key predicate, then the remaining clauses.
    fn render_modifiers(&mut self, chain: &Chain, key: &[(String, Value)]) -> Result<()> {
        let ordered = chain.in_clause_order();
        let (joins, rest): (Vec<&Modifier>, Vec<&Modifier>) = ordered
            .into_iter()
            .partition(|m| matches!(m, Modifier::Join(_) | Modifier::LeftJoin(_)));

        for modifier in joins {
            self.render_modifier(modifier)?;
        }
        for (column, value) in key {
            self.open_clause();
            self.query
                .push_str(&format!("{} = ", Self::qualified(self.root, column)));
            self.bind(value.clone());
        }
        for modifier in rest {
            self.render_modifier(modifier)?;
        }
        Ok(())
    }

    fn render_modifier(&mut self, modifier: &Modifier) -> Result<()> {
        match modifier {
            Modifier::Join(join) => self.render_join(join),
            Modifier::LeftJoin(join) => self.render_left_join(join),
            Modifier::Where(exprs) => self.render_where(exprs),
            Modifier::GroupBy(columns) => self.render_group_by(columns),
            Modifier::OrderBy(orders) => self.render_order_by(orders),
            Modifier::Limit { limit, offset } => {
                self.render_limit(*limit, *offset);
                Ok(())
            }
        }
    }

    pub fn render_join(&mut self, join: &Join) -> Result<()> {
        self.render_join_kind("INNER", join)
    }

    pub fn render_left_join(&mut self, join: &Join) -> Result<()> {
        self.render_join_kind("LEFT", join)
    }

    fn render_join_kind(&mut self, kind: &str, join: &Join) -> Result<()> {
        let target = self.ns.resolve_table(self.root.database(), &join.table)?;
        target.ensure_resolved()?;
        // One alias per table: a table already in scope cannot be joined again.
        if self.scope.iter().any(|t| t.name() == target.name()) {
            return Err(Error::NoJoinCondition {
                from: self.root.name().to_string(),
                to: target.name().to_string(),
            });
        }
        self.query.push_str(&format!(
            " {kind} JOIN {} AS {} ON ",
            quote_ident(target.name()),
            target.alias()
        ));
        match &join.on {
            Some(exprs) if !exprs.is_empty() => {
                for (idx, expr) in exprs.iter().enumerate() {
                    if idx > 0 {
                        self.query.push_str(" AND ");
                    }
                    self.render_expr(expr)?;
                }
            }
            _ => {
                let condition = self.infer_join_condition(target)?;
                self.query.push_str(&condition);
            }
        }
        self.scope.push(target);
        Ok(())
    }

    /// Foreign keys on `target` pointing back at a table already in scope,
    /// or failing that, keys in scope pointing at `target`.
    fn infer_join_condition(&self, target: &TableDef) -> Result<String> {
        for from in &self.scope {
            let mut conditions: Vec<String> = target
                .foreign_keys()
                .filter_map(|fk| match fk.reference() {
                    Some(Reference::Resolved(r)) if points_at(r, from) => Some(format!(
                        "{} = {}",
                        Self::qualified(from, &r.column),
                        Self::qualified(target, fk.column_name())
                    )),
                    _ => None,
                })
                .collect();
            if conditions.is_empty() {
                conditions = from
                    .foreign_keys()
                    .filter_map(|fk| match fk.reference() {
                        Some(Reference::Resolved(r)) if points_at(r, target) => Some(format!(
                            "{} = {}",
                            Self::qualified(from, fk.column_name()),
                            Self::qualified(target, &r.column)
                        )),
                        _ => None,
                    })
                    .collect();
            }
            if !conditions.is_empty() {
                return Ok(conditions.join(" AND "));
            }
        }
        Err(Error::NoJoinCondition {
            from: self.root.name().to_string(),
            to: target.name().to_string(),
        })
    }

    fn open_clause(&mut self) {
        if self.where_open {
            self.query.push_str(" AND ");
        } else {
            self.query.push_str(" WHERE ");
            self.where_open = true;
        }
    }

    /// Predicates are ANDed, including across repeated `WHERE` modifiers.
    pub fn render_where(&mut self, exprs: &[Expr]) -> Result<()> {
        for expr in exprs {
            self.open_clause();
            self.render_expr(expr)?;
        }
        Ok(())
    }

    pub fn render_group_by(&mut self, columns: &[Col]) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let rendered = columns
            .iter()
            .map(|c| self.render_column(c))
            .collect::<Result<Vec<_>>>()?;
        self.query
            .push_str(&format!(" GROUP BY {}", rendered.join(", ")));
        Ok(())
    }

    pub fn render_order_by(&mut self, orders: &[Order]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }
        let rendered = orders
            .iter()
            .map(|o| {
                let column = self.render_column(&o.column)?;
                Ok(if o.descending {
                    format!("{column} DESC")
                } else {
                    column
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.query
            .push_str(&format!(" ORDER BY {}", rendered.join(", ")));
        Ok(())
    }

    pub fn render_limit(&mut self, limit: u64, offset: Option<u64>) {
        self.query.push_str(" LIMIT ");
        self.bind(Value::BigInt(i64::try_from(limit).unwrap_or(i64::MAX)));
        if let Some(offset) = offset {
            self.query.push_str(" OFFSET ");
            self.bind(Value::BigInt(i64::try_from(offset).unwrap_or(i64::MAX)));
        }
    }

    /// `alias."column"` for a column reference.
    pub fn render_column(&self, col: &Col) -> Result<String> {
        let table = self.ns.resolve_table(self.root.database(), &col.table)?;
        let field = table.lookup(&col.attr).ok_or_else(|| Error::UnknownField {
            table: table.name().to_string(),
            field: col.attr.clone(),
        })?;
        if !field.is_stored() {
            return Err(Error::UnsupportedOperation(format!(
                "relation {}.{} has no column",
                table.name(),
                col.attr
            )));
        }
        Ok(Self::qualified(table, field.column_name()))
    }

    pub fn render_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Compare {
                column,
                op,
                operand,
            } => {
                let column = self.render_column(column)?;
                self.query.push_str(&format!("{column} {} ", op.as_sql()));
                match operand {
                    Operand::Value(value) => self.bind(value.clone()),
                    Operand::Column(other) => {
                        let other = self.render_column(other)?;
                        self.query.push_str(&other);
                    }
                    Operand::Function(function) => {
                        self.query.push_str(Self::render_function(*function));
                    }
                }
            }
            Expr::In { column, values } => {
                if values.is_empty() {
                    self.query.push_str("FALSE");
                    return Ok(());
                }
                let column = self.render_column(column)?;
                self.query.push_str(&format!("{column} IN ("));
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        self.query.push_str(", ");
                    }
                    self.bind(value.clone());
                }
                self.query.push(')');
            }
            Expr::And(exprs) => self.render_group(exprs, " AND ", "TRUE")?,
            Expr::Or(exprs) => self.render_group(exprs, " OR ", "FALSE")?,
        }
        Ok(())
    }

    fn render_group(&mut self, exprs: &[Expr], joiner: &str, empty: &str) -> Result<()> {
        match exprs {
            [] => self.query.push_str(empty),
            [single] => self.render_expr(single)?,
            _ => {
                self.query.push('(');
                for (idx, expr) in exprs.iter().enumerate() {
                    if idx > 0 {
                        self.query.push_str(joiner);
                    }
                    self.render_expr(expr)?;
                }
                self.query.push(')');
            }
        }
        Ok(())
    }
}

fn points_at(reference: &sqlmeta_core::ResolvedRef, table: &TableDef) -> bool {
    reference.table == table.name() && reference.database == table.database()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{or, utc_now};
    use sqlmeta_core::{Field, SqlType, TableDecl, many_to_many};

    macro_rules! entity {
        ($name:ident, $decl:expr) => {
            #[derive(Debug, Default)]
            struct $name {
                slots: Slots,
            }

            impl Entity for $name {
                fn declare() -> TableDecl {
                    $decl
                }

                fn slots(&self) -> &Slots {
                    &self.slots
                }

                fn slots_mut(&mut self) -> &mut Slots {
                    &mut self.slots
                }
            }
        };
    }

    entity!(
        User,
        TableDecl::new("render")
            .field("id", Field::primary_key(SqlType::Integer).autoincrement())
            .field(
                "created_at",
                Field::column(SqlType::timestamp()).default_function(SqlFunction::UtcNow)
            )
            .field("login", Field::column(SqlType::string(50)).unique(true))
            .field("groups", many_to_many("group", "user_group"))
    );
    entity!(
        Group,
        TableDecl::new("render")
            .field("id", Field::primary_key(SqlType::Integer))
            .field("name", Field::column(SqlType::string(255)))
    );
    entity!(
        UserGroup,
        TableDecl::new("render")
            .field("group_id", Field::foreign_key("group.id").as_primary_key())
            .field("user_id", Field::foreign_key("user.id").as_primary_key())
    );

    fn namespace() -> Namespace {
        let mut ns = Namespace::new();
        ns.register::<User>().unwrap();
        ns.register::<Group>().unwrap();
        ns.register::<UserGroup>().unwrap();
        assert!(ns.finalize().is_complete());
        ns
    }

    #[test]
    fn test_render_select_plain() {
        let ns = namespace();
        let mut r = Renderer::for_entity::<Group>(&ns).unwrap();
        r.render_select(&Chain::default()).unwrap();
        assert_eq!(r.query(), r#"SELECT t2."id", t2."name" FROM "group" AS t2"#);
        assert!(r.parameters().is_empty());
    }

    #[test]
    fn test_render_where_and_or() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Where(vec![Col::of::<User>("login").eq("alice")]));
        chain.push(Modifier::Where(vec![or([
            Col::of::<User>("id").gt(3),
            Col::of::<User>("id").in_(Vec::<i32>::new()),
        ])]));
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        r.render_select(&chain).unwrap();
        let (sql, params) = r.finish();
        assert_eq!(
            sql,
            r#"SELECT t1."created_at", t1."id", t1."login" FROM "user" AS t1 WHERE t1."login" = %s AND (t1."id" > %s OR FALSE)"#
        );
        assert_eq!(params, vec![Value::from("alice"), Value::Int(3)]);
    }

    #[test]
    fn test_render_inferred_join() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Join(Join {
            table: sqlmeta_core::TableTarget::of::<UserGroup>(),
            on: None,
        }));
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        r.render_select(&chain).unwrap();
        assert!(
            r.query()
                .ends_with(r#" INNER JOIN "user_group" AS t3 ON t1."id" = t3."user_id""#),
            "{}",
            r.query()
        );
    }

    #[test]
    fn test_render_join_multi_hop_and_left() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Join(Join {
            table: sqlmeta_core::TableTarget::Named("user_group".into()),
            on: None,
        }));
        chain.push(Modifier::LeftJoin(Join {
            table: sqlmeta_core::TableTarget::of::<Group>(),
            on: None,
        }));
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        r.render_select(&chain).unwrap();
        assert!(
            r.query()
                .ends_with(r#" LEFT JOIN "group" AS t2 ON t3."group_id" = t2."id""#),
            "{}",
            r.query()
        );
    }

    #[test]
    fn test_render_explicit_join_overrides_inference() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Join(Join {
            table: sqlmeta_core::TableTarget::of::<Group>(),
            on: Some(vec![Col::of::<Group>("name").eq(Col::of::<User>("login"))]),
        }));
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        r.render_select(&chain).unwrap();
        assert!(
            r.query()
                .ends_with(r#" INNER JOIN "group" AS t2 ON t2."name" = t1."login""#)
        );
    }

    #[test]
    fn test_render_join_without_condition_fails() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Join(Join {
            table: sqlmeta_core::TableTarget::of::<Group>(),
            on: None,
        }));
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        assert_eq!(
            r.render_select(&chain).unwrap_err(),
            Error::NoJoinCondition {
                from: "user".into(),
                to: "group".into()
            }
        );
    }

    #[test]
    fn test_render_rejects_table_already_in_scope() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Join(Join {
            table: sqlmeta_core::TableTarget::of::<User>(),
            on: None,
        }));
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        assert_eq!(
            r.render_select(&chain).unwrap_err(),
            Error::NoJoinCondition {
                from: "user".into(),
                to: "user".into()
            }
        );

        let mut chain = Chain::default();
        for _ in 0..2 {
            chain.push(Modifier::Join(Join {
                table: sqlmeta_core::TableTarget::of::<UserGroup>(),
                on: None,
            }));
        }
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        assert_eq!(
            r.render_select(&chain).unwrap_err(),
            Error::NoJoinCondition {
                from: "user".into(),
                to: "user_group".into()
            }
        );
    }

    #[test]
    fn test_render_insert_skips_generated_and_inlines_functions() {
        let ns = namespace();
        let user = User::default().with("login", "bob").unwrap();
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        r.render_insert(user.slots()).unwrap();
        let (sql, params) = r.finish();
        assert_eq!(
            sql,
            r#"INSERT INTO "user" ("created_at", "login") VALUES ((NOW() at time zone 'utc'), %s) RETURNING "created_at", "id", "login""#
        );
        assert_eq!(params, vec![Value::from("bob")]);
    }

    #[test]
    fn test_render_update_and_delete_use_key() {
        let ns = namespace();
        let group = Group::default()
            .with("id", 7)
            .unwrap()
            .with("name", "wheel")
            .unwrap();
        let mut r = Renderer::for_entity::<Group>(&ns).unwrap();
        r.render_update(group.slots()).unwrap();
        let (sql, params) = r.finish();
        assert_eq!(
            sql,
            r#"UPDATE "group" SET "name" = %s WHERE "id" = %s RETURNING "id", "name""#
        );
        assert_eq!(params, vec![Value::from("wheel"), Value::Int(7)]);

        let mut r = Renderer::for_entity::<Group>(&ns).unwrap();
        r.render_delete(group.slots()).unwrap();
        assert_eq!(r.query(), r#"DELETE FROM "group" WHERE "id" = %s"#);
        assert_eq!(r.parameters(), [Value::Int(7)]);
    }

    #[test]
    fn test_render_update_without_mutable_columns() {
        let ns = namespace();
        let link = UserGroup::default()
            .with("group_id", 1)
            .unwrap()
            .with("user_id", 2)
            .unwrap();
        let mut r = Renderer::for_entity::<UserGroup>(&ns).unwrap();
        assert!(matches!(
            r.render_update(link.slots()),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_render_group_order_limit() {
        let ns = namespace();
        let mut chain = Chain::default();
        chain.push(Modifier::Limit {
            limit: 10,
            offset: Some(20),
        });
        chain.push(Modifier::OrderBy(vec![Col::of::<Group>("name").desc()]));
        chain.push(Modifier::GroupBy(vec![Col::of::<Group>("name")]));
        let mut r = Renderer::for_entity::<Group>(&ns).unwrap();
        r.render_count(Some(&Col::of::<Group>("id")), &chain).unwrap();
        let (sql, params) = r.finish();
        assert_eq!(
            sql,
            r#"SELECT COUNT(t2."id") FROM "group" AS t2 GROUP BY t2."name" ORDER BY t2."name" DESC LIMIT %s OFFSET %s"#
        );
        assert_eq!(params, vec![Value::BigInt(10), Value::BigInt(20)]);
    }

    #[test]
    fn test_render_function_operand() {
        let ns = namespace();
        let mut r = Renderer::for_entity::<User>(&ns).unwrap();
        r.render_where(&[Col::of::<User>("created_at").lt(utc_now())])
            .unwrap();
        assert_eq!(
            r.query(),
            r#" WHERE t1."created_at" < (NOW() at time zone 'utc')"#
        );
        assert!(r.parameters().is_empty());
    }

    #[test]
    fn test_relation_is_not_a_column() {
        let ns = namespace();
        let r = Renderer::for_entity::<User>(&ns).unwrap();
        assert!(matches!(
            r.render_column(&Col::of::<User>("groups")),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            r.render_column(&Col::of::<User>("nope")),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_transaction_statements() {
        assert_eq!(Renderer::render_begin_transaction(), "BEGIN");
        assert_eq!(Renderer::render_commit_transaction(), "COMMIT");
        assert_eq!(Renderer::render_rollback_transaction(), "ROLLBACK");
    }
}
