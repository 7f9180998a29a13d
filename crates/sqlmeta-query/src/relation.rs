//! Loading related entities.
//!
//! Relations are never cached: each load renders and runs a fresh
//! [`Select`] built from the relation's resolved foreign keys.

use asupersync::{Cx, Outcome};
use sqlmeta_core::{
    Cursor, Driver, DriverRegistry, Entity, Error, Namespace, Reference, Relation, ResolvedRef,
    Result, TableDef, TableLink, Value, try_outcome, try_result,
};

use crate::expr::{Col, Expr};
use crate::select::{ResultSet, Select, scoped_cursor};
use crate::statement::Chained;

fn resolved<'r>(owner: &TableDef, reference: &'r Reference) -> Result<&'r ResolvedRef> {
    reference.resolved().ok_or_else(|| Error::UnresolvedReference {
        owner: owner.name().to_string(),
        reference: reference.describe(),
    })
}

fn same_table(reference: &ResolvedRef, table: &TableDef) -> bool {
    reference.table == table.name() && reference.database == table.database()
}

fn wrong_target(owner: &TableDef, attr: &str, target: &TableDef) -> Error {
    Error::UnsupportedOperation(format!(
        "{}.{attr} does not lead to {}",
        owner.name(),
        target.name()
    ))
}

/// Value of `column` on `entity`; an unsaved entity has no key to follow.
fn key_value<E: Entity>(entity: &E, owner: &TableDef, column: &str) -> Result<Value> {
    let value = entity.get(column);
    if value.is_null() {
        return Err(Error::MissingKeyValue {
            table: owner.name().to_string(),
            column: column.to_string(),
        });
    }
    Ok(value)
}

/// Predicate selecting rows of `target` whose foreign key `fk` points back
/// at `entity`.
fn back_reference<E: Entity>(
    entity: &E,
    owner: &TableDef,
    attr: &str,
    target: &TableDef,
    fk: &ResolvedRef,
) -> Result<Expr> {
    if !same_table(fk, target) {
        return Err(wrong_target(owner, attr, target));
    }
    let fk_field = target.require_field(&fk.field)?;
    let points_to = resolved(target, fk_field.reference().ok_or_else(|| {
        wrong_target(owner, attr, target)
    })?)?;
    if !same_table(points_to, owner) {
        return Err(wrong_target(owner, attr, target));
    }
    Ok(Col::named(target.name(), &fk.field).eq(key_value(entity, owner, &points_to.field)?))
}

/// The statement that loads relation `attr` of `entity` as `T` rows.
pub fn related<E: Entity, T: Entity>(ns: &Namespace, entity: &E, attr: &str) -> Result<Select<T>> {
    let owner = ns.table_of::<E>()?;
    let target = ns.table_of::<T>()?;
    let relation = owner.relation(attr)?;

    let select = match relation {
        Relation::OneToOne { foreign_key } => {
            let fk = resolved(owner, foreign_key)?;
            if same_table(fk, owner) {
                let local = owner.require_field(&fk.field)?;
                let points_to = resolved(
                    owner,
                    local
                        .reference()
                        .ok_or_else(|| wrong_target(owner, attr, target))?,
                )?;
                if !same_table(points_to, target) {
                    return Err(wrong_target(owner, attr, target));
                }
                Select::new().filter(
                    Col::named(target.name(), &points_to.field)
                        .eq(key_value(entity, owner, &fk.field)?),
                )
            } else {
                Select::new().filter(back_reference(entity, owner, attr, target, fk)?)
            }
        }
        Relation::OneToMany { foreign_key } => {
            let fk = resolved(owner, foreign_key)?;
            Select::new().filter(back_reference(entity, owner, attr, target, fk)?)
        }
        Relation::ManyToMany {
            foreign_table,
            secondary,
        } => {
            let unresolved = |link: &TableLink| Error::UnresolvedReference {
                owner: owner.name().to_string(),
                reference: link.describe().to_string(),
            };
            let TableLink::Resolved { database, table } = foreign_table else {
                return Err(unresolved(foreign_table));
            };
            if *table != target.name() || *database != target.database() {
                return Err(wrong_target(owner, attr, target));
            }
            let TableLink::Resolved { database, table } = secondary else {
                return Err(unresolved(secondary));
            };
            let link = ns.table(database, table)?;
            let filters = link
                .foreign_keys()
                .filter_map(|fk| match fk.reference() {
                    Some(Reference::Resolved(r)) if same_table(r, owner) => Some(
                        key_value(entity, owner, &r.field)
                            .map(|value| Col::named(link.name(), &fk.attr).eq(value)),
                    ),
                    _ => None,
                })
                .collect::<Result<Vec<Expr>>>()?;
            if filters.is_empty() {
                return Err(Error::NoJoinCondition {
                    from: link.name().to_string(),
                    to: owner.name().to_string(),
                });
            }
            Select::new().join_table(link.name()).filter_all(filters)
        }
    };
    tracing::debug!(
        table = %owner.name(),
        relation = %attr,
        kind = relation.kind().as_str(),
        "Loading relation"
    );
    Ok(select)
}

/// Load a one-to-one relation on an explicit cursor.
pub async fn load_one_on<E: Entity, T: Entity, C: Cursor>(
    cx: &Cx,
    ns: &Namespace,
    cursor: &mut C,
    entity: &E,
    attr: &str,
) -> Outcome<Option<T>, Error> {
    let select = try_result!(related::<E, T>(ns, entity, attr));
    select.first_on(cx, ns, cursor).await
}

/// Load a collection relation on an explicit cursor. Every call runs one
/// fresh query.
pub async fn load_many_on<'ns, E: Entity, T: Entity, C: Cursor>(
    cx: &Cx,
    ns: &'ns Namespace,
    cursor: &mut C,
    entity: &E,
    attr: &str,
) -> Outcome<ResultSet<'ns, T>, Error> {
    let select = try_result!(related::<E, T>(ns, entity, attr));
    select.run_on(cx, ns, cursor).await
}

pub async fn load_one<E: Entity, T: Entity, D: Driver>(
    cx: &Cx,
    ns: &Namespace,
    drivers: &DriverRegistry<D>,
    entity: &E,
    attr: &str,
) -> Outcome<Option<T>, Error> {
    let table = try_result!(ns.table_of::<T>());
    let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
    load_one_on(cx, ns, &mut cursor, entity, attr).await
}

pub async fn load_many<'ns, E: Entity, T: Entity, D: Driver>(
    cx: &Cx,
    ns: &'ns Namespace,
    drivers: &DriverRegistry<D>,
    entity: &E,
    attr: &str,
) -> Outcome<ResultSet<'ns, T>, Error> {
    let table = try_result!(ns.table_of::<T>());
    let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
    load_many_on(cx, ns, &mut cursor, entity, attr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmeta_core::{Field, Slots, SqlType, TableDecl, Value, one_to_many, one_to_one};

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
        Author,
        TableDecl::new("library")
            .field("id", Field::primary_key(SqlType::Integer))
            .field("books", one_to_many("book.author_id"))
            .field("profile", one_to_one("profile.author_id"))
    );
    entity!(
        Book,
        TableDecl::new("library")
            .field("id", Field::primary_key(SqlType::Integer))
            .field("author_id", Field::foreign_key("author.id"))
            .field("author", one_to_one("author_id"))
    );
    entity!(
        Profile,
        TableDecl::new("library")
            .field("id", Field::primary_key(SqlType::Integer))
            .field("author_id", Field::foreign_key("author.id").unique(true))
    );

    fn namespace() -> Namespace {
        let mut ns = Namespace::new();
        ns.register::<Book>().unwrap();
        ns.register::<Author>().unwrap();
        ns.register::<Profile>().unwrap();
        assert!(ns.finalize().is_complete());
        ns
    }

    #[test]
    fn test_one_to_one_local_key() {
        let ns = namespace();
        let book = Book::default().with("author_id", 9).unwrap();
        let (sql, params) = related::<Book, Author>(&ns, &book, "author")
            .unwrap()
            .build(&ns)
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT t2."id" FROM "author" AS t2 WHERE t2."id" = %s"#
        );
        assert_eq!(params, vec![Value::Int(9)]);
    }

    #[test]
    fn test_one_to_one_remote_key_and_one_to_many() {
        let ns = namespace();
        let author = Author::default().with("id", 4).unwrap();
        let (sql, params) = related::<Author, Profile>(&ns, &author, "profile")
            .unwrap()
            .build(&ns)
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT t3."author_id", t3."id" FROM "profile" AS t3 WHERE t3."author_id" = %s"#
        );
        assert_eq!(params, vec![Value::Int(4)]);

        let (sql, _) = related::<Author, Book>(&ns, &author, "books")
            .unwrap()
            .build(&ns)
            .unwrap();
        assert!(sql.ends_with(r#"FROM "book" AS t1 WHERE t1."author_id" = %s"#));
    }

    #[test]
    fn test_wrong_target_type() {
        let ns = namespace();
        let author = Author::default().with("id", 4).unwrap();
        assert!(matches!(
            related::<Author, Profile>(&ns, &author, "books"),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            related::<Author, Book>(&ns, &author, "id"),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_unsaved_entity_has_no_key_to_follow() {
        let ns = namespace();
        let author = Author::default();
        assert_eq!(
            related::<Author, Book>(&ns, &author, "books").unwrap_err(),
            Error::MissingKeyValue {
                table: "author".into(),
                column: "id".into()
            }
        );
        let book = Book::default();
        assert_eq!(
            related::<Book, Author>(&ns, &book, "author").unwrap_err(),
            Error::MissingKeyValue {
                table: "book".into(),
                column: "author_id".into()
            }
        );
    }
}
