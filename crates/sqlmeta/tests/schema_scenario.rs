//! Registry and DDL behaviour over the sample schema.

mod common;

use common::{DATABASE, Group, User, UserGroup, UserPreference, namespace};
use sqlmeta::prelude::*;
use sqlmeta::{DdlGenerator, PostgresDdlGenerator};

fn position(order: &[&str], name: &str) -> usize {
    order
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
}

#[test]
fn list_tables_places_targets_before_referrers() {
    let ns = namespace();
    let tables = ns.list_tables(DATABASE).unwrap();
    let order: Vec<&str> = tables.iter().map(|t| t.name()).collect();
    assert_eq!(order.len(), 5);
    assert!(position(&order, "user") < position(&order, "user_group"));
    assert!(position(&order, "group") < position(&order, "user_group"));
    assert!(position(&order, "user") < position(&order, "user_preference"));
    assert!(position(&order, "preference") < position(&order, "user_preference"));
}

#[test]
fn user_group_ddl_has_both_foreign_keys() {
    let ns = namespace();
    let ddl = CreateTable::<UserGroup>::new().build(&ns).unwrap();
    assert_eq!(
        ddl,
        concat!(
            "CREATE TABLE IF NOT EXISTS \"user_group\" (\n",
            "  \"group_id\" int NOT NULL,\n",
            "  \"user_id\" int NOT NULL,\n",
            "  PRIMARY KEY (\"group_id\", \"user_id\"),\n",
            "  CONSTRAINT \"user_group_group_id_fkey\" FOREIGN KEY (\"group_id\")\n",
            "    REFERENCES \"group\" (\"id\") MATCH SIMPLE ON UPDATE NO ACTION ON DELETE NO ACTION,\n",
            "  CONSTRAINT \"user_group_user_id_fkey\" FOREIGN KEY (\"user_id\")\n",
            "    REFERENCES \"user\" (\"id\") MATCH SIMPLE ON UPDATE NO ACTION ON DELETE NO ACTION\n",
            ")"
        )
    );
}

#[test]
fn user_ddl_orders_columns_and_constraints() {
    let ns = namespace();
    let ddl = PostgresDdlGenerator
        .create_table(ns.table_of::<User>().unwrap())
        .unwrap();
    let lines: Vec<&str> = ddl.lines().collect();
    assert_eq!(lines[0], "CREATE TABLE IF NOT EXISTS \"user\" (");
    assert_eq!(lines[1], "  \"id\" serial NOT NULL,");
    assert_eq!(
        lines[2],
        "  \"created_at\" timestamp with time zone NOT NULL DEFAULT (NOW() at time zone 'utc'),"
    );
    assert_eq!(lines[3], "  \"email\" varchar(255) NOT NULL,");
    assert_eq!(lines[4], "  \"firstname\" varchar(255),");
    assert_eq!(lines[5], "  \"lang\" varchar(2) NOT NULL DEFAULT 'en',");
    assert!(ddl.contains("  PRIMARY KEY (\"id\"),\n"));
    assert!(ddl.contains("  CONSTRAINT \"user_email_key\" UNIQUE (\"email\"),\n"));
    assert!(ddl.ends_with("  CONSTRAINT \"user_login_key\" UNIQUE (\"login\")\n)"));
}

#[test]
fn foreign_keys_copy_target_type_without_autoincrement() {
    let ns = namespace();
    let table = ns.table_of::<UserPreference>().unwrap();
    let user_id = table.field("user_id").unwrap();
    assert_eq!(user_id.sql_type, Some(SqlType::Integer));
    assert!(!user_id.autoincrement);
    assert!(ns.table_of::<User>().unwrap().field("id").unwrap().autoincrement);
}

#[test]
fn create_schema_follows_dependency_order() {
    let ns = namespace();
    let statements = CreateSchema::new(DATABASE).build(&ns).unwrap();
    let tables: Vec<&str> = ns
        .list_tables(DATABASE)
        .unwrap()
        .into_iter()
        .map(|t| t.name())
        .collect();
    assert_eq!(statements.len(), tables.len());
    for (sql, table) in statements.iter().zip(&tables) {
        assert!(
            sql.starts_with(&format!("CREATE TABLE IF NOT EXISTS \"{table}\" (")),
            "{sql}"
        );
    }
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut ns = namespace();
    assert!(matches!(
        ns.register::<Group>(),
        Err(Error::DuplicateTable { .. })
    ));
}

#[test]
fn summary_serializes_foreign_keys() {
    let ns = namespace();
    let summary = serde_json::to_value(ns.summary(DATABASE)).unwrap();
    let user_group = summary
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "user_group")
        .unwrap();
    assert_eq!(user_group["alias"], "t1");
    assert_eq!(user_group["foreign_keys"]["group_id"], "group.id");
    assert_eq!(user_group["foreign_keys"]["user_id"], "user.id");
    assert_eq!(
        user_group["primary_key"],
        serde_json::json!(["group_id", "user_id"])
    );
}
