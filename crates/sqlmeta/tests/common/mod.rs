//! Sample schema shared by the integration tests.
//!
//! Registration order fixes the aliases: `user_group` t1, `user` t2,
//! `group` t3, `preference` t4, `user_preference` t5.

#![allow(dead_code)]

use sqlmeta::prelude::*;

pub const DATABASE: &str = "sample";

macro_rules! entity {
    ($name:ident, $decl:expr) => {
        #[derive(Debug, Default, Clone)]
        pub struct $name {
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
    UserGroup,
    TableDecl::new(DATABASE)
        .field("group_id", Field::foreign_key("group.id").as_primary_key())
        .field("user_id", Field::foreign_key("user.id").as_primary_key())
);

entity!(
    User,
    TableDecl::new(DATABASE)
        .field("id", Field::primary_key(SqlType::Integer).autoincrement())
        .field(
            "created_at",
            Field::column(SqlType::timestamp()).default_function(SqlFunction::UtcNow)
        )
        .field("login", Field::column(SqlType::string(50)).unique(true))
        .field("password", Field::column(SqlType::string(60)))
        .field("firstname", Field::column(SqlType::string(255)).nullable(true))
        .field("lastname", Field::column(SqlType::string(255)).nullable(true))
        .field("email", Field::column(SqlType::string(255)).unique(true))
        .field("lang", Field::column(SqlType::string(2)).default_value("en"))
        .field("preferences", one_to_many("user_preference.user_id"))
        .field("groups", many_to_many_of::<Group, UserGroup>())
);

entity!(
    Group,
    TableDecl::new(DATABASE)
        .field("id", Field::primary_key(SqlType::Integer))
        .field(
            "created_at",
            Field::column(SqlType::timestamp()).default_function(SqlFunction::UtcNow)
        )
        .field("name", Field::column(SqlType::string(255)))
        .field("users", many_to_many("user", "user_group"))
);

entity!(
    Preference,
    TableDecl::new(DATABASE)
        .field("id", Field::primary_key(SqlType::Integer).autoincrement())
        .field(
            "created_at",
            Field::column(SqlType::timestamp()).default_function(SqlFunction::UtcNow)
        )
        .field("key", Field::column(SqlType::string(255)).unique(true))
        .field("type", Field::column(SqlType::string(50)))
        .field("default", Field::column(SqlType::Text).nullable(true))
);

entity!(
    UserPreference,
    TableDecl::new(DATABASE)
        .field("id", Field::primary_key(SqlType::Integer).autoincrement())
        .field(
            "created_at",
            Field::column(SqlType::timestamp()).default_function(SqlFunction::UtcNow)
        )
        .field("user_id", Field::foreign_key_to::<User>("id"))
        .field("preference_id", Field::foreign_key_to::<Preference>("id"))
        .field("value", Field::column(SqlType::Text).nullable(true))
        .field("preference", one_to_one("preference_id"))
        .field("user", one_to_one("user_preference.user_id"))
);

/// Registry with every sample table registered and resolved.
pub fn namespace() -> Namespace {
    let mut ns = Namespace::new();
    ns.register::<UserGroup>().unwrap();
    ns.register::<User>().unwrap();
    ns.register::<Group>().unwrap();
    ns.register::<Preference>().unwrap();
    ns.register::<UserPreference>().unwrap();
    let report = ns.finalize();
    assert!(report.is_complete(), "unresolved: {:?}", report.unresolved);
    ns
}

/// A row in `user` column order: created_at, email, firstname, id, lang,
/// lastname, login, password.
pub fn user_row(id: i32, login: &str) -> Row {
    Row::new(vec![
        Value::TimestampTz(1_700_000_000_000_000),
        Value::from(format!("{login}@example.com")),
        Value::Null,
        Value::Int(id),
        Value::from("en"),
        Value::Null,
        Value::from(login),
        Value::from("secret"),
    ])
}

/// A row in `user_preference` column order: created_at, id, preference_id,
/// user_id, value.
pub fn user_preference_row(id: i32, user_id: i32, preference_id: i32, value: &str) -> Row {
    Row::new(vec![
        Value::TimestampTz(1_700_000_000_000_000),
        Value::Int(id),
        Value::Int(preference_id),
        Value::Int(user_id),
        Value::from(value),
    ])
}
