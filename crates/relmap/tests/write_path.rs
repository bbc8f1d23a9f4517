use relmap::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

relmap::sql_enum! {
    pub enum Plan: "account_plan" {
        Free => "FREE",
        Pro => "PRO",
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Free
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Settings {
    theme: String,
}

relmap::json_type!(Settings);

#[derive(Debug, Default, Clone, PartialEq)]
struct Account {
    id: Uuid,
    plan: Plan,
    settings: Option<Settings>,
}

impl Entity for Account {
    const TABLE_NAME: &'static str = "accounts";

    fn describe(b: &mut EntityBuilder<Self>) {
        b.field("id", |a| &a.id, |a| &mut a.id);
        b.field("plan", |a| &a.plan, |a| &mut a.plan);
        b.optional("settings", |a| &a.settings, |a| &mut a.settings);
    }
}

#[derive(Default)]
struct Capture {
    executed: parking_lot::Mutex<Vec<Statement>>,
}

impl Connection for Capture {
    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.executed.lock().push(statement.clone());
        Ok(Vec::new())
    }

    fn execute(&self, statement: &Statement) -> Result<u64> {
        self.executed.lock().push(statement.clone());
        Ok(1)
    }
}

fn postgres() -> Database<Capture> {
    let db = Database::new(
        Capture::default(),
        DatabaseConfig::default().engine(Engine::Postgres),
    );
    db.chain().register_json::<Settings>();
    db.register::<Account>().unwrap();
    db
}

#[test]
fn test_insert_uses_engine_placeholders() {
    let db = postgres();
    let account = Account {
        id: Uuid::nil(),
        plan: Plan::Pro,
        settings: Some(Settings {
            theme: "dark".into(),
        }),
    };

    db.repository::<Account>().unwrap().insert(&account).unwrap();

    let executed = db.connection().executed.lock();
    let statement = &executed[0];
    assert_eq!(
        statement.sql,
        r#"INSERT INTO "accounts" ("id", "plan", "settings") VALUES ((:id)::uuid, (:plan)::account_plan, (:settings)::jsonb)"#
    );
    assert_eq!(
        statement.param("plan"),
        Some(&Value::typed("account_plan", Value::from("PRO")))
    );
}

#[test]
fn test_null_json_binds_null() {
    let db = postgres();
    db.repository::<Account>()
        .unwrap()
        .insert(&Account::default())
        .unwrap();
    let executed = db.connection().executed.lock();
    assert_eq!(executed[0].param("settings"), Some(&Value::Null));
}

#[test]
fn test_find_by_uuid_casts_parameter() {
    let db = postgres();
    let id = Uuid::nil();
    let found = db.repository::<Account>().unwrap().find_by_id(id).unwrap();
    assert!(found.is_none());

    let executed = db.connection().executed.lock();
    assert!(
        executed[0]
            .sql
            .contains(r#"WHERE "accounts"."id" = (:p1)::uuid LIMIT 1"#),
        "{}",
        executed[0].sql
    );
}

#[test]
fn test_json_registration_must_precede_entity_registration() {
    let db = Database::new(
        Capture::default(),
        DatabaseConfig::default().engine(Engine::Postgres),
    );
    let err = db.register::<Account>().unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::TypeNotConfigured { .. })
    ));
    assert!(db.repository::<Account>().is_err());
}
