#![allow(dead_code)]

use chrono::NaiveDate;
use platform_authn::UserProfile;
use platform_authz::AppRole;
use platform_db::DbPool;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, Statement, Value};
use uuid::Uuid;

/// Mirrors the production tables closely enough for the store-side checks the
/// service relies on: enum domains become CHECK constraints and the slot
/// uniqueness is a unique index.
const SCHEMA: &[&str] = &[
    "CREATE TABLE employees (
        id BLOB PRIMARY KEY NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NULL,
        phone TEXT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 1
    )",
    "CREATE TABLE user_profiles (
        user_id BLOB PRIMARY KEY NOT NULL,
        role TEXT NOT NULL,
        employee_id BLOB NULL REFERENCES employees(id),
        display_name TEXT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 1
    )",
    "CREATE TABLE assignments (
        id BLOB PRIMARY KEY NOT NULL,
        employee_id BLOB NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
        activity TEXT NOT NULL CHECK (activity IN ('ME1', 'ME2', 'LOG')),
        assign_date DATE NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('OPERATEUR', 'CHEF_EQUIPE')),
        shift TEXT NOT NULL CHECK (shift IN ('MATIN', 'APRES_MIDI', 'NUIT')),
        is_pf BOOLEAN NOT NULL DEFAULT 0,
        status TEXT NOT NULL CHECK (status IN ('BROUILLON', 'SOUMIS', 'VALIDE', 'REFUSE')),
        created_by BLOB NULL
    )",
    "CREATE UNIQUE INDEX assignments_slot_key
        ON assignments (employee_id, assign_date, activity, role, shift)",
    "CREATE TABLE unavailabilities (
        id BLOB PRIMARY KEY NOT NULL,
        employee_id BLOB NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
        type TEXT NOT NULL CHECK (type IN ('CONGE', 'MALADIE', 'FORMATION', 'AUTRE')),
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        start_time TIME NULL,
        end_time TIME NULL,
        impact TEXT NOT NULL CHECK (impact IN ('INDISPONIBLE', 'PARTIEL')),
        status TEXT NOT NULL CHECK (status IN ('BROUILLON', 'SOUMIS', 'VALIDE', 'REFUSE')),
        requested_by BLOB NULL
    )",
    "CREATE TABLE v_coverage_alerts_daily_summary (
        activity TEXT NOT NULL,
        day_date DATE NOT NULL,
        mode TEXT NOT NULL,
        missing_total INTEGER NOT NULL,
        missing_items TEXT NOT NULL,
        PRIMARY KEY (activity, day_date)
    )",
    "CREATE TABLE v_medical_visit_alerts (
        employee_id BLOB NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        visit_type_code TEXT NOT NULL,
        visit_type_label TEXT NULL,
        visit_date DATE NULL,
        expires_on DATE NULL,
        alert_level TEXT NOT NULL,
        PRIMARY KEY (employee_id, visit_type_code)
    )",
];

pub async fn setup() -> DbPool {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    for ddl in SCHEMA {
        db.execute(Statement::from_string(DatabaseBackend::Sqlite, ddl.to_string()))
            .await
            .unwrap();
    }
    db
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn caller(role: AppRole, employee_id: Option<Uuid>) -> UserProfile {
    UserProfile {
        user_id: Uuid::new_v4(),
        email: Some(format!("{}@example.test", role.as_str().to_lowercase())),
        role,
        employee_id,
        display_name: None,
    }
}

pub fn manager() -> UserProfile {
    caller(AppRole::Responsable, None)
}

pub fn supervisor() -> UserProfile {
    caller(AppRole::ChefChantier, None)
}

pub async fn insert_employee(db: &DbPool, first: &str, last: &str, active: bool) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO employees (id, first_name, last_name, email, phone, is_active) VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            first.into(),
            last.into(),
            Value::from(None::<String>),
            Value::from(None::<String>),
            active.into(),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn insert_assignment(
    db: &DbPool,
    employee_id: Uuid,
    day: &str,
    activity: &str,
    status: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO assignments (id, employee_id, activity, assign_date, role, shift, is_pf, status, created_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            employee_id.into(),
            activity.into(),
            date(day).into(),
            "OPERATEUR".into(),
            "MATIN".into(),
            false.into(),
            status.into(),
            Value::from(None::<Uuid>),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn insert_unavailability(
    db: &DbPool,
    employee_id: Uuid,
    start: &str,
    end: &str,
    status: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO unavailabilities (id, employee_id, type, start_date, end_date, start_time, end_time, impact, status, requested_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            employee_id.into(),
            "CONGE".into(),
            date(start).into(),
            date(end).into(),
            Value::from(None::<String>),
            Value::from(None::<String>),
            "INDISPONIBLE".into(),
            status.into(),
            Value::from(None::<Uuid>),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn assignment_status(db: &DbPool, id: Uuid) -> String {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT status FROM assignments WHERE id = ?",
            vec![id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "status").unwrap()
}
