use crate::errors::Error;
use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use tracing::debug;

/// Bootstrap DDL, safe to run on every start
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    language TEXT NOT NULL,
    content TEXT NOT NULL,
    is_system BOOLEAN NOT NULL DEFAULT 0,
    user_id TEXT,
    is_deleted BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chart_groups (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    parent_id TEXT REFERENCES chart_groups(id),
    is_deleted BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    kind INTEGER NOT NULL DEFAULT 0,
    status INTEGER NOT NULL DEFAULT 0,
    user_id TEXT NOT NULL,
    template_id TEXT REFERENCES templates(id),
    group_id TEXT REFERENCES chart_groups(id),
    image_url TEXT,
    is_deleted BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id, is_deleted, created_at);

CREATE TABLE IF NOT EXISTS task_results (
    id TEXT PRIMARY KEY NOT NULL,
    task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id),
    is_success BOOLEAN NOT NULL DEFAULT 0,
    summary TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    data_points TEXT NOT NULL DEFAULT '[]',
    table_data TEXT NOT NULL DEFAULT '[]',
    generated_code TEXT,
    integration_doc TEXT,
    rendered_template TEXT,
    error_message TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Creates any missing tables and indexes
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), Error> {
    conn.batch_execute(SCHEMA_SQL)?;
    debug!("Database schema is up to date");
    Ok(())
}
