//! Versioned schema migrations, applied in order before the server starts.
//!
//! Every step is safe to run against a database created by an older release
//! that predates the `schema_migrations` table: tables are created with
//! `IF NOT EXISTS` and columns are only added when missing.

use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;

use super::error::Result;
use super::schema::schema_migrations;

pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    apply: fn(&SqliteConnection) -> QueryResult<()>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_wine",
        apply: create_wine,
    },
    Migration {
        version: 2,
        name: "add_wine_purchase_and_tasting_columns",
        apply: add_wine_purchase_and_tasting_columns,
    },
    Migration {
        version: 3,
        name: "create_consumption",
        apply: create_consumption,
    },
];

const CREATE_SCHEMA_MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    applied_at TIMESTAMP NOT NULL
)
"#;

const CREATE_WINE: &str = r#"
CREATE TABLE IF NOT EXISTS wine (
    id INTEGER PRIMARY KEY NOT NULL,
    name VARCHAR(120) NOT NULL,
    varietal VARCHAR(80),
    region VARCHAR(120),
    vintage INTEGER,
    quantity INTEGER NOT NULL DEFAULT 1,
    status VARCHAR(20) NOT NULL DEFAULT 'cellar',
    notes TEXT,
    created_at TIMESTAMP NOT NULL
)
"#;

/// Columns added to `wine` after the first release.
const WINE_OPTIONAL_COLUMNS: &[(&str, &str)] = &[
    ("price_paid", "NUMERIC(10, 2)"),
    ("purchase_location", "VARCHAR(120)"),
    ("tasting_notes", "TEXT"),
    ("experience_notes", "TEXT"),
    ("rating", "NUMERIC(2, 1)"),
];

const CREATE_CONSUMPTION: &str = r#"
CREATE TABLE IF NOT EXISTS consumption (
    id INTEGER PRIMARY KEY NOT NULL,
    wine_id INTEGER REFERENCES wine (id) ON DELETE SET NULL,
    wine_name VARCHAR(120) NOT NULL,
    consumed_at TIMESTAMP NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 1,
    rating NUMERIC(2, 1),
    tasting_notes TEXT,
    experience_notes TEXT
)
"#;

fn create_wine(conn: &SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(CREATE_WINE)
}

fn add_wine_purchase_and_tasting_columns(conn: &SqliteConnection) -> QueryResult<()> {
    let existing = table_columns(conn, "wine")?;

    for (column, sql_type) in WINE_OPTIONAL_COLUMNS {
        if existing.iter().any(|name| name == column) {
            continue;
        }

        debug!("Adding column wine.{}", column);
        conn.batch_execute(&format!(
            "ALTER TABLE wine ADD COLUMN {} {}",
            column, sql_type
        ))?;
    }

    Ok(())
}

fn create_consumption(conn: &SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(CREATE_CONSUMPTION)
}

#[derive(QueryableByName)]
struct ColumnInfo {
    #[sql_type = "Text"]
    name: String,
}

/// Names of the columns currently present on `table`.
pub fn table_columns(conn: &SqliteConnection, table: &str) -> QueryResult<Vec<String>> {
    let columns = diesel::sql_query("SELECT name FROM pragma_table_info(?)")
        .bind::<Text, _>(table)
        .load::<ColumnInfo>(conn)?;

    Ok(columns.into_iter().map(|c| c.name).collect())
}

/// Applies every migration that has not been recorded yet and returns the
/// versions that ran.
pub fn run_pending(conn: &SqliteConnection) -> Result<Vec<i32>> {
    use self::schema_migrations::dsl::*;

    conn.batch_execute(CREATE_SCHEMA_MIGRATIONS)?;

    let recorded = schema_migrations.select(version).load::<i32>(conn)?;
    let mut ran = Vec::new();

    for migration in MIGRATIONS {
        if recorded.contains(&migration.version) {
            continue;
        }

        conn.transaction::<_, diesel::result::Error, _>(|| {
            (migration.apply)(conn)?;
            diesel::insert_into(schema_migrations)
                .values((
                    version.eq(migration.version),
                    name.eq(migration.name),
                    applied_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            Ok(())
        })?;

        info!(
            "Applied migration {} ({})",
            migration.version, migration.name
        );
        ran.push(migration.version);
    }

    Ok(ran)
}
