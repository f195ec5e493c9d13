//! Database migrations

use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 2;

fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let sql = format!("PRAGMA table_info({table})");
    let Ok(mut stmt) = conn.prepare(&sql) else {
        return false;
    };
    let Ok(rows) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };
    rows.flatten().any(|name| name == column)
}

fn add_column_if_not_exists(
    conn: &Connection,
    table: &str,
    column: &str,
    col_type: &str,
) -> Result<(), rusqlite::Error> {
    if !column_exists(conn, table, column) {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {col_type}");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let current_version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        "Database schema version: {} (target: {})",
        current_version,
        SCHEMA_VERSION
    );

    if current_version < 1 {
        tracing::info!("Running migration v1: conditions table");
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS conditions (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                category_id TEXT,
                day_of_inspection TEXT,
                date_from TEXT,
                frontendtype TEXT,
                ranking TEXT,
                title TEXT,
                lang TEXT,
                long_text TEXT,
                winter_activity TEXT,
                geometry TEXT,
                risk_description TEXT,
                weather_description TEXT,
                user_id TEXT,
                processed TEXT NOT NULL DEFAULT 'n' CHECK(processed IN ('y', 'n')),
                date_processed TEXT,
                geometry_description TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_conditions_date_from ON conditions(date_from);
            ",
        )?;
    }

    if current_version < 2 {
        tracing::info!("Running migration v2: notified_status column on conditions");
        add_column_if_not_exists(conn, "conditions", "notified_status", "TEXT")?;
        // Rows that predate the column were announced with their current status.
        conn.execute(
            "UPDATE conditions SET notified_status = status WHERE notified_status IS NULL",
            [],
        )?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::info!("Database schema up to date (version {})", SCHEMA_VERSION);

    Ok(())
}
