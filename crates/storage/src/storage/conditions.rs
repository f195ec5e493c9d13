use chrono::NaiveDate;
use mountainwatch_core::{Condition, format_date, parse_date, processed_flag};
use rusqlite::{OptionalExtension as _, params};

use super::{Storage, get_conn, log_row_error};
use crate::error::Result;

const CONDITION_COLUMNS: &str = "id, status, category_id, day_of_inspection, date_from, frontendtype, \
     ranking, title, lang, long_text, winter_activity, geometry, risk_description, \
     weather_description, user_id, processed, date_processed, geometry_description";

fn date_param(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| format_date(Some(d)))
}

fn date_column(raw: Option<String>) -> Option<NaiveDate> {
    raw.as_deref().and_then(parse_date)
}

fn text_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn row_to_condition(row: &rusqlite::Row<'_>) -> rusqlite::Result<Condition> {
    let processed: String = row.get(15)?;
    Ok(Condition {
        id: row.get(0)?,
        status: row.get(1)?,
        category_id: text_column(row, 2)?,
        day_of_inspection: date_column(row.get(3)?),
        date_from: date_column(row.get(4)?),
        frontend_type: text_column(row, 5)?,
        ranking: text_column(row, 6)?,
        title: text_column(row, 7)?,
        lang: text_column(row, 8)?,
        long_text: text_column(row, 9)?,
        winter_activity: text_column(row, 10)?,
        geometry: text_column(row, 11)?,
        risk_description: text_column(row, 12)?,
        weather_description: text_column(row, 13)?,
        user_id: text_column(row, 14)?,
        processed: processed == "y",
        date_processed: date_column(row.get(16)?),
        geometry_description: text_column(row, 17)?,
    })
}

/// A row whose current status has not been announced yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStatus {
    pub id: String,
    pub title: String,
    pub notified_status: String,
    pub status: String,
}

impl Storage {
    /// Whether a row with this id exists.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn condition_exists(&self, id: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM conditions WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a newly seen condition as unprocessed.
    ///
    /// Returns `false` (and writes nothing) when the id is already stored.
    ///
    /// # Errors
    /// Returns error if database insert fails.
    pub fn insert_condition(&self, condition: &Condition) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "INSERT INTO conditions ({CONDITION_COLUMNS}, notified_status)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 'n', NULL, ?16, ?2)
               ON CONFLICT(id) DO NOTHING"
        );
        let inserted = conn.execute(
            &sql,
            params![
                condition.id,
                condition.status,
                condition.category_id,
                date_param(condition.day_of_inspection),
                date_param(condition.date_from),
                condition.frontend_type,
                condition.ranking,
                condition.title,
                condition.lang,
                condition.long_text,
                condition.winter_activity,
                condition.geometry,
                condition.risk_description,
                condition.weather_description,
                condition.user_id,
                condition.geometry_description,
            ],
        )?;
        if inserted == 1 {
            tracing::debug!(id = %condition.id, status = %condition.status, "Condition inserted");
        }
        Ok(inserted == 1)
    }

    /// Get condition by ID.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn get_condition(&self, id: &str) -> Result<Option<Condition>> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {CONDITION_COLUMNS} FROM conditions WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_condition).optional()?)
    }

    /// All stored conditions, oldest `date_from` first.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn all_conditions(&self) -> Result<Vec<Condition>> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {CONDITION_COLUMNS} FROM conditions ORDER BY date_from, id");
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt.query_map([], row_to_condition)?.filter_map(log_row_error).collect();
        Ok(results)
    }

    /// Conditions whose new-record notification was never handled.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn unprocessed_conditions(&self) -> Result<Vec<Condition>> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {CONDITION_COLUMNS} FROM conditions WHERE processed = ?1 ORDER BY date_from, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![processed_flag(false)], row_to_condition)?
            .filter_map(log_row_error)
            .collect();
        Ok(results)
    }

    /// `processed` flag of a row, `None` when the id is unknown.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn is_processed(&self, id: &str) -> Result<Option<bool>> {
        let conn = get_conn(&self.pool)?;
        let flag: Option<String> = conn
            .query_row("SELECT processed FROM conditions WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(flag.map(|f| f == processed_flag(true)))
    }

    /// Overwrite the stored status. Returns `true` if a row changed.
    ///
    /// # Errors
    /// Returns error if database update fails.
    pub fn update_status(&self, id: &str, status: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let updated = conn.execute(
            "UPDATE conditions SET status = ?2 WHERE id = ?1 AND status <> ?2",
            params![id, status],
        )?;
        Ok(updated == 1)
    }

    /// Flip `processed` to `'y'` and record the day. Never reverts.
    ///
    /// Returns `false` when the row is unknown or already processed.
    ///
    /// # Errors
    /// Returns error if database update fails.
    pub fn mark_processed(&self, id: &str, day: NaiveDate) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let updated = conn.execute(
            "UPDATE conditions SET processed = 'y', date_processed = ?2
               WHERE id = ?1 AND processed = 'n'",
            params![id, format_date(Some(day))],
        )?;
        Ok(updated == 1)
    }

    /// Last status a notification was dispatched for.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn notified_status(&self, id: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        let status: Option<Option<String>> = conn
            .query_row("SELECT notified_status FROM conditions WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(status.flatten())
    }

    /// Record that `status` has been announced for this row.
    ///
    /// # Errors
    /// Returns error if database update fails.
    pub fn mark_status_notified(&self, id: &str, status: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let updated = conn.execute(
            "UPDATE conditions SET notified_status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        Ok(updated == 1)
    }

    /// Rows whose stored status differs from the last announced one.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn pending_status_notifications(&self) -> Result<Vec<PendingStatus>> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT id, COALESCE(title, ''), COALESCE(notified_status, ''), status
               FROM conditions
               WHERE notified_status IS NULL OR notified_status <> status
               ORDER BY date_from, id",
        )?;
        let results = stmt
            .query_map([], |row| {
                Ok(PendingStatus {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    notified_status: row.get(2)?,
                    status: row.get(3)?,
                })
            })?
            .filter_map(log_row_error)
            .collect();
        Ok(results)
    }

    /// Number of stored conditions.
    ///
    /// # Errors
    /// Returns error if database query fails.
    pub fn condition_count(&self) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conditions", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
