use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{ConnectOptions, Pool, Row, Sqlite};

use crate::models::{MasteryRecord, ProfileState};
use crate::srs::MAX_LEVEL;
use crate::store::RecordStore;

struct MasteryRow {
    item_id: String,
    record: MasteryRecord,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for MasteryRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let item_id: String = row.try_get("item_id")?;
        let level: i64 = row.try_get("interval_level")?;
        let due_ms: i64 = row.try_get("due_at")?;

        let due_at = DateTime::<Utc>::from_timestamp_millis(due_ms).ok_or_else(|| {
            sqlx::Error::ColumnDecode {
                index: "due_at".to_string(),
                source: format!("timestamp out of range: {}", due_ms).into(),
            }
        })?;

        Ok(MasteryRow {
            item_id,
            record: MasteryRecord {
                // Clamped on read; anything else is the scheduler's job.
                interval_level: level.clamp(0, i64::from(MAX_LEVEL)) as u8,
                due_at,
            },
        })
    }
}

/// SQLite-backed persistence for the profile and mastery records.
#[derive(Clone)]
pub struct Db {
    pool: Pool<Sqlite>,
}

impl Db {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .log_statements(log::LevelFilter::Trace);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed to open database {}", url))?;

        let db = Db { pool };
        db.migrate().await?;
        log::info!("database ready at {}", url);
        Ok(db)
    }

    /// A private database that lives as long as this pool. Used by tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .log_statements(log::LevelFilter::Trace);

        // Every connection to :memory: is a separate database, so pin exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Db { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mastery (
                item_id TEXT PRIMARY KEY,
                interval_level INTEGER NOT NULL DEFAULT 0,
                due_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_xp INTEGER NOT NULL DEFAULT 0,
                streak_count INTEGER,
                last_active_day TEXT,
                selected_course TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_profile_and_records(&self) -> anyhow::Result<(ProfileState, RecordStore)> {
        let profile = match sqlx::query(
            "SELECT total_xp, streak_count, last_active_day, selected_course FROM profile WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        {
            Some(row) => {
                let total_xp: i64 = row.try_get("total_xp")?;
                let streak_count: Option<i64> = row.try_get("streak_count")?;
                let last_active_day: Option<NaiveDate> = row.try_get("last_active_day")?;
                let selected_course: Option<String> = row.try_get("selected_course")?;

                ProfileState {
                    total_xp: u64::try_from(total_xp).unwrap_or(0),
                    streak_count: streak_count.and_then(|c| u32::try_from(c).ok()),
                    last_active_day,
                    selected_course,
                }
            }
            None => ProfileState::default(),
        };

        let rows = sqlx::query_as::<_, MasteryRow>("SELECT item_id, interval_level, due_at FROM mastery")
            .fetch_all(&self.pool)
            .await?;
        let records: RecordStore = rows.into_iter().map(|r| (r.item_id, r.record)).collect();

        log::debug!(
            "loaded profile (xp {}, streak {:?}) and {} records",
            profile.total_xp,
            profile.streak_count,
            records.len()
        );
        Ok((profile, records))
    }

    /// Writes the profile and the full record mapping in one transaction.
    pub async fn save(&self, profile: &ProfileState, records: &RecordStore) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO profile (id, total_xp, streak_count, last_active_day, selected_course)
            VALUES (1, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                total_xp = excluded.total_xp,
                streak_count = excluded.streak_count,
                last_active_day = excluded.last_active_day,
                selected_course = excluded.selected_course
            "#,
        )
        .bind(i64::try_from(profile.total_xp).unwrap_or(i64::MAX))
        .bind(profile.streak_count.map(i64::from))
        .bind(profile.last_active_day)
        .bind(profile.selected_course.as_deref())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM mastery").execute(&mut *tx).await?;
        for (item_id, record) in records.iter() {
            sqlx::query("INSERT INTO mastery (item_id, interval_level, due_at) VALUES (?, ?, ?)")
                .bind(item_id)
                .bind(i64::from(record.interval_level))
                .bind(record.due_at.timestamp_millis())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Closes the pool; any later save or load fails.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn reset(&self) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM mastery").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM profile").execute(&mut *tx).await?;
        tx.commit().await?;
        log::warn!("all progress has been reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn fresh_database_is_empty() {
        let db = Db::in_memory().await.unwrap();
        let (profile, records) = db.load_profile_and_records().await.unwrap();
        assert_eq!(profile, ProfileState::default());
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let db = Db::in_memory().await.unwrap();

        let profile = ProfileState {
            total_xp: 125,
            streak_count: Some(4),
            last_active_day: NaiveDate::from_ymd_opt(2024, 2, 29),
            selected_course: Some("fr".to_string()),
        };
        let mut records = RecordStore::new();
        records.put(
            "es-g1",
            MasteryRecord {
                interval_level: 3,
                due_at: Utc.timestamp_millis_opt(1_709_200_000_123).unwrap(),
            },
        );
        records.put(
            "es-g2",
            MasteryRecord {
                interval_level: 0,
                due_at: Utc.timestamp_millis_opt(1_709_100_000_000).unwrap(),
            },
        );

        db.save(&profile, &records).await.unwrap();
        let (loaded_profile, loaded_records) = db.load_profile_and_records().await.unwrap();
        assert_eq!(loaded_profile, profile);
        assert_eq!(loaded_records, records);

        // A second save replaces rather than accumulates.
        records.clear();
        db.save(&profile, &records).await.unwrap();
        let (_, loaded_records) = db.load_profile_and_records().await.unwrap();
        assert!(loaded_records.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_levels_are_clamped_on_read() {
        let db = Db::in_memory().await.unwrap();
        sqlx::query("INSERT INTO mastery (item_id, interval_level, due_at) VALUES ('x', 42, 0)")
            .execute(&db.pool)
            .await
            .unwrap();

        let (_, records) = db.load_profile_and_records().await.unwrap();
        assert_eq!(records.get("x").unwrap().interval_level, MAX_LEVEL);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let db = Db::in_memory().await.unwrap();
        let profile = ProfileState {
            total_xp: 10,
            ..ProfileState::default()
        };
        let mut records = RecordStore::new();
        records.put("a", MasteryRecord::unreviewed(Utc::now()));
        db.save(&profile, &records).await.unwrap();

        db.reset().await.unwrap();
        let (profile, records) = db.load_profile_and_records().await.unwrap();
        assert_eq!(profile, ProfileState::default());
        assert!(records.is_empty());
    }
}
