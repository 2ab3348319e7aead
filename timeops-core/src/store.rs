use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use timeops_remote::domain::{RemoteEntry, RemoteTag, TagColor};

use crate::errors::EngineError;
use crate::models::{Entry, NewEntry, RunningEntry, Tag, DEFAULT_TAG_NAME};

/// The embedded local store. Sole source of truth while offline.
///
/// A single connection serializes transactional operations; callers only
/// ever suspend, they never block each other mid-transaction.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(database_url: &str) -> Result<Self, EngineError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, EngineError> {
        Self::new("sqlite::memory:").await
    }

    /// Inserts the protected default tag when the tags table is empty.
    pub async fn seed_defaults(&self) -> Result<(), EngineError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM tags")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        if count == 0 {
            self.add_tag(DEFAULT_TAG_NAME, TagColor::Slate).await?;
        }
        Ok(())
    }

    // --- entries ---

    pub async fn add_entry(&self, entry: &NewEntry) -> Result<i64, EngineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO entries (name, tag_id, start_time_utc, end_time_utc, synced, msg)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.name)
        .bind(entry.tag_id)
        .bind(entry.start_time_utc)
        .bind(entry.end_time_utc)
        .bind(entry.synced)
        .bind(&entry.msg)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replaces every field of the row identified by `entry.id`.
    pub async fn update_entry(&self, entry: &Entry) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            UPDATE entries
            SET remote_id = ?2,
                name = ?3,
                tag_id = ?4,
                start_time_utc = ?5,
                end_time_utc = ?6,
                synced = ?7,
                msg = ?8
            WHERE id = ?1
            "#,
        )
        .bind(entry.id)
        .bind(entry.remote_id)
        .bind(&entry.name)
        .bind(entry.tag_id)
        .bind(entry.start_time_utc)
        .bind(entry.end_time_utc)
        .bind(entry.synced)
        .bind(&entry.msg)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a per-entry sync failure message, leaving the row pending.
    pub async fn set_entry_error(&self, id: i64, msg: &str) -> Result<(), EngineError> {
        sqlx::query("UPDATE entries SET msg = ?2 WHERE id = ?1")
            .bind(id)
            .bind(msg)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_entry(&self, id: i64) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM entries WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_entry(&self, id: i64) -> Result<Option<Entry>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT id, remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg
            FROM entries
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| entry_from_row(&row)))
    }

    pub async fn list_entries(&self) -> Result<Vec<Entry>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg
            FROM entries
            ORDER BY start_time_utc DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    pub async fn entries_for_tag(&self, tag_id: i64) -> Result<Vec<Entry>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg
            FROM entries
            WHERE tag_id = ?1
            ORDER BY start_time_utc DESC
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    /// Pending local mutations, in insertion order.
    pub async fn pending_entries(&self) -> Result<Vec<Entry>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg
            FROM entries
            WHERE synced = 0
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    pub async fn clear_entries(&self) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM entries")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- tags ---

    pub async fn add_tag(&self, name: &str, color: TagColor) -> Result<i64, EngineError> {
        let result = sqlx::query("INSERT INTO tags (name, color) VALUES (?1, ?2)")
            .bind(name)
            .bind(color.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_tag(&self, tag: &Tag) -> Result<(), EngineError> {
        sqlx::query("UPDATE tags SET name = ?2, color = ?3 WHERE id = ?1")
            .bind(tag.id)
            .bind(&tag.name)
            .bind(tag.color.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_tag(&self, id: i64) -> Result<Option<Tag>, EngineError> {
        let row = sqlx::query("SELECT id, name, color FROM tags WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| tag_from_row(&row)))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, EngineError> {
        let rows = sqlx::query("SELECT id, name, color FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Tags offered for user editing. The protected default is excluded.
    pub async fn editable_tags(&self) -> Result<Vec<Tag>, EngineError> {
        let rows = sqlx::query("SELECT id, name, color FROM tags WHERE name != ?1 ORDER BY id")
            .bind(DEFAULT_TAG_NAME)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    // --- running slot ---

    pub async fn get_running(&self) -> Result<Option<RunningEntry>, EngineError> {
        let row = sqlx::query(
            "SELECT name, tag_id, start_time_utc, synced, msg FROM running WHERE slot = 0",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| RunningEntry {
            name: row.get("name"),
            tag_id: row.get("tag_id"),
            start_time_utc: row.get("start_time_utc"),
            synced: row.get("synced"),
            msg: row.get("msg"),
        }))
    }

    /// Full replacement of the running slot, no partial field merge.
    pub async fn set_running(&self, running: &RunningEntry) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO running (slot, name, tag_id, start_time_utc, synced, msg)
            VALUES (0, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(slot) DO UPDATE SET
                name = excluded.name,
                tag_id = excluded.tag_id,
                start_time_utc = excluded.start_time_utc,
                synced = excluded.synced,
                msg = excluded.msg
            "#,
        )
        .bind(&running.name)
        .bind(running.tag_id)
        .bind(running.start_time_utc)
        .bind(running.synced)
        .bind(&running.msg)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn clear_running(&self) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM running")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM running").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    // --- pull transaction ---

    /// Replaces local state with the remote snapshot inside one transaction:
    /// pending entries survive unchanged, everything else is rebuilt from
    /// the remote sets. Entries left pointing at a vanished tag are repaired
    /// with the first available tag and queued for re-sync.
    pub async fn apply_remote_snapshot(
        &self,
        entries: &[RemoteEntry],
        tags: &[RemoteTag],
    ) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;

        let pending: Vec<Entry> = sqlx::query(
            r#"
            SELECT id, remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg
            FROM entries
            WHERE synced = 0
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(entry_from_row)
        .collect();

        sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;

        for entry in &pending {
            sqlx::query(
                r#"
                INSERT INTO entries (id, remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(entry.id)
            .bind(entry.remote_id)
            .bind(&entry.name)
            .bind(entry.tag_id)
            .bind(entry.start_time_utc)
            .bind(entry.end_time_utc)
            .bind(entry.synced)
            .bind(&entry.msg)
            .execute(&mut *tx)
            .await?;
        }

        for remote in entries {
            sqlx::query(
                r#"
                INSERT INTO entries (remote_id, name, tag_id, start_time_utc, end_time_utc, synced, msg)
                VALUES (?1, ?2, ?3, ?4, ?5, 1, '')
                "#,
            )
            .bind(remote.id)
            .bind(&remote.name)
            .bind(remote.tag_id)
            .bind(remote.start_time_utc)
            .bind(remote.end_time_utc)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;

        for tag in tags {
            sqlx::query("INSERT INTO tags (id, name, color) VALUES (?1, ?2, ?3)")
                .bind(tag.id)
                .bind(&tag.name)
                .bind(tag.color.to_string())
                .execute(&mut *tx)
                .await?;
        }

        let first_tag = sqlx::query("SELECT id FROM tags ORDER BY id LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(row) = first_tag {
            let first_id: i64 = row.get("id");
            sqlx::query(
                r#"
                UPDATE entries SET tag_id = ?1, synced = 0
                WHERE tag_id NOT IN (SELECT id FROM tags)
                "#,
            )
            .bind(first_id)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                r#"
                UPDATE running SET tag_id = ?1, synced = 0
                WHERE tag_id NOT IN (SELECT id FROM tags)
                "#,
            )
            .bind(first_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn entry_from_row(row: &SqliteRow) -> Entry {
    Entry {
        id: row.get("id"),
        remote_id: row.get("remote_id"),
        name: row.get("name"),
        tag_id: row.get("tag_id"),
        start_time_utc: row.get("start_time_utc"),
        end_time_utc: row.get("end_time_utc"),
        synced: row.get("synced"),
        msg: row.get("msg"),
    }
}

fn tag_from_row(row: &SqliteRow) -> Tag {
    let color: String = row.get("color");
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: color.parse().unwrap_or_default(),
    }
}
