//! SQLite-backed repository
//!
//! A single connection behind a mutex; every call runs on the blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::Repository;
use crate::store::types::{ItemId, NewItem, TrackedItem};

const CURRENT_SCHEMA_VERSION: i32 = 1;

const ITEM_COLUMNS: &str = "id, owner_id, url, selector, label, last_content, last_hash, \
     last_checked, last_updated, created_at, is_active";

pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
    max_active_per_owner: usize,
}

impl SqliteRepository {
    /// Open (creating if needed) the database at `path` and migrate it
    pub fn open(path: &Path, max_active_per_owner: usize) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
                    message: format!(
                        "failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ),
                })?;
            }
        }

        let conn = Connection::open(path)?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            log::warn!("Failed to enable WAL mode: {}", err);
        }
        log::debug!("Opened database {}", path.display());
        Self::with_connection(conn, max_active_per_owner)
    }

    pub fn open_in_memory(max_active_per_owner: usize) -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, max_active_per_owner)
    }

    fn with_connection(mut conn: Connection, max_active_per_owner: usize) -> StoreResult<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            max_active_per_owner,
        })
    }

    async fn execute<T, F>(&self, task: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = match conn.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            task(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("database task failed: {}", e),
        })?
    }
}

fn run_migrations(conn: &mut Connection) -> StoreResult<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::Backend {
            message: format!(
                "database version ({}) is newer than supported schema ({})",
                version, CURRENT_SCHEMA_VERSION
            ),
        });
    }
    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if version < 1 {
        tx.execute_batch(include_str!("schemas/schema_v1.sql"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    tx.commit()?;
    log::debug!(
        "Migrated database from version {} to {}",
        version,
        CURRENT_SCHEMA_VERSION
    );
    Ok(())
}

fn parse_datetime(value: &str, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend {
            message: format!("invalid {} '{}': {}", column, value, e),
        })
}

fn parse_optional_datetime(
    value: Option<String>,
    column: &str,
) -> StoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_datetime(&v, column)).transpose()
}

fn row_to_item(row: &Row<'_>) -> StoreResult<TrackedItem> {
    let created_at: String = row.get("created_at")?;
    let is_active: i64 = row.get("is_active")?;

    Ok(TrackedItem {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        url: row.get("url")?,
        selector: row.get("selector")?,
        label: row.get("label")?,
        last_content: row.get("last_content")?,
        last_fingerprint: row.get("last_hash")?,
        last_checked_at: parse_optional_datetime(row.get("last_checked")?, "last_checked")?,
        last_changed_at: parse_optional_datetime(row.get("last_updated")?, "last_updated")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        active: is_active != 0,
    })
}

fn query_items(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<TrackedItem>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(row_to_item(row)?);
    }
    Ok(items)
}

fn count_active_in(conn: &Connection, owner_id: &str) -> StoreResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tracked_items WHERE owner_id = ?1 AND is_active = 1",
        params![owner_id],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as usize)
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create_item(&self, item: NewItem) -> StoreResult<ItemId> {
        let limit = self.max_active_per_owner;
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            if count_active_in(&tx, &item.owner_id)? >= limit {
                return Err(StoreError::LimitExceeded {
                    owner_id: item.owner_id,
                    limit,
                });
            }

            let observed_at = item.baseline.observed_at.to_rfc3339();
            tx.execute(
                "INSERT INTO tracked_items
                    (owner_id, url, selector, label, last_content, last_hash,
                     last_checked, last_updated, created_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?7, 1)",
                params![
                    item.owner_id,
                    item.url,
                    item.selector,
                    item.label,
                    item.baseline.content,
                    item.baseline.fingerprint,
                    observed_at,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn list_active(&self, owner_id: &str) -> StoreResult<Vec<TrackedItem>> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM tracked_items WHERE owner_id = ?1 AND is_active = 1 \
                     ORDER BY created_at DESC, id DESC",
                    ITEM_COLUMNS
                ),
                params![owner_id],
            )
        })
        .await
    }

    async fn list_all_active(&self) -> StoreResult<Vec<TrackedItem>> {
        self.execute(|conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM tracked_items WHERE is_active = 1 ORDER BY id",
                    ITEM_COLUMNS
                ),
                [],
            )
        })
        .await
    }

    async fn soft_delete(&self, owner_id: &str, id: ItemId) -> StoreResult<bool> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE tracked_items SET is_active = 0
                 WHERE id = ?1 AND owner_id = ?2 AND is_active = 1",
                params![id, owner_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn update(
        &self,
        id: ItemId,
        content: &str,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let content = content.to_string();
        let fingerprint = fingerprint.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE tracked_items
                 SET last_content = ?1, last_hash = ?2, last_checked = ?3, last_updated = ?3
                 WHERE id = ?4",
                params![content, fingerprint, at.to_rfc3339(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound { id });
            }
            Ok(())
        })
        .await
    }

    async fn touch_checked_at(&self, id: ItemId, at: DateTime<Utc>) -> StoreResult<()> {
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE tracked_items SET last_checked = ?1 WHERE id = ?2",
                params![at.to_rfc3339(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound { id });
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<TrackedItem>> {
        self.execute(move |conn| {
            let mut items = query_items(
                conn,
                &format!("SELECT {} FROM tracked_items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
            )?;
            Ok(items.pop())
        })
        .await
    }

    async fn count_active(&self, owner_id: &str) -> StoreResult<usize> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| count_active_in(conn, &owner_id)).await
    }

    fn max_active_per_owner(&self) -> usize {
        self.max_active_per_owner
    }
}
