use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::{sql_query, SqliteConnection};
use serde::Serialize;

use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use x_client::User;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::kind::{CacheKind, Lookup, Users, TABLES};
use crate::schema::{self, users};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(QueryableByName)]
struct StoredRecord {
    #[diesel(sql_type = Text)]
    data: String,
    #[diesel(sql_type = BigInt)]
    fetched_at: i64,
}

#[derive(QueryableByName)]
struct Scalar {
    #[diesel(sql_type = BigInt)]
    value: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub table: &'static str,
    pub rows: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub path: Option<String>,
    pub footprint: u64,
    pub tables: Vec<TableStats>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvictionReport {
    pub footprint_before: u64,
    pub footprint_after: u64,
    pub removed: Vec<TableStats>,
}

/// Persistent keyed store with per-lookup freshness.
///
/// Every record carries the time it was written. A read passes the TTL it
/// wants; a record is fresh iff `now - fetched_at < ttl`, so changing a TTL
/// applies to records already on disk. A disabled store never hits.
pub struct CacheStore {
    pub(crate) conn: Option<SqliteConnection>,
    path: Option<String>,
    clock: Arc<dyn Clock>,
}

impl Debug for CacheStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("enabled", &self.conn.is_some())
            .field("path", &self.path)
            .field("clock", &self.clock)
            .finish()
    }
}

impl CacheStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let path = path.to_string_lossy().to_string();
        let mut conn = SqliteConnection::establish(&path)?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT.as_millis()))?;
        conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        Self::init(conn, Some(path))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = SqliteConnection::establish(":memory:")?;
        Self::init(conn, None)
    }

    /// A store that records nothing and reports every lookup as absent.
    pub fn disabled() -> Self {
        Self {
            conn: None,
            path: None,
            clock: Arc::new(SystemClock),
        }
    }

    fn init(mut conn: SqliteConnection, path: Option<String>) -> Result<Self> {
        conn.batch_execute(schema::CREATE_TABLES)?;
        tracing::debug!("Cache opened at {}", path.as_deref().unwrap_or(":memory:"));
        Ok(Self {
            conn: Some(conn),
            path,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

fn is_fresh(fetched_at: i64, now: i64, ttl: Duration) -> bool {
    let age = now.saturating_sub(fetched_at).max(0) as u128;
    age < ttl.as_millis()
}

fn decode<K: CacheKind>(key: &str, record: StoredRecord, now: i64, ttl: Duration) -> Lookup<K::Value> {
    if !is_fresh(record.fetched_at, now, ttl) {
        return Lookup::Absent;
    }
    match serde_json::from_str(&record.data) {
        Ok(value) => Lookup::Found(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} record {}: {}", K::TABLE, key, e);
            Lookup::Absent
        }
    }
}

fn write_record(conn: &mut SqliteConnection, table: &str, key: &str, data: &str, fetched_at: i64) -> QueryResult<usize> {
    sql_query(format!(
        "insert into {table} (cache_key, data, fetched_at) values (?, ?, ?)
        on conflict (cache_key) do update set data = excluded.data, fetched_at = excluded.fetched_at"
    ))
    .bind::<Text, _>(key)
    .bind::<Text, _>(data)
    .bind::<BigInt, _>(fetched_at)
    .execute(conn)
}

fn count_rows(conn: &mut SqliteConnection, table: &str) -> QueryResult<i64> {
    let row: Scalar = sql_query(format!("select count(*) as value from {table}")).get_result(conn)?;
    Ok(row.value)
}

fn footprint(conn: &mut SqliteConnection) -> QueryResult<u64> {
    let row: Scalar = sql_query(
        "select page_count * page_size as value from pragma_page_count(), pragma_page_size()",
    )
    .get_result(conn)?;
    Ok(row.value.max(0) as u64)
}

// MARK: Keyed records

impl CacheStore {
    pub fn get<K: CacheKind>(&mut self, key: &K::Key, ttl: Duration) -> Result<Lookup<K::Value>> {
        let now = self.now_millis();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(Lookup::Absent);
        };
        let cache_key = K::cache_key(key);
        let record = sql_query(format!(
            "select data, fetched_at from {} where cache_key = ?",
            K::TABLE
        ))
        .bind::<Text, _>(&cache_key)
        .get_result::<StoredRecord>(conn)
        .optional()?;

        Ok(match record {
            Some(record) => decode::<K>(&cache_key, record, now, ttl),
            None => Lookup::Absent,
        })
    }

    /// Insert or replace the record for `key`, stamped with the current time.
    pub fn put<K: CacheKind>(&mut self, key: &K::Key, value: &K::Value) -> Result<()> {
        let now = self.now_millis();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };
        let data = serde_json::to_string(value)?;
        write_record(conn, K::TABLE, &K::cache_key(key), &data, now)?;
        Ok(())
    }

    pub fn put_all<'a, K, I>(&mut self, entries: I) -> Result<()>
    where
        K: CacheKind,
        K::Key: 'a,
        K::Value: 'a,
        I: IntoIterator<Item = (&'a K::Key, &'a K::Value)>,
    {
        let now = self.now_millis();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };
        conn.transaction(|conn| -> Result<()> {
            for (key, value) in entries {
                let data = serde_json::to_string(value)?;
                write_record(conn, K::TABLE, &K::cache_key(key), &data, now)?;
            }
            Ok(())
        })
    }
}

// MARK: Users by username

impl CacheStore {
    pub fn user_by_username(&mut self, username: &str, ttl: Duration) -> Result<Lookup<User>> {
        let now = self.now_millis();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(Lookup::Absent);
        };
        let username = username.to_lowercase();
        let record = users::table
            .filter(users::username.eq(&username))
            .select((users::cache_key, users::data, users::fetched_at))
            .first::<(String, String, i64)>(conn)
            .optional()?;

        Ok(match record {
            Some((key, data, fetched_at)) => match decode::<Users>(&key, StoredRecord { data, fetched_at }, now, ttl) {
                Lookup::Found(user) if user.username.to_lowercase() == username => Lookup::Found(user),
                Lookup::Found(user) => {
                    tracing::warn!("Index for @{} points at @{}, ignoring", username, user.username);
                    Lookup::Absent
                }
                Lookup::Absent => Lookup::Absent,
            },
            None => Lookup::Absent,
        })
    }

    /// Store a user fetched as a profile. The username index moves to this
    /// user even if another cached user held it before.
    pub fn put_user_profile(&mut self, user: &User) -> Result<()> {
        let now = self.now_millis();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };
        let key = Users::cache_key(&user.id);
        let username = user.username.to_lowercase();
        let data = serde_json::to_string(user)?;

        conn.transaction(|conn| -> Result<()> {
            diesel::update(users::table.filter(users::username.eq(&username)).filter(users::cache_key.ne(&key)))
                .set(users::username.eq(None::<String>))
                .execute(conn)?;
            write_record(conn, Users::TABLE, &key, &data, now)?;
            diesel::update(users::table.find(&key))
                .set(users::username.eq(&username))
                .execute(conn)?;
            Ok(())
        })
    }

    /// Store a user that appeared in a follower or following listing. The
    /// record is refreshed, but the username index is only claimed when
    /// nobody holds it yet. A stale name left on the row is dropped.
    pub fn put_user_listing(&mut self, users_listed: &[User]) -> Result<()> {
        let now = self.now_millis();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };

        conn.transaction(|conn| -> Result<()> {
            for user in users_listed {
                let key = Users::cache_key(&user.id);
                let username = user.username.to_lowercase();
                let data = serde_json::to_string(user)?;
                write_record(conn, Users::TABLE, &key, &data, now)?;
                diesel::update(users::table.find(&key).filter(users::username.ne(&username)))
                    .set(users::username.eq(None::<String>))
                    .execute(conn)?;

                let taken: i64 = users::table
                    .filter(users::username.eq(&username))
                    .count()
                    .get_result(conn)?;
                if taken == 0 {
                    diesel::update(users::table.find(&key).filter(users::username.is_null()))
                        .set(users::username.eq(&username))
                        .execute(conn)?;
                }
            }
            Ok(())
        })
    }
}

// MARK: Maintenance

impl CacheStore {
    /// Size of the database in bytes (`page_count * page_size`).
    pub fn footprint(&mut self) -> Result<u64> {
        match self.conn.as_mut() {
            Some(conn) => Ok(footprint(conn)?),
            None => Ok(0),
        }
    }

    /// Evict when the footprint exceeds `max_size`. Returns `None` when
    /// nothing had to be done.
    pub fn cleanup(&mut self, max_size: u64) -> Result<Option<EvictionReport>> {
        let before = self.footprint()?;
        if !self.is_enabled() || before <= max_size {
            return Ok(None);
        }
        tracing::info!("Cache is {} bytes, over the {} byte limit", before, max_size);
        self.evict().map(Some)
    }

    /// Delete the older half (rounded up) of every table by `fetched_at`,
    /// then compact the file.
    pub fn evict(&mut self) -> Result<EvictionReport> {
        let Some(conn) = self.conn.as_mut() else {
            return Ok(EvictionReport {
                footprint_before: 0,
                footprint_after: 0,
                removed: Vec::new(),
            });
        };
        let footprint_before = footprint(conn)?;

        let removed = conn.transaction(|conn| -> Result<Vec<TableStats>> {
            let mut removed = Vec::new();
            for table in TABLES {
                let rows = sql_query(format!(
                    "delete from {table} where rowid in (
                        select rowid from {table} order by fetched_at asc
                        limit (select (count(*) + 1) / 2 from {table})
                    )"
                ))
                .execute(conn)?;
                removed.push(TableStats {
                    table,
                    rows: rows as i64,
                });
            }
            Ok(removed)
        })?;
        conn.batch_execute("VACUUM;")?;

        let footprint_after = footprint(conn)?;
        for stats in &removed {
            tracing::info!("Evicted {} rows from {}", stats.rows, stats.table);
        }
        Ok(EvictionReport {
            footprint_before,
            footprint_after,
            removed,
        })
    }

    pub fn clear(&mut self) -> Result<()> {
        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };
        conn.transaction(|conn| -> Result<()> {
            for table in TABLES {
                sql_query(format!("delete from {table}")).execute(conn)?;
            }
            Ok(())
        })?;
        conn.batch_execute("VACUUM;")?;
        Ok(())
    }

    pub fn stats(&mut self) -> Result<CacheStats> {
        let path = self.path.clone();
        let Some(conn) = self.conn.as_mut() else {
            return Ok(CacheStats {
                path,
                footprint: 0,
                tables: Vec::new(),
            });
        };
        let mut tables = Vec::new();
        for table in TABLES {
            tables.push(TableStats {
                table,
                rows: count_rows(conn, table)?,
            });
        }
        Ok(CacheStats {
            path,
            footprint: footprint(conn)?,
            tables,
        })
    }
}
