//! `SQLite` persistence layer.

use aas_discovery_core::{
    AssetLink, AssetLinkRecord, DeleteOutcome, DescriptorStore, DiscoveryError, RegisterOutcome,
    Result,
};
use rusqlite::{Connection, OpenFlags, OptionalExtension, ToSql, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle read connections kept for reuse.
const MAX_IDLE_READERS: usize = 8;

/// `SQLite`-backed descriptor store.
///
/// Each operation runs in its own transaction, so record rows and the
/// `(name, value, aas_id)` index over them always change together.
///
/// Writes go through a single connection behind a mutex and take
/// `BEGIN IMMEDIATE`, which `SQLite` would serialize anyway. For a file in
/// WAL mode, `get` and `matches` run on separate read-only connections and
/// each reads its own snapshot, so reads never wait on the writer or on each
/// other. In-memory databases have no WAL and use the writer connection for
/// everything.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    readers: Option<ReaderPool>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("readers", &self.readers.as_ref().map(|pool| &pool.path))
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened or initialized.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        let mut store = Self::from_connection(conn)?;
        if journal_mode.eq_ignore_ascii_case("wal") {
            store.readers = Some(ReaderPool::new(path));
        }

        tracing::debug!(
            path = %path.display(),
            journal_mode = %journal_mode,
            pooled_reads = store.readers.is_some(),
            "Opened SQLite descriptor store"
        );
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be created.
    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        init_schema(&conn)?;
        Ok(Self {
            writer: Mutex::new(conn),
            readers: None,
        })
    }

    /// Number of registered records.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM aas_records", [], |row| row.get(0))
        })?;
        usize::try_from(count).map_err(DiscoveryError::storage)
    }

    /// Check if no record is registered.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| DiscoveryError::storage("SQLite connection lock poisoned"))
    }

    /// Run a read on a pooled connection, or on the writer when there is no
    /// pool.
    fn read<T>(&self, op: impl FnOnce(&mut Connection) -> rusqlite::Result<T>) -> Result<T> {
        let Some(pool) = &self.readers else {
            let mut conn = self.lock()?;
            return op(&mut conn).map_err(DiscoveryError::storage);
        };

        let mut conn = pool.checkout()?;
        let result = op(&mut conn);
        pool.checkin(conn);
        result.map_err(DiscoveryError::storage)
    }
}

/// Read-only connections to a WAL database file.
struct ReaderPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ReaderPool {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            idle: Mutex::new(Vec::new()),
        }
    }

    fn checkout(&self) -> Result<Connection> {
        let idle = self
            .idle
            .lock()
            .map_err(|_| DiscoveryError::storage("SQLite reader pool lock poisoned"))?
            .pop();
        match idle {
            Some(conn) => Ok(conn),
            None => open_reader(&self.path).map_err(DiscoveryError::storage),
        }
    }

    fn checkin(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_READERS {
                idle.push(conn);
            }
        }
    }
}

fn open_reader(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Initialize database schema.
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r"
        -- One row per registered AAS identifier
        CREATE TABLE IF NOT EXISTS aas_records (
            aas_id TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Current asset links; position keeps submission order
        CREATE TABLE IF NOT EXISTS asset_links (
            aas_id TEXT NOT NULL REFERENCES aas_records(aas_id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (aas_id, name, value)
        );

        -- Link index: pair -> sorted identifiers
        CREATE INDEX IF NOT EXISTS idx_asset_links_pair ON asset_links(name, value, aas_id);
        ",
    )
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn register_tx(
    conn: &mut Connection,
    record: &AssetLinkRecord,
) -> rusqlite::Result<RegisterOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = now_millis();

    let existed = tx
        .query_row(
            "SELECT 1 FROM aas_records WHERE aas_id = ?1",
            [record.aas_id()],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if existed {
        tx.execute(
            "UPDATE aas_records SET updated_at = ?2 WHERE aas_id = ?1",
            (record.aas_id(), now),
        )?;
        tx.execute("DELETE FROM asset_links WHERE aas_id = ?1", [record.aas_id()])?;
    } else {
        tx.execute(
            "INSERT INTO aas_records (aas_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            (record.aas_id(), now),
        )?;
    }

    {
        let mut insert = tx.prepare(
            r"
            INSERT INTO asset_links (aas_id, position, name, value)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )?;
        for (position, link) in record.links().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            insert.execute((record.aas_id(), position, &link.name, &link.value))?;
        }
    }

    tx.commit()?;

    Ok(if existed {
        RegisterOutcome::Replaced
    } else {
        RegisterOutcome::Created
    })
}

fn get_tx(conn: &mut Connection, aas_id: &str) -> rusqlite::Result<Option<Vec<AssetLink>>> {
    let tx = conn.transaction()?;

    let exists = tx
        .query_row(
            "SELECT 1 FROM aas_records WHERE aas_id = ?1",
            [aas_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !exists {
        return Ok(None);
    }

    let links = {
        let mut stmt = tx.prepare(
            r"
            SELECT name, value FROM asset_links
            WHERE aas_id = ?1
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([aas_id], |row| {
            Ok(AssetLink::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    tx.commit()?;
    Ok(Some(links))
}

fn delete_tx(conn: &mut Connection, aas_id: &str) -> rusqlite::Result<DeleteOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute("DELETE FROM asset_links WHERE aas_id = ?1", [aas_id])?;
    let deleted = tx.execute("DELETE FROM aas_records WHERE aas_id = ?1", [aas_id])?;

    tx.commit()?;
    Ok(if deleted > 0 {
        DeleteOutcome::Deleted
    } else {
        DeleteOutcome::NotFound
    })
}

/// First `take` identifiers `>= from` holding every link in `query`.
///
/// Walks the first link's slice of `idx_asset_links_pair` in id order and
/// probes the other links through the primary key. `LIMIT` ends the walk
/// after `take` hits. A single statement reads one snapshot.
fn matches_query(
    conn: &Connection,
    query: &[AssetLink],
    from: Option<&str>,
    take: usize,
) -> rusqlite::Result<Vec<String>> {
    let Some((driver, probes)) = query.split_first() else {
        return Ok(Vec::new());
    };
    let take = i64::try_from(take).unwrap_or(i64::MAX);

    let mut sql = String::from(
        "SELECT d.aas_id FROM asset_links d WHERE d.name = ? AND d.value = ?",
    );
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(2 * query.len() + 2);
    params.push(&driver.name);
    params.push(&driver.value);
    if let Some(from) = &from {
        sql.push_str(" AND d.aas_id >= ?");
        params.push(from);
    }
    for probe in probes {
        sql.push_str(
            " AND EXISTS (SELECT 1 FROM asset_links p \
             WHERE p.aas_id = d.aas_id AND p.name = ? AND p.value = ?)",
        );
        params.push(&probe.name);
        params.push(&probe.value);
    }
    sql.push_str(" ORDER BY d.aas_id ASC LIMIT ?");
    params.push(&take);

    let mut stmt = conn.prepare_cached(&sql)?;
    let ids = stmt
        .query_map(params.as_slice(), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

impl DescriptorStore for SqliteStore {
    fn register(&self, record: AssetLinkRecord) -> Result<RegisterOutcome> {
        let mut conn = self.lock()?;
        register_tx(&mut conn, &record).map_err(|e| {
            tracing::warn!(error = %e, aas_id = record.aas_id(), "Failed to register asset links");
            DiscoveryError::storage(e)
        })
    }

    fn get(&self, aas_id: &str) -> Result<Option<Vec<AssetLink>>> {
        self.read(|conn| get_tx(conn, aas_id))
    }

    fn delete(&self, aas_id: &str) -> Result<DeleteOutcome> {
        let mut conn = self.lock()?;
        delete_tx(&mut conn, aas_id).map_err(|e| {
            tracing::warn!(error = %e, aas_id, "Failed to delete asset links");
            DiscoveryError::storage(e)
        })
    }

    fn matches(
        &self,
        query: &[AssetLink],
        from: Option<&str>,
        take: usize,
    ) -> Result<Vec<String>> {
        self.read(|conn| matches_query(conn, query, from, take))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn record(id: &str, links: &[(&str, &str)]) -> AssetLinkRecord {
        AssetLinkRecord::new(id, links.iter().map(|(n, v)| AssetLink::new(*n, *v))).unwrap()
    }

    #[test]
    fn sqlite_store_basic_operations() {
        let store = SqliteStore::in_memory().unwrap();

        let outcome = store
            .register(record("urn:a", &[("sn", "S1"), ("plant", "P1")]))
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::Created);

        // Order of submission survives the round trip
        assert_eq!(
            store.get("urn:a").unwrap(),
            Some(vec![AssetLink::new("sn", "S1"), AssetLink::new("plant", "P1")])
        );

        let outcome = store.register(record("urn:a", &[("line", "L1")])).unwrap();
        assert_eq!(outcome, RegisterOutcome::Replaced);
        assert_eq!(
            store.get("urn:a").unwrap(),
            Some(vec![AssetLink::new("line", "L1")])
        );

        assert_eq!(store.delete("urn:a").unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.delete("urn:a").unwrap(), DeleteOutcome::NotFound);
        assert_eq!(store.get("urn:a").unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn empty_link_set_is_still_a_record() {
        let store = SqliteStore::in_memory().unwrap();
        store.register(record("urn:empty", &[])).unwrap();

        assert_eq!(store.get("urn:empty").unwrap(), Some(Vec::new()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn matches_respect_lower_bound() {
        let store = SqliteStore::in_memory().unwrap();
        for id in ["urn:c", "urn:a", "urn:b"] {
            store.register(record(id, &[("g", "1")])).unwrap();
        }
        store.register(record("urn:d", &[("g", "2")])).unwrap();

        let from_b = store
            .matches(&[AssetLink::new("g", "1")], Some("urn:b"), 10)
            .unwrap();
        assert_eq!(from_b, vec!["urn:b", "urn:c"]);

        let all = store.matches(&[AssetLink::new("g", "1")], None, 10).unwrap();
        assert_eq!(all, vec!["urn:a", "urn:b", "urn:c"]);
    }

    #[test]
    fn matches_intersect_and_stop_at_take() {
        let store = SqliteStore::in_memory().unwrap();
        for i in 0..50 {
            store
                .register(record(&format!("urn:{i:02}"), &[("plant", "P1"), ("line", "L1")]))
                .unwrap();
        }
        store.register(record("urn:solo", &[("plant", "P1")])).unwrap();

        let query = [AssetLink::new("plant", "P1"), AssetLink::new("line", "L1")];
        assert_eq!(store.matches(&query, None, 2).unwrap(), vec!["urn:00", "urn:01"]);
        assert_eq!(
            store.matches(&query, Some("urn:48"), 5).unwrap(),
            vec!["urn:48", "urn:49"]
        );
        assert!(store.matches(&query, None, 0).unwrap().is_empty());
        assert!(store.matches(&[], None, 10).unwrap().is_empty());
    }

    #[test]
    fn replace_removes_stale_postings() {
        let store = SqliteStore::in_memory().unwrap();
        store.register(record("urn:x", &[("alpha", "1")])).unwrap();
        store.register(record("urn:x", &[("beta", "2")])).unwrap();

        assert!(store
            .matches(&[AssetLink::new("alpha", "1")], None, 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn file_reads_bypass_writer_lock() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("discovery.db")).unwrap();
        store.register(record("urn:a", &[("plant", "P1")])).unwrap();

        let writer = store.lock().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::scope(|scope| {
            scope.spawn(|| {
                let links = store.get("urn:a");
                let ids = store.matches(&[AssetLink::new("plant", "P1")], None, 10);
                tx.send((links, ids)).unwrap();
            });

            let received = rx.recv_timeout(Duration::from_secs(5));
            drop(writer);

            let (links, ids) = received.unwrap();
            assert_eq!(links.unwrap(), Some(vec![AssetLink::new("plant", "P1")]));
            assert_eq!(ids.unwrap(), vec!["urn:a"]);
        });
    }

    #[test]
    fn file_reads_see_committed_writes() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("discovery.db")).unwrap();

        store.register(record("urn:a", &[("sn", "S1")])).unwrap();
        assert_eq!(
            store.get("urn:a").unwrap(),
            Some(vec![AssetLink::new("sn", "S1")])
        );

        store.register(record("urn:a", &[("sn", "S2")])).unwrap();
        assert_eq!(
            store.get("urn:a").unwrap(),
            Some(vec![AssetLink::new("sn", "S2")])
        );
        assert!(store
            .matches(&[AssetLink::new("sn", "S1")], None, 10)
            .unwrap()
            .is_empty());

        store.delete("urn:a").unwrap();
        assert_eq!(store.get("urn:a").unwrap(), None);
        assert!(store.is_empty().unwrap());
    }
}
