//! Core BlockStore implementation

use rusqlite::{Connection, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blocks (
    id          TEXT PRIMARY KEY,
    label       TEXT NOT NULL,
    scope       TEXT NOT NULL,
    value       TEXT NOT NULL,
    version     INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_blocks_label_scope ON blocks(label, scope);
"#;

const SELECT_COLUMNS: &str = "id, label, scope, value, version, created_at, updated_at";

/// Persistence tier a block lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scope {
    /// Shared by every session and every downstream consumer
    Global,
    /// Private to one conversation session
    Session(String),
}

impl Scope {
    /// Scope for a conversation session
    pub fn session(id: impl Into<String>) -> Self {
        Scope::Session(id.into())
    }

    /// Check if this is the shared tier
    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Session(id) => write!(f, "session:{}", id),
        }
    }
}

impl FromStr for Scope {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Scope::Global),
            other => match other.strip_prefix("session:") {
                Some(id) if !id.is_empty() => Ok(Scope::Session(id.to_string())),
                _ => Err(StoreError::InvalidScope(other.to_string())),
            },
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for Scope {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A labelled, scoped persistence unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Unique block ID (UUID v7)
    pub id: String,
    /// Label the block is addressed by
    pub label: String,
    /// Tier the block lives in
    pub scope: Scope,
    /// Current serialized value
    pub value: String,
    /// Write counter; 0 means the block still holds its initial value
    pub version: u64,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
    /// Last write timestamp (unix ms)
    pub updated_at: i64,
}

impl Block {
    /// True until the first write replaces the initial value
    pub fn is_placeholder(&self) -> bool {
        self.version == 0
    }
}

/// Result of reading a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRead {
    /// No block exists for the label in this scope
    Missing,
    /// The block exists but has never been written
    Placeholder,
    /// The block holds a written value (possibly empty)
    Value(String),
}

impl BlockRead {
    /// Get the written value, if any
    pub fn value(&self) -> Option<&str> {
        match self {
            BlockRead::Value(v) => Some(v),
            BlockRead::Missing | BlockRead::Placeholder => None,
        }
    }

    /// Consume into the written value, if any
    pub fn into_value(self) -> Option<String> {
        match self {
            BlockRead::Value(v) => Some(v),
            BlockRead::Missing | BlockRead::Placeholder => None,
        }
    }
}

/// One write in a batch committed by [`BlockStore::write_all`]
#[derive(Debug, Clone)]
pub struct BlockWrite {
    pub label: String,
    pub scope: Scope,
    pub value: String,
}

impl BlockWrite {
    pub fn new(label: impl Into<String>, scope: Scope, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scope,
            value: value.into(),
        }
    }
}

/// The block store
pub struct BlockStore {
    conn: Connection,
    /// Database file, None for in-memory stores
    path: Option<PathBuf>,
}

impl BlockStore {
    /// Open or create a block store in the given directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_timeout(dir, crate::DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Open with an explicit busy timeout for contended writers
    pub fn open_with_timeout(dir: impl AsRef<Path>, busy_timeout_ms: u64) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(crate::DB_FILE);
        debug!(?path, busy_timeout_ms, "BlockStore::open_with_timeout: called");

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %path.display(), "Opened block store");
        Ok(Self { conn, path: Some(path) })
    }

    /// Open a private in-memory store (tests and one-shot tools)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("BlockStore::open_in_memory: called");
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: None })
    }

    /// Database file backing this store, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Return the block for (label, scope), creating it with `initial` if absent
    ///
    /// The lookup and insert run in one IMMEDIATE transaction, so concurrent
    /// callers (threads or processes sharing the file) observe a single block.
    pub fn get_or_create(&mut self, label: &str, scope: &Scope, initial: &str) -> Result<Block, StoreError> {
        debug!(%label, %scope, "BlockStore::get_or_create: called");
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let block = match select_one(&tx, label, scope)? {
            Some(existing) => {
                debug!(id = %existing.id, "BlockStore::get_or_create: found existing block");
                existing
            }
            None => insert(&tx, label, scope, initial, 0)?,
        };

        tx.commit()?;
        Ok(block)
    }

    /// Get the block for (label, scope) without creating it
    pub fn get(&self, label: &str, scope: &Scope) -> Result<Option<Block>, StoreError> {
        debug!(%label, %scope, "BlockStore::get: called");
        select_one(&self.conn, label, scope)
    }

    /// Read the current value, distinguishing missing, placeholder and written blocks
    pub fn read(&self, label: &str, scope: &Scope) -> Result<BlockRead, StoreError> {
        debug!(%label, %scope, "BlockStore::read: called");
        let result = match self.get(label, scope)? {
            None => BlockRead::Missing,
            Some(block) if block.is_placeholder() => BlockRead::Placeholder,
            Some(block) => BlockRead::Value(block.value),
        };
        Ok(result)
    }

    /// Overwrite an existing block (last writer wins)
    pub fn write(&mut self, label: &str, scope: &Scope, value: &str) -> Result<Block, StoreError> {
        let mut blocks = self.write_all(&[BlockWrite::new(label, scope.clone(), value)])?;
        blocks.pop().ok_or_else(|| StoreError::NotFound {
            label: label.to_string(),
            scope: scope.to_string(),
        })
    }

    /// Apply several writes atomically: either every block is updated or none is
    ///
    /// Every target block must already exist. Writing a block's current value
    /// again leaves it untouched.
    pub fn write_all(&mut self, writes: &[BlockWrite]) -> Result<Vec<Block>, StoreError> {
        debug!(count = writes.len(), "BlockStore::write_all: called");
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut written = Vec::with_capacity(writes.len());

        for w in writes {
            let Some(block) = select_one(&tx, &w.label, &w.scope)? else {
                debug!(label = %w.label, scope = %w.scope, "BlockStore::write_all: block missing, rolling back");
                return Err(StoreError::NotFound {
                    label: w.label.clone(),
                    scope: w.scope.to_string(),
                });
            };
            written.push(overwrite(&tx, block, &w.value)?);
        }

        tx.commit()?;
        Ok(written)
    }

    /// Read-check-write for several blocks in one IMMEDIATE transaction
    ///
    /// `update` sees the current state of every key and returns one new value
    /// per key, or an error that rolls everything back. Missing blocks are
    /// created with their new value. No other connection can write in between,
    /// so the check holds for the write even across processes.
    pub fn update_all<E, F>(&mut self, keys: &[(&str, &Scope)], update: F) -> Result<Vec<Block>, E>
    where
        E: From<StoreError>,
        F: FnOnce(&[BlockRead]) -> Result<Vec<String>, E>,
    {
        debug!(count = keys.len(), "BlockStore::update_all: called");
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        let mut current = Vec::with_capacity(keys.len());
        for (label, scope) in keys {
            current.push(select_one(&tx, label, scope)?);
        }

        let reads: Vec<BlockRead> = current
            .iter()
            .map(|block| match block {
                None => BlockRead::Missing,
                Some(b) if b.is_placeholder() => BlockRead::Placeholder,
                Some(b) => BlockRead::Value(b.value.clone()),
            })
            .collect();

        // An Err here drops the transaction, which rolls it back
        let values = update(&reads)?;
        if values.len() != keys.len() {
            return Err(StoreError::BatchSize {
                expected: keys.len(),
                found: values.len(),
            }
            .into());
        }

        let mut written = Vec::with_capacity(keys.len());
        for (((label, scope), block), value) in keys.iter().zip(current).zip(&values) {
            let block = match block {
                Some(block) => overwrite(&tx, block, value)?,
                None => insert(&tx, label, scope, value, 1)?,
            };
            written.push(block);
        }

        tx.commit().map_err(StoreError::from)?;
        Ok(written)
    }

    /// List blocks, optionally restricted to one scope
    pub fn list(&self, scope: Option<&Scope>) -> Result<Vec<Block>, StoreError> {
        debug!(?scope, "BlockStore::list: called");
        let rows = match scope {
            Some(scope) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM blocks WHERE scope = ?1 ORDER BY label, created_at",
                    SELECT_COLUMNS
                ))?;
                stmt.query_map(params![scope.to_string()], raw_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM blocks ORDER BY scope, label, created_at",
                    SELECT_COLUMNS
                ))?;
                stmt.query_map([], raw_row)?.collect::<Result<Vec<_>, _>>()?
            }
        };

        rows.into_iter().map(RawBlock::into_block).collect()
    }

    /// Insert a block without the get-or-create guard (simulates a foreign writer)
    #[cfg(test)]
    fn insert_unchecked(&self, label: &str, scope: &Scope, value: &str) -> Result<(), StoreError> {
        let now = now_ms();
        self.conn.execute(
            "INSERT INTO blocks (id, label, scope, value, version, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![Uuid::now_v7().to_string(), label, scope.to_string(), value, now, now],
        )?;
        Ok(())
    }
}

/// Row as stored, before the scope column is parsed
struct RawBlock {
    id: String,
    label: String,
    scope: String,
    value: String,
    version: i64,
    created_at: i64,
    updated_at: i64,
}

impl RawBlock {
    fn into_block(self) -> Result<Block, StoreError> {
        Ok(Block {
            id: self.id,
            label: self.label,
            scope: self.scope.parse()?,
            value: self.value,
            version: self.version.max(0) as u64,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawBlock> {
    Ok(RawBlock {
        id: row.get(0)?,
        label: row.get(1)?,
        scope: row.get(2)?,
        value: row.get(3)?,
        version: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Select the single live block for (label, scope)
///
/// More than one row is a broken invariant and is reported, never resolved.
fn select_one(conn: &Connection, label: &str, scope: &Scope) -> Result<Option<Block>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM blocks WHERE label = ?1 AND scope = ?2",
        SELECT_COLUMNS
    ))?;
    let mut rows = stmt
        .query_map(params![label, scope.to_string()], raw_row)?
        .collect::<Result<Vec<_>, _>>()?;

    match rows.len() {
        0 => Ok(None),
        1 => rows.pop().map(RawBlock::into_block).transpose(),
        count => {
            tracing::error!(%label, %scope, count, "select_one: duplicate blocks found");
            Err(StoreError::Duplicate {
                label: label.to_string(),
                scope: scope.to_string(),
                count,
            })
        }
    }
}

/// Insert a new block; `version == 0` marks a placeholder
fn insert(conn: &Connection, label: &str, scope: &Scope, value: &str, version: u64) -> Result<Block, StoreError> {
    let now = now_ms();
    let block = Block {
        id: Uuid::now_v7().to_string(),
        label: label.to_string(),
        scope: scope.clone(),
        value: value.to_string(),
        version,
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO blocks (id, label, scope, value, version, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![block.id, block.label, scope.to_string(), block.value, version as i64, now, now],
    )?;
    info!(id = %block.id, %label, %scope, "Created block");
    Ok(block)
}

/// Replace a block's value and bump its version; an unchanged value is a no-op
fn overwrite(conn: &Connection, mut block: Block, value: &str) -> Result<Block, StoreError> {
    if block.version > 0 && block.value == value {
        debug!(id = %block.id, "overwrite: value unchanged, skipping");
        return Ok(block);
    }

    block.value = value.to_string();
    block.version += 1;
    block.updated_at = now_ms();
    conn.execute(
        "UPDATE blocks SET value = ?1, version = ?2, updated_at = ?3 WHERE id = ?4",
        params![block.value, block.version as i64, block.updated_at, block.id],
    )?;
    debug!(id = %block.id, version = block.version, "overwrite: block updated");
    Ok(block)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use tempfile::TempDir;

    #[test]
    fn test_scope_round_trip() {
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("session:abc".parse::<Scope>().unwrap(), Scope::session("abc"));
        assert_eq!(Scope::session("abc").to_string(), "session:abc");
        assert!("session:".parse::<Scope>().is_err());
        assert!("agent".parse::<Scope>().is_err());
    }

    #[test]
    fn test_get_or_create_creates_placeholder() {
        let mut store = BlockStore::open_in_memory().unwrap();

        let block = store
            .get_or_create("global_contract_plan", &Scope::Global, "No plan yet.")
            .unwrap();
        assert!(block.is_placeholder());
        assert_eq!(block.value, "No plan yet.");

        let again = store
            .get_or_create("global_contract_plan", &Scope::Global, "ignored")
            .unwrap();
        assert_eq!(again.id, block.id);
        assert_eq!(again.value, "No plan yet.");
    }

    #[test]
    fn test_read_distinguishes_missing_placeholder_and_value() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let scope = Scope::session("s1");

        assert_eq!(store.read("current_plan", &scope).unwrap(), BlockRead::Missing);

        store.get_or_create("current_plan", &scope, "No plan yet.").unwrap();
        assert_eq!(store.read("current_plan", &scope).unwrap(), BlockRead::Placeholder);

        store.write("current_plan", &scope, "").unwrap();
        assert_eq!(
            store.read("current_plan", &scope).unwrap(),
            BlockRead::Value(String::new())
        );
    }

    #[test]
    fn test_write_requires_existing_block() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let err = store.write("current_plan", &Scope::Global, "{}").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_write_same_value_is_idempotent() {
        let mut store = BlockStore::open_in_memory().unwrap();
        store.get_or_create("p", &Scope::Global, "init").unwrap();

        let first = store.write("p", &Scope::Global, "v1").unwrap();
        let second = store.write("p", &Scope::Global, "v1").unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 1);
        assert_eq!(second.value, "v1");

        let third = store.write("p", &Scope::Global, "v2").unwrap();
        assert_eq!(third.version, 2);
    }

    #[test]
    fn test_write_all_is_all_or_nothing() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let session = Scope::session("s1");
        store.get_or_create("current_plan", &session, "init").unwrap();
        // No global block: the batch must fail and leave the session block untouched

        let err = store
            .write_all(&[
                BlockWrite::new("current_plan", session.clone(), "doc"),
                BlockWrite::new("global_contract_plan", Scope::Global, "doc"),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.read("current_plan", &session).unwrap(), BlockRead::Placeholder);

        store
            .get_or_create("global_contract_plan", &Scope::Global, "init")
            .unwrap();
        let written = store
            .write_all(&[
                BlockWrite::new("current_plan", session.clone(), "doc"),
                BlockWrite::new("global_contract_plan", Scope::Global, "doc"),
            ])
            .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(store.read("global_contract_plan", &Scope::Global).unwrap().value(), Some("doc"));
    }

    #[derive(Debug)]
    enum Guarded {
        Frozen,
        Store(StoreError),
    }

    impl From<StoreError> for Guarded {
        fn from(err: StoreError) -> Self {
            Guarded::Store(err)
        }
    }

    /// Write `value` unless the block already says "deployed"
    fn write_unless_deployed(store: &mut BlockStore, value: &str) -> Result<Vec<Block>, Guarded> {
        store.update_all(&[("p", &Scope::Global)], |current| {
            if current[0].value() == Some("deployed") {
                return Err(Guarded::Frozen);
            }
            Ok(vec![value.to_string()])
        })
    }

    #[test]
    fn test_update_all_sees_current_state_and_creates_missing() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let session = Scope::session("s1");
        store.get_or_create("current_plan", &session, "No plan yet.").unwrap();

        let written = store
            .update_all::<StoreError, _>(
                &[("current_plan", &session), ("global_contract_plan", &Scope::Global)],
                |current| {
                    assert_eq!(current, &[BlockRead::Placeholder, BlockRead::Missing]);
                    Ok(vec!["doc".to_string(), "doc".to_string()])
                },
            )
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|b| b.version == 1));
        assert_eq!(store.read("global_contract_plan", &Scope::Global).unwrap().value(), Some("doc"));

        // Same values again: versions stay put
        let again = store
            .update_all::<StoreError, _>(
                &[("current_plan", &session), ("global_contract_plan", &Scope::Global)],
                |current| Ok(current.iter().filter_map(|r| r.value().map(str::to_string)).collect()),
            )
            .unwrap();
        assert!(again.iter().all(|b| b.version == 1));
    }

    #[test]
    fn test_update_all_rejection_writes_nothing() {
        let mut store = BlockStore::open_in_memory().unwrap();
        store.get_or_create("p", &Scope::Global, "init").unwrap();
        store.write("p", &Scope::Global, "deployed").unwrap();

        let err = write_unless_deployed(&mut store, "draft").unwrap_err();
        assert!(matches!(err, Guarded::Frozen));
        assert_eq!(store.read("p", &Scope::Global).unwrap().value(), Some("deployed"));

        // A rejected batch must not leave a half-created block behind either
        let err = store
            .update_all::<Guarded, _>(&[("other", &Scope::Global), ("p", &Scope::Global)], |_| Err(Guarded::Frozen))
            .unwrap_err();
        assert!(matches!(err, Guarded::Frozen));
        assert_eq!(store.read("other", &Scope::Global).unwrap(), BlockRead::Missing);
    }

    #[test]
    fn test_update_all_rejects_wrong_value_count() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let err = store
            .update_all::<StoreError, _>(&[("a", &Scope::Global), ("b", &Scope::Global)], |_| {
                Ok(vec!["only one".to_string()])
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::BatchSize { expected: 2, found: 1 }));
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_guarded_writer_never_overwrites_a_concurrent_deploy() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = BlockStore::open(temp.path()).unwrap();
            store.get_or_create("p", &Scope::Global, "init").unwrap();
        }

        for _ in 0..20 {
            {
                let mut store = BlockStore::open(temp.path()).unwrap();
                store.write("p", &Scope::Global, "draft").unwrap();
            }

            let barrier = Arc::new(Barrier::new(2));
            let drafter = {
                let dir = temp.path().to_path_buf();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let mut store = BlockStore::open(&dir).unwrap();
                    barrier.wait();
                    for i in 0..25 {
                        match write_unless_deployed(&mut store, &format!("draft-{}", i)) {
                            Ok(_) => {}
                            Err(Guarded::Frozen) => break,
                            Err(Guarded::Store(e)) => panic!("store error: {}", e),
                        }
                    }
                })
            };
            let deployer = {
                let dir = temp.path().to_path_buf();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let mut store = BlockStore::open(&dir).unwrap();
                    barrier.wait();
                    store.write("p", &Scope::Global, "deployed").unwrap();
                })
            };
            drafter.join().unwrap();
            deployer.join().unwrap();

            let store = BlockStore::open(temp.path()).unwrap();
            assert_eq!(store.read("p", &Scope::Global).unwrap().value(), Some("deployed"));
        }
    }

    #[test]
    fn test_duplicate_blocks_abort_operations() {
        let mut store = BlockStore::open_in_memory().unwrap();
        store.get_or_create("global_contract_plan", &Scope::Global, "init").unwrap();
        store
            .insert_unchecked("global_contract_plan", &Scope::Global, "rogue")
            .unwrap();

        let err = store
            .get_or_create("global_contract_plan", &Scope::Global, "init")
            .unwrap_err();
        assert!(err.is_corruption());

        let err = store.write("global_contract_plan", &Scope::Global, "new").unwrap_err();
        assert!(err.is_corruption());

        // Neither copy was touched
        let blocks = store.list(Some(&Scope::Global)).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.value != "new"));
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let a = store.get_or_create("current_plan", &Scope::session("a"), "x").unwrap();
        let b = store.get_or_create("current_plan", &Scope::session("b"), "x").unwrap();
        let g = store.get_or_create("current_plan", &Scope::Global, "x").unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.id, g.id);
        assert_eq!(store.list(None).unwrap().len(), 3);
        assert_eq!(store.list(Some(&Scope::session("a"))).unwrap().len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = BlockStore::open(temp.path()).unwrap();
            store.get_or_create("p", &Scope::Global, "init").unwrap();
            store.write("p", &Scope::Global, "saved").unwrap();
        }

        let store = BlockStore::open(temp.path()).unwrap();
        assert_eq!(store.read("p", &Scope::Global).unwrap().value(), Some("saved"));
        assert!(store.path().unwrap().ends_with(crate::DB_FILE));
    }

    #[test]
    fn test_concurrent_get_or_create_yields_one_block() {
        let temp = TempDir::new().unwrap();
        // Create the schema before the racers start
        drop(BlockStore::open(temp.path()).unwrap());

        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let dir = temp.path().to_path_buf();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let mut store = BlockStore::open(&dir).unwrap();
                    barrier.wait();
                    store
                        .get_or_create("global_contract_plan", &Scope::Global, "No plan yet.")
                        .unwrap()
                        .id
                })
            })
            .collect();

        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| id == &ids[0]));

        let store = BlockStore::open(temp.path()).unwrap();
        assert_eq!(store.list(Some(&Scope::Global)).unwrap().len(), 1);
    }
}
