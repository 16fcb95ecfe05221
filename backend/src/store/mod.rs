//! # Mapping Store
//!
//! SQLite persistence for generations (class and style mappings plus the
//! rewritten artifacts), named Class Lists and the read-only template and
//! site catalogs.
//!
//! ## Consistency
//!
//! 1.  **Connections**: every operation opens its own connection with a busy
//!     timeout, so the store can be cloned freely into blocking tasks and
//!     worker threads.
//! 2.  **Atomic writes**: each write is a single transaction that first
//!     clears the key's rows, then inserts the new ones. Each read runs in
//!     one transaction too, so a reader never sees half of a mapping or rows
//!     from two different runs.
//! 3.  **Per-key exclusion**: writers for the same `(template_id, site_id)` or
//!     `(site_id, list_name)` take a [`locks::KeyLocks`] guard for the whole
//!     compute-and-persist sequence. Writers for different keys never wait on
//!     each other.
//! 4.  **Compute before write**: generation runs to completion (or fails, or
//!     is cancelled) before the transaction opens. Failures leave the previous
//!     rows untouched.

mod catalog;
mod class_lists;
mod generations;
pub mod locks;
mod schema;

use crate::config::AppConfig;
use crate::engine::error::EngineError;
use crate::store::locks::KeyLocks;
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct MappingStore {
    inner: Arc<Inner>,
}

struct Inner {
    db_path: PathBuf,
    template_prefix: String,
    list_prefix: String,
    default_list_size: usize,
    generation_locks: KeyLocks<(String, String)>,
    list_locks: KeyLocks<(String, String)>,
}

impl MappingStore {
    /// Opens (creating if needed) the database named in `config` and makes
    /// sure every table exists.
    pub fn open(config: &AppConfig) -> Result<Self, EngineError> {
        let store = Self {
            inner: Arc::new(Inner {
                db_path: config.database.clone(),
                template_prefix: config.template_prefix.clone(),
                list_prefix: config.list_prefix.clone(),
                default_list_size: config.default_list_size,
                generation_locks: KeyLocks::new(),
                list_locks: KeyLocks::new(),
            }),
        };
        let conn = store.connect()?;
        schema::create_tables(&conn)?;
        info!("mapping store ready at {}", config.database.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, EngineError> {
        let conn = Connection::open(&self.inner.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

fn require(value: &str, what: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        Err(EngineError::InvalidInput(format!("{what} must not be empty")))
    } else {
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
