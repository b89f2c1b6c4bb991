//! Service layer for threadedcomments-core.
//!
//! Provides typed, high-level APIs for posting and deleting comments,
//! navigating threads, and checking store health. The service layer owns the
//! store and the tree manager behind a single facade.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use threadedcomments_core::config::TreeConfig;
//! use threadedcomments_core::core::CoreContext;
//! use threadedcomments_core::store::NewComment;
//! use threadedcomments_core::tree::CreateOptions;
//!
//! let ctx = CoreContext::new(Path::new("comments.db"), TreeConfig::default()).unwrap();
//! let services = ctx.services().unwrap();
//! let root = services
//!     .comments()
//!     .post(NewComment::new("post:1", "alice", "First!"), CreateOptions::default())
//!     .unwrap();
//! let thread = services.threads().thread(root.id).unwrap();
//! ```

pub mod comments;
pub mod errors;
pub mod health;
pub mod threads;

pub use errors::{CoreError, CoreResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::TreeConfig;
use crate::store::CommentStore;
use crate::tree::TreeManager;

/// Default time a writer waits on a locked database.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Context for threadedcomments-core services.
///
/// Holds the database location and tree configuration. Create one per
/// process and open services from it as needed.
#[derive(Debug, Clone)]
pub struct CoreContext {
    /// Path to the SQLite database file.
    db_path: PathBuf,
    config: TreeConfig,
    busy_timeout: Duration,
}

impl CoreContext {
    /// Create a new core context.
    ///
    /// Validates the tree configuration up front.
    pub fn new(db_path: &Path, config: TreeConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            db_path: db_path.to_path_buf(),
            config,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Path to the database.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Open the database and initialize its schema.
    pub fn open_store(&self) -> CoreResult<CommentStore> {
        let store = CommentStore::open(&self.db_path)?;
        store.set_busy_timeout(self.busy_timeout)?;
        store.init_schema()?;
        Ok(store)
    }

    /// Create a `CommentServices` instance backed by this context.
    pub fn services(&self) -> CoreResult<CommentServices> {
        CommentServices::new(self.open_store()?, self.config.clone())
    }
}

/// Facade providing all comment service APIs.
pub struct CommentServices {
    store: CommentStore,
    tree: TreeManager,
}

impl CommentServices {
    /// Wrap an initialized store.
    ///
    /// Fails with [`CoreError::Config`] if `config` is invalid or the store
    /// already holds ids wider than `path_digits` allows.
    pub fn new(store: CommentStore, config: TreeConfig) -> CoreResult<Self> {
        let tree = TreeManager::new(config)?;
        let max_id = store.max_id()?;
        tree.config().check_capacity(max_id)?;
        debug!(max_id, path_digits = tree.config().path_digits, "capacity ok");
        Ok(Self { store, tree })
    }

    /// Access comment operations.
    #[must_use]
    pub fn comments(&self) -> comments::CommentService<'_> {
        comments::CommentService::new(&self.store, &self.tree)
    }

    /// Access thread navigation and maintenance.
    #[must_use]
    pub fn threads(&self) -> threads::ThreadService<'_> {
        threads::ThreadService::new(&self.store, &self.tree)
    }

    /// Access consistency checks.
    #[must_use]
    pub fn health(&self) -> health::HealthService<'_> {
        health::HealthService::new(&self.store, &self.tree)
    }

    /// Get a reference to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &CommentStore {
        &self.store
    }

    #[must_use]
    pub const fn tree(&self) -> &TreeManager {
        &self.tree
    }
}
