//! The Cauldron: versioned state store for application version records.
//!
//! All mutations go through a [`Transaction`]. Changes are applied to a
//! working copy and only become visible to readers once
//! [`Transaction::commit`] has written them to the backend. Dropping a
//! transaction without committing discards it, so an error between begin
//! and commit never leaves the store half-updated.
//!
//! Only one transaction may be open at a time. Each one is tagged with a
//! generation; a guard whose transaction was already discarded never
//! touches a later one.

pub mod backend;
pub mod document;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use thiserror::Error;

use crate::core::{AppDescriptor, DependencySet, PackagePath};
use crate::reconcile::sync_container_native_dependencies;
pub use backend::{FileBackend, StoreBackend};
pub use document::{bump_patch, AppVersionRecord, AuditEntry, CauldronDocument, INITIAL_CONTAINER_VERSION};

/// Errors of the transaction envelope.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to commit to cauldron at {location}")]
    Commit {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("a cauldron transaction is already in progress")]
    TransactionAlreadyInProgress,

    #[error("no cauldron transaction is in progress")]
    NoTransaction,

    #[error("no application version `{descriptor}` in the cauldron")]
    UnknownApplication { descriptor: String },
}

/// Working copy of an open transaction.
#[derive(Debug)]
struct Working {
    generation: u64,
    document: CauldronDocument,
}

#[derive(Debug)]
struct StoreState {
    committed: CauldronDocument,
    working: Option<Working>,
    next_generation: u64,
}

impl StoreState {
    /// Working copy of transaction `generation`, if it is still the open one.
    fn working_mut(&mut self, generation: u64) -> Option<&mut CauldronDocument> {
        self.working
            .as_mut()
            .filter(|w| w.generation == generation)
            .map(|w| &mut w.document)
    }
}

/// Versioned store of application version records.
pub struct Cauldron {
    backend: Box<dyn StoreBackend>,
    state: Mutex<StoreState>,
}

impl Cauldron {
    /// Open the store held by `backend`, starting empty if nothing was saved.
    pub fn open(backend: impl StoreBackend + 'static) -> Result<Self> {
        let committed = match backend.load()? {
            Some(content) => CauldronDocument::parse(&content)?,
            None => {
                tracing::debug!("no cauldron at {}; starting empty", backend.describe());
                CauldronDocument::new()
            }
        };

        Ok(Cauldron {
            backend: Box::new(backend),
            state: Mutex::new(StoreState {
                committed,
                working: None,
                next_generation: 0,
            }),
        })
    }

    /// Open the cauldron JSON file at `path`.
    pub fn open_file(path: &Path) -> Result<Self> {
        Self::open(FileBackend::new(path))
    }

    pub fn location(&self) -> String {
        self.backend.describe()
    }

    // The committed document is only replaced after a successful save, so
    // the state is consistent even if a holder of the lock panicked.
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a transaction on a copy of the committed state.
    pub fn begin_transaction(&self) -> Result<Transaction<'_>, StoreError> {
        let mut state = self.state();
        if state.working.is_some() {
            return Err(StoreError::TransactionAlreadyInProgress);
        }
        let generation = state.next_generation;
        state.next_generation += 1;
        state.working = Some(Working {
            generation,
            document: state.committed.clone(),
        });
        tracing::debug!("began cauldron transaction {}", generation);

        Ok(Transaction {
            cauldron: self,
            generation,
            finished: false,
        })
    }

    /// Drop the working copy, if any. Safe to call at any time.
    pub fn discard_transaction(&self) {
        if let Some(working) = self.state().working.take() {
            tracing::debug!("discarded cauldron transaction {}", working.generation);
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.state().working.is_some()
    }

    /// The last committed state.
    pub fn snapshot(&self) -> CauldronDocument {
        self.state().committed.clone()
    }

    /// Committed record for `descriptor`.
    pub fn get_app(&self, descriptor: &AppDescriptor) -> Result<AppVersionRecord, StoreError> {
        self.state()
            .committed
            .app(descriptor)
            .cloned()
            .ok_or_else(|| StoreError::UnknownApplication {
                descriptor: descriptor.to_string(),
            })
    }
}

/// An open transaction.
///
/// Released by [`Transaction::commit`], [`Transaction::discard`] or drop.
/// Once its working copy is gone (discarded through
/// [`Cauldron::discard_transaction`]) every call fails with
/// [`StoreError::NoTransaction`].
pub struct Transaction<'a> {
    cauldron: &'a Cauldron,
    generation: u64,
    finished: bool,
}

impl Transaction<'_> {
    fn with_working<R>(&self, f: impl FnOnce(&mut CauldronDocument) -> R) -> Result<R, StoreError> {
        let mut state = self.cauldron.state();
        let working = state
            .working_mut(self.generation)
            .ok_or(StoreError::NoTransaction)?;
        Ok(f(working))
    }

    /// Working copy of the record for `descriptor`.
    pub fn app(&self, descriptor: &AppDescriptor) -> Result<Option<AppVersionRecord>, StoreError> {
        self.with_working(|doc| doc.app(descriptor).cloned())
    }

    /// Replace the native dependencies of `descriptor`.
    pub fn set_native_dependencies(
        &mut self,
        descriptor: &AppDescriptor,
        deps: DependencySet,
    ) -> Result<(), StoreError> {
        self.with_working(|doc| doc.app_mut(descriptor).native_dependencies = deps)
    }

    /// Merge freshly discovered native dependencies into the record of
    /// `descriptor` and return the resulting set.
    pub fn sync_native_dependencies(
        &mut self,
        descriptor: &AppDescriptor,
        discovered: &[PackagePath],
    ) -> Result<DependencySet> {
        let current = self
            .app(descriptor)?
            .map(|record| record.native_dependencies)
            .unwrap_or_default();
        let synced = sync_container_native_dependencies(&current, discovered)?;
        self.set_native_dependencies(descriptor, synced.clone())?;
        Ok(synced)
    }

    /// Record a mini-app as part of `descriptor`, replacing an older version.
    pub fn add_mini_app(&mut self, descriptor: &AppDescriptor, mini_app: PackagePath) -> Result<(), StoreError> {
        self.with_working(|doc| {
            doc.app_mut(descriptor).mini_apps.upsert(mini_app);
        })
    }

    /// Set the container version of `descriptor`: `pinned` if given,
    /// otherwise a patch bump of the current one. Also stamps the tool
    /// version. Returns the new container version.
    pub fn update_container_version(
        &mut self,
        descriptor: &AppDescriptor,
        pinned: Option<&str>,
    ) -> Result<String> {
        let current = self
            .app(descriptor)?
            .and_then(|record| record.container_version);
        let next = match (pinned, current) {
            (Some(v), _) => {
                semver::Version::parse(v)
                    .map_err(|e| anyhow::anyhow!("invalid container version `{}`: {}", v, e))?;
                v.to_string()
            }
            (None, Some(current)) => bump_patch(&current)?,
            (None, None) => INITIAL_CONTAINER_VERSION.to_string(),
        };

        let version = next.clone();
        self.with_working(move |doc| {
            let record = doc.app_mut(descriptor);
            record.container_version = Some(version);
            record.ern_version = Some(env!("CARGO_PKG_VERSION").to_string());
        })?;
        Ok(next)
    }

    /// Persist the working copy with `message` in the audit log.
    ///
    /// On failure the transaction stays open so the caller can retry or
    /// discard. Returns the audit entry id.
    pub fn commit(&mut self, message: &str) -> Result<String, StoreError> {
        let mut state = self.cauldron.state();
        let mut next = state
            .working_mut(self.generation)
            .ok_or(StoreError::NoTransaction)?
            .clone();

        let location = self.cauldron.backend.describe();
        let commit_error = |source: anyhow::Error| StoreError::Commit {
            location: location.clone(),
            source: source.into(),
        };

        let id = next.content_id().map_err(commit_error)?;
        next.log.push(AuditEntry {
            id: id.clone(),
            message: message.to_string(),
        });

        let content = next.to_json_string().map_err(commit_error)?;
        self.cauldron.backend.save(&content).map_err(commit_error)?;

        state.committed = next;
        state.working = None;
        self.finished = true;
        tracing::info!("committed {} to {}: {}", id, location, message);
        Ok(id)
    }

    /// Abandon every change made in this transaction.
    pub fn discard(mut self) {
        self.release();
    }

    // Discards only this transaction's working copy. A newer transaction
    // begun after an external discard is left alone.
    fn release(&mut self) {
        self.finished = true;
        let mut state = self.cauldron.state();
        if state.working_mut(self.generation).is_some() {
            state.working = None;
            tracing::debug!("discarded cauldron transaction {}", self.generation);
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.release();
        }
    }
}
