// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Unit of work passed through every mutating engine operation.

use core::fmt;

/// Thin wrapper around a unit-of-work identifier.
///
/// Issued by [`crate::ConnectionEngine::begin`]; zero is never issued.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TxId(u64);

impl TxId {
    /// Constructs a `TxId` from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Explicit transaction carrying deferred effects.
///
/// Two hook lists ride along with the writes of one operation:
/// - `on_success` hooks run in registration order once the store has
///   committed (broadcasts, audit entries, orphan events, offset propagation);
/// - compensations run in reverse order on rollback and restore in-memory
///   node state the operation changed eagerly (owners, orphan flags).
///
/// An engine holds at most one open unit of work. Close it with
/// [`crate::ConnectionEngine::commit`] or [`crate::ConnectionEngine::rollback`];
/// dropping it discards both lists and leaves the engine refusing to begin
/// another.
#[must_use = "a unit of work must be committed or rolled back"]
pub struct UnitOfWork {
    tx: TxId,
    on_success: Vec<Hook>,
    compensations: Vec<Hook>,
}

impl UnitOfWork {
    /// Opens an empty unit of work.
    pub fn new(tx: TxId) -> Self {
        Self {
            tx,
            on_success: Vec::new(),
            compensations: Vec::new(),
        }
    }

    /// Identifier of this unit of work.
    pub fn tx(&self) -> TxId {
        self.tx
    }

    /// Registers a hook to run after a successful commit.
    pub fn on_success<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_success.push(Box::new(hook));
    }

    /// Registers an undo step for rollback.
    pub fn compensate<F>(&mut self, undo: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.compensations.push(Box::new(undo));
    }

    /// Number of pending post-commit hooks.
    pub fn pending_hooks(&self) -> usize {
        self.on_success.len()
    }

    /// Number of pending compensations.
    pub fn pending_compensations(&self) -> usize {
        self.compensations.len()
    }

    /// Runs the post-commit hooks. Compensations are dropped.
    pub fn complete(self) {
        for hook in self.on_success {
            hook();
        }
    }

    /// Runs the compensations newest first. Post-commit hooks are dropped.
    pub fn abandon(self) {
        for undo in self.compensations.into_iter().rev() {
            undo();
        }
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("tx", &self.tx)
            .field("on_success", &self.on_success.len())
            .field("compensations", &self.compensations.len())
            .finish()
    }
}
