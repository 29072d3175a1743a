// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scriptable access check.

use pbs_core::{AccessCheck, AccessDenied, ActorId, Eid, PbsNode};
use std::collections::BTreeSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Rules {
    denied: BTreeSet<(ActorId, Eid)>,
    deny_all: bool,
    checks: usize,
}

/// Allows everything unless told otherwise; counts every check.
#[derive(Debug, Default)]
pub struct ScriptedAccess {
    rules: Mutex<Rules>,
}

impl ScriptedAccess {
    /// Allow-all access check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Denies `actor` on `node` from now on.
    pub fn deny(&self, actor: ActorId, node: Eid) {
        self.lock().denied.insert((actor, node));
    }

    /// Denies or re-allows every request.
    pub fn set_deny_all(&self, deny: bool) {
        self.lock().deny_all = deny;
    }

    /// Number of checks performed.
    pub fn checks(&self) -> usize {
        self.lock().checks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Rules> {
        self.rules.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AccessCheck for ScriptedAccess {
    fn check_access(&self, node: &dyn PbsNode, actor: ActorId) -> Result<(), AccessDenied> {
        let mut rules = self.lock();
        rules.checks += 1;
        if rules.deny_all || rules.denied.contains(&(actor, node.eid())) {
            Err(AccessDenied)
        } else {
            Ok(())
        }
    }
}
