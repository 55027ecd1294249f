use std::sync::Arc;

use dashmap::DashMap;

use super::connection::{CloseReason, Connection};

/// Connection registry: `identity -> Connection`, at most one per identity.
///
/// Every operation is a single `DashMap` call, so mutations for one identity
/// are linearized by its shard lock. No guard escapes a method: callers close
/// or send on returned handles after the lock is released.
#[derive(Default)]
pub struct ConnectionRegistry {
    conns: DashMap<Arc<str>, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
        }
    }

    /// Insert or replace the entry for the handle's identity.
    /// Returns the superseded handle; the caller is responsible for closing it.
    pub fn register(&self, conn: Connection) -> Option<Connection> {
        self.conns.insert(conn.identity_arc(), conn)
    }

    /// Remove the entry only if it still points at `conn`.
    pub fn unregister_if_current(&self, identity: &str, conn: &Connection) -> bool {
        self.conns
            .remove_if(identity, |_, cur| cur.id() == conn.id())
            .is_some()
    }

    pub fn get(&self, identity: &str) -> Option<Connection> {
        self.conns.get(identity).map(|r| r.value().clone())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.conns.contains_key(identity)
    }

    pub fn size(&self) -> usize {
        self.conns.len()
    }

    /// Snapshot of registered identities (unordered).
    pub fn identities(&self) -> Vec<String> {
        self.conns.iter().map(|e| e.key().to_string()).collect()
    }

    /// Signal closure to every registered handle. Entries stay in place so
    /// each owning session deregisters itself and reports offline.
    pub fn close_all(&self, reason: CloseReason) -> usize {
        let all: Vec<Connection> = self.conns.iter().map(|e| e.value().clone()).collect();
        all.iter().filter(|c| c.close(reason)).count()
    }
}
