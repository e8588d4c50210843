//! Fixed set of lazily opened connections
//!
//! Calls are spread round-robin over `pool_size` slots. Each slot holds one
//! connection, opened on first use and cleared when it breaks. Every opened
//! connection gets a fresh generation so a late failure report cannot clear
//! its replacement.

use crate::connector::{Connector, PooledConnection};
use crate::errors::CacheError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A connection handed out for one command
pub(crate) struct Lease {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
    pub(crate) connection: PooledConnection,
}

#[derive(Debug)]
pub(crate) struct ConnectionPool {
    connector: Connector,
    slots: Vec<Mutex<Option<(u64, PooledConnection)>>>,
    next: AtomicUsize,
    generations: AtomicU64,
}

impl ConnectionPool {
    pub(crate) fn new(connector: Connector, size: u32) -> Self {
        let size = usize::try_from(size).unwrap_or(usize::MAX).max(1);

        Self {
            connector,
            slots: (0..size).map(|_| Mutex::new(None)).collect(),
            next: AtomicUsize::new(0),
            generations: AtomicU64::new(0),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding a connection.
    ///
    /// Slots locked by an in-flight connect are not counted.
    pub(crate) fn open_connections(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.try_lock(), Ok(guard) if guard.is_some()))
            .count()
    }

    /// Get the next slot's connection, connecting if the slot is empty
    pub(crate) async fn acquire(&self) -> Result<Lease, CacheError> {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut guard = self.slots[slot].lock().await;

        if let Some((generation, connection)) = guard.as_ref() {
            return Ok(Lease {
                slot,
                generation: *generation,
                connection: connection.clone(),
            });
        }

        crate::debug_log!("[CACHE] Opening connection for slot {}", slot);
        let connection = self.connector.connect().await?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        *guard = Some((generation, connection.clone()));

        Ok(Lease {
            slot,
            generation,
            connection,
        })
    }

    /// Forget a slot's connection so the next use reconnects.
    ///
    /// Does nothing when the slot has already moved on to a newer connection.
    pub(crate) async fn discard(&self, slot: usize, generation: u64) {
        let Some(entry) = self.slots.get(slot) else {
            return;
        };

        let mut guard = entry.lock().await;
        if matches!(guard.as_ref(), Some((current, _)) if *current == generation) {
            *guard = None;
        }
    }
}
