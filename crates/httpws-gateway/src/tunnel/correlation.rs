//! Pending-request table: `request id -> reply slot`.
//!
//! Requesters register and remove; the dispatch loop only resolves. Resolving
//! takes the sender out of the slot but leaves the entry, so the entry's
//! lifetime always belongs to the call that created it.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;

use httpws_core::error::{CorrelationFault, Result};
use httpws_core::protocol::envelope::Response;

#[derive(Debug)]
pub struct CorrelationTable {
    slots: DashMap<u64, Option<oneshot::Sender<Response>>>,
    seq: AtomicU64,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh non-zero id and create its reply slot in one step, so
    /// an explicit `register` racing with this call can never take the id.
    pub fn register_next(&self) -> (u64, oneshot::Receiver<Response>) {
        loop {
            let id = self.seq.fetch_add(1, Ordering::Relaxed);
            if id == 0 {
                continue;
            }
            if let Entry::Vacant(v) = self.slots.entry(id) {
                let (tx, rx) = oneshot::channel();
                v.insert(Some(tx));
                return (id, rx);
            }
        }
    }

    /// Create the reply slot for `id`. A live id is refused.
    pub fn register(&self, id: u64) -> Result<oneshot::Receiver<Response>> {
        match self.slots.entry(id) {
            Entry::Occupied(_) => Err(CorrelationFault::DuplicateId(id).into()),
            Entry::Vacant(v) => {
                let (tx, rx) = oneshot::channel();
                v.insert(Some(tx));
                Ok(rx)
            }
        }
    }

    /// Deliver `response` to the waiter for `id`.
    ///
    /// Returns false when nobody is waiting: unknown id, already resolved, or
    /// the waiter gave up between lookup and delivery.
    pub fn resolve(&self, id: u64, response: Response) -> bool {
        let Some(tx) = self.slots.get_mut(&id).and_then(|mut slot| slot.take()) else {
            return false;
        };
        tx.send(response).is_ok()
    }

    pub fn remove(&self, id: u64) {
        self.slots.remove(&id);
    }

    pub fn contains(&self, id: u64) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Removes its entry when dropped, whichever way the call ends.
pub(crate) struct PendingGuard<'a> {
    table: &'a CorrelationTable,
    id: u64,
}

impl<'a> PendingGuard<'a> {
    pub(crate) fn new(table: &'a CorrelationTable, id: u64) -> Self {
        Self { table, id }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(self.id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn register_next_skips_explicitly_taken_ids() {
        let table = CorrelationTable::new();
        let _one = table.register(1).unwrap();
        let _two = table.register(2).unwrap();

        let (id, _slot) = table.register_next();
        assert_eq!(id, 3);
        assert!(table.register(3).is_err());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn resolve_delivers_once() {
        let table = CorrelationTable::new();
        let (id, mut slot) = table.register_next();

        assert!(table.resolve(id, Response::status_only(id, 200, "OK")));
        assert!(!table.resolve(id, Response::status_only(id, 200, "OK")));
        assert_eq!(slot.try_recv().unwrap().status, 200);
        assert!(table.contains(id));

        table.remove(id);
        assert!(table.is_empty());
    }
}
