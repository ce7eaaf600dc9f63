//! Fault injection for record stores
//!
//! Each operation class has its own call counter. Arming an operation with
//! `fail_after(op, n)` lets the next `n` calls through and fails every call
//! after that with `StoreUnavailable`, until `heal` is called.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use rolodex_core::{Error, IndexRangeQuery, Kind, Record, RecordKey, RecordStore, Result};

/// Operation classes of `RecordStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `get`
    Get,
    /// `put`
    Put,
    /// `put_batch`
    PutBatch,
    /// `query_by_ancestor`
    Ancestor,
    /// `query_by_index_range`
    IndexRange,
    /// `get_batch`
    GetBatch,
    /// `query_kind`
    QueryKind,
}

#[derive(Debug, Default)]
struct FaultState {
    /// Successful calls allowed before failing, per armed op
    budget: FxHashMap<Op, usize>,
    /// Calls seen, successful or not
    calls: FxHashMap<Op, usize>,
}

/// A `RecordStore` wrapper that fails on demand
#[derive(Debug)]
pub struct FaultyStore<S> {
    inner: S,
    state: Mutex<FaultState>,
}

impl<S: RecordStore> FaultyStore<S> {
    /// Wrap a store; nothing fails until armed
    pub fn new(inner: S) -> Self {
        FaultyStore {
            inner,
            state: Mutex::new(FaultState::default()),
        }
    }

    /// Let `successes` more calls of `op` through, then fail every call
    pub fn fail_after(&self, op: Op, successes: usize) {
        self.state.lock().budget.insert(op, successes);
    }

    /// Stop failing `op`
    pub fn heal(&self, op: Op) {
        self.state.lock().budget.remove(&op);
    }

    /// Stop failing everything
    pub fn heal_all(&self) {
        self.state.lock().budget.clear();
    }

    /// Calls of `op` seen so far
    pub fn calls(&self, op: Op) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, op: Op) -> Result<()> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        match state.budget.get_mut(&op) {
            Some(0) => Err(Error::store_unavailable(format!("injected {:?} failure", op))),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<S: RecordStore> RecordStore for FaultyStore<S> {
    fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        self.check(Op::Get)?;
        self.inner.get(key)
    }

    fn put(&self, record: Record) -> Result<RecordKey> {
        self.check(Op::Put)?;
        self.inner.put(record)
    }

    fn put_batch(&self, records: Vec<Record>) -> Result<Vec<RecordKey>> {
        self.check(Op::PutBatch)?;
        self.inner.put_batch(records)
    }

    fn query_by_ancestor(&self, root: &RecordKey) -> Result<Vec<Record>> {
        self.check(Op::Ancestor)?;
        self.inner.query_by_ancestor(root)
    }

    fn query_by_index_range(&self, query: &IndexRangeQuery) -> Result<Vec<RecordKey>> {
        self.check(Op::IndexRange)?;
        self.inner.query_by_index_range(query)
    }

    fn get_batch(&self, keys: &[RecordKey]) -> Result<Vec<Option<Record>>> {
        self.check(Op::GetBatch)?;
        self.inner.get_batch(keys)
    }

    fn query_kind(&self, kind: Kind, after: Option<&RecordKey>, limit: usize) -> Result<Vec<Record>> {
        self.check(Op::QueryKind)?;
        self.inner.query_kind(kind, after, limit)
    }
}
