//! Transaction manager
//!
//! The only path through which callers touch the store.
//!
//! - Read transactions hold a published snapshot and never wait.
//! - Write transactions hold a private working copy plus the writer slot.
//!   Writers are serialized: [`Store::begin_write`] blocks until every
//!   earlier writer has committed or aborted, admitting waiters in arrival
//!   order; [`Store::try_begin_write`] fails with
//!   [`StoreError::WriterBusy`] instead of waiting.
//!
//! A write transaction ends exactly once, by `commit` or `abort`. Dropping
//! it unterminated aborts it, so early returns and `?` never leak the
//! writer slot.

mod gate;

pub use gate::{WriterGate, WriterSlot};

use std::sync::Arc;
use log::debug;

use crate::error::{Result, StoreError};
use crate::models::Record;
use crate::store::{Snapshot, Store};

/// Read operations shared by read and write transactions
pub trait Txn {
    /// The snapshot this transaction reads from
    fn snapshot(&self) -> Result<&Snapshot>;

    /// Version of the snapshot being read
    fn version(&self) -> Result<u64> {
        Ok(self.snapshot()?.version())
    }

    /// All rows of `R` whose `index` field equals `key`, in index order
    fn get<R: Record>(&self, index: &str, key: &str) -> Result<Vec<Arc<R>>> {
        self.snapshot()?.table::<R>().get(index, key)
    }

    /// The first row of `R` whose `index` field equals `key`
    fn first<R: Record>(&self, index: &str, key: &str) -> Result<Option<Arc<R>>> {
        self.snapshot()?.table::<R>().first(index, key)
    }

    /// Every row of `R`, in the order of `index`
    fn scan<R: Record>(&self, index: &str) -> Result<Vec<Arc<R>>> {
        self.snapshot()?.table::<R>().scan(index)
    }
}

/// Read-only transaction over one published snapshot
#[derive(Debug, Clone)]
pub struct ReadTxn {
    snapshot: Arc<Snapshot>,
}

impl ReadTxn {
    /// Release the snapshot
    pub fn abort(self) {}
}

impl Txn for ReadTxn {
    fn snapshot(&self) -> Result<&Snapshot> {
        Ok(&self.snapshot)
    }
}

/// Read-write transaction over a working copy
#[derive(Debug)]
pub struct WriteTxn<'s> {
    store: &'s Store,

    /// `None` once committed or aborted
    working: Option<Snapshot>,

    /// Held until the transaction terminates
    slot: Option<WriterSlot<'s>>,
}

impl<'s> WriteTxn<'s> {
    fn new(store: &'s Store, slot: WriterSlot<'s>) -> Self {
        // Forking after the slot is taken guarantees we build on the latest commit
        let working = store.fork();
        debug!("Began write transaction for version {}", working.version());

        WriteTxn {
            store,
            working: Some(working),
            slot: Some(slot),
        }
    }

    fn working_mut(&mut self) -> Result<&mut Snapshot> {
        self.working.as_mut().ok_or(StoreError::AlreadyTerminated)
    }

    /// Insert a new row; fails with `DuplicateKey` if its primary key exists
    pub fn insert<R: Record>(&mut self, row: R) -> Result<Arc<R>> {
        self.working_mut()?.table_mut::<R>().insert(row)
    }

    /// Delete the row with `row`'s primary key; fails with `NotFound` if absent
    pub fn delete<R: Record>(&mut self, row: &R) -> Result<Arc<R>> {
        self.working_mut()?.table_mut::<R>().delete(row)
    }

    /// Publish the working copy and release the writer slot
    pub fn commit(&mut self) -> Result<()> {
        let working = self.working.take().ok_or(StoreError::AlreadyTerminated)?;
        let version = working.version();

        self.store.publish(working);
        drop(self.slot.take());

        debug!("Committed write transaction at version {}", version);
        Ok(())
    }

    /// Discard the working copy and release the writer slot.
    ///
    /// A no-op on a transaction that already ended.
    pub fn abort(&mut self) {
        if let Some(working) = self.working.take() {
            debug!("Aborted write transaction for version {}", working.version());
        }
        drop(self.slot.take());
    }

    /// Whether commit or abort has been called
    pub fn is_terminated(&self) -> bool {
        self.working.is_none()
    }
}

impl Txn for WriteTxn<'_> {
    fn snapshot(&self) -> Result<&Snapshot> {
        self.working.as_ref().ok_or(StoreError::AlreadyTerminated)
    }
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        if !self.is_terminated() {
            debug!("Write transaction dropped before commit");
            self.abort();
        }
    }
}

impl Store {
    /// Begin a read transaction on the current snapshot
    pub fn begin_read(&self) -> ReadTxn {
        ReadTxn {
            snapshot: self.current_snapshot(),
        }
    }

    /// Begin a write transaction, waiting for earlier writers to finish
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let slot = self.writer.acquire();
        WriteTxn::new(self, slot)
    }

    /// Begin a write transaction only if no other writer holds or awaits the slot
    pub fn try_begin_write(&self) -> Result<WriteTxn<'_>> {
        let slot = self.writer.try_acquire().ok_or(StoreError::WriterBusy)?;
        Ok(WriteTxn::new(self, slot))
    }

    /// Run `f` inside a read transaction
    pub fn view<T>(&self, f: impl FnOnce(&ReadTxn) -> Result<T>) -> Result<T> {
        let txn = self.begin_read();
        f(&txn)
    }

    /// Run `f` inside a write transaction, committing on `Ok` and aborting
    /// on `Err`. If `f` terminates the transaction itself, its decision stands.
    pub fn update<T>(&self, f: impl FnOnce(&mut WriteTxn<'_>) -> Result<T>) -> Result<T> {
        let mut txn = self.begin_write();
        match f(&mut txn) {
            Ok(value) => {
                if !txn.is_terminated() {
                    txn.commit()?;
                }
                Ok(value)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlogComment, BlogPost, CommentFields, PostFields};
    use crate::schema::{index, POSTS_TABLE};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn post(id: &str, title: &str) -> BlogPost {
        BlogPost::new(
            id.to_string(),
            PostFields {
                title: title.to_string(),
                article_text: "text".to_string(),
                author_name: "author".to_string(),
            },
        )
    }

    fn comment(id: &str, post_id: &str) -> BlogComment {
        BlogComment::new(
            id.to_string(),
            post_id.to_string(),
            CommentFields {
                comment_text: "text".to_string(),
                author_name: "author".to_string(),
            },
        )
    }

    #[test]
    fn test_write_lifecycle() {
        let store = Store::blog().unwrap();

        let mut txn = store.begin_write();
        txn.insert(post("p1", "A")).unwrap();

        // Visible inside the transaction, invisible outside
        assert!(txn.first::<BlogPost>(index::ID, "p1").unwrap().is_some());
        assert!(store.begin_read().first::<BlogPost>(index::ID, "p1").unwrap().is_none());

        txn.commit().unwrap();
        assert!(store.begin_read().first::<BlogPost>(index::ID, "p1").unwrap().is_some());
        assert_eq!(store.current_snapshot().version(), 1);
    }

    #[test]
    fn test_commit_twice_fails() {
        let store = Store::blog().unwrap();
        let mut txn = store.begin_write();
        txn.commit().unwrap();

        assert_eq!(txn.commit(), Err(StoreError::AlreadyTerminated));
        assert_eq!(store.current_snapshot().version(), 1);
    }

    #[test]
    fn test_abort_after_commit_is_noop() {
        let store = Store::blog().unwrap();
        let mut txn = store.begin_write();
        txn.insert(post("p1", "A")).unwrap();
        txn.commit().unwrap();
        txn.abort();
        txn.abort();

        assert_eq!(store.begin_read().scan::<BlogPost>(index::ID).unwrap().len(), 1);
    }

    #[test]
    fn test_operations_after_termination_fail() {
        let store = Store::blog().unwrap();
        let mut txn = store.begin_write();
        txn.abort();

        assert_eq!(txn.insert(post("p1", "A")).unwrap_err(), StoreError::AlreadyTerminated);
        assert_eq!(txn.delete(&post("p1", "A")).unwrap_err(), StoreError::AlreadyTerminated);
        assert_eq!(
            txn.get::<BlogPost>(index::ID, "p1").unwrap_err(),
            StoreError::AlreadyTerminated
        );
        assert_eq!(txn.commit(), Err(StoreError::AlreadyTerminated));
    }

    #[test]
    fn test_abort_leaves_published_snapshot_untouched() {
        let store = Store::blog().unwrap();
        store
            .update(|txn| {
                txn.insert(post("p1", "A"))?;
                txn.insert(comment("c1", "p1"))?;
                Ok(())
            })
            .unwrap();
        let before = store.current_snapshot();

        let mut txn = store.begin_write();
        let p1 = txn.first::<BlogPost>(index::ID, "p1").unwrap().unwrap();
        txn.delete(&*p1).unwrap();
        txn.insert(post("p2", "B")).unwrap();
        txn.abort();

        let after = store.current_snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.table::<BlogPost>().len(), 1);
        assert_eq!(after.table::<BlogComment>().len(), 1);
    }

    #[test]
    fn test_drop_aborts_and_releases_writer() {
        let store = Store::blog().unwrap();

        {
            let mut txn = store.begin_write();
            txn.insert(post("p1", "A")).unwrap();
        }

        assert!(!store.writer.is_held());
        assert!(store.begin_read().scan::<BlogPost>(index::ID).unwrap().is_empty());

        // The slot is free again
        let mut txn = store.try_begin_write().unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn test_update_commits_on_ok_and_aborts_on_err() {
        let store = Store::blog().unwrap();

        let title = store
            .update(|txn| {
                let row = txn.insert(post("p1", "A"))?;
                Ok(row.title.clone())
            })
            .unwrap();
        assert_eq!(title, "A");

        let err = store
            .update(|txn| {
                txn.insert(post("p2", "B"))?;
                txn.insert(post("p1", "again"))?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateKey {
                table: POSTS_TABLE.to_string(),
                key: "p1".to_string(),
            }
        );

        let ids: Vec<String> = store
            .view(|txn| txn.scan::<BlogPost>(index::ID))
            .unwrap()
            .iter()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn test_unknown_index_on_read_and_write() {
        let store = Store::blog().unwrap();
        let read = store.begin_read();
        assert!(matches!(
            read.get::<BlogComment>("postID", "p1"),
            Err(StoreError::UnknownIndex { .. })
        ));

        let write = store.begin_write();
        assert!(matches!(
            write.scan::<BlogPost>("articleid"),
            Err(StoreError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = Store::blog().unwrap();
        store.update(|txn| txn.insert(post("p1", "A")).map(|_| ())).unwrap();

        let reader = store.begin_read();

        store
            .update(|txn| {
                let p1 = txn.first::<BlogPost>(index::ID, "p1")?.unwrap();
                txn.delete(&*p1)?;
                txn.insert(post("p2", "B"))?;
                Ok(())
            })
            .unwrap();

        // The reader began first, so the later commit is invisible to it
        let ids: Vec<String> = reader
            .scan::<BlogPost>(index::ID)
            .unwrap()
            .iter()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(ids, vec!["p1"]);
        assert_eq!(reader.version().unwrap(), 1);

        let fresh = store.begin_read();
        assert!(fresh.first::<BlogPost>(index::ID, "p1").unwrap().is_none());
        assert!(fresh.first::<BlogPost>(index::ID, "p2").unwrap().is_some());
        assert_eq!(fresh.version().unwrap(), 2);
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let store = Store::blog().unwrap();
        store.update(|txn| txn.insert(post("p1", "A")).map(|_| ())).unwrap();

        let reader = store.begin_read();
        let first = reader.first::<BlogPost>(index::ID, "p1").unwrap().unwrap();

        store
            .update(|txn| {
                let p1 = txn.first::<BlogPost>(index::ID, "p1")?.unwrap();
                txn.delete(&*p1)?;
                txn.insert(post("p1", "changed"))?;
                Ok(())
            })
            .unwrap();

        let second = reader.first::<BlogPost>(index::ID, "p1").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.title, "A");
    }

    #[test]
    fn test_reads_do_not_wait_for_writer() {
        let store = Store::blog().unwrap();
        let mut writer = store.begin_write();
        writer.insert(post("p1", "A")).unwrap();

        // Reading while a writer is open returns immediately
        let reader = store.begin_read();
        assert!(reader.scan::<BlogPost>(index::ID).unwrap().is_empty());

        writer.commit().unwrap();
    }

    #[test]
    fn test_second_writer_blocks_until_first_finishes() {
        let store = Arc::new(Store::blog().unwrap());
        let mut first = store.begin_write();
        first.insert(post("p1", "A")).unwrap();

        assert_eq!(store.try_begin_write().unwrap_err(), StoreError::WriterBusy);

        let (tx, rx) = mpsc::channel();
        let store_clone = store.clone();
        let handle = thread::spawn(move || {
            let mut second = store_clone.begin_write();
            // Forked after the first commit, so p1 is visible here
            let seen = second.first::<BlogPost>(index::ID, "p1").unwrap().is_some();
            second.insert(post("p2", "B")).unwrap();
            second.commit().unwrap();
            tx.send(seen).unwrap();
        });

        // The second writer is stuck behind the first
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        first.commit().unwrap();
        drop(first);

        let seen = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();

        assert!(seen);
        assert_eq!(store.current_snapshot().version(), 2);
        assert_eq!(store.begin_read().scan::<BlogPost>(index::ID).unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_writers_are_totally_ordered() {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(Store::blog().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store_clone = store.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        store_clone
                            .update(|txn| {
                                txn.insert(post(&format!("p{}-{}", worker, i), "t"))?;
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        // Readers running alongside see versions only ever go up
        let mut last_version = 0;
        let mut last_len = 0;
        while handles.iter().any(|h| !h.is_finished()) {
            let reader = store.begin_read();
            let version = reader.version().unwrap();
            let len = reader.scan::<BlogPost>(index::ID).unwrap().len();
            assert!(version >= last_version);
            assert!(len >= last_len);
            // Every commit adds exactly one row
            assert_eq!(len as u64, version);
            last_version = version;
            last_len = len;
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.current_snapshot().version(), 200);
        assert_eq!(store.begin_read().scan::<BlogPost>(index::ID).unwrap().len(), 200);
        assert!(store.current_snapshot().table::<BlogPost>().indexes_consistent());
    }
}
