use std::marker::PhantomData;

use tokio::sync::broadcast::{
    Receiver,
    error::{RecvError, TryRecvError},
};

use crate::store::{self, Record, Store, Table};

/// A push-based view of a whole table.
///
/// The first [`next`](LiveQuery::next) returns the current contents; each later
/// call waits until a write to the table commits and returns the new contents.
/// Bursts of writes that land between two calls collapse into one snapshot.
pub struct LiveQuery<T> {
    store: Store,
    changes: Receiver<Table>,
    primed: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> LiveQuery<T> {
    pub(crate) fn new(store: Store) -> Self {
        // Subscribe before the first snapshot so no commit falls in between.
        let changes = store.subscribe();
        Self {
            store,
            changes,
            primed: false,
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> Table {
        T::TABLE
    }

    pub async fn next(&mut self) -> Result<Vec<T>, store::Error> {
        if self.primed {
            self.wait_for_change().await?;
        }
        self.primed = true;
        super::all::<T>(&self.store).await
    }

    async fn wait_for_change(&mut self) -> Result<(), store::Error> {
        loop {
            match self.changes.recv().await {
                Ok(table) if table == T::TABLE => break,
                Ok(_) => continue,
                // Missed events may have touched this table.
                Err(RecvError::Lagged(_)) => break,
                Err(RecvError::Closed) => return Err(store::Error::Closed),
            }
        }
        loop {
            match self.changes.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Ok(())
    }
}
