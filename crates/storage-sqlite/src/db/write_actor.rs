//! Single-writer actor for the SQLite database.
//!
//! All mutations go through one background task owning one pooled connection.
//! Each job runs inside an immediate transaction and may queue change events;
//! the actor publishes those events to the change feed only after the
//! transaction has committed, and does so serially. Commit order therefore
//! equals feed order, which is what gives downstream subscribers their
//! per-connection ordering guarantee.

use std::any::Any;

use diesel::SqliteConnection;
use tokio::sync::{mpsc, oneshot};

// PooledConnection derefs to SqliteConnection; immediate_transaction is an
// inherent SqliteConnection method.

use orderdeck_core::errors::Result;
use orderdeck_core::feed::ChangeEvent;

use super::DbPool;
use crate::errors::StorageError;
use crate::feed::ChangeFeedPublisher;

/// A write job: gets the writer's connection plus a buffer for change events
/// to publish if the enclosing transaction commits.
type Job<T> =
    Box<dyn FnOnce(&mut SqliteConnection, &mut Vec<ChangeEvent>) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, Reply)>,
}

impl WriteHandle {
    /// Executes a database job on the writer's dedicated connection and
    /// returns its result. Change events queued by the job are published to
    /// the feed after commit.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection, &mut Vec<ChangeEvent>) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |conn, changes| {
                    job(conn, changes).map(|v| Box::new(v) as Box<dyn Any + Send>)
                }),
                ret_tx,
            ))
            .await
            .expect("Writer actor's receiving channel was closed, indicating the actor stopped.");

        ret_rx
            .await
            .expect("Writer actor dropped the reply sender without sending a result.")
            .map(|boxed: Box<dyn Any + Send + 'static>| {
                *boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("Failed to downcast writer actor result."))
            })
    }
}

/// Spawns the writer actor. It holds one connection from the pool for its
/// lifetime and processes jobs serially.
pub fn spawn_writer(pool: DbPool, publisher: ChangeFeedPublisher) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, Reply)>(1024);

    tokio::spawn(async move {
        let mut conn = pool
            .get()
            .expect("Failed to get a connection from the DB pool for the writer actor.");

        while let Some((job, reply_tx)) = rx.recv().await {
            let mut changes: Vec<ChangeEvent> = Vec::new();
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| {
                    job(c, &mut changes).map_err(StorageError::from)
                })
                .map_err(|e: StorageError| e.into());

            // Post-commit only. A rolled-back transaction publishes nothing.
            if result.is_ok() {
                for event in changes {
                    publisher.publish(event);
                }
            }

            // Ignore error if the requester has gone away.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
