//! Store executor for non-blocking persistence.
//!
//! The `SQLite` store is owned by a dedicated thread; async callers send
//! closures over a channel and await the result on a oneshot, so no lock is
//! held across an await point.

use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use shop_seed_core::{Collection, EntityKind, NewRow};
use shop_seed_store_sqlite::SqliteStore;
use tokio::sync::oneshot;

use crate::error::GatewayError;
use crate::gateway::Gateway;

type StoreResult<T> = anyhow::Result<T>;
type BoxedStoreOp = Box<dyn FnOnce(&mut SqliteStore) -> BoxedResult + Send + 'static>;
type BoxedResult = Box<dyn std::any::Any + Send + 'static>;

struct StoreOperation {
    op: BoxedStoreOp,
    response: oneshot::Sender<BoxedResult>,
}

/// Runs store operations in submission order on its own thread.
pub struct StoreExecutor {
    sender: mpsc::Sender<StoreOperation>,
    _handle: thread::JoinHandle<()>,
}

impl StoreExecutor {
    /// Take ownership of an opened, migrated store.
    #[must_use]
    pub fn new(mut store: SqliteStore) -> Self {
        let (sender, receiver) = mpsc::channel::<StoreOperation>();

        let handle = thread::spawn(move || {
            while let Ok(operation) = receiver.recv() {
                let result = (operation.op)(&mut store);
                let _ = operation.response.send(result);
            }
        });

        Self { sender, _handle: handle }
    }

    /// Run a store operation on the store thread.
    ///
    /// # Errors
    /// Returns [`ExecutorError`] when the operation fails or the store thread is gone.
    pub async fn run<F, T>(&self, op: F) -> Result<T, ExecutorError>
    where
        F: FnOnce(&mut SqliteStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (response_tx, response_rx) = oneshot::channel();

        let boxed_op: BoxedStoreOp = Box::new(move |store| {
            let result = op(store);
            Box::new(result) as BoxedResult
        });

        self.sender
            .send(StoreOperation { op: boxed_op, response: response_tx })
            .map_err(|_| ExecutorError::ChannelClosed)?;

        let boxed_result = response_rx.await.map_err(|_| ExecutorError::ChannelClosed)?;

        let result = boxed_result
            .downcast::<StoreResult<T>>()
            .map_err(|_| ExecutorError::TypeMismatch)?;

        result.map_err(ExecutorError::Store)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("store error: {0:#}")]
    Store(anyhow::Error),

    #[error("channel closed - executor may have shut down")]
    ChannelClosed,

    #[error("type mismatch in result - internal error")]
    TypeMismatch,
}

impl From<ExecutorError> for GatewayError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Store(store_err) => GatewayError::Store(format!("{store_err:#}")),
            ExecutorError::ChannelClosed => GatewayError::ChannelClosed,
            ExecutorError::TypeMismatch => GatewayError::TypeMismatch,
        }
    }
}

#[async_trait]
impl Gateway for StoreExecutor {
    async fn create(&self, row: NewRow) -> Result<i64, GatewayError> {
        Ok(self.run(move |store| store.insert(&row)).await?)
    }

    async fn destroy(&self, kind: EntityKind, id: i64) -> Result<(), GatewayError> {
        Ok(self.run(move |store| store.destroy(kind, id)).await?)
    }

    async fn update_challenge_description(
        &self,
        challenge_id: i64,
        description: String,
    ) -> Result<(), GatewayError> {
        Ok(self
            .run(move |store| store.update_challenge_description(challenge_id, &description))
            .await?)
    }

    async fn insert_document(
        &self,
        collection: Collection,
        document: serde_json::Value,
    ) -> Result<(), GatewayError> {
        self.run(move |store| store.insert_document(collection, &document)).await?;
        Ok(())
    }
}
