use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// An open storage transaction. Dropping it without commit rolls back.
#[async_trait::async_trait]
pub trait StorageTx: Send + Any {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
    /// Lets a backend's repos get their own transaction type back.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
