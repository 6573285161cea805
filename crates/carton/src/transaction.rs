use crate::driver::ClientTransaction;
use crate::repository::Repository;
use crate::statement::Statement;
use crate::Result;

/// An open transaction whose statements route results back through the
/// repository.
///
/// If dropped without [`commit`](Self::commit) or
/// [`rollback`](Self::rollback), a rollback is issued in the background.
pub struct Transaction<'a> {
    repository: &'a Repository,

    /// `Option` so that commit/rollback/Drop can move the client
    /// transaction out.
    inner: Option<Box<dyn ClientTransaction>>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(repository: &'a Repository, inner: Box<dyn ClientTransaction>) -> Self {
        Self {
            repository,
            inner: Some(inner),
        }
    }

    /// Prepares a statement bound to this transaction's connection.
    pub async fn prepare(&mut self, sql: &str) -> Result<Statement<'a>> {
        let inner = self
            .inner
            .as_mut()
            .expect("transaction used after commit/rollback")
            .prepare(sql)
            .await?;
        Ok(Statement::new(self.repository, inner))
    }

    /// Commits the transaction.
    pub async fn commit(mut self) -> Result<()> {
        let inner = self
            .inner
            .take()
            .expect("transaction used after commit/rollback");
        inner.commit().await
    }

    /// Rolls the transaction back.
    pub async fn rollback(mut self) -> Result<()> {
        let inner = self
            .inner
            .take()
            .expect("transaction used after commit/rollback");
        inner.rollback().await
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            // Rollback is asynchronous and Drop is not; hand the client
            // transaction to the runtime to finish it.
            tokio::spawn(async move {
                let _ = inner.rollback().await;
            });
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("open", &self.inner.is_some())
            .finish()
    }
}
