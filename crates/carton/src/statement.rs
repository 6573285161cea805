use crate::driver::ClientStatement;
use crate::repository::{Executed, Repository};
use crate::stmt::Value;
use crate::Result;

/// A prepared statement whose results are routed back through the
/// repository, so schema-mapped tables come back as collections here too.
pub struct Statement<'a> {
    repository: &'a Repository,
    inner: Box<dyn ClientStatement>,
}

impl<'a> Statement<'a> {
    pub(crate) fn new(repository: &'a Repository, inner: Box<dyn ClientStatement>) -> Self {
        Self { repository, inner }
    }

    /// Executes the statement with the given parameters.
    pub async fn execute(&mut self, params: &[Value]) -> Result<Executed> {
        let result = self.inner.execute(params).await?;
        self.repository.handle_query_result(result).await
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement").finish_non_exhaustive()
    }
}
