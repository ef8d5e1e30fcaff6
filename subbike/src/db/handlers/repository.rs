//! Shared CRUD surface for table-backed repositories.

use crate::db::errors::Result;

/// CRUD operations over one table, borrowed from a connection or transaction.
///
/// Request and response types are kept separate so handlers never see raw rows they did not ask
/// for. Queries beyond plain CRUD (lookups by name, aggregations) live as inherent methods on the
/// repository itself.
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;
    type UpdateRequest;
    type Response;
    type Id: Send + Sync;
    /// Narrows `list`, e.g. to one owner
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// `None` when no row has this id
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Returns whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Fails with `DbError::NotFound` when the id does not exist
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
