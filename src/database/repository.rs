use async_trait::async_trait;
use uuid::Uuid;

use crate::database::credit_package_repository::{CreditPackage, NewCreditPackage};
use crate::database::error::DatabaseError;

/// Data access for the `credit_packages` table.
///
/// Handlers depend on this trait rather than on `PgPool`, so the store can be
/// swapped (tests use an in-memory implementation).
#[async_trait]
pub trait CreditPackageStore: Send + Sync {
    /// All packages in store order
    async fn find_all(&self) -> Result<Vec<CreditPackage>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditPackage>, DatabaseError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<CreditPackage>, DatabaseError>;

    async fn insert(&self, package: &NewCreditPackage) -> Result<CreditPackage, DatabaseError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
