use crate::database::error::DatabaseError;
use crate::database::repository::CreditPackageStore;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Credit package entity
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CreditPackage {
    pub id: Uuid,
    pub name: String,
    pub credit_amount: i32,
    pub price: Decimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Fields supplied by the client on create
#[derive(Debug, Clone, PartialEq)]
pub struct NewCreditPackage {
    pub name: String,
    pub credit_amount: i32,
    pub price: Decimal,
}

/// Postgres-backed credit package repository
#[derive(Clone)]
pub struct PgCreditPackageRepository {
    pool: PgPool,
}

impl PgCreditPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditPackageStore for PgCreditPackageRepository {
    async fn find_all(&self) -> Result<Vec<CreditPackage>, DatabaseError> {
        sqlx::query_as::<_, CreditPackage>(
            "SELECT id, name, credit_amount, price, created_at
             FROM credit_packages
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditPackage>, DatabaseError> {
        sqlx::query_as::<_, CreditPackage>(
            "SELECT id, name, credit_amount, price, created_at
             FROM credit_packages
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CreditPackage>, DatabaseError> {
        sqlx::query_as::<_, CreditPackage>(
            "SELECT id, name, credit_amount, price, created_at
             FROM credit_packages
             WHERE name = $1
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn insert(&self, package: &NewCreditPackage) -> Result<CreditPackage, DatabaseError> {
        sqlx::query_as::<_, CreditPackage>(
            r#"
            INSERT INTO credit_packages (name, credit_amount, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, credit_amount, price, created_at
            "#,
        )
        .bind(&package.name)
        .bind(package.credit_amount)
        .bind(package.price)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM credit_packages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}
