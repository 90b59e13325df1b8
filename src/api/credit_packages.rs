//! Credit package endpoints
//!
//! Handlers receive input that has already passed the schema checks in
//! [`crate::api::validation`] and talk to the store through
//! [`CreditPackageStore`].

use axum::{
    extract::{Path, State},
    http::{Method, Uri},
    response::Response,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::envelope;
use crate::api::validation::{validate_uuid, ValidatedJson, ValidatedPath};
use crate::app::AppState;
use crate::database::credit_package_repository::{CreditPackage, NewCreditPackage};
use crate::error::{AppError, AppResult};

pub const MAX_NAME_LENGTH: usize = 50;
/// Precision and scale of the `price` column
pub const MAX_PRICE_DIGITS: u32 = 10;
pub const MAX_PRICE_SCALE: u32 = 2;
pub const UPDATE_NOT_IMPLEMENTED_MESSAGE: &str = "Update logic not yet implemented.";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCreditPackageRequest {
    #[validate(custom(function = "validate_package_name"))]
    pub name: String,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub credit_amount: i32,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
}

impl CreateCreditPackageRequest {
    pub fn into_new_package(self) -> NewCreditPackage {
        NewCreditPackage {
            name: self.name.trim().to_string(),
            credit_amount: self.credit_amount,
            price: self.price,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreditPackageIdParams {
    #[serde(rename = "creditPackageId")]
    #[validate(custom(function = "validate_uuid"))]
    pub credit_package_id: String,
}

impl CreditPackageIdParams {
    pub fn id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(self.credit_package_id.trim())
            .map_err(|_| AppError::invalid_id(self.credit_package_id.clone()))
    }
}

fn validate_package_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length == 0 || length > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(format!("must be between 1 and {} characters", MAX_NAME_LENGTH).into());
        return Err(err);
    }
    Ok(())
}

/// Prices must fit the `NUMERIC(10, 2)` column without rounding.
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    let message = if *price <= Decimal::ZERO {
        "must be greater than 0".to_string()
    } else if price.normalize().scale() > MAX_PRICE_SCALE {
        format!("must have at most {} decimal places", MAX_PRICE_SCALE)
    } else if *price >= price_ceiling() {
        format!("must be less than {}", price_ceiling())
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("range");
    err.message = Some(message.into());
    Err(err)
}

fn price_ceiling() -> Decimal {
    Decimal::new(10_i64.pow(MAX_PRICE_DIGITS - MAX_PRICE_SCALE), 0)
}

/// GET /v1/api/credit-package
pub async fn list_credit_packages(State(state): State<AppState>) -> AppResult<Response> {
    let packages = state.credit_packages.find_all().await?;
    Ok(envelope::success(packages))
}

/// POST /v1/api/credit-package
pub async fn create_credit_package(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    ValidatedJson(payload): ValidatedJson<CreateCreditPackageRequest>,
) -> AppResult<Response> {
    let new_package = payload.into_new_package();

    if state
        .credit_packages
        .find_by_name(&new_package.name)
        .await?
        .is_some()
    {
        return Err(AppError::duplicate());
    }

    let package = state.credit_packages.insert(&new_package).await?;

    info!(
        %method,
        path = %uri.path(),
        credit_package_id = %package.id,
        "credit package created"
    );
    Ok(envelope::created(package))
}

/// PUT /v1/api/credit-package/{creditPackageId}
///
/// Accepts the identifier and changes nothing.
pub async fn update_credit_package(Path(credit_package_id): Path<String>) -> Response {
    info!(credit_package_id = %credit_package_id, "credit package update requested");
    envelope::success(json!({ "message": UPDATE_NOT_IMPLEMENTED_MESSAGE }))
}

/// DELETE /v1/api/credit-package/{creditPackageId}
pub async fn delete_credit_package(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    ValidatedPath(params): ValidatedPath<CreditPackageIdParams>,
) -> AppResult<Response> {
    let id = params.id()?;

    if state.credit_packages.find_by_id(id).await?.is_none() {
        return Err(AppError::invalid_id(id.to_string()));
    }
    // Someone else may have removed it between the lookup and here
    if !state.credit_packages.delete(id).await? {
        return Err(AppError::invalid_id(id.to_string()));
    }

    info!(
        %method,
        path = %uri.path(),
        credit_package_id = %id,
        "credit package deleted"
    );
    Ok(envelope::deleted())
}

/// GET /v1/api/admin/credit-package
pub async fn admin_list_credit_packages() -> Response {
    envelope::success(Vec::<CreditPackage>::new())
}
