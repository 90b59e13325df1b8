pub mod credit_packages;
pub mod envelope;
pub mod health;
pub mod validation;
pub mod webhooks;
