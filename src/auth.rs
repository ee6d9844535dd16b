//! RSA-signed JWTs and API Gateway authorizer responses.

/// Policy documents for API Gateway custom authorizers.
pub mod authorizer;

/// Token signing and validation.
pub mod jwt;
