//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorEnvelope;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "statusCode": 500,
        "type": "default-error",
        "message": "An internal server error occurred",
        "timestamp": "2025-01-01T00:00:00Z",
        "path": "/api/users"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorEnvelope);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "statusCode": 400,
        "type": "http-error",
        "message": "Request validation failed",
        "timestamp": "2025-01-01T00:00:00Z",
        "path": "/api/users",
        "details": {
            "email": [{
                "code": "email",
                "message": null,
                "params": {"value": "not-an-email"}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorEnvelope);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid UUID",
    content_type = "application/json",
    example = json!({
        "statusCode": 400,
        "type": "http-error",
        "message": "Invalid UUID format",
        "timestamp": "2025-01-01T00:00:00Z",
        "path": "/api/users/not-a-uuid"
    })
)]
pub struct BadRequestUuidResponse(pub ErrorEnvelope);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "statusCode": 404,
        "type": "http-error",
        "message": "Resource not found",
        "timestamp": "2025-01-01T00:00:00Z",
        "path": "/api/users/0193a7e0-0000-7000-8000-000000000000"
    })
)]
pub struct NotFoundResponse(pub ErrorEnvelope);

#[derive(ToResponse)]
#[response(
    description = "Unauthorized - Authentication required",
    content_type = "application/json",
    example = json!({
        "statusCode": 401,
        "type": "http-error",
        "message": "Missing authentication token",
        "timestamp": "2025-01-01T00:00:00Z",
        "path": "/api/users"
    })
)]
pub struct UnauthorizedResponse(pub ErrorEnvelope);

#[derive(ToResponse)]
#[response(
    description = "Conflict - Resource already exists",
    content_type = "application/json",
    example = json!({
        "statusCode": 409,
        "type": "http-error",
        "message": "Resource already exists",
        "timestamp": "2025-01-01T00:00:00Z",
        "path": "/api/users"
    })
)]
pub struct ConflictResponse(pub ErrorEnvelope);
