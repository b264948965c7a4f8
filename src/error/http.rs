//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::UserNotFound
            | Self::OrderNotFound
            | Self::PaymentIntentNotFound
            | Self::ProductNotFound
            | Self::CartItemNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailExists
            | Self::OrderAlreadyProcessed
            | Self::ProductAlreadyReviewed => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            // 429 Too Many Requests
            Self::ConnectionLimitReached => StatusCode::TOO_MANY_REQUESTS,

            // 400 Bad Request
            Self::Unknown
            | Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::PasswordTooShort
            | Self::OrderEmpty
            | Self::PaymentFailed
            | Self::PaymentNotCompleted
            | Self::PaymentAmountTooSmall
            | Self::WebhookSignatureInvalid
            | Self::ProductInvalidPrice
            | Self::ProductOutOfStock
            | Self::ReviewRatingInvalid
            | Self::InsufficientStock => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway — upstream provider failures are retryable
            Self::PaymentProviderError | Self::NetworkError => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error — includes metadata integrity faults,
            // which indicate a producer/consumer mismatch rather than user error
            Self::PaymentMetadataInvalid
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::OrderAlreadyProcessed.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::PaymentNotCompleted.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PaymentProviderError.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::PaymentMetadataInvalid.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
