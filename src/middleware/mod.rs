pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use rate_limit::{enforce_rate_limit, RateLimiter, RateLimits};
pub use response::{ApiResponse, ApiResult, Message};
