//! Client constants
//!
//! Centralized location for endpoint paths, storage keys and defaults used
//! throughout the client.

// Backend
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Auth endpoints
pub const REQUEST_OTP_PATH: &str = "/auth/request_otp/";
pub const VERIFY_OTP_PATH: &str = "/auth/verify_otp/";
pub const TOKEN_REFRESH_PATH: &str = "/auth/token_refresh/";
pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const CURRENT_USER_PATH: &str = "/users/me/";

/// Paths that never carry an access token and never trigger a refresh.
pub const PUBLIC_ENDPOINTS: [&str; 3] = [REQUEST_OTP_PATH, VERIFY_OTP_PATH, TOKEN_REFRESH_PATH];

// Session
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const REGISTRATION_SUBMITTED_MESSAGE: &str = "Registration request submitted successfully";

// Credential storage
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Coursehub.api";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

// Environment
pub const ENV_API_URL: &str = "COURSEHUB_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "COURSEHUB_TIMEOUT_SECS";
pub const ENV_LOGIN_PATH: &str = "COURSEHUB_LOGIN_PATH";
pub const ENV_KEYCHAIN_SERVICE: &str = "COURSEHUB_KEYCHAIN_SERVICE";
