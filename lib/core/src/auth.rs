//! Authentication seam.
//!
//! This crate does NOT implement authentication. Modules and the server
//! binary only know this trait; the concrete implementation (session,
//! JWT, ...) is injected at startup time.

use axum::http::HeaderMap;

use crate::ServiceError;

/// Pluggable authenticator, consulted before admin operations.
///
/// The check receives the request headers (for extracting tokens)
/// and a permission string such as `"rates:admin"`.
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticate a request and check the given permission.
    ///
    /// - `headers`: the HTTP request headers
    /// - `permission`: the permission string (`"module:action"`)
    /// - Returns `Ok(())` if allowed, `Err(ServiceError)` if denied.
    fn check(
        &self,
        headers: &HeaderMap,
        permission: &str,
    ) -> Result<(), ServiceError>;
}

/// A no-op authenticator that allows everything. Used for testing
/// and for deployments that terminate auth upstream.
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn check(&self, _headers: &HeaderMap, _permission: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// An authenticator that denies everything. Used for testing.
pub struct DenyAll;

impl Authenticator for DenyAll {
    fn check(&self, _headers: &HeaderMap, _permission: &str) -> Result<(), ServiceError> {
        Err(ServiceError::Validation("access denied".into()))
    }
}
