//! API endpoint implementations for the tracker HTTP surface.

/// Order CRUD and status update endpoints.
pub mod orders;
/// Server-push notification stream endpoint.
pub mod stream;
