/// API error types and handling
pub mod errors;
/// HTTP handlers for tasks, templates, groups and uploads
pub mod handlers;
/// Caller identity extraction
pub mod identity;
/// Routes configuration and setup
pub mod routes;
/// HTTP server implementation
pub mod server;
