//! The API endpoints URIs.

/// The root route which reports that the service is up.
pub const ROOT: &str = "/";
/// The route for health checks.
pub const HEALTH: &str = "/api/health";
/// The route that turns a sentence into a command object.
pub const ASSISTANT: &str = "/api/ai/assistant";
