//! Health check endpoint for liveness probes.

/// Returns 200 when the server is running.
pub async fn health_handler() -> &'static str {
    "OK"
}
