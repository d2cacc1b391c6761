//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{Assistant, AssistantConfig, Error};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The pipeline that answers assistant requests.
    pub assistant: Arc<Assistant>,

    /// Cancelled when the server shuts down.
    ///
    /// Each request derives a child token from this one for its upstream call.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new [AppState] from the assistant `config`.
    ///
    /// # Errors
    /// Returns an error if the assistant pipeline cannot be created, see
    /// [Assistant::new].
    pub fn new(config: AssistantConfig, shutdown: CancellationToken) -> Result<Self, Error> {
        Ok(Self {
            assistant: Arc::new(Assistant::new(config)?),
            shutdown,
        })
    }
}
