use std::time::Duration;

use home_api::HomeContext;
use slack_integration::SignatureVerifier;
use storage::Storage;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) home: HomeContext,
    pub(crate) verifier: SignatureVerifier,
    pub(crate) storage: Storage,
    /// How long a request waits for its handler before acknowledging anyway.
    pub(crate) ack_deadline: Duration,
}
