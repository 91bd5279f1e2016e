use crate::{BackendConnector, GenerativeBackend};
use colorbook_common::Credential;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a credential may be used against the generative service.
///
/// Every failure (network, bad key, quota) collapses to "rejected"; there is
/// no retry and no lockout.
#[derive(Clone)]
pub struct CredentialGate {
    connector: Arc<dyn BackendConnector>,
}

impl CredentialGate {
    pub fn new(connector: Arc<dyn BackendConnector>) -> Self {
        Self { connector }
    }

    /// True only if a read-only call with the credential succeeds
    pub async fn validate(&self, credential: &Credential) -> bool {
        self.admit(credential).await.is_some()
    }

    /// Like `validate`, but hands back the connected backend for reuse
    pub async fn admit(&self, credential: &Credential) -> Option<Arc<dyn GenerativeBackend>> {
        let backend = match self.connector.connect(credential) {
            Ok(backend) => backend,
            Err(e) => {
                warn!(error_type = e.error_type(), "Could not build backend: {}", e);
                return None;
            }
        };

        match backend.list_models().await {
            Ok(models) => {
                debug!(models = models.len(), "Credential accepted");
                Some(backend)
            }
            Err(e) => {
                warn!(error_type = e.error_type(), "Credential rejected: {}", e);
                None
            }
        }
    }
}
