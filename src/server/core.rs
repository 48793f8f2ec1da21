//! Drive context
//!
//! Process-wide, immutable state built once at startup: configuration, the
//! confined storage root and the credential seams. Cloning is cheap; every
//! clone shares the same state.

use log::{error, info};
use std::sync::Arc;

use crate::auth::{CredentialVerifier, Role, TokenIssuer, role_from_credential};
use crate::config::DriveConfig;
use crate::error::{DriveResult, StorageResult};
use crate::protocol::{Request, Response, handle_request};
use crate::storage::PathResolver;

#[derive(Clone)]
pub struct Drive {
    config: Arc<DriveConfig>,
    resolver: Arc<PathResolver>,
    verifier: Arc<dyn CredentialVerifier>,
    issuer: Option<Arc<dyn TokenIssuer>>,
}

impl Drive {
    /// Validates the configuration and prepares the storage root.
    pub fn new(config: DriveConfig, verifier: Arc<dyn CredentialVerifier>) -> DriveResult<Self> {
        config.validate()?;

        let resolver = PathResolver::new(config.storage_root_path()).map_err(|e| {
            error!("Failed to prepare storage root {}: {}", config.storage_root, e);
            e
        })?;

        info!("Storage root: {}", resolver.root().display());

        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            verifier,
            issuer: None,
        })
    }

    /// Enables login by supplying something that can mint credentials.
    pub fn with_issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn issuer(&self) -> Option<&dyn TokenIssuer> {
        self.issuer.as_deref()
    }

    /// Role of the holder of `credential`, guest unless it verifies.
    pub fn role_for(&self, credential: Option<&str>) -> Role {
        role_from_credential(self.verifier.as_ref(), credential)
    }

    /// Handles one decoded request.
    pub async fn handle(&self, credential: Option<&str>, request: Request) -> Response {
        handle_request(self, credential, request).await
    }

    /// Runs a blocking storage operation on tokio's blocking pool.
    ///
    /// The operation keeps running if the returned future is dropped, so a
    /// mutation that has started always finishes.
    pub async fn run_blocking<T, F>(&self, op: F) -> DriveResult<T>
    where
        F: FnOnce(&Drive) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let drive = self.clone();
        let result = tokio::task::spawn_blocking(move || op(&drive)).await?;
        Ok(result?)
    }
}
