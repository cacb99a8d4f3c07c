//! Scoped ownership of the run's resource group.
//!
//! The guard starts empty, takes the group name before the create request,
//! and is released exactly once at the end of the run. Release never fails: delete
//! errors are logged and reported in the [`CleanupOutcome`].

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::azure::WebAppManager;
use crate::error::{AzureError, SampleError};

/// What release did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// No group was acquired, or it never came into existence.
    NothingToCleanUp,
    /// The group was deleted.
    Deleted {
        /// Deleted group name.
        resource_group: String,
    },
    /// Deleting the group failed; the error was logged and swallowed.
    Failed {
        /// Group that may still exist.
        resource_group: String,
        /// Error text.
        message: String,
    },
}

impl CleanupOutcome {
    /// Returns true unless the delete failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToCleanUp => write!(f, "no cleanup necessary"),
            Self::Deleted { resource_group } => write!(f, "deleted {resource_group}"),
            Self::Failed {
                resource_group,
                message,
            } => write!(f, "failed to delete {resource_group}: {message}"),
        }
    }
}

/// Owns the resource group until release.
pub struct ResourceGroupGuard<M: WebAppManager + ?Sized> {
    /// Management operations used for the delete.
    manager: Arc<M>,
    /// Name of the group this run asked for, if any.
    resource_group: Option<String>,
}

impl<M: WebAppManager + ?Sized> ResourceGroupGuard<M> {
    /// Creates an empty guard.
    #[must_use]
    pub const fn new(manager: Arc<M>) -> Self {
        Self {
            manager,
            resource_group: None,
        }
    }

    /// Takes ownership of a group by name. Call before the create request so
    /// a create that fails or is interrupted half way is still cleaned up.
    pub fn acquire(&mut self, resource_group: impl Into<String>) {
        let resource_group = resource_group.into();
        debug!("Resource group {resource_group} is now owned by this run");
        self.resource_group = Some(resource_group);
    }

    /// Deletes the owned group, if any. Consumes the guard so release
    /// happens at most once.
    pub async fn release(mut self) -> CleanupOutcome {
        let Some(name) = self.resource_group.take() else {
            info!("Did not create any resources in Azure. No clean up is necessary");
            return CleanupOutcome::NothingToCleanUp;
        };

        info!("Deleting resource group: {name}");
        match self.manager.delete_resource_group(&name).await {
            Ok(()) => {
                info!("Deleted resource group: {name}");
                CleanupOutcome::Deleted {
                    resource_group: name,
                }
            }
            Err(SampleError::Azure(AzureError::ResourceNotFound { .. })) => {
                info!("Resource group {name} was never created. No clean up is necessary");
                CleanupOutcome::NothingToCleanUp
            }
            Err(e) => {
                error!("Failed to delete resource group {name}: {e}");
                CleanupOutcome::Failed {
                    resource_group: name,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl<M: WebAppManager + ?Sized> Drop for ResourceGroupGuard<M> {
    fn drop(&mut self) {
        if let Some(name) = &self.resource_group {
            warn!(
                "Resource group {name} was never released; delete it with `webapp-sample cleanup {name}`"
            );
        }
    }
}
