// ABOUTME: Scoped ownership of a provisioned sandbox
// ABOUTME: Guarantees teardown on success, error, and panic paths

use kiln_core::ModelProvider;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Result, Sandbox, SandboxManager};

/// A sandbox that is destroyed when the lease ends.
///
/// Call [`SandboxLease::release`] on the normal path. If the lease is dropped
/// without being released (early return, panic unwinding) teardown is spawned
/// on the current tokio runtime instead.
pub struct SandboxLease {
    manager: Arc<dyn SandboxManager>,
    sandbox: Sandbox,
    released: bool,
}

impl SandboxLease {
    /// Provision a sandbox and take ownership of it
    pub async fn acquire(
        manager: Arc<dyn SandboxManager>,
        provider: ModelProvider,
        run_id: &str,
    ) -> Result<Self> {
        let sandbox = manager.provision(provider, run_id).await?;
        Ok(Self {
            manager,
            sandbox,
            released: false,
        })
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Destroy the sandbox and wait for teardown to finish
    pub async fn release(mut self) {
        self.manager.destroy(&self.sandbox).await;
        self.released = true;
    }
}

impl Drop for SandboxLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let manager = Arc::clone(&self.manager);
        let sandbox = self.sandbox.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Lease dropped without release, destroying {}", sandbox.short_id());
                handle.spawn(async move {
                    manager.destroy(&sandbox).await;
                });
            }
            Err(_) => warn!(
                "Sandbox {} leaked: no runtime available for teardown",
                sandbox.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecOutput, SandboxError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingManager {
        destroyed: Mutex<Vec<String>>,
        notify: Notify,
        fail_provision: bool,
    }

    #[async_trait]
    impl SandboxManager for RecordingManager {
        async fn provision(&self, _provider: ModelProvider, run_id: &str) -> Result<Sandbox> {
            if self.fail_provision {
                return Err(SandboxError::ContainerStartFailed("boom".to_string()));
            }
            Ok(Sandbox {
                id: format!("id-{}", run_id),
                name: format!("kiln-sandbox-{}", run_id),
            })
        }

        async fn exec(
            &self,
            _sandbox: &Sandbox,
            _command: &str,
            _workdir: Option<&str>,
        ) -> Result<ExecOutput> {
            Ok(ExecOutput::default())
        }

        async fn destroy(&self, sandbox: &Sandbox) {
            self.destroyed.lock().unwrap().push(sandbox.id.clone());
            self.notify.notify_one();
        }
    }

    #[tokio::test]
    async fn test_release_destroys_exactly_once() {
        let manager = Arc::new(RecordingManager::default());
        let lease = SandboxLease::acquire(manager.clone(), ModelProvider::Claude, "r1")
            .await
            .unwrap();
        assert_eq!(lease.sandbox().id, "id-r1");

        lease.release().await;
        tokio::task::yield_now().await;

        assert_eq!(*manager.destroyed.lock().unwrap(), vec!["id-r1".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_without_release_destroys() {
        let manager = Arc::new(RecordingManager::default());
        let lease = SandboxLease::acquire(manager.clone(), ModelProvider::Codex, "r2")
            .await
            .unwrap();

        drop(lease);
        manager.notify.notified().await;

        assert_eq!(*manager.destroyed.lock().unwrap(), vec!["id-r2".to_string()]);
    }

    #[tokio::test]
    async fn test_panic_inside_scope_still_destroys() {
        let manager = Arc::new(RecordingManager::default());
        let lease = SandboxLease::acquire(manager.clone(), ModelProvider::Claude, "r3")
            .await
            .unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = lease;
            panic!("agent blew up");
        }));
        assert!(result.is_err());

        manager.notify.notified().await;
        assert_eq!(*manager.destroyed.lock().unwrap(), vec!["id-r3".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_provision_yields_no_lease() {
        let manager = Arc::new(RecordingManager {
            fail_provision: true,
            ..Default::default()
        });

        let result = SandboxLease::acquire(manager.clone(), ModelProvider::Claude, "r4").await;
        assert!(result.is_err());
        assert!(manager.destroyed.lock().unwrap().is_empty());
    }
}
