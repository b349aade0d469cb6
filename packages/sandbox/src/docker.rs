// ABOUTME: Docker implementation of the sandbox manager
// ABOUTME: Uses bollard to create, exec into, and tear down resource-limited containers

use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, ListContainersOptions, LogOutput, RemoveContainerOptions,
        StartContainerOptions, StopContainerOptions,
    },
    errors::Error as BollardError,
    exec::{CreateExecOptions, StartExecResults},
    models::HostConfig,
    Docker,
};
use futures::StreamExt;
use kiln_core::ModelProvider;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::{
    Credentials, ExecOutput, ResourceLimits, Result, Sandbox, SandboxError, SandboxManager,
};

/// Labels applied to every Kiln sandbox for discovery and cleanup
const ROLE_LABEL: &str = "role";
const ROLE_VALUE: &str = "agent-sandbox";
const MANAGED_LABEL: &str = "kiln.managed";
const RUN_LABEL: &str = "kiln.run_id";

/// CFS period used for the CPU quota (100ms)
const CPU_PERIOD: i64 = 100_000;

/// Grace period before Docker escalates a stop to SIGKILL
const STOP_TIMEOUT_SECS: i64 = 5;

/// Long-lived no-op foreground process; work happens through exec
const IDLE_COMMAND: [&str; 2] = ["sleep", "infinity"];

/// Docker-backed sandbox manager
pub struct DockerSandboxManager {
    client: Docker,
    image: String,
    limits: ResourceLimits,
    credentials: Credentials,
}

impl DockerSandboxManager {
    /// Connect to the local Docker daemon.
    ///
    /// `request_timeout` bounds every API call, including a blocking exec, so it
    /// must exceed the agent's wall-clock limit.
    pub fn new(
        image: &str,
        limits: ResourceLimits,
        credentials: Credentials,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Docker::connect_with_local_defaults()?.with_timeout(request_timeout);
        Ok(Self::with_client(client, image, limits, credentials))
    }

    /// Create with a specific Docker connection
    pub fn with_client(
        client: Docker,
        image: &str,
        limits: ResourceLimits,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            image: image.to_string(),
            limits,
            credentials,
        }
    }

    /// Fail fast if the Docker daemon is unreachable
    pub async fn ping(&self) -> Result<()> {
        self.client.ping().await.map_err(|e| {
            error!("Failed to connect to Docker daemon: {}", e);
            SandboxError::Docker(e)
        })?;
        info!("Docker connection OK");
        Ok(())
    }

    /// Force-remove every container carrying the Kiln label.
    ///
    /// Meant for worker startup, before any job of this process exists, to
    /// reclaim sandboxes leaked by a crashed predecessor.
    pub async fn sweep_stale(&self) -> Result<Vec<String>> {
        let filters = HashMap::from([(
            "label".to_string(),
            vec![format!("{}=true", MANAGED_LABEL)],
        )]);
        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        let containers = self.client.list_containers(Some(options)).await?;
        let mut removed = Vec::new();

        for id in containers.into_iter().filter_map(|c| c.id) {
            let options = RemoveContainerOptions {
                force: true,
                v: true,
                ..Default::default()
            };
            match self.client.remove_container(&id, Some(options)).await {
                Ok(_) => removed.push(id),
                Err(e) => warn!("Failed to remove stale sandbox {}: {}", id, e),
            }
        }

        if !removed.is_empty() {
            info!("Removed {} stale sandboxes", removed.len());
        }
        Ok(removed)
    }

    async fn ensure_image(&self) -> Result<()> {
        match self.client.inspect_image(&self.image).await {
            Ok(_) => Ok(()),
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(SandboxError::ImageError(format!(
                "Image {} not found locally. Build or pull it first",
                self.image
            ))),
            Err(e) => Err(SandboxError::Docker(e)),
        }
    }

    async fn stop(&self, sandbox: &Sandbox) -> Result<()> {
        let options = StopContainerOptions {
            t: STOP_TIMEOUT_SECS,
        };
        match self.client.stop_container(&sandbox.id, Some(options)).await {
            Ok(_) => Ok(()),
            // Already stopped
            Err(BollardError::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(SandboxError::Docker(e)),
        }
    }

    async fn remove(&self, sandbox: &Sandbox) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };
        match self.client.remove_container(&sandbox.id, Some(options)).await {
            Ok(_) => Ok(()),
            // Already removed
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(SandboxError::Docker(e)),
        }
    }
}

/// Build the bollard container config for one sandbox
pub fn container_config(
    image: &str,
    limits: &ResourceLimits,
    env_vars: &HashMap<String, String>,
    run_id: &str,
) -> Config<String> {
    let labels = HashMap::from([
        (ROLE_LABEL.to_string(), ROLE_VALUE.to_string()),
        (MANAGED_LABEL.to_string(), "true".to_string()),
        (RUN_LABEL.to_string(), run_id.to_string()),
    ]);

    let mut env: Vec<String> = env_vars
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    env.sort();

    let host_config = HostConfig {
        memory: Some((limits.memory_mb * 1024 * 1024) as i64),
        cpu_period: Some(CPU_PERIOD),
        cpu_quota: Some((limits.cpu_cores * CPU_PERIOD as f64) as i64),
        ..Default::default()
    };

    Config {
        image: Some(image.to_string()),
        cmd: Some(IDLE_COMMAND.iter().map(|s| s.to_string()).collect()),
        env: Some(env),
        labels: Some(labels),
        tty: Some(false),
        host_config: Some(host_config),
        ..Default::default()
    }
}

#[async_trait]
impl SandboxManager for DockerSandboxManager {
    async fn provision(&self, provider: ModelProvider, run_id: &str) -> Result<Sandbox> {
        // Resolve credentials first so a missing secret never leaves a container behind
        let env_vars = self.credentials.sandbox_env(provider)?;

        info!("Provisioning sandbox (image: {})...", self.image);
        let start = Instant::now();
        self.ensure_image().await?;

        let name = format!("kiln-sandbox-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        let options = CreateContainerOptions {
            name: name.clone(),
            platform: None,
        };
        let config = container_config(&self.image, &self.limits, &env_vars, run_id);

        let created = self
            .client
            .create_container(Some(options), config)
            .await
            .map_err(|e| {
                error!("Failed to create container: {}", e);
                SandboxError::ContainerStartFailed(e.to_string())
            })?;

        let sandbox = Sandbox {
            id: created.id,
            name,
        };

        if let Err(e) = self
            .client
            .start_container(&sandbox.id, None::<StartContainerOptions<String>>)
            .await
        {
            error!("Failed to start container {}: {}", sandbox.short_id(), e);
            // Created but never handed out: clean it up here
            self.destroy(&sandbox).await;
            return Err(SandboxError::ContainerStartFailed(e.to_string()));
        }

        info!(
            "Container started | ID: {} | Name: {} | took {:.2}s",
            sandbox.short_id(),
            sandbox.name,
            start.elapsed().as_secs_f64()
        );
        debug!(
            "Container details: image={} memory={}MiB cpus={} provider={}",
            self.image, self.limits.memory_mb, self.limits.cpu_cores, provider
        );
        Ok(sandbox)
    }

    async fn exec(
        &self,
        sandbox: &Sandbox,
        command: &str,
        workdir: Option<&str>,
    ) -> Result<ExecOutput> {
        debug!("Exec in {}: {}", sandbox.short_id(), command);

        let exec_config = CreateExecOptions {
            cmd: Some(vec!["sh", "-c", command]),
            working_dir: workdir,
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self.client.create_exec(&sandbox.id, exec_config).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        match self.client.start_exec(&exec.id, None).await? {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(msg) = output.next().await {
                    match msg? {
                        LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
                        LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                        LogOutput::Console { message } => stdout.extend_from_slice(&message),
                        _ => {}
                    }
                }
            }
            StartExecResults::Detached => {
                return Err(SandboxError::ExecFailed(
                    "Exec was detached unexpectedly".to_string(),
                ))
            }
        }

        let inspect = self.client.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.ok_or_else(|| {
            SandboxError::ExecFailed("Exec finished without an exit code".to_string())
        })?;

        Ok(ExecOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    async fn destroy(&self, sandbox: &Sandbox) {
        info!("Destroying container {}...", sandbox.short_id());
        let start = Instant::now();

        if let Err(e) = self.stop(sandbox).await {
            // Removal below is forced, so a failed stop is not fatal
            warn!("Failed to stop container {}: {}", sandbox.short_id(), e);
        }

        match self.remove(sandbox).await {
            Ok(()) => info!(
                "Container {} destroyed | took {:.2}s",
                sandbox.short_id(),
                start.elapsed().as_secs_f64()
            ),
            Err(e) => error!(
                "Failed to destroy container {}: {}",
                sandbox.short_id(),
                e
            ),
        }
    }
}
