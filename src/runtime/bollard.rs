// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible API.

use crate::runtime::error::{ConnectionSnafu, RuntimeError};
use crate::runtime::traits::{
    ArchiveError, ArchiveOps, ContainerConfig, ContainerError, ContainerFilters, ContainerInfo,
    ContainerOps, ContainerState, ContainerSummary, EnvVar, ExecConfig, ExecError, ExecOps,
    ExecResult, ImageError, ImageOps, NetworkConfig, NetworkError, NetworkInfo, NetworkOps,
    PortMapping, RestartPolicyConfig, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::runtime::types::{RuntimeAddress, RuntimeEndpoint, RuntimeType};
use crate::types::{ContainerId, ExecId, NetworkId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{
    ContainerCreateBody, ContainerStateStatusEnum, EndpointSettings, HostConfig,
    HostConfigLogConfig, Mount, MountTypeEnum, PortBinding, RestartPolicy, RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, InspectNetworkOptions,
    ListContainersOptions, RemoveContainerOptions, RestartContainerOptions,
    StartContainerOptions, StopContainerOptions, UploadToContainerOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use snafu::ResultExt;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const EXEC_POLL_INTERVAL: Duration = Duration::from_millis(100);
const EXEC_TIMEOUT: Duration = Duration::from_secs(300);
const LIST_RETRIES: u32 = 2;
const LIST_RETRY_DELAY: Duration = Duration::from_millis(500);

// =============================================================================
// Error Mapping Helpers
// =============================================================================

/// Status code and message of an engine-side error response.
fn server_error(e: &bollard::errors::Error) -> Option<(u16, &str)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match server_error(&e) {
        Some((404, message)) => ContainerError::ImageNotFound(message.to_string()),
        Some((409, message)) => ContainerError::AlreadyExists(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match server_error(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((304, message)) => ContainerError::AlreadyRunning(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match server_error(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        Some((304, message)) => ContainerError::NotRunning(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match server_error(&e) {
        Some((404, message)) => ContainerError::NotFound(message.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_network_create_error(e: bollard::errors::Error) -> NetworkError {
    match server_error(&e) {
        Some((409, message)) => NetworkError::AlreadyExists(message.to_string()),
        _ => NetworkError::Runtime(e.to_string()),
    }
}

fn map_network_connect_error(e: bollard::errors::Error) -> NetworkError {
    match server_error(&e) {
        Some((404, message)) => NetworkError::NotFound(message.to_string()),
        // Docker answers 403 "endpoint with name ... already exists in network ..."
        Some((403, message)) => NetworkError::AlreadyConnected(message.to_string()),
        Some((_, message)) if message.contains("already exists") => {
            NetworkError::AlreadyConnected(message.to_string())
        }
        _ => NetworkError::Runtime(e.to_string()),
    }
}

fn map_network_disconnect_error(e: bollard::errors::Error) -> NetworkError {
    match server_error(&e) {
        Some((404, message)) => NetworkError::NotFound(message.to_string()),
        Some((403, message)) => NetworkError::NotConnected(message.to_string()),
        // Older engines report a non-member with a 500
        Some((_, message)) if message.contains("is not connected") => {
            NetworkError::NotConnected(message.to_string())
        }
        _ => NetworkError::Runtime(e.to_string()),
    }
}

fn map_exec_create_error(e: bollard::errors::Error) -> ExecError {
    match server_error(&e) {
        Some((404, message)) => ExecError::ContainerNotFound(message.to_string()),
        Some((409, message)) => ExecError::ContainerNotRunning(message.to_string()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_exec_not_found_error(e: bollard::errors::Error) -> ExecError {
    match server_error(&e) {
        Some((404, message)) => ExecError::ExecNotFound(message.to_string()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_upload_error(e: bollard::errors::Error) -> ArchiveError {
    match server_error(&e) {
        Some((404, message)) => ArchiveError::ContainerNotFound(message.to_string()),
        Some((400 | 403, message)) => ArchiveError::Rejected(message.to_string()),
        _ => ArchiveError::Runtime(e.to_string()),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// One handle is created per process and shared by reference with every
/// lifecycle manager.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<String, ExecError> {
        let opts = bollard::models::ExecConfig {
            cmd: Some(config.cmd.clone()),
            attach_stdout: Some(config.attach_stdout),
            attach_stderr: Some(config.attach_stderr),
            tty: Some(false),
            ..Default::default()
        };

        let response = self
            .client
            .create_exec(container.as_str(), opts)
            .await
            .map_err(map_exec_create_error)?;

        Ok(response.id)
    }

    async fn exec_start(
        &self,
        exec_id: &str,
        detach: bool,
    ) -> Result<StartExecResults, ExecError> {
        let opts = StartExecOptions {
            detach,
            ..Default::default()
        };

        self.client
            .start_exec(exec_id, Some(opts))
            .await
            .map_err(map_exec_not_found_error)
    }

    /// Poll the exec instance until it exits and return its exit code.
    async fn exec_wait(&self, exec_id: &str) -> Result<i64, ExecError> {
        let deadline = Instant::now() + EXEC_TIMEOUT;
        loop {
            let details = self
                .client
                .inspect_exec(exec_id)
                .await
                .map_err(map_exec_not_found_error)?;

            if !details.running.unwrap_or(false) {
                return Ok(details.exit_code.unwrap_or(0));
            }
            if Instant::now() >= deadline {
                return Err(ExecError::Failed(format!(
                    "exec {} still running after {}s",
                    exec_id,
                    EXEC_TIMEOUT.as_secs()
                )));
            }
            tokio::time::sleep(EXEC_POLL_INTERVAL).await;
        }
    }
}

/// Drain an attached exec stream into separate stdout and stderr buffers.
async fn collect_output<S>(mut output: S) -> Result<(Vec<u8>, Vec<u8>), ExecError>
where
    S: futures::Stream<Item = Result<LogOutput, bollard::errors::Error>> + Unpin,
{
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while let Some(item) = output.next().await {
        match item.map_err(|e| ExecError::Failed(e.to_string()))? {
            LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
            LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
            _ => {}
        }
    }
    Ok((stdout, stderr))
}

/// Connect to the runtime at `endpoint` and verify it answers a ping.
pub async fn connect(endpoint: &RuntimeEndpoint) -> Result<BollardRuntime, RuntimeError> {
    let address = endpoint.address.to_string();

    let client = match &endpoint.address {
        RuntimeAddress::Socket(path) => {
            Docker::connect_with_unix(path, 120, bollard::API_DEFAULT_VERSION)
        }
        RuntimeAddress::DockerHost(_) => Docker::connect_with_defaults(),
    }
    .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))
    .context(ConnectionSnafu {
        address: address.clone(),
    })?;

    let runtime = BollardRuntime::new(client, endpoint.runtime_type);
    runtime.ping().await.context(ConnectionSnafu { address })?;

    Ok(runtime)
}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::Runtime(e.to_string()))?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker".to_string(),
            RuntimeType::Podman => "Podman".to_string(),
        };

        Ok(RuntimeMetadata {
            name,
            version: info.server_version.unwrap_or_default(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(&self, reference: &str) -> Result<(), ImageError> {
        let opts = CreateImageOptions {
            from_image: Some(reference.to_string()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates - consume it
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| match server_error(&e) {
                Some((404, _)) => ImageError::NotFound(reference.to_string()),
                _ => ImageError::PullFailed(format!("{}: {}", reference, e)),
            })?;
            if let Some(status) = info.status {
                tracing::debug!(image = reference, progress = ?info.progress_detail, "{}", status);
            }
        }

        Ok(())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool, ImageError> {
        match self.client.inspect_image(reference).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                reference, e
            ))),
        }
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let opts = CreateContainerOptions {
            name: Some(config.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), create_body(config))
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(grace_secs(timeout)),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = RestartContainerOptions {
            t: Some(grace_secs(timeout)),
            ..Default::default()
        };

        self.client
            .restart_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let state = container_state(details.state.as_ref().and_then(|s| s.status));
        let networks = details
            .network_settings
            .and_then(|settings| settings.networks)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, endpoint)| {
                let info = NetworkInfo {
                    network_id: endpoint.network_id.unwrap_or_default(),
                    ip_address: endpoint.ip_address.unwrap_or_default(),
                };
                (name, info)
            })
            .collect();
        let (image, labels) = details
            .config
            .map(|c| (c.image.unwrap_or_default(), c.labels.unwrap_or_default()))
            .unwrap_or_default();

        Ok(ContainerInfo {
            id: ContainerId::new(details.id.unwrap_or_else(|| id.to_string())),
            name: details
                .name
                .as_deref()
                .map(strip_name)
                .unwrap_or_default(),
            image,
            state,
            labels,
            networks,
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(list_filters(filters)),
            ..Default::default()
        };

        // Podman reports transient "stopping"/"stopped" states that bollard
        // cannot deserialize; retry briefly before giving up.
        let mut retries = LIST_RETRIES;
        loop {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => return Ok(containers.into_iter().map(summary).collect()),
                Err(e) => {
                    let message = e.to_string();
                    let transient = message.contains("unknown variant `stopping`")
                        || message.contains("unknown variant `stopped`");
                    if !transient || retries == 0 {
                        return Err(ContainerError::Runtime(message));
                    }
                    retries -= 1;
                    tracing::debug!(%message, "retrying container listing");
                    tokio::time::sleep(LIST_RETRY_DELAY).await;
                }
            }
        }
    }
}

// =============================================================================
// Request and Response Translation
// =============================================================================

/// Translate a container configuration into the engine's create request.
fn create_body(config: &ContainerConfig) -> ContainerCreateBody {
    let bindings: HashMap<String, Option<Vec<PortBinding>>> = config
        .ports
        .iter()
        .filter_map(|port| {
            let host_port = port.host_port?;
            let binding = PortBinding {
                host_ip: port.host_ip.clone(),
                host_port: Some(host_port.to_string()),
            };
            Some((port.port_key(), Some(vec![binding])))
        })
        .collect();

    let mounts = config
        .volumes
        .iter()
        .map(|m| Mount {
            source: Some(m.source.clone()),
            target: Some(m.target.clone()),
            typ: Some(MountTypeEnum::BIND),
            read_only: Some(m.read_only),
            ..Default::default()
        })
        .collect();

    let host_config = HostConfig {
        restart_policy: Some(RestartPolicy {
            name: Some(restart_policy_name(&config.restart_policy)),
            maximum_retry_count: None,
        }),
        mounts: non_empty(mounts),
        port_bindings: (!bindings.is_empty()).then_some(bindings),
        log_config: (!config.log_options.is_empty()).then(|| HostConfigLogConfig {
            typ: None,
            config: Some(config.log_options.clone()),
        }),
        ..Default::default()
    };

    ContainerCreateBody {
        image: Some(config.image.clone()),
        tty: Some(false),
        env: non_empty(config.env.iter().map(EnvVar::to_assignment).collect()),
        labels: (!config.labels.is_empty()).then(|| config.labels.clone()),
        exposed_ports: non_empty(config.ports.iter().map(PortMapping::port_key).collect()),
        host_config: Some(host_config),
        ..Default::default()
    }
}

fn restart_policy_name(policy: &RestartPolicyConfig) -> RestartPolicyNameEnum {
    match policy {
        RestartPolicyConfig::No => RestartPolicyNameEnum::NO,
        RestartPolicyConfig::Always => RestartPolicyNameEnum::ALWAYS,
        RestartPolicyConfig::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
    }
}

/// Engine-side filters for a container listing. Labels must all match.
fn list_filters(filters: &ContainerFilters) -> HashMap<String, Vec<String>> {
    let mut map = HashMap::new();
    if let Some(name) = &filters.name {
        map.insert("name".to_string(), vec![name.clone()]);
    }
    if !filters.labels.is_empty() {
        let mut labels: Vec<String> = filters
            .labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        labels.sort();
        map.insert("label".to_string(), labels);
    }
    map
}

/// Unknown or missing status is treated as exited.
fn container_state(status: Option<ContainerStateStatusEnum>) -> ContainerState {
    match status {
        Some(ContainerStateStatusEnum::CREATED) => ContainerState::Created,
        Some(ContainerStateStatusEnum::RUNNING) => ContainerState::Running,
        Some(ContainerStateStatusEnum::PAUSED) => ContainerState::Paused,
        Some(ContainerStateStatusEnum::RESTARTING) => ContainerState::Restarting,
        Some(ContainerStateStatusEnum::REMOVING) => ContainerState::Removing,
        Some(ContainerStateStatusEnum::DEAD) => ContainerState::Dead,
        _ => ContainerState::Exited,
    }
}

fn summary(container: bollard::models::ContainerSummary) -> ContainerSummary {
    ContainerSummary {
        id: ContainerId::new(container.id.unwrap_or_default()),
        name: container
            .names
            .as_ref()
            .and_then(|names| names.first())
            .map(|name| strip_name(name))
            .unwrap_or_default(),
        image: container.image.unwrap_or_default(),
        state: container
            .state
            .map(|s| format!("{:?}", s).to_lowercase())
            .unwrap_or_default(),
        labels: container.labels.unwrap_or_default(),
    }
}

/// The engine reports names with a leading slash.
fn strip_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Whole seconds, saturating at the API's i32 limit.
fn grace_secs(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX)
}

#[async_trait]
impl NetworkOps for BollardRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let request = bollard::models::NetworkCreateRequest {
            name: config.name.clone(),
            driver: config.driver.clone(),
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            ..Default::default()
        };

        let response = self
            .client
            .create_network(request)
            .await
            .map_err(map_network_create_error)?;

        Ok(NetworkId::new(response.id))
    }

    async fn connect_to_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
    ) -> Result<(), NetworkError> {
        let request = bollard::models::NetworkConnectRequest {
            container: container.to_string(),
            endpoint_config: Some(EndpointSettings::default()),
        };

        self.client
            .connect_network(network.as_str(), request)
            .await
            .map_err(map_network_connect_error)
    }

    async fn disconnect_from_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
    ) -> Result<(), NetworkError> {
        let request = bollard::models::NetworkDisconnectRequest {
            container: container.to_string(),
            force: Some(false),
        };

        self.client
            .disconnect_network(network.as_str(), request)
            .await
            .map_err(map_network_disconnect_error)
    }

    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        match self
            .client
            .inspect_network(name, None::<InspectNetworkOptions>)
            .await
        {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(NetworkError::Runtime(e.to_string())),
        }
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let exec_id = self.exec_create(container, config).await?;

        // Podman's attached exec streams do not always close, so output is
        // not captured there.
        let detach = self.runtime_type == RuntimeType::Podman;
        let (stdout, stderr) = match self.exec_start(&exec_id, detach).await? {
            StartExecResults::Attached { output, .. } => collect_output(output).await?,
            StartExecResults::Detached => (Vec::new(), Vec::new()),
        };

        let exit_code = self.exec_wait(&exec_id).await?;
        Ok(ExecResult {
            exit_code,
            stdout,
            stderr,
        })
    }

    async fn exec_detached(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let exec_id = self.exec_create(container, config).await?;
        self.exec_start(&exec_id, true).await?;
        Ok(ExecId::new(exec_id))
    }
}

#[async_trait]
impl ArchiveOps for BollardRuntime {
    async fn upload_archive(
        &self,
        container: &ContainerId,
        path: &str,
        archive: Vec<u8>,
    ) -> Result<(), ArchiveError> {
        // Replacing an existing file is the engine default.
        let opts = UploadToContainerOptions {
            path: path.to_string(),
            ..Default::default()
        };

        let body = Either::Left(Full::new(Bytes::from(archive)));

        self.client
            .upload_to_container(container.as_str(), Some(opts), body)
            .await
            .map_err(map_upload_error)
    }
}
