// ABOUTME: In-memory container engine implementing every runtime capability trait.
// ABOUTME: Records mutations and simulates exec and archive extraction for assertions.

use async_trait::async_trait;
use flate2::read::GzDecoder;
use localinfra::runtime::{
    ArchiveError, ArchiveOps, ContainerConfig, ContainerError, ContainerFilters, ContainerInfo,
    ContainerOps, ContainerState, ContainerSummary, EnvVar, ExecConfig, ExecError, ExecOps,
    ExecResult, ImageError, ImageOps, NetworkConfig, NetworkError, NetworkInfo, NetworkOps,
    PortMapping, RestartPolicyConfig, VolumeMount,
};
use localinfra::types::{ContainerId, ExecId, NetworkId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::time::Duration;

/// A container as the fake engine stores it.
#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
    pub env: Vec<EnvVar>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMount>,
    pub restart_policy: RestartPolicyConfig,
    pub log_options: HashMap<String, String>,
    /// One entry per endpoint, so duplicate membership would show up.
    pub networks: Vec<String>,
    pub restarts: usize,
}

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub content: String,
    pub mode: u32,
}

#[derive(Default)]
struct State {
    containers: BTreeMap<String, FakeContainer>,
    networks: BTreeSet<String>,
    images: BTreeSet<String>,
    pulls: Vec<String>,
    /// Files by (container name, absolute path).
    files: BTreeMap<(String, String), FakeFile>,
    dirs: BTreeSet<(String, String)>,
    execs: Vec<(String, Vec<String>)>,
    detached: Vec<(String, Vec<String>)>,
    mutations: usize,
    next_id: usize,
    exec_exit_code: i64,
    reject_uploads: bool,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }

    /// Resolve an id or name to the container's name.
    fn name_of(&self, id: &str) -> Option<String> {
        if self.containers.contains_key(id) {
            return Some(id.to_string());
        }
        self.containers
            .values()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
    }
}

/// In-memory engine. Thread-safe so it satisfies the `Send + Sync` bounds.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- setup -------------------------------------------------------------

    /// Add a running kind node of the `educates` cluster.
    pub fn add_node(&self, name: &str) {
        self.add_container(
            name,
            &[("io.x-k8s.kind.cluster", "educates")],
            ContainerState::Running,
        );
    }

    pub fn add_container(&self, name: &str, labels: &[(&str, &str)], state: ContainerState) {
        let mut s = self.state.lock();
        let id = s.next_id("ctr");
        s.containers.insert(
            name.to_string(),
            FakeContainer {
                id,
                name: name.to_string(),
                image: "kindest/node".to_string(),
                state,
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                env: Vec::new(),
                ports: Vec::new(),
                volumes: Vec::new(),
                restart_policy: RestartPolicyConfig::No,
                log_options: HashMap::new(),
                networks: Vec::new(),
                restarts: 0,
            },
        );
    }

    pub fn add_network(&self, name: &str) {
        self.state.lock().networks.insert(name.to_string());
    }

    pub fn add_image(&self, image: &str) {
        self.state.lock().images.insert(image.to_string());
    }

    /// Make every attached exec exit with `code`.
    pub fn set_exec_exit_code(&self, code: i64) {
        self.state.lock().exec_exit_code = code;
    }

    pub fn reject_uploads(&self) {
        self.state.lock().reject_uploads = true;
    }

    // ---- inspection --------------------------------------------------------

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state.lock().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state.lock().containers.keys().cloned().collect()
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.state.lock().networks.contains(name)
    }

    /// Number of endpoints `container` holds on `network`.
    pub fn endpoints(&self, container: &str, network: &str) -> usize {
        self.container(container)
            .map(|c| c.networks.iter().filter(|n| *n == network).count())
            .unwrap_or(0)
    }

    pub fn file(&self, container: &str, path: &str) -> Option<FakeFile> {
        self.state
            .lock()
            .files
            .get(&(container.to_string(), path.to_string()))
            .cloned()
    }

    pub fn has_dir(&self, container: &str, dir: &str) -> bool {
        self.state
            .lock()
            .dirs
            .contains(&(container.to_string(), dir.to_string()))
    }

    pub fn pulls(&self) -> Vec<String> {
        self.state.lock().pulls.clone()
    }

    pub fn execs(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().execs.clone()
    }

    pub fn detached_execs(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().detached.clone()
    }

    /// Count of calls that changed engine state.
    pub fn mutations(&self) -> usize {
        self.state.lock().mutations
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut s = self.state.lock();
        if s.containers.contains_key(&config.name) {
            return Err(ContainerError::AlreadyExists(config.name.clone()));
        }
        if !s.images.contains(&config.image) {
            return Err(ContainerError::ImageNotFound(config.image.clone()));
        }

        let id = s.next_id("ctr");
        s.containers.insert(
            config.name.clone(),
            FakeContainer {
                id: id.clone(),
                name: config.name.clone(),
                image: config.image.clone(),
                state: ContainerState::Created,
                labels: config.labels.clone(),
                env: config.env.clone(),
                ports: config.ports.clone(),
                volumes: config.volumes.clone(),
                restart_policy: config.restart_policy.clone(),
                log_options: config.log_options.clone(),
                networks: Vec::new(),
                restarts: 0,
            },
        );
        s.mutations += 1;
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let container = s.containers.get_mut(&name).expect("resolved container");
        if container.state == ContainerState::Running {
            return Err(ContainerError::AlreadyRunning(name));
        }
        container.state = ContainerState::Running;
        s.mutations += 1;
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let container = s.containers.get_mut(&name).expect("resolved container");
        if container.state != ContainerState::Running {
            return Err(ContainerError::NotRunning(name));
        }
        container.state = ContainerState::Exited;
        s.mutations += 1;
        Ok(())
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let container = s.containers.get_mut(&name).expect("resolved container");
        container.state = ContainerState::Running;
        container.restarts += 1;
        s.mutations += 1;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !force && s.containers[&name].state == ContainerState::Running {
            return Err(ContainerError::Runtime(format!(
                "cannot remove running container {}",
                name
            )));
        }
        s.containers.remove(&name);
        s.files.retain(|(container, _), _| *container != name);
        s.dirs.retain(|(container, _)| *container != name);
        s.mutations += 1;
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let s = self.state.lock();
        let name = s
            .name_of(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let c = &s.containers[&name];
        Ok(ContainerInfo {
            id: ContainerId::new(c.id.clone()),
            name: c.name.clone(),
            image: c.image.clone(),
            state: c.state,
            labels: c.labels.clone(),
            networks: c
                .networks
                .iter()
                .map(|n| {
                    (
                        n.clone(),
                        NetworkInfo {
                            network_id: n.clone(),
                            ip_address: String::new(),
                        },
                    )
                })
                .collect(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let s = self.state.lock();
        Ok(s.containers
            .values()
            .filter(|c| filters.all || c.state == ContainerState::Running)
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .filter(|c| {
                filters
                    .name
                    .as_ref()
                    .is_none_or(|name| c.name.contains(name.as_str()))
            })
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.id.clone()),
                name: c.name.clone(),
                image: c.image.clone(),
                state: format!("{:?}", c.state).to_lowercase(),
                labels: c.labels.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(&self, reference: &str) -> Result<(), ImageError> {
        let mut s = self.state.lock();
        s.images.insert(reference.to_string());
        s.pulls.push(reference.to_string());
        s.mutations += 1;
        Ok(())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool, ImageError> {
        Ok(self.state.lock().images.contains(reference))
    }
}

#[async_trait]
impl NetworkOps for FakeRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let mut s = self.state.lock();
        if !s.networks.insert(config.name.clone()) {
            return Err(NetworkError::AlreadyExists(config.name.clone()));
        }
        s.mutations += 1;
        Ok(NetworkId::new(config.name.clone()))
    }

    async fn connect_to_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
    ) -> Result<(), NetworkError> {
        let mut s = self.state.lock();
        if !s.networks.contains(network.as_str()) {
            return Err(NetworkError::NotFound(network.to_string()));
        }
        let name = s
            .name_of(container.as_str())
            .ok_or_else(|| NetworkError::NotFound(container.to_string()))?;
        let c = s.containers.get_mut(&name).expect("resolved container");
        if c.networks.iter().any(|n| n == network.as_str()) {
            return Err(NetworkError::AlreadyConnected(name));
        }
        c.networks.push(network.to_string());
        s.mutations += 1;
        Ok(())
    }

    async fn disconnect_from_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
    ) -> Result<(), NetworkError> {
        let mut s = self.state.lock();
        if !s.networks.contains(network.as_str()) {
            return Err(NetworkError::NotFound(network.to_string()));
        }
        let name = s
            .name_of(container.as_str())
            .ok_or_else(|| NetworkError::NotFound(container.to_string()))?;
        let c = s.containers.get_mut(&name).expect("resolved container");
        let Some(pos) = c.networks.iter().position(|n| n == network.as_str()) else {
            return Err(NetworkError::NotConnected(name));
        };
        c.networks.remove(pos);
        s.mutations += 1;
        Ok(())
    }

    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.state.lock().networks.contains(name))
    }
}

#[async_trait]
impl ExecOps for FakeRuntime {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(container.as_str())
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if s.containers[&name].state != ContainerState::Running {
            return Err(ExecError::ContainerNotRunning(name));
        }

        s.execs.push((name.clone(), config.cmd.clone()));
        let exit_code = s.exec_exit_code;
        if exit_code != 0 {
            return Ok(ExecResult {
                exit_code,
                stdout: Vec::new(),
                stderr: b"simulated failure".to_vec(),
            });
        }

        let cmd: Vec<&str> = config.cmd.iter().map(String::as_str).collect();
        match cmd.as_slice() {
            ["mkdir", "-p", dir] => {
                s.dirs.insert((name, dir.to_string()));
            }
            ["rm", "-rf", dir] => {
                let prefix = format!("{}/", dir);
                s.dirs
                    .retain(|(c, d)| !(*c == name && (d == dir || d.starts_with(&prefix))));
                s.files
                    .retain(|(c, p), _| !(*c == name && p.starts_with(&prefix)));
            }
            _ => {}
        }
        s.mutations += 1;

        Ok(ExecResult {
            exit_code: 0,
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }

    async fn exec_detached(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(container.as_str())
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if s.containers[&name].state != ContainerState::Running {
            return Err(ExecError::ContainerNotRunning(name));
        }
        s.detached.push((name, config.cmd.clone()));
        s.mutations += 1;
        Ok(ExecId::new(s.next_id("exec")))
    }
}

#[async_trait]
impl ArchiveOps for FakeRuntime {
    async fn upload_archive(
        &self,
        container: &ContainerId,
        path: &str,
        archive: Vec<u8>,
    ) -> Result<(), ArchiveError> {
        let mut s = self.state.lock();
        let name = s
            .name_of(container.as_str())
            .ok_or_else(|| ArchiveError::ContainerNotFound(container.to_string()))?;
        if s.reject_uploads {
            return Err(ArchiveError::Rejected("simulated rejection".to_string()));
        }

        let mut tar = tar::Archive::new(GzDecoder::new(archive.as_slice()));
        let entries = tar
            .entries()
            .map_err(|e| ArchiveError::Rejected(e.to_string()))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| ArchiveError::Rejected(e.to_string()))?;
            let relative = entry
                .path()
                .map_err(|e| ArchiveError::Rejected(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            let mode = entry
                .header()
                .mode()
                .map_err(|e| ArchiveError::Rejected(e.to_string()))?;
            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| ArchiveError::Rejected(e.to_string()))?;

            let full = format!("{}/{}", path.trim_end_matches('/'), relative);
            s.files
                .insert((name.clone(), full), FakeFile { content, mode });
        }
        s.mutations += 1;
        Ok(())
    }
}
