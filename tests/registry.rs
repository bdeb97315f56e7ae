// ABOUTME: Lifecycle tests for the primary registry against the in-memory runtime.
// ABOUTME: Covers deploy, linking into nodes, idempotent delete, and prune.

mod support;

use localinfra::cluster::ClusterError;
use localinfra::converge::{Outcome, Removal};
use localinfra::registry::{Prune, RegistryError, RegistryManager};
use localinfra::runtime::{ContainerState, RestartPolicyConfig};
use localinfra::types::BindAddress;
use support::fake_runtime::FakeRuntime;

const REGISTRY: &str = "educates-registry";
const LOCALHOST_HOSTS: &str = "/etc/containerd/certs.d/localhost:5001/hosts.toml";
const SERVICE_HOSTS: &str = "/etc/containerd/certs.d/registry.default.svc.cluster.local/hosts.toml";

fn cluster() -> FakeRuntime {
    support::init_tracing();
    let runtime = FakeRuntime::new();
    runtime.add_network("kind");
    runtime.add_node("educates-control-plane");
    runtime.add_node("educates-worker");
    runtime
}

mod deploy {
    use super::*;

    #[tokio::test]
    async fn starts_registry_on_both_networks() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);

        let outcome = manager.deploy(&BindAddress::default()).await.unwrap();
        assert_eq!(outcome, Outcome::Created);

        let registry = runtime.container(REGISTRY).expect("registry container");
        assert_eq!(registry.state, ContainerState::Running);
        assert_eq!(registry.image, "docker.io/library/registry:3");
        assert_eq!(registry.restart_policy, RestartPolicyConfig::Always);
        assert_eq!(runtime.endpoints(REGISTRY, "educates"), 1);
        assert_eq!(runtime.endpoints(REGISTRY, "kind"), 1);
        assert!(runtime.has_network("educates"));

        let port = &registry.ports[0];
        assert_eq!(port.container_port, 5000);
        assert_eq!(port.host_port, Some(5001));
        assert_eq!(port.host_ip.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn writes_hosts_fragment_on_every_node() {
        let runtime = cluster();
        RegistryManager::new(&runtime)
            .deploy(&BindAddress::default())
            .await
            .unwrap();

        for node in ["educates-control-plane", "educates-worker"] {
            for path in [LOCALHOST_HOSTS, SERVICE_HOSTS] {
                let file = runtime
                    .file(node, path)
                    .unwrap_or_else(|| panic!("{} missing on {}", path, node));
                assert_eq!(file.content, "[host.\"http://educates-registry:5000\"]\n");
                assert_eq!(file.mode, 0o644);
            }
        }
    }

    #[tokio::test]
    async fn pulls_image_only_when_missing() {
        let runtime = cluster();
        runtime.add_image("docker.io/library/registry:3");

        RegistryManager::new(&runtime)
            .deploy(&BindAddress::default())
            .await
            .unwrap();

        assert!(runtime.pulls().is_empty());
    }

    #[tokio::test]
    async fn second_deploy_changes_nothing() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);
        manager.deploy(&BindAddress::default()).await.unwrap();
        let before = runtime.mutations();

        let outcome = manager.deploy(&BindAddress::default()).await.unwrap();

        assert_eq!(outcome, Outcome::AlreadyPresent);
        assert_eq!(runtime.mutations(), before);
    }

    #[tokio::test]
    async fn stopped_registry_counts_as_present() {
        let runtime = cluster();
        runtime.add_container(REGISTRY, &[], ContainerState::Exited);
        let before = runtime.mutations();

        let outcome = RegistryManager::new(&runtime)
            .deploy(&BindAddress::default())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::AlreadyPresent);
        assert_eq!(runtime.mutations(), before);
        assert_eq!(
            runtime.container(REGISTRY).unwrap().state,
            ContainerState::Exited
        );
    }

    #[tokio::test]
    async fn fails_without_cluster_nodes() {
        support::init_tracing();
        let runtime = FakeRuntime::new();
        runtime.add_network("kind");

        let err = RegistryManager::new(&runtime)
            .deploy(&BindAddress::default())
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                RegistryError::Link {
                    source: ClusterError::NoClusterNodes { .. },
                    ..
                }
            ),
            "unexpected error: {}",
            err
        );
    }

    #[tokio::test]
    async fn fails_when_node_rejects_fragment() {
        let runtime = cluster();
        runtime.reject_uploads();

        let err = RegistryManager::new(&runtime)
            .deploy(&BindAddress::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Link { .. }), "{}", err);
        assert!(err.to_string().contains("localhost:5001"));
    }

    #[tokio::test]
    async fn redeploy_after_delete_matches_first_deploy() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);

        manager.deploy(&BindAddress::default()).await.unwrap();
        let first = runtime.container(REGISTRY).unwrap();
        manager.delete().await.unwrap();
        manager.deploy(&BindAddress::default()).await.unwrap();
        let second = runtime.container(REGISTRY).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.image, second.image);
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.ports, second.ports);
        assert_eq!(first.restart_policy, second.restart_policy);
        assert_eq!(first.networks, second.networks);
        assert_eq!(first.state, second.state);
    }
}

mod standalone {
    use super::*;

    #[tokio::test]
    async fn skips_cluster_network_and_nodes() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);

        let outcome = manager
            .deploy_standalone(&BindAddress::default())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Created);
        assert_eq!(runtime.endpoints(REGISTRY, "educates"), 1);
        assert_eq!(runtime.endpoints(REGISTRY, "kind"), 0);
        assert!(runtime.file("educates-worker", LOCALHOST_HOSTS).is_none());
    }

    #[tokio::test]
    async fn link_completes_a_standalone_deploy() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);
        manager
            .deploy_standalone(&BindAddress::default())
            .await
            .unwrap();

        manager.link_to_cluster().await.unwrap();

        assert_eq!(runtime.endpoints(REGISTRY, "kind"), 1);
        assert!(runtime.file("educates-worker", LOCALHOST_HOSTS).is_some());
        assert!(runtime.file("educates-control-plane", SERVICE_HOSTS).is_some());
    }

    #[tokio::test]
    async fn repeated_link_keeps_one_endpoint() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);
        manager.deploy(&BindAddress::default()).await.unwrap();

        manager.link_to_cluster().await.unwrap();
        manager.link_to_cluster().await.unwrap();

        assert_eq!(runtime.endpoints(REGISTRY, "kind"), 1);
        assert_eq!(runtime.endpoints(REGISTRY, "educates"), 1);
    }

    #[tokio::test]
    async fn link_requires_deployed_registry() {
        let runtime = cluster();

        let err = RegistryManager::new(&runtime)
            .link_to_cluster()
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::NotDeployed { .. }), "{}", err);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_container() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);
        manager.deploy(&BindAddress::default()).await.unwrap();

        assert_eq!(manager.delete().await.unwrap(), Removal::Removed);
        assert!(runtime.container(REGISTRY).is_none());
    }

    #[tokio::test]
    async fn removes_stopped_container() {
        let runtime = cluster();
        runtime.add_container(REGISTRY, &[], ContainerState::Exited);

        assert_eq!(
            RegistryManager::new(&runtime).delete().await.unwrap(),
            Removal::Removed
        );
        assert!(runtime.container(REGISTRY).is_none());
    }

    #[tokio::test]
    async fn absent_registry_is_a_no_op() {
        let runtime = cluster();
        let before = runtime.mutations();

        let manager = RegistryManager::new(&runtime);
        assert_eq!(manager.delete().await.unwrap(), Removal::AlreadyAbsent);
        assert_eq!(manager.delete().await.unwrap(), Removal::AlreadyAbsent);
        assert_eq!(runtime.mutations(), before);
    }

    #[tokio::test]
    async fn leaves_other_containers_alone() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);
        manager.deploy(&BindAddress::default()).await.unwrap();

        manager.delete().await.unwrap();

        assert!(runtime.container("educates-control-plane").is_some());
        assert!(runtime.container("educates-worker").is_some());
    }
}

mod prune {
    use super::*;

    #[tokio::test]
    async fn starts_garbage_collection_detached() {
        let runtime = cluster();
        let manager = RegistryManager::new(&runtime);
        manager.deploy(&BindAddress::default()).await.unwrap();

        let result = manager.prune().await.unwrap();

        assert!(matches!(result, Prune::Started(_)));
        let detached = runtime.detached_execs();
        assert_eq!(detached.len(), 1);
        assert_eq!(detached[0].0, REGISTRY);
        assert_eq!(
            detached[0].1,
            vec![
                "registry",
                "garbage-collect",
                "/etc/distribution/config.yml",
                "--delete-untagged=true"
            ]
        );
    }

    #[tokio::test]
    async fn skipped_without_registry() {
        let runtime = cluster();

        let result = RegistryManager::new(&runtime).prune().await.unwrap();

        assert_eq!(result, Prune::Skipped);
        assert!(runtime.detached_execs().is_empty());
    }
}
