use crate::app::LoopEvent;
use crate::dispatch::{PendingOperation, Verb};
use crate::forms::{ContainerSpec, split_image_reference};
use crate::model::{
    ContainerRecord, ImageRecord, LifecycleState, NetworkRecord, ResourceTab, Snapshot,
    VolumeRecord, format_bytes, format_timestamp, short_id,
};
use anyhow::{Context, Result, anyhow, bail};
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StopContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::models::{ContainerSummary, HostConfig, ImageSummary, Network, PortBinding, Volume};
use bollard::network::ListNetworksOptions;
use bollard::volume::{ListVolumesOptions, RemoveVolumeOptions};
use futures::StreamExt;
use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

const STOP_TIMEOUT_SECS: i64 = 10;

#[derive(Clone)]
pub struct DockerGateway {
    client: Docker,
}

impl DockerGateway {
    pub async fn connect() -> Result<Self> {
        let client = Docker::connect_with_local_defaults()
            .context("failed to configure the Docker client")?;
        client
            .ping()
            .await
            .context("cannot reach the Docker daemon, is it running?")?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, tab: ResourceTab) -> Result<Snapshot> {
        let snapshot = match tab {
            ResourceTab::Containers => Snapshot::Containers(self.list_containers().await?),
            ResourceTab::Images => Snapshot::Images(self.list_images().await?),
            ResourceTab::Volumes => Snapshot::Volumes(self.list_volumes().await?),
            ResourceTab::Networks => Snapshot::Networks(self.list_networks().await?),
        };
        debug!(%tab, rows = snapshot.len(), "fetched");
        Ok(snapshot)
    }

    async fn list_containers(&self) -> Result<Vec<ContainerRecord>> {
        let options: ListContainersOptions<String> = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        let summaries = self
            .client
            .list_containers(Some(options))
            .await
            .context("failed to list containers")?;
        let mut records = summaries
            .into_iter()
            .map(container_record)
            .collect::<Vec<_>>();
        records.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(records)
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let options: ListImagesOptions<String> = ListImagesOptions {
            all: false,
            ..Default::default()
        };
        let summaries = self
            .client
            .list_images(Some(options))
            .await
            .context("failed to list images")?;
        let mut records = summaries.into_iter().map(image_record).collect::<Vec<_>>();
        records.sort_by(|left, right| left.tags.cmp(&right.tags));
        Ok(records)
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeRecord>> {
        let response = self
            .client
            .list_volumes(None::<ListVolumesOptions<String>>)
            .await
            .context("failed to list volumes")?;
        let mut records = response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(volume_record)
            .collect::<Vec<_>>();
        records.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(records)
    }

    async fn list_networks(&self) -> Result<Vec<NetworkRecord>> {
        let networks = self
            .client
            .list_networks(None::<ListNetworksOptions<String>>)
            .await
            .context("failed to list networks")?;
        let mut records = networks.into_iter().map(network_record).collect::<Vec<_>>();
        records.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(records)
    }

    pub async fn run_operation(&self, operation: &PendingOperation) -> Result<(), String> {
        let results = join_all(
            operation
                .targets
                .iter()
                .map(|id| self.apply_verb(operation.tab, operation.verb, id)),
        )
        .await;

        let failures = results
            .into_iter()
            .filter_map(Result::err)
            .map(|error| format!("{error:#}"))
            .collect::<Vec<_>>();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }

    async fn apply_verb(&self, tab: ResourceTab, verb: Verb, id: &str) -> Result<()> {
        let result = match (tab, verb) {
            (ResourceTab::Containers, Verb::Pause) => self.client.pause_container(id).await,
            (ResourceTab::Containers, Verb::Unpause) => self.client.unpause_container(id).await,
            (ResourceTab::Containers, Verb::Start) => {
                self.client.start_container::<String>(id, None).await
            }
            (ResourceTab::Containers, Verb::Stop) => {
                let options = StopContainerOptions {
                    t: STOP_TIMEOUT_SECS,
                };
                self.client.stop_container(id, Some(options)).await
            }
            (ResourceTab::Containers, Verb::Remove) => {
                let options = RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                };
                self.client.remove_container(id, Some(options)).await
            }
            (ResourceTab::Images, Verb::Remove) => {
                let options = RemoveImageOptions {
                    force: false,
                    noprune: false,
                };
                self.client
                    .remove_image(id, Some(options), None)
                    .await
                    .map(|_| ())
            }
            (ResourceTab::Volumes, Verb::Remove) => {
                let options = RemoveVolumeOptions { force: false };
                self.client.remove_volume(id, Some(options)).await
            }
            (ResourceTab::Networks, Verb::Remove) => self.client.remove_network(id).await,
            (tab, verb) => return Err(anyhow!("cannot {verb} a {}", tab.noun())),
        };
        result.with_context(|| format!("failed to {verb} {} {}", tab.noun(), short_id(id)))
    }

    pub async fn pull_image(&self, reference: &str) -> Result<()> {
        let (from_image, tag) = split_image_reference(reference);
        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };
        let mut progress = Box::pin(self.client.create_image(Some(options), None, None));
        while let Some(update) = progress.next().await {
            let info = update.with_context(|| format!("failed to pull {reference}"))?;
            if let Some(error) = info.error {
                bail!("failed to pull {reference}: {error}");
            }
        }
        Ok(())
    }

    pub async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });
        let response = self
            .client
            .create_container(options, container_config(spec))
            .await
            .with_context(|| format!("failed to create container from {}", spec.image))?;

        if spec.auto_start {
            self.client
                .start_container::<String>(&response.id, None)
                .await
                .with_context(|| format!("created {} but failed to start it", short_id(&response.id)))?;
        }

        Ok(spec
            .name
            .clone()
            .unwrap_or_else(|| short_id(&response.id).to_string()))
    }

    /// Follows the container's output, posting one event per line until the
    /// stream ends or the task is aborted.
    pub fn spawn_log_stream(
        &self,
        container_id: String,
        tail: u64,
        tx: UnboundedSender<LoopEvent>,
    ) -> JoinHandle<()> {
        let options: LogsOptions<String> = LogsOptions {
            follow: true,
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let stream = self.client.logs(&container_id, Some(options));

        tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            let mut error = None;
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(output) => {
                        for line in log_lines(output) {
                            let event = LoopEvent::LogLine {
                                container_id: container_id.clone(),
                                line,
                            };
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(stream_error) => {
                        error = Some(stream_error.to_string());
                        break;
                    }
                }
            }
            let _ = tx.send(LoopEvent::LogsEnded {
                container_id,
                error,
            });
        })
    }
}

fn log_lines(output: LogOutput) -> Vec<String> {
    let message = match output {
        LogOutput::StdOut { message }
        | LogOutput::StdErr { message }
        | LogOutput::Console { message } => message,
        LogOutput::StdIn { .. } => return Vec::new(),
    };
    String::from_utf8_lossy(&message)
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

pub fn container_record(summary: ContainerSummary) -> ContainerRecord {
    let id = summary.id.unwrap_or_default();
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|name| name.trim_start_matches('/').to_string())
        .unwrap_or_else(|| short_id(&id).to_string());

    let ports = summary
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|port| {
            let protocol = port
                .typ
                .map(|typ| typ.to_string())
                .filter(|typ| !typ.is_empty())
                .unwrap_or_else(|| "tcp".to_string());
            match port.public_port {
                Some(public) => format!(
                    "{}:{public}->{}/{protocol}",
                    port.ip.unwrap_or_else(|| "0.0.0.0".to_string()),
                    port.private_port
                ),
                None => format!("{}/{protocol}", port.private_port),
            }
        })
        .collect();

    let mounts = summary
        .mounts
        .unwrap_or_default()
        .into_iter()
        .filter_map(|mount| {
            mount
                .name
                .filter(|name| !name.is_empty())
                .or(mount.source)
        })
        .collect();

    let mut networks = summary
        .network_settings
        .and_then(|settings| settings.networks)
        .map(|networks| networks.into_keys().collect::<Vec<_>>())
        .unwrap_or_default();
    networks.sort();

    ContainerRecord {
        id,
        name,
        image: summary.image.unwrap_or_default(),
        image_id: summary.image_id.unwrap_or_default(),
        state: LifecycleState::from_container_state(&summary.state.unwrap_or_default()),
        status: summary.status.unwrap_or_default(),
        ports,
        mounts,
        networks,
        created: format_timestamp(summary.created.unwrap_or_default()),
    }
}

pub fn image_record(summary: ImageSummary) -> ImageRecord {
    let tags = summary
        .repo_tags
        .into_iter()
        .filter(|tag| tag != "<none>:<none>")
        .collect();
    ImageRecord {
        id: summary.id,
        tags,
        size: format_bytes(summary.size),
        created: format_timestamp(summary.created),
        used_by: Vec::new(),
    }
}

pub fn volume_record(volume: Volume) -> VolumeRecord {
    VolumeRecord {
        name: volume.name,
        driver: volume.driver,
        mountpoint: volume.mountpoint,
        scope: volume
            .scope
            .map(|scope| scope.to_string())
            .unwrap_or_default(),
        used_by: Vec::new(),
    }
}

pub fn network_record(network: Network) -> NetworkRecord {
    let id = network.id.unwrap_or_default();
    NetworkRecord {
        name: network
            .name
            .unwrap_or_else(|| short_id(&id).to_string()),
        id,
        driver: network.driver.unwrap_or_default(),
        scope: network.scope.unwrap_or_default(),
        internal: network.internal.unwrap_or(false),
        used_by: Vec::new(),
    }
}

pub fn container_config(spec: &ContainerSpec) -> Config<String> {
    let mut exposed_ports = HashMap::new();
    let mut port_bindings = HashMap::new();
    for binding in &spec.ports {
        exposed_ports.insert(binding.container_port.clone(), HashMap::new());
        port_bindings.insert(
            binding.container_port.clone(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(binding.host_port.clone()),
            }]),
        );
    }

    let host_config = HostConfig {
        binds: (!spec.binds.is_empty()).then(|| spec.binds.clone()),
        port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
        network_mode: Some(spec.network.clone()),
        ..Default::default()
    };

    Config {
        image: Some(spec.image.clone()),
        env: (!spec.env.is_empty()).then(|| spec.env.clone()),
        exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
        host_config: Some(host_config),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        container_config, container_record, image_record, log_lines, network_record,
        volume_record,
    };
    use crate::forms::{ContainerSpec, PortBinding};
    use crate::model::LifecycleState;
    use bollard::container::LogOutput;
    use bollard::models::{
        ContainerSummary, ContainerSummaryNetworkSettings, EndpointSettings, ImageSummary,
        MountPoint, Network, Port, Volume,
    };
    use std::collections::HashMap;

    #[test]
    fn container_summary_maps_to_record() {
        let summary = ContainerSummary {
            id: Some("0123456789abcdef".to_string()),
            names: Some(vec!["/web".to_string()]),
            image: Some("nginx:latest".to_string()),
            image_id: Some("sha256:img".to_string()),
            state: Some("paused".to_string()),
            status: Some("Up 3 minutes (Paused)".to_string()),
            ports: Some(vec![
                Port {
                    private_port: 80,
                    public_port: Some(8080),
                    ip: Some("0.0.0.0".to_string()),
                    ..Default::default()
                },
                Port {
                    private_port: 443,
                    ..Default::default()
                },
            ]),
            mounts: Some(vec![
                MountPoint {
                    name: Some("data".to_string()),
                    source: Some("/var/lib/docker/volumes/data".to_string()),
                    ..Default::default()
                },
                MountPoint {
                    source: Some("/srv".to_string()),
                    ..Default::default()
                },
            ]),
            network_settings: Some(ContainerSummaryNetworkSettings {
                networks: Some(HashMap::from([
                    ("web-net".to_string(), EndpointSettings::default()),
                    ("bridge".to_string(), EndpointSettings::default()),
                ])),
            }),
            ..Default::default()
        };

        let record = container_record(summary);
        assert_eq!(record.name, "web");
        assert_eq!(record.state, LifecycleState::Paused);
        assert_eq!(record.ports, vec!["0.0.0.0:8080->80/tcp", "443/tcp"]);
        assert_eq!(record.mounts, vec!["data", "/srv"]);
        assert_eq!(record.networks, vec!["bridge", "web-net"]);
        assert_eq!(record.created, "-");
    }

    #[test]
    fn nameless_container_falls_back_to_short_id() {
        let record = container_record(ContainerSummary {
            id: Some("0123456789abcdef".to_string()),
            ..Default::default()
        });
        assert_eq!(record.name, "0123456789ab");
        assert_eq!(record.state, LifecycleState::Unknown);
    }

    #[test]
    fn dangling_tags_are_dropped() {
        let record = image_record(ImageSummary {
            id: "sha256:abc".to_string(),
            repo_tags: vec!["<none>:<none>".to_string(), "redis:7".to_string()],
            size: 1_500_000,
            ..Default::default()
        });
        assert_eq!(record.tags, vec!["redis:7"]);
        assert_eq!(record.size, "1.5MB");
    }

    #[test]
    fn volumes_and_networks_map_plainly() {
        let volume = volume_record(Volume {
            name: "data".to_string(),
            driver: "local".to_string(),
            mountpoint: "/var/lib/docker/volumes/data/_data".to_string(),
            ..Default::default()
        });
        assert_eq!(volume.name, "data");
        assert_eq!(volume.driver, "local");

        let network = network_record(Network {
            id: Some("n1".to_string()),
            name: Some("bridge".to_string()),
            driver: Some("bridge".to_string()),
            internal: Some(true),
            ..Default::default()
        });
        assert_eq!(network.name, "bridge");
        assert!(network.internal);
    }

    #[test]
    fn container_config_carries_ports_binds_and_env() {
        let spec = ContainerSpec {
            name: Some("web".to_string()),
            image: "sha256:abc".to_string(),
            ports: vec![PortBinding {
                host_port: "8080".to_string(),
                container_port: "80/tcp".to_string(),
            }],
            binds: vec!["/srv:/data".to_string()],
            env: Vec::new(),
            auto_start: false,
            network: "bridge".to_string(),
        };
        let config = container_config(&spec);
        assert_eq!(config.image.as_deref(), Some("sha256:abc"));
        assert!(config.env.is_none());
        assert!(
            config
                .exposed_ports
                .as_ref()
                .is_some_and(|ports| ports.contains_key("80/tcp"))
        );

        let host = config.host_config.unwrap_or_default();
        assert_eq!(host.binds, Some(vec!["/srv:/data".to_string()]));
        assert_eq!(host.network_mode.as_deref(), Some("bridge"));
        let binding = host
            .port_bindings
            .and_then(|bindings| bindings.get("80/tcp").cloned().flatten())
            .unwrap_or_default();
        assert_eq!(binding[0].host_port.as_deref(), Some("8080"));
    }

    #[test]
    fn log_chunks_split_into_lines() {
        let output = LogOutput::StdOut {
            message: "one\r\ntwo\n".into(),
        };
        assert_eq!(log_lines(output), vec!["one", "two"]);
        let stdin = LogOutput::StdIn {
            message: "ignored".into(),
        };
        assert!(log_lines(stdin).is_empty());
    }
}
