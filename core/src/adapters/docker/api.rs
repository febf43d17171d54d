//! Primary container backend: the daemon API via `bollard`.

use std::collections::HashMap;

use bollard::container::{
    InspectContainerOptions, ListContainersOptions, RestartContainerOptions, StopContainerOptions,
};
use bollard::Docker;
use tracing::debug;

use crate::domain::{short_id, ContainerPortMapping, Protocol};
use crate::error::Result;

/// Seconds the daemon waits before killing a container on stop/restart.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Container enumeration and control through the daemon API.
pub struct DockerApi {
    docker: Docker,
}

impl DockerApi {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Published mappings of all running containers.
    ///
    /// Any error aborts the whole pass; no partial list is returned.
    pub async fn mappings(&self) -> Result<Vec<ContainerPortMapping>> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        debug!(count = containers.len(), "Listed running containers");

        let mut image_names: HashMap<String, String> = HashMap::new();
        let mut mappings = Vec::new();

        for summary in containers {
            let Some(id) = summary.id else { continue };
            let details = self
                .docker
                .inspect_container(&id, None::<InspectContainerOptions>)
                .await?;

            let name = details
                .name
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string();

            let image_id = details.image.clone().unwrap_or_default();
            let image = match image_names.get(&image_id) {
                Some(image) => image.clone(),
                None => {
                    let image = self.image_reference(&image_id).await?;
                    image_names.insert(image_id, image.clone());
                    image
                }
            };

            let ports = details
                .network_settings
                .and_then(|ns| ns.ports)
                .unwrap_or_default();

            mappings.extend(port_table_mappings(&short_id(&id), &name, &image, ports));
        }

        Ok(mappings)
    }

    /// First repo tag of an image, else its short id.
    async fn image_reference(&self, image_id: &str) -> Result<String> {
        if image_id.is_empty() {
            return Ok(String::new());
        }
        let image = self.docker.inspect_image(image_id).await?;
        Ok(image
            .repo_tags
            .and_then(|tags| tags.into_iter().next())
            .unwrap_or_else(|| short_id(image_id)))
    }

    pub async fn stop(&self, container_id: &str) -> std::result::Result<(), bollard::errors::Error> {
        let options = StopContainerOptions {
            t: STOP_TIMEOUT_SECS,
        };
        self.docker.stop_container(container_id, Some(options)).await
    }

    pub async fn restart(
        &self,
        container_id: &str,
    ) -> std::result::Result<(), bollard::errors::Error> {
        let options = RestartContainerOptions {
            t: STOP_TIMEOUT_SECS as isize,
        };
        self.docker.restart_container(container_id, Some(options)).await
    }
}

/// Flatten an inspect port table (`"80/tcp" -> [bindings]`) into mappings.
///
/// Entries are visited in key order. Bindings without a numeric host port
/// are skipped.
fn port_table_mappings(
    container_id: &str,
    container_name: &str,
    image: &str,
    ports: HashMap<String, Option<Vec<bollard::models::PortBinding>>>,
) -> Vec<ContainerPortMapping> {
    let mut entries: Vec<_> = ports.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut mappings = Vec::new();
    for (key, bindings) in entries {
        let Some((container_port, protocol)) = key.split_once('/') else {
            continue;
        };
        let (Ok(container_port), Ok(protocol)) =
            (container_port.parse::<u16>(), protocol.parse::<Protocol>())
        else {
            continue;
        };

        for binding in bindings.unwrap_or_default() {
            let Some(host_port) = binding
                .host_port
                .as_deref()
                .and_then(|p| p.parse::<u16>().ok())
            else {
                continue;
            };
            mappings.push(ContainerPortMapping {
                container_id: container_id.to_string(),
                container_name: container_name.to_string(),
                image: image.to_string(),
                host_ip: binding.host_ip.unwrap_or_default(),
                host_port,
                container_port,
                protocol,
            });
        }
    }
    mappings
}
