use std::{
    collections::HashMap,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use bollard::{
    Docker,
    container::{Config, CreateContainerOptions, RemoveContainerOptions},
    image::CreateImageOptions,
    models::{HostConfig, PortBinding},
};
use futures_util::TryStreamExt;
use schemadiff_core::{ConnectionConfig, ProvisionError};
use tokio::runtime::{Builder, Runtime};

use crate::ContainerSpec;

const READINESS_POLL: Duration = Duration::from_secs(2);

/// A running database container. Removed (force) when dropped; removal
/// failures are logged, never fatal.
pub struct ProvisionedDatabase {
    runtime: Runtime,
    docker: Docker,
    container_id: String,
    config: ConnectionConfig,
    image: String,
}

impl ProvisionedDatabase {
    /// Pulls the image if needed, starts a detached container with an
    /// ephemeral host port, and resolves the connection coordinates.
    /// Any failure here is fatal for the run.
    pub fn launch(spec: &ContainerSpec) -> Result<Self, ProvisionError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| ProvisionError::Daemon(Box::new(error)))?;
        let docker = Docker::connect_with_local_defaults()
            .map_err(|error| ProvisionError::Daemon(Box::new(error)))?;

        let container_id = runtime
            .block_on(start_container(&docker, spec))
            .map_err(|error| ProvisionError::ContainerStart {
                image: spec.image.clone(),
                source: error,
            })?;

        let host_port = runtime
            .block_on(resolve_host_port(&docker, &container_id, spec))
            .map_err(|error| ProvisionError::ContainerStart {
                image: spec.image.clone(),
                source: error,
            })?;

        let mut config = ConnectionConfig::for_database(spec.database.clone());
        config.host = Some("127.0.0.1".to_string());
        config.port = Some(host_port);
        config.user = Some(spec.user.clone());
        config.password = Some(spec.password.clone());

        tracing::info!(
            image = %spec.image,
            container = %short_id(&container_id),
            port = host_port,
            "database container started"
        );

        Ok(Self {
            runtime,
            docker,
            container_id,
            config,
            image: spec.image.clone(),
        })
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Polls the caller's probe until it succeeds or the deadline passes.
    /// The probe typically dials the engine and runs a trivial query.
    pub fn wait_until_ready<F>(
        &self,
        timeout: Duration,
        mut probe: F,
    ) -> Result<(), ProvisionError>
    where
        F: FnMut(&ConnectionConfig) -> bool,
    {
        let started = Instant::now();
        loop {
            if probe(&self.config) {
                tracing::info!(
                    image = %self.image,
                    elapsed = ?started.elapsed(),
                    "database ready"
                );
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(ProvisionError::NotReady {
                    image: self.image.clone(),
                    waited: started.elapsed(),
                });
            }
            std::thread::sleep(READINESS_POLL);
        }
    }
}

impl Drop for ProvisionedDatabase {
    fn drop(&mut self) {
        let options = Some(RemoveContainerOptions {
            force: true,
            ..Default::default()
        });
        let result = self
            .runtime
            .block_on(self.docker.remove_container(&self.container_id, options));
        match result {
            Ok(()) => tracing::debug!(
                container = %short_id(&self.container_id),
                "container removed"
            ),
            Err(error) => tracing::warn!(
                container = %short_id(&self.container_id),
                "failed to remove container: {error}"
            ),
        }
    }
}

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

async fn start_container(docker: &Docker, spec: &ContainerSpec) -> Result<String, BoxedError> {
    docker
        .create_image(
            Some(CreateImageOptions {
                from_image: spec.image.clone(),
                ..Default::default()
            }),
            None,
            None,
        )
        .try_collect::<Vec<_>>()
        .await?;

    let port_key = format!("{}/tcp", spec.container_port);
    let mut port_bindings = HashMap::new();
    port_bindings.insert(
        port_key.clone(),
        Some(vec![PortBinding {
            host_ip: Some("127.0.0.1".to_string()),
            // Empty means "assign an ephemeral port".
            host_port: Some(String::new()),
        }]),
    );
    let mut exposed_ports = HashMap::new();
    exposed_ports.insert(port_key, HashMap::new());

    let config = Config {
        image: Some(spec.image.clone()),
        env: Some(spec.env.clone()),
        cmd: if spec.cmd.is_empty() {
            None
        } else {
            Some(spec.cmd.clone())
        },
        exposed_ports: Some(exposed_ports),
        host_config: Some(HostConfig {
            port_bindings: Some(port_bindings),
            privileged: Some(spec.privileged),
            ..Default::default()
        }),
        ..Default::default()
    };

    let name = container_name(spec);
    let created = docker
        .create_container(
            Some(CreateContainerOptions {
                name: name.as_str(),
                platform: None,
            }),
            config,
        )
        .await?;
    docker
        .start_container::<String>(&created.id, None)
        .await?;

    Ok(created.id)
}

async fn resolve_host_port(
    docker: &Docker,
    container_id: &str,
    spec: &ContainerSpec,
) -> Result<u16, BoxedError> {
    let inspected = docker.inspect_container(container_id, None).await?;
    let port_key = format!("{}/tcp", spec.container_port);

    let binding = inspected
        .network_settings
        .and_then(|settings| settings.ports)
        .and_then(|ports| ports.get(&port_key).cloned())
        .flatten()
        .and_then(|bindings| bindings.into_iter().next())
        .and_then(|binding| binding.host_port);

    let port = binding
        .as_deref()
        .and_then(|port| port.parse::<u16>().ok())
        .ok_or_else(|| format!("no host port bound for {port_key}"))?;

    Ok(port)
}

fn container_name(spec: &ContainerSpec) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or_default();
    format!(
        "schemadiff-{}-{}-{nanos}",
        spec.dialect,
        std::process::id()
    )
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}
