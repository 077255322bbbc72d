//! Production [`ContainerEngine`] over the `bollard` Docker client (spec §4.1).
//!
//! Grounded on the pack's standard `bollard` usage (`testcontainers-rs`,
//! `CortexLM-dataforge`, `In-Saiyan-AlgoJudge` manifests) combined with the
//! request shapes `runbox/docker/docker_api.py` sends to the daemon. This is
//! the only module in the workspace that knows the engine's own field names
//! (`Status`/`ExitCode`/`OOMKilled`, ...) — everything above sees the
//! narrowed [`RawContainerState`].

use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, Config, CreateContainerOptions, InspectContainerOptions,
    KillContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    UploadToContainerOptions, WaitContainerOptions,
};
use bollard::models::{HostConfig, Mount as BollardMount, MountTypeEnum, ResourcesUlimits};
use bollard::volume::{CreateVolumeOptions, RemoveVolumeOptions};
use bollard::Docker;
use futures::StreamExt;

use crucible_core::engine_trait::{AttachedStream, ContainerConfig, EngineMessage, RawContainerState};
use crucible_core::{ContainerEngine, EngineError, StreamId, TimeoutError, VolumeId};

use crate::error::{engine_error, timeout_error};

/// Container engine adapter backed by a live Docker daemon connection.
pub struct BollardEngine {
    docker: Docker,
}

impl BollardEngine {
    /// Connects using the standard Docker environment (`DOCKER_HOST`, unix
    /// socket default, or Windows named pipe), matching `aiodocker.Docker()`'s
    /// own zero-argument behavior.
    pub fn connect_with_defaults() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults().map_err(engine_error)?;
        Ok(Self { docker })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

fn to_host_config(config: &ContainerConfig) -> HostConfig {
    let mounts = config
        .mounts
        .iter()
        .map(|m| BollardMount {
            target: Some(m.bind.clone()),
            source: Some(m.volume.as_str().to_string()),
            typ: Some(MountTypeEnum::VOLUME),
            read_only: Some(m.readonly),
            ..Default::default()
        })
        .collect();

    HostConfig {
        memory: Some(config.memory_bytes as i64),
        mounts: Some(mounts),
        oom_kill_disable: Some(false),
        ulimits: config.cpu_ulimit_secs.map(|secs| {
            vec![ResourcesUlimits {
                name: Some("cpu".to_string()),
                soft: Some(secs as i64),
                hard: Some(secs as i64),
            }]
        }),
        ..Default::default()
    }
}

#[async_trait]
impl ContainerEngine for BollardEngine {
    async fn create_container(
        &self,
        config: ContainerConfig,
        name: &str,
    ) -> Result<crucible_core::ContainerId, EngineError> {
        let body = Config {
            image: Some(config.image.clone()),
            cmd: Some(config.cmd.clone()),
            working_dir: Some(config.working_dir.clone()),
            user: config.user.clone(),
            attach_stdin: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            open_stdin: Some(true),
            stdin_once: Some(false),
            tty: Some(false),
            host_config: Some(to_host_config(&config)),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name,
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), body)
            .await
            .map_err(engine_error)?;

        Ok(crucible_core::ContainerId::new(response.id))
    }

    async fn start(&self, container: &crucible_core::ContainerId) -> Result<(), EngineError> {
        self.docker
            .start_container::<String>(container.as_str(), None)
            .await
            .map_err(engine_error)
    }

    async fn wait(
        &self,
        container: &crucible_core::ContainerId,
        timeout: Duration,
    ) -> Result<(), TimeoutError> {
        let mut stream = self.docker.wait_container(
            container.as_str(),
            None::<WaitContainerOptions>,
        );
        match tokio::time::timeout(timeout, stream.next()).await {
            Ok(_) => Ok(()),
            Err(_) => Err(timeout_error(timeout)),
        }
    }

    async fn kill(&self, container: &crucible_core::ContainerId) -> Result<(), EngineError> {
        self.docker
            .kill_container(container.as_str(), None::<KillContainerOptions>)
            .await
            .map_err(engine_error)
    }

    async fn delete(
        &self,
        container: &crucible_core::ContainerId,
        force: bool,
    ) -> Result<(), EngineError> {
        self.docker
            .remove_container(
                container.as_str(),
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await
            .map_err(engine_error)
    }

    async fn inspect(
        &self,
        container: &crucible_core::ContainerId,
    ) -> Result<RawContainerState, EngineError> {
        let info = self
            .docker
            .inspect_container(container.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(engine_error)?;

        let state = info.state.unwrap_or_default();
        Ok(RawContainerState {
            status: state
                .status
                .map(|s| format!("{s:?}").to_lowercase())
                .unwrap_or_default(),
            exit_code: state.exit_code,
            oom_killed: state.oom_killed.unwrap_or(false),
            running: state.running.unwrap_or(false),
        })
    }

    async fn attach(
        &self,
        container: &crucible_core::ContainerId,
    ) -> Result<Box<dyn AttachedStream>, EngineError> {
        let results = self
            .docker
            .attach_container(
                container.as_str(),
                Some(AttachContainerOptions {
                    stdin: Some(true),
                    stdout: Some(true),
                    stderr: Some(true),
                    stream: Some(true),
                    logs: Some(false),
                    ..Default::default()
                }),
            )
            .await
            .map_err(engine_error)?;

        Ok(Box::new(BollardAttachedStream {
            output: results.output,
            input: results.input,
        }))
    }

    async fn put_archive(
        &self,
        container: &crucible_core::ContainerId,
        directory: &str,
        tar_bytes: Vec<u8>,
    ) -> Result<(), EngineError> {
        self.docker
            .upload_to_container(
                container.as_str(),
                Some(UploadToContainerOptions {
                    path: directory.to_string(),
                    ..Default::default()
                }),
                tar_bytes.into(),
            )
            .await
            .map_err(engine_error)
    }

    async fn create_volume(&self, name: &str, driver: &str) -> Result<VolumeId, EngineError> {
        let volume = self
            .docker
            .create_volume(CreateVolumeOptions {
                name,
                driver,
                ..Default::default()
            })
            .await
            .map_err(engine_error)?;
        Ok(VolumeId::new(volume.name))
    }

    async fn delete_volume(&self, volume: &VolumeId) -> Result<(), EngineError> {
        self.docker
            .remove_volume(
                volume.as_str(),
                Some(RemoveVolumeOptions { force: true }),
            )
            .await
            .map_err(engine_error)
    }

    async fn log(
        &self,
        container: &crucible_core::ContainerId,
        stdout: bool,
        stderr: bool,
    ) -> Result<Vec<String>, EngineError> {
        let mut stream = self.docker.logs(
            container.as_str(),
            Some(LogsOptions {
                stdout,
                stderr,
                ..Default::default()
            }),
        );

        let mut lines = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(engine_error)?;
            let text = String::from_utf8_lossy(chunk.into_bytes().as_ref()).into_owned();
            lines.extend(text.lines().map(|l| l.to_string()));
        }
        Ok(lines)
    }
}

struct BollardAttachedStream {
    output: std::pin::Pin<Box<dyn futures::Stream<Item = Result<LogOutput, bollard::errors::Error>> + Send>>,
    input: std::pin::Pin<Box<dyn tokio::io::AsyncWrite + Send>>,
}

#[async_trait]
impl AttachedStream for BollardAttachedStream {
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), EngineError> {
        use tokio::io::AsyncWriteExt;
        self.input
            .write_all(data)
            .await
            .map_err(|e| EngineError::new(e.to_string()))?;
        self.input
            .flush()
            .await
            .map_err(|e| EngineError::new(e.to_string()))
    }

    async fn read_message(&mut self) -> Result<Option<EngineMessage>, EngineError> {
        match self.output.next().await {
            None => Ok(None),
            Some(Err(e)) => Err(engine_error(e)),
            Some(Ok(LogOutput::StdOut { message })) => Ok(Some(EngineMessage {
                stream: StreamId::Stdout,
                payload: message.to_vec(),
            })),
            Some(Ok(LogOutput::StdErr { message })) => Ok(Some(EngineMessage {
                stream: StreamId::Stderr,
                payload: message.to_vec(),
            })),
            // StdIn echoes and the console combined stream carry no
            // stream_id distinction the spec cares about; surface as stdout.
            Some(Ok(LogOutput::StdIn { message } | LogOutput::Console { message })) => {
                Ok(Some(EngineMessage {
                    stream: StreamId::Stdout,
                    payload: message.to_vec(),
                }))
            }
        }
    }
}

