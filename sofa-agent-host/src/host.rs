//! Host facts: installed macOS version and hardware model identifier
//!
//! - `sw_vers -productVersion` for the OS version, with sysinfo as fallback
//! - `sysctl -n hw.model` for the model identifier

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

use crate::config::HostConfig;
use crate::error::HostFactError;

/// Source of the facts a compatibility check needs about this host
pub trait HostFactSource {
    fn system_version(&self) -> impl Future<Output = Result<String, HostFactError>> + Send;
    fn model_identifier(&self) -> impl Future<Output = Result<String, HostFactError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub system_version: String,
    pub model_identifier: String,
}

impl HostFacts {
    pub async fn collect<S: HostFactSource>(source: &S) -> Result<Self, HostFactError> {
        let system_version = source.system_version().await?;
        let model_identifier = source.model_identifier().await?;
        debug!("Host facts - version: {}, model: {}", system_version, model_identifier);
        Ok(Self { system_version, model_identifier })
    }
}

/// Facts read from the running system
pub struct SystemHostFacts {
    timeout: Duration,
}

impl SystemHostFacts {
    pub fn new(config: &HostConfig) -> Self {
        Self { timeout: config.command_timeout() }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String, HostFactError> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Executing host command: {}", command);

        let child = AsyncCommand::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(HostFactError::Spawn { command, source }),
            Err(_) => return Err(HostFactError::Timeout { command, timeout: self.timeout }),
        };

        if !output.status.success() {
            return Err(HostFactError::ExitStatus { command, code: output.status.code() });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(HostFactError::EmptyOutput { command });
        }
        Ok(text)
    }
}

impl HostFactSource for SystemHostFacts {
    async fn system_version(&self) -> Result<String, HostFactError> {
        match self.run("sw_vers", &["-productVersion"]).await {
            Ok(version) => Ok(version),
            Err(e) => match sysinfo::System::os_version().filter(|v| !v.trim().is_empty()) {
                Some(version) => {
                    warn!("{}, using OS version reported by sysinfo", e);
                    Ok(version.trim().to_string())
                }
                None => Err(e),
            },
        }
    }

    async fn model_identifier(&self) -> Result<String, HostFactError> {
        self.run("sysctl", &["-n", "hw.model"]).await
    }
}
