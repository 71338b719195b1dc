//! kubectl-backed cluster access
//!
//! Implements the cluster collaborators by shelling out to `kubectl`.
//! Every invocation carries `--kubeconfig` (when configured) and
//! `--namespace`. The configured kubectl command may contain arguments,
//! e.g. `minikube kubectl --`.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use knt_core::config::ClientConfig;
use knt_core::traits::{ClusterClient, ReadinessWatcher};
use knt_core::{ClusterError, LabelSelector, PodAddresses, Resource, ResourceKind};

/// Prints one line per deployment status change
const AVAILABLE_REPLICAS_JSONPATH: &str = "jsonpath={.status.availableReplicas}{\"\\n\"}";

/// Cluster access through the `kubectl` CLI
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
    prefix_args: Vec<String>,
    kubeconfig: Option<PathBuf>,
    namespace: String,
}

impl Kubectl {
    /// Create a client from a kubectl command line, kubeconfig and namespace
    pub fn new(command: &str, kubeconfig: Option<PathBuf>, namespace: impl Into<String>) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "kubectl".to_string());
        Self {
            program,
            prefix_args: parts.collect(),
            kubeconfig,
            namespace: namespace.into(),
        }
    }

    /// Create a client from the client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            &config.kubectl,
            config.kubeconfig.clone(),
            config.namespace.clone(),
        )
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args);
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        cmd.arg("--namespace").arg(&self.namespace);
        cmd.args(args);
        cmd.kill_on_drop(true);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        let verb: Vec<&str> = args.iter().take(2).copied().collect();
        format!("{} {}", self.program, verb.join(" "))
    }

    /// Run a command to completion and return its stdout
    async fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>, ClusterError> {
        let description = self.describe(args);
        tracing::debug!("Running {}", description);

        let mut child = self
            .command(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ClusterError::Spawn {
                command: description.clone(),
                source,
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input)
                .await
                .map_err(|source| ClusterError::Spawn {
                    command: description.clone(),
                    source,
                })?;
            // Dropping the pipe closes kubectl's stdin
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ClusterError::Spawn {
                command: description.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                command: description,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl ClusterClient for Kubectl {
    async fn create(&self, resource: &Resource) -> Result<(), ClusterError> {
        let document = serde_json::to_vec(&resource.document).map_err(|e| ClusterError::Output {
            command: format!("{} create", self.program),
            message: e.to_string(),
        })?;
        self.run(&["create", "-f", "-"], Some(&document)).await?;
        tracing::info!("Created {} {}", resource.kind, resource.name);
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> Result<(), ClusterError> {
        self.run(&["delete", kind.as_str(), name], None).await?;
        tracing::info!("Deleted {} {}", kind, name);
        Ok(())
    }

    async fn list_pods(&self, selector: &LabelSelector) -> Result<Vec<PodAddresses>, ClusterError> {
        let selector = selector.to_string();
        let args = ["get", "pods", "-l", &selector, "-o", "json"];
        let stdout = self.run(&args, None).await?;
        parse_pod_list(&stdout).map_err(|message| ClusterError::Output {
            command: self.describe(&args),
            message,
        })
    }
}

#[async_trait]
impl ReadinessWatcher for Kubectl {
    async fn wait_available(&self, deployment: &str, replicas: u32) -> Result<(), ClusterError> {
        let target = format!("deployment/{}", deployment);
        let args = [
            "get",
            target.as_str(),
            "--watch",
            "-o",
            AVAILABLE_REPLICAS_JSONPATH,
        ];
        let description = self.describe(&args);

        let mut child = self
            .command(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ClusterError::Spawn {
                command: description.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ClusterError::Output {
            command: description.clone(),
            message: "stdout not captured".to_string(),
        })?;
        let mut lines = BufReader::new(stdout).lines();

        let mut available = 0;
        loop {
            let line = lines.next_line().await.map_err(|source| ClusterError::Spawn {
                command: description.clone(),
                source,
            })?;
            let Some(line) = line else {
                break;
            };

            available = parse_available(&line).map_err(|message| ClusterError::Output {
                command: description.clone(),
                message,
            })?;

            if available == replicas {
                tracing::info!(
                    "All pods {}/{} in the deployment are ready",
                    available,
                    replicas
                );
                let _ = child.kill().await;
                return Ok(());
            }
            tracing::info!(
                "Pods are starting up: {}/{} in the deployment are ready",
                available,
                replicas
            );
        }

        // The watch ended before the ready transition
        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ClusterError::Spawn {
                command: description.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                command: description,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Err(ClusterError::WatchEnded {
            deployment: deployment.to_string(),
            available,
            wanted: replicas,
        })
    }
}

/// Parse one watch line; an absent `availableReplicas` prints as empty
fn parse_available(line: &str) -> Result<u32, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(0);
    }
    line.parse()
        .map_err(|e| format!("invalid availableReplicas {:?}: {}", line, e))
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodMetadata {
    name: String,
    deletion_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatus {
    #[serde(rename = "podIP")]
    pod_ip: Option<String>,
    #[serde(rename = "podIPs", default)]
    pod_ips: Vec<PodIp>,
}

#[derive(Debug, Deserialize)]
struct PodIp {
    ip: String,
}

/// Extract pod names and IPs from `kubectl get pods -o json` output.
///
/// Terminating pods are skipped. `podIPs` is preferred; `podIP` is used
/// when the list is absent.
fn parse_pod_list(json: &[u8]) -> Result<Vec<PodAddresses>, String> {
    let list: PodList = serde_json::from_slice(json).map_err(|e| e.to_string())?;

    let pods = list
        .items
        .into_iter()
        .filter(|pod| pod.metadata.deletion_timestamp.is_none())
        .map(|pod| {
            let ips = if pod.status.pod_ips.is_empty() {
                pod.status.pod_ip.into_iter().collect()
            } else {
                pod.status.pod_ips.into_iter().map(|p| p.ip).collect()
            };
            PodAddresses {
                name: pod.metadata.name,
                ips,
            }
        })
        .collect();

    Ok(pods)
}
