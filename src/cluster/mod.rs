// SPDX-License-Identifier: MIT

//! Cluster capability boundary.
//!
//! `ClusterApi` is the only way the router reaches live cluster state. The
//! production implementation is [`http::HttpClusterClient`]; tests substitute
//! a fake behind the same trait.

pub mod http;
pub mod kubeconfig;
pub mod model;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpClusterClient;
pub use model::{
    AppliedResource, ClusterInfo, DeploymentSummary, NamespaceSummary, NodeSummary, PodSummary,
    ServiceSummary,
};

/// Failures raised by the cluster capability, as reason strings plus the
/// transport causes they came from.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Non-2xx apiserver response; message is the `Status.message` when present
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(String),

    #[error("Exec failed: {0}")]
    Exec(String),

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn kubeconfig(message: impl Into<String>) -> Self {
        Self::Kubeconfig(message.into())
    }
}

/// Resource kinds supported for manifest apply and deletion. Adding a kind is
/// a compile-time-checked change: every dispatch site matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
}

impl ResourceKind {
    /// Case-insensitive parse; `None` for anything outside the supported set.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "pod" => Some(Self::Pod),
            "deployment" => Some(Self::Deployment),
            "service" => Some(Self::Service),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
            Self::Service => "Service",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the router can perform against a cluster.
///
/// `namespace: Option<&str>` on list operations means "all namespaces" when
/// `None`. Implementations must be safe for concurrent use; the router adds no
/// locking of its own.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_pods(
        &self,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodSummary>, ClusterError>;

    async fn pod_logs(
        &self,
        pod: &str,
        namespace: &str,
        container: Option<&str>,
        tail_lines: i64,
    ) -> Result<String, ClusterError>;

    async fn exec_in_pod(
        &self,
        pod: &str,
        namespace: &str,
        command: &[String],
        container: Option<&str>,
    ) -> Result<String, ClusterError>;

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError>;

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<DeploymentSummary>, ClusterError>;

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<DeploymentSummary, ClusterError>;

    async fn scale_deployment(
        &self,
        name: &str,
        namespace: &str,
        replicas: i32,
    ) -> Result<(), ClusterError>;

    async fn list_services(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ServiceSummary>, ClusterError>;

    async fn list_nodes(&self) -> Result<Vec<NodeSummary>, ClusterError>;

    async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>, ClusterError>;

    async fn cluster_info(&self) -> Result<ClusterInfo, ClusterError>;

    /// Submit a prepared manifest of the given kind. The manifest already
    /// carries the resolved namespace in its metadata.
    async fn create_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        manifest: &Value,
    ) -> Result<AppliedResource, ClusterError>;

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<(), ClusterError>;
}
