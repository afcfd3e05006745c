//! Per-tool parameter structs, deserialized once at the router boundary after
//! required-argument validation and namespace defaulting.

use serde::Deserialize;

fn default_tail_lines() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct GetPodsArgs {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetDeploymentsArgs {
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetServicesArgs {
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetDeploymentArgs {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct ScaleDeploymentArgs {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
}

#[derive(Debug, Deserialize)]
pub struct RestartPodArgs {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct GetLogsArgs {
    pub pod_name: String,
    pub namespace: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default = "default_tail_lines")]
    pub tail_lines: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteCommandArgs {
    pub pod_name: String,
    pub namespace: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub container: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyManifestArgs {
    pub manifest_yaml: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteResourceArgs {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}
