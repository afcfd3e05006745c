// SPDX-License-Identifier: MIT

//! Request routing: descriptor lookup, argument validation, namespace
//! defaulting, dispatch through the cluster capability, result rendering.

use crate::cluster::model::{DeletedResource, RestartedPod, ScaledDeployment};
use crate::cluster::{ClusterApi, ResourceKind};
use crate::error::K3sError;
use crate::mcp::params::{
    ApplyManifestArgs, DeleteResourceArgs, ExecuteCommandArgs, GetDeploymentArgs,
    GetDeploymentsArgs, GetLogsArgs, GetPodsArgs, GetServicesArgs, RestartPodArgs,
    ScaleDeploymentArgs,
};
use crate::mcp::registry::{self, NamespaceRule, Operation, ToolDescriptor};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Routes one tool invocation at a time; holds no per-call state. The cluster
/// handle is injected so tests can substitute a fake.
pub struct Router {
    cluster: Arc<dyn ClusterApi>,
    default_namespace: String,
}

impl Router {
    pub fn new(cluster: Arc<dyn ClusterApi>, default_namespace: impl Into<String>) -> Self {
        Self {
            cluster,
            default_namespace: default_namespace.into(),
        }
    }

    /// Route one invocation to the cluster capability and render its result as
    /// a single text payload: JSON for structured results, verbatim text for
    /// logs and command output.
    pub async fn dispatch(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, K3sError> {
        let descriptor = registry::lookup(tool).ok_or_else(|| K3sError::unknown_tool(tool))?;
        let arguments = self.normalize(descriptor, arguments)?;
        self.run(descriptor, arguments).await
    }

    /// Required-argument check (first missing field in declared order wins),
    /// then namespace defaulting per the descriptor's rule.
    fn normalize(
        &self,
        descriptor: &ToolDescriptor,
        mut arguments: Map<String, Value>,
    ) -> Result<Map<String, Value>, K3sError> {
        // Null and empty-string namespaces count as omitted.
        if matches!(arguments.get("namespace"), Some(ns) if is_blank(ns)) {
            arguments.remove("namespace");
        }

        for param in descriptor.params.iter().filter(|p| p.required) {
            match arguments.get(param.name) {
                None | Some(Value::Null) => {
                    return Err(K3sError::missing_argument(descriptor.name, param.name));
                }
                Some(_) => {}
            }
        }

        if descriptor.namespace == NamespaceRule::DefaultWhenOmitted
            && !arguments.contains_key("namespace")
        {
            arguments.insert(
                "namespace".to_string(),
                Value::String(self.default_namespace.clone()),
            );
        }

        Ok(arguments)
    }

    async fn run(
        &self,
        descriptor: &ToolDescriptor,
        arguments: Map<String, Value>,
    ) -> Result<String, K3sError> {
        match descriptor.operation {
            Operation::GetPods => {
                let args: GetPodsArgs = parse_args(arguments)?;
                let pods = self
                    .cluster
                    .list_pods(args.namespace.as_deref(), args.labels.as_deref())
                    .await?;
                render(&pods)
            }
            Operation::GetDeployments => {
                let args: GetDeploymentsArgs = parse_args(arguments)?;
                let deployments = self.cluster.list_deployments(args.namespace.as_deref()).await?;
                render(&deployments)
            }
            Operation::GetDeployment => {
                let args: GetDeploymentArgs = parse_args(arguments)?;
                let deployment = self.cluster.get_deployment(&args.name, &args.namespace).await?;
                render(&deployment)
            }
            Operation::GetServices => {
                let args: GetServicesArgs = parse_args(arguments)?;
                let services = self.cluster.list_services(args.namespace.as_deref()).await?;
                render(&services)
            }
            Operation::GetNodes => render(&self.cluster.list_nodes().await?),
            Operation::GetNamespaces => render(&self.cluster.list_namespaces().await?),
            Operation::GetClusterInfo => render(&self.cluster.cluster_info().await?),
            Operation::ScaleDeployment => {
                let args: ScaleDeploymentArgs = parse_args(arguments)?;
                self.cluster
                    .scale_deployment(&args.name, &args.namespace, args.replicas)
                    .await?;
                render(&ScaledDeployment {
                    name: args.name,
                    namespace: args.namespace,
                    replicas: args.replicas,
                    status: "scaled".to_string(),
                })
            }
            Operation::RestartPod => {
                let args: RestartPodArgs = parse_args(arguments)?;
                self.cluster.delete_pod(&args.name, &args.namespace).await?;
                render(&RestartedPod {
                    name: args.name,
                    namespace: args.namespace,
                    status: "deleted (pod will be recreated by its controller)".to_string(),
                })
            }
            Operation::GetLogs => {
                let args: GetLogsArgs = parse_args(arguments)?;
                Ok(self
                    .cluster
                    .pod_logs(
                        &args.pod_name,
                        &args.namespace,
                        args.container.as_deref(),
                        args.tail_lines,
                    )
                    .await?)
            }
            Operation::ExecuteCommand => {
                let args: ExecuteCommandArgs = parse_args(arguments)?;
                Ok(self
                    .cluster
                    .exec_in_pod(
                        &args.pod_name,
                        &args.namespace,
                        &args.command,
                        args.container.as_deref(),
                    )
                    .await?)
            }
            Operation::ApplyManifest => {
                let args: ApplyManifestArgs = parse_args(arguments)?;
                let (kind, namespace, manifest) = prepare_manifest(
                    &args.manifest_yaml,
                    args.namespace.as_deref(),
                    &self.default_namespace,
                )?;
                let applied = self.cluster.create_resource(kind, &namespace, &manifest).await?;
                render(&applied)
            }
            Operation::DeleteResource => {
                let args: DeleteResourceArgs = parse_args(arguments)?;
                let kind = ResourceKind::parse(&args.kind)
                    .ok_or_else(|| K3sError::unsupported_kind(&args.kind))?;
                self.cluster
                    .delete_resource(kind, &args.name, &args.namespace)
                    .await?;
                render(&DeletedResource {
                    kind: kind.as_str().to_string(),
                    name: args.name,
                    namespace: args.namespace,
                    status: "deleted".to_string(),
                })
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str() == Some("")
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Map<String, Value>) -> Result<T, K3sError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| K3sError::InvalidArguments(e.to_string()))
}

fn render<T: Serialize>(value: &T) -> Result<String, K3sError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Parse a manifest, resolve its target kind and namespace (explicit argument
/// over manifest metadata over the configured default), and stamp the resolved
/// namespace into the metadata.
fn prepare_manifest(
    yaml: &str,
    namespace_override: Option<&str>,
    default_namespace: &str,
) -> Result<(ResourceKind, String, Value), K3sError> {
    let mut manifest: Value =
        serde_yaml::from_str(yaml).map_err(|e| K3sError::Manifest(e.to_string()))?;
    let root = manifest
        .as_object_mut()
        .ok_or_else(|| K3sError::Manifest("manifest must be a YAML mapping".to_string()))?;

    let kind_name = root
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("(none)")
        .to_string();
    let kind = ResourceKind::parse(&kind_name)
        .ok_or_else(|| K3sError::unsupported_kind(&kind_name))?;

    let metadata_namespace = root
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let namespace = namespace_override
        .map(str::to_string)
        .or(metadata_namespace)
        .unwrap_or_else(|| default_namespace.to_string());

    match root.get_mut("metadata") {
        Some(Value::Object(metadata)) => {
            metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
        }
        _ => {
            root.insert("metadata".to_string(), json!({"namespace": namespace}));
        }
    }

    Ok((kind, namespace, manifest))
}
