// SPDX-License-Identifier: MIT

//! Static tool catalog: names, descriptions and argument shapes are fixed at
//! compile time and never change while the server runs.

use serde_json::{json, Map, Value};

/// Which handler a tool routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetPods,
    GetDeployments,
    GetDeployment,
    GetServices,
    GetNodes,
    ScaleDeployment,
    RestartPod,
    GetLogs,
    ExecuteCommand,
    ApplyManifest,
    DeleteResource,
    GetNamespaces,
    GetClusterInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    StringList,
}

/// How an omitted `namespace` argument is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceRule {
    /// The tool takes no namespace argument
    NotAccepted,
    /// Omitted namespace means "all namespaces"
    AllWhenOmitted,
    /// Omitted namespace is replaced by the configured default before dispatch
    DefaultWhenOmitted,
    /// Resolved from the manifest metadata, falling back to the default
    FromManifest,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub namespace: NamespaceRule,
    pub operation: Operation,
}

impl ToolDescriptor {
    /// JSON Schema for the tool's input object, derived from the declared
    /// parameters.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for param in self.params {
            let schema = match param.ty {
                ParamType::String => json!({
                    "type": "string",
                    "description": param.description,
                }),
                ParamType::Integer => json!({
                    "type": "integer",
                    "description": param.description,
                }),
                ParamType::StringList => json!({
                    "type": "array",
                    "items": {"type": "string"},
                    "description": param.description,
                }),
            };
            properties.insert(param.name.to_string(), schema);
        }

        let required: Vec<Value> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| Value::String(p.name.to_string()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema
    }
}

pub static CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "get_pods",
        description: "List pods in a namespace or across all namespaces. Supports label selectors for filtering.",
        params: &[
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace to filter pods (omit for all namespaces)",
            },
            ParamSpec {
                name: "labels",
                ty: ParamType::String,
                required: false,
                description: "Label selector (e.g., 'app=nginx,env=prod')",
            },
        ],
        namespace: NamespaceRule::AllWhenOmitted,
        operation: Operation::GetPods,
    },
    ToolDescriptor {
        name: "get_deployments",
        description: "List deployments in a namespace or across all namespaces",
        params: &[ParamSpec {
            name: "namespace",
            ty: ParamType::String,
            required: false,
            description: "Namespace to filter deployments (omit for all namespaces)",
        }],
        namespace: NamespaceRule::AllWhenOmitted,
        operation: Operation::GetDeployments,
    },
    ToolDescriptor {
        name: "get_deployment",
        description: "Get detailed information about a specific deployment",
        params: &[
            ParamSpec {
                name: "name",
                ty: ParamType::String,
                required: true,
                description: "Deployment name",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace (default: default)",
            },
        ],
        namespace: NamespaceRule::DefaultWhenOmitted,
        operation: Operation::GetDeployment,
    },
    ToolDescriptor {
        name: "get_services",
        description: "List services in a namespace or across all namespaces",
        params: &[ParamSpec {
            name: "namespace",
            ty: ParamType::String,
            required: false,
            description: "Namespace to filter services (omit for all namespaces)",
        }],
        namespace: NamespaceRule::AllWhenOmitted,
        operation: Operation::GetServices,
    },
    ToolDescriptor {
        name: "get_nodes",
        description: "List all nodes in the cluster with resource information",
        params: &[],
        namespace: NamespaceRule::NotAccepted,
        operation: Operation::GetNodes,
    },
    ToolDescriptor {
        name: "scale_deployment",
        description: "Scale a deployment to a specific number of replicas",
        params: &[
            ParamSpec {
                name: "name",
                ty: ParamType::String,
                required: true,
                description: "Deployment name",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace (default: default)",
            },
            ParamSpec {
                name: "replicas",
                ty: ParamType::Integer,
                required: true,
                description: "Desired replica count",
            },
        ],
        namespace: NamespaceRule::DefaultWhenOmitted,
        operation: Operation::ScaleDeployment,
    },
    ToolDescriptor {
        name: "restart_pod",
        description: "Restart a pod by deleting it (will be recreated by its controller)",
        params: &[
            ParamSpec {
                name: "name",
                ty: ParamType::String,
                required: true,
                description: "Pod name",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace (default: default)",
            },
        ],
        namespace: NamespaceRule::DefaultWhenOmitted,
        operation: Operation::RestartPod,
    },
    ToolDescriptor {
        name: "get_logs",
        description: "Get logs from a pod. Can specify container and number of lines to tail.",
        params: &[
            ParamSpec {
                name: "pod_name",
                ty: ParamType::String,
                required: true,
                description: "Pod name",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace (default: default)",
            },
            ParamSpec {
                name: "container",
                ty: ParamType::String,
                required: false,
                description: "Container name (optional)",
            },
            ParamSpec {
                name: "tail_lines",
                ty: ParamType::Integer,
                required: false,
                description: "Number of lines to tail (default: 100)",
            },
        ],
        namespace: NamespaceRule::DefaultWhenOmitted,
        operation: Operation::GetLogs,
    },
    ToolDescriptor {
        name: "execute_command",
        description: "Execute a command in a pod container",
        params: &[
            ParamSpec {
                name: "pod_name",
                ty: ParamType::String,
                required: true,
                description: "Pod name",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace (default: default)",
            },
            ParamSpec {
                name: "command",
                ty: ParamType::StringList,
                required: true,
                description: "Command to execute as array (e.g., ['ls', '-la'])",
            },
            ParamSpec {
                name: "container",
                ty: ParamType::String,
                required: false,
                description: "Container name (optional)",
            },
        ],
        namespace: NamespaceRule::DefaultWhenOmitted,
        operation: Operation::ExecuteCommand,
    },
    ToolDescriptor {
        name: "apply_manifest",
        description: "Apply a Kubernetes YAML manifest to create resources (Pod, Deployment or Service)",
        params: &[
            ParamSpec {
                name: "manifest_yaml",
                ty: ParamType::String,
                required: true,
                description: "YAML manifest content",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace override (optional)",
            },
        ],
        namespace: NamespaceRule::FromManifest,
        operation: Operation::ApplyManifest,
    },
    ToolDescriptor {
        name: "delete_resource",
        description: "Delete a Kubernetes resource (Pod, Deployment or Service)",
        params: &[
            ParamSpec {
                name: "kind",
                ty: ParamType::String,
                required: true,
                description: "Resource kind (Pod, Deployment, Service)",
            },
            ParamSpec {
                name: "name",
                ty: ParamType::String,
                required: true,
                description: "Resource name",
            },
            ParamSpec {
                name: "namespace",
                ty: ParamType::String,
                required: false,
                description: "Namespace (default: default)",
            },
        ],
        namespace: NamespaceRule::DefaultWhenOmitted,
        operation: Operation::DeleteResource,
    },
    ToolDescriptor {
        name: "get_namespaces",
        description: "List all namespaces in the cluster",
        params: &[],
        namespace: NamespaceRule::NotAccepted,
        operation: Operation::GetNamespaces,
    },
    ToolDescriptor {
        name: "get_cluster_info",
        description: "Get cluster information including version, nodes, and namespaces",
        params: &[],
        namespace: NamespaceRule::NotAccepted,
        operation: Operation::GetClusterInfo,
    },
];

pub fn lookup(name: &str) -> Option<&'static ToolDescriptor> {
    CATALOG.iter().find(|d| d.name == name)
}
