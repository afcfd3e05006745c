//! Response shaping: the apiserver's verbose objects reduced to the summaries
//! the tools return.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerSummary {
    pub name: String,
    pub image: String,
    pub ready: bool,
    pub restart_count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub node: Option<String>,
    pub pod_ip: Option<String>,
    pub host_ip: Option<String>,
    pub containers: Vec<ContainerSummary>,
    pub created: Option<String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplicaCounts {
    pub desired: i64,
    pub current: i64,
    pub ready: i64,
    pub available: i64,
    pub unavailable: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerImage {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentSummary {
    pub name: String,
    pub namespace: String,
    pub replicas: ReplicaCounts,
    pub strategy: Option<String>,
    pub containers: Vec<ContainerImage>,
    pub created: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServicePort {
    pub name: Option<String>,
    pub port: i64,
    pub target_port: Option<String>,
    pub protocol: Option<String>,
    pub node_port: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceSummary {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub cluster_ip: Option<String>,
    pub external_ips: Vec<String>,
    pub ports: Vec<ServicePort>,
    pub selector: BTreeMap<String, String>,
    pub created: Option<String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceQuantities {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub pods: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub status: String,
    pub roles: Vec<String>,
    pub version: String,
    pub os: String,
    pub kernel: String,
    pub container_runtime: String,
    pub capacity: ResourceQuantities,
    pub allocatable: ResourceQuantities,
    pub addresses: Vec<NodeAddress>,
    pub conditions: BTreeMap<String, String>,
    pub created: Option<String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceSummary {
    pub name: String,
    pub status: String,
    pub created: Option<String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
    pub git_version: String,
    pub platform: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeTotals {
    pub total: usize,
    pub ready: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceTotals {
    pub total: usize,
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterInfo {
    pub version: VersionInfo,
    pub nodes: NodeTotals,
    pub namespaces: NamespaceTotals,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppliedResource {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletedResource {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScaledDeployment {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestartedPod {
    pub name: String,
    pub namespace: String,
    pub status: String,
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn integer(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl PodSummary {
    pub fn from_api(pod: &Value) -> Self {
        let metadata = &pod["metadata"];
        let spec = &pod["spec"];
        let status = &pod["status"];

        let statuses = array(status, "containerStatuses");
        let containers = array(spec, "containers")
            .iter()
            .map(|container| {
                let name = text(container, "name").unwrap_or_default();
                let state = statuses
                    .iter()
                    .find(|s| s.get("name").and_then(Value::as_str) == Some(name.as_str()));
                ContainerSummary {
                    image: text(container, "image").unwrap_or_default(),
                    ready: state
                        .and_then(|s| s.get("ready"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                    restart_count: state.map(|s| integer(s, "restartCount").unwrap_or(0)).unwrap_or(0),
                    name,
                }
            })
            .collect();

        Self {
            name: text(metadata, "name").unwrap_or_default(),
            namespace: text(metadata, "namespace").unwrap_or_default(),
            status: text(status, "phase").unwrap_or_default(),
            node: text(spec, "nodeName"),
            pod_ip: text(status, "podIP"),
            host_ip: text(status, "hostIP"),
            containers,
            created: text(metadata, "creationTimestamp"),
            labels: string_map(metadata.get("labels")),
        }
    }
}

impl DeploymentSummary {
    pub fn from_api(deployment: &Value) -> Self {
        let metadata = &deployment["metadata"];
        let spec = &deployment["spec"];
        let status = &deployment["status"];

        let containers = array(&spec["template"]["spec"], "containers")
            .iter()
            .map(|container| ContainerImage {
                name: text(container, "name").unwrap_or_default(),
                image: text(container, "image").unwrap_or_default(),
            })
            .collect();

        Self {
            name: text(metadata, "name").unwrap_or_default(),
            namespace: text(metadata, "namespace").unwrap_or_default(),
            replicas: ReplicaCounts {
                desired: integer(spec, "replicas").unwrap_or(0),
                current: integer(status, "replicas").unwrap_or(0),
                ready: integer(status, "readyReplicas").unwrap_or(0),
                available: integer(status, "availableReplicas").unwrap_or(0),
                unavailable: integer(status, "unavailableReplicas").unwrap_or(0),
            },
            strategy: text(&spec["strategy"], "type"),
            containers,
            created: text(metadata, "creationTimestamp"),
            labels: string_map(metadata.get("labels")),
            selector: string_map(spec.get("selector").and_then(|s| s.get("matchLabels"))),
        }
    }
}

impl ServiceSummary {
    pub fn from_api(service: &Value) -> Self {
        let metadata = &service["metadata"];
        let spec = &service["spec"];

        let ports = array(spec, "ports")
            .iter()
            .map(|port| ServicePort {
                name: text(port, "name"),
                port: integer(port, "port").unwrap_or(0),
                // targetPort may be a number or a named port
                target_port: port.get("targetPort").map(|t| match t {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
                protocol: text(port, "protocol"),
                node_port: integer(port, "nodePort"),
            })
            .collect();

        let external_ips = array(spec, "externalIPs")
            .iter()
            .filter_map(|ip| ip.as_str().map(str::to_string))
            .collect();

        Self {
            name: text(metadata, "name").unwrap_or_default(),
            namespace: text(metadata, "namespace").unwrap_or_default(),
            service_type: text(spec, "type"),
            cluster_ip: text(spec, "clusterIP"),
            external_ips,
            ports,
            selector: string_map(spec.get("selector")),
            created: text(metadata, "creationTimestamp"),
            labels: string_map(metadata.get("labels")),
        }
    }
}

const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

impl NodeSummary {
    pub fn from_api(node: &Value) -> Self {
        let metadata = &node["metadata"];
        let status = &node["status"];
        let info = &status["nodeInfo"];

        let conditions: BTreeMap<String, String> = array(status, "conditions")
            .iter()
            .filter_map(|c| Some((text(c, "type")?, text(c, "status")?)))
            .collect();
        let ready = conditions.get("Ready").map(String::as_str) == Some("True");

        let labels = string_map(metadata.get("labels"));
        let roles = labels
            .keys()
            .filter_map(|label| label.strip_prefix(ROLE_LABEL_PREFIX))
            .map(str::to_string)
            .collect();

        let addresses = array(status, "addresses")
            .iter()
            .map(|addr| NodeAddress {
                address_type: text(addr, "type").unwrap_or_default(),
                address: text(addr, "address").unwrap_or_default(),
            })
            .collect();

        Self {
            name: text(metadata, "name").unwrap_or_default(),
            status: if ready { "Ready" } else { "NotReady" }.to_string(),
            roles,
            version: text(info, "kubeletVersion").unwrap_or_default(),
            os: format!(
                "{} ({})",
                text(info, "osImage").unwrap_or_default(),
                text(info, "architecture").unwrap_or_default()
            ),
            kernel: text(info, "kernelVersion").unwrap_or_default(),
            container_runtime: text(info, "containerRuntimeVersion").unwrap_or_default(),
            capacity: ResourceQuantities::from_api(status.get("capacity")),
            allocatable: ResourceQuantities::from_api(status.get("allocatable")),
            addresses,
            conditions,
            created: text(metadata, "creationTimestamp"),
            labels,
        }
    }
}

impl ResourceQuantities {
    fn from_api(quantities: Option<&Value>) -> Self {
        let quantities = quantities.unwrap_or(&Value::Null);
        Self {
            cpu: text(quantities, "cpu"),
            memory: text(quantities, "memory"),
            pods: text(quantities, "pods"),
        }
    }
}

impl NamespaceSummary {
    pub fn from_api(namespace: &Value) -> Self {
        let metadata = &namespace["metadata"];
        Self {
            name: text(metadata, "name").unwrap_or_default(),
            status: text(&namespace["status"], "phase").unwrap_or_default(),
            created: text(metadata, "creationTimestamp"),
            labels: string_map(metadata.get("labels")),
        }
    }
}

impl VersionInfo {
    pub fn from_api(version: &Value) -> Self {
        Self {
            major: text(version, "major").unwrap_or_default(),
            minor: text(version, "minor").unwrap_or_default(),
            git_version: text(version, "gitVersion").unwrap_or_default(),
            platform: text(version, "platform").unwrap_or_default(),
        }
    }
}
