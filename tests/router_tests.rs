//! Integration tests for tool routing and dispatch against a fake cluster.
//!
//! Every test drives the router exactly the way the MCP server does and
//! asserts both the rendered payload and the calls that reached (or did not
//! reach) the cluster capability.

use async_trait::async_trait;
use k3s_mcp_rs::cluster::model::{
    AppliedResource, ClusterInfo, DeploymentSummary, NamespaceSummary, NodeSummary, PodSummary,
    ServiceSummary,
};
use k3s_mcp_rs::cluster::{ClusterApi, ClusterError, ResourceKind};
use k3s_mcp_rs::error::K3sError;
use k3s_mcp_rs::mcp::router::Router;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

/// Record of every capability invocation, for asserting what the router called.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    ListPods {
        namespace: Option<String>,
        labels: Option<String>,
    },
    PodLogs {
        pod: String,
        namespace: String,
        container: Option<String>,
        tail_lines: i64,
    },
    Exec {
        pod: String,
        namespace: String,
        command: Vec<String>,
        container: Option<String>,
    },
    DeletePod {
        name: String,
        namespace: String,
    },
    ListDeployments {
        namespace: Option<String>,
    },
    GetDeployment {
        name: String,
        namespace: String,
    },
    Scale {
        name: String,
        namespace: String,
        replicas: i32,
    },
    ListServices {
        namespace: Option<String>,
    },
    ListNodes,
    ListNamespaces,
    ClusterInfo,
    Create {
        kind: ResourceKind,
        namespace: String,
        manifest: Value,
    },
    Delete {
        kind: ResourceKind,
        name: String,
        namespace: String,
    },
}

#[derive(Default)]
struct FakeCluster {
    calls: Mutex<Vec<Call>>,
    fail_with: Option<String>,
}

impl FakeCluster {
    fn new() -> Self {
        Self::default()
    }

    fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    fn record(&self, call: Call) -> Result<(), ClusterError> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(message) => Err(ClusterError::api(404, message.clone())),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_pods(
        &self,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodSummary>, ClusterError> {
        self.record(Call::ListPods {
            namespace: namespace.map(str::to_string),
            labels: label_selector.map(str::to_string),
        })?;
        Ok(vec![])
    }

    async fn pod_logs(
        &self,
        pod: &str,
        namespace: &str,
        container: Option<&str>,
        tail_lines: i64,
    ) -> Result<String, ClusterError> {
        self.record(Call::PodLogs {
            pod: pod.to_string(),
            namespace: namespace.to_string(),
            container: container.map(str::to_string),
            tail_lines,
        })?;
        Ok("line one\nline two".to_string())
    }

    async fn exec_in_pod(
        &self,
        pod: &str,
        namespace: &str,
        command: &[String],
        container: Option<&str>,
    ) -> Result<String, ClusterError> {
        self.record(Call::Exec {
            pod: pod.to_string(),
            namespace: namespace.to_string(),
            command: command.to_vec(),
            container: container.map(str::to_string),
        })?;
        Ok("total 0".to_string())
    }

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        self.record(Call::DeletePod {
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<DeploymentSummary>, ClusterError> {
        self.record(Call::ListDeployments {
            namespace: namespace.map(str::to_string),
        })?;
        Ok(vec![])
    }

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<DeploymentSummary, ClusterError> {
        self.record(Call::GetDeployment {
            name: name.to_string(),
            namespace: namespace.to_string(),
        })?;
        Ok(DeploymentSummary {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        })
    }

    async fn scale_deployment(
        &self,
        name: &str,
        namespace: &str,
        replicas: i32,
    ) -> Result<(), ClusterError> {
        self.record(Call::Scale {
            name: name.to_string(),
            namespace: namespace.to_string(),
            replicas,
        })
    }

    async fn list_services(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ServiceSummary>, ClusterError> {
        self.record(Call::ListServices {
            namespace: namespace.map(str::to_string),
        })?;
        Ok(vec![])
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSummary>, ClusterError> {
        self.record(Call::ListNodes)?;
        Ok(vec![])
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>, ClusterError> {
        self.record(Call::ListNamespaces)?;
        Ok(vec![NamespaceSummary {
            name: "default".to_string(),
            status: "Active".to_string(),
            ..Default::default()
        }])
    }

    async fn cluster_info(&self) -> Result<ClusterInfo, ClusterError> {
        self.record(Call::ClusterInfo)?;
        Ok(ClusterInfo::default())
    }

    async fn create_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        manifest: &Value,
    ) -> Result<AppliedResource, ClusterError> {
        self.record(Call::Create {
            kind,
            namespace: namespace.to_string(),
            manifest: manifest.clone(),
        })?;
        Ok(AppliedResource {
            kind: kind.as_str().to_string(),
            name: manifest["metadata"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            namespace: namespace.to_string(),
            status: "created".to_string(),
        })
    }

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<(), ClusterError> {
        self.record(Call::Delete {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }
}

fn router() -> (Arc<FakeCluster>, Router) {
    let fake = Arc::new(FakeCluster::new());
    let router = Router::new(fake.clone(), "default");
    (fake, router)
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn unknown_tool_is_rejected_without_cluster_calls() {
    let (fake, router) = router();

    let err = router.dispatch("get_podz", Map::new()).await.unwrap_err();

    assert!(matches!(err, K3sError::UnknownTool(_)));
    assert_eq!(err.to_string(), "Unknown tool: get_podz");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn missing_required_argument_names_the_first_absent_field() {
    let (fake, router) = router();

    let err = router
        .dispatch("scale_deployment", args(json!({"replicas": 3})))
        .await
        .unwrap_err();
    match err {
        K3sError::MissingArgument { tool, field } => {
            assert_eq!(tool, "scale_deployment");
            assert_eq!(field, "name");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // with everything absent, the first declared required field is reported
    let err = router
        .dispatch("execute_command", Map::new())
        .await
        .unwrap_err();
    match err {
        K3sError::MissingArgument { field, .. } => assert_eq!(field, "pod_name"),
        other => panic!("unexpected error: {:?}", other),
    }

    // null counts as absent
    let err = router
        .dispatch("restart_pod", args(json!({"name": null})))
        .await
        .unwrap_err();
    assert!(matches!(err, K3sError::MissingArgument { .. }));

    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn omitted_namespace_defaults_before_dispatch() {
    let (fake, router) = router();

    router
        .dispatch("scale_deployment", args(json!({"name": "web", "replicas": 3})))
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![Call::Scale {
            name: "web".to_string(),
            namespace: "default".to_string(),
            replicas: 3,
        }]
    );
}

#[tokio::test]
async fn omitted_namespace_on_list_tools_means_all_namespaces() {
    let (fake, router) = router();

    router.dispatch("get_pods", Map::new()).await.unwrap();
    router
        .dispatch("get_pods", args(json!({"namespace": ""})))
        .await
        .unwrap();
    router
        .dispatch(
            "get_pods",
            args(json!({"namespace": "kube-system", "labels": "app=traefik"})),
        )
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            Call::ListPods {
                namespace: None,
                labels: None,
            },
            Call::ListPods {
                namespace: None,
                labels: None,
            },
            Call::ListPods {
                namespace: Some("kube-system".to_string()),
                labels: Some("app=traefik".to_string()),
            },
        ]
    );
}

#[tokio::test]
async fn apply_manifest_rejects_unsupported_kind_without_mutation() {
    let (fake, router) = router();
    let manifest = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n";

    let err = router
        .dispatch("apply_manifest", args(json!({"manifest_yaml": manifest})))
        .await
        .unwrap_err();

    assert!(matches!(err, K3sError::UnsupportedKind(_)));
    assert_eq!(err.to_string(), "Unsupported resource kind: ConfigMap");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn apply_manifest_resolves_namespace_and_stamps_metadata() {
    let (fake, router) = router();
    let bare = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: shell\n";
    let with_namespace =
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: shell\n  namespace: staging\n";

    router
        .dispatch("apply_manifest", args(json!({"manifest_yaml": bare})))
        .await
        .unwrap();
    router
        .dispatch(
            "apply_manifest",
            args(json!({"manifest_yaml": with_namespace, "namespace": "prod"})),
        )
        .await
        .unwrap();
    router
        .dispatch("apply_manifest", args(json!({"manifest_yaml": with_namespace})))
        .await
        .unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    match &calls[0] {
        Call::Create {
            kind,
            namespace,
            manifest,
        } => {
            assert_eq!(*kind, ResourceKind::Pod);
            assert_eq!(namespace, "default");
            assert_eq!(manifest["metadata"]["namespace"], "default");
        }
        other => panic!("unexpected call: {:?}", other),
    }
    match &calls[1] {
        Call::Create {
            namespace, manifest, ..
        } => {
            assert_eq!(namespace, "prod");
            assert_eq!(manifest["metadata"]["namespace"], "prod");
        }
        other => panic!("unexpected call: {:?}", other),
    }
    match &calls[2] {
        Call::Create { namespace, .. } => assert_eq!(namespace, "staging"),
        other => panic!("unexpected call: {:?}", other),
    }
}

#[tokio::test]
async fn invalid_manifest_yaml_is_a_parse_failure() {
    let (fake, router) = router();

    let err = router
        .dispatch(
            "apply_manifest",
            args(json!({"manifest_yaml": "key: [unclosed"})),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, K3sError::Manifest(_)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn cluster_failures_surface_and_serving_continues() {
    let fake = Arc::new(FakeCluster::failing("deployments.apps \"web\" not found"));
    let router = Router::new(fake.clone(), "default");

    let err = router
        .dispatch("get_deployment", args(json!({"name": "web"})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("deployments.apps \"web\" not found"));

    // the router stays usable after a failure
    let err = router
        .dispatch("get_deployment", args(json!({"name": "web"})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));

    assert_eq!(fake.calls().len(), 2);
}

#[tokio::test]
async fn delete_resource_invokes_exactly_one_deletion_and_reports_it() {
    let (fake, router) = router();

    let payload = router
        .dispatch(
            "delete_resource",
            args(json!({"kind": "Pod", "name": "x", "namespace": "ns"})),
        )
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![Call::Delete {
            kind: ResourceKind::Pod,
            name: "x".to_string(),
            namespace: "ns".to_string(),
        }]
    );
    let parsed: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(
        parsed,
        json!({"kind": "Pod", "name": "x", "namespace": "ns", "status": "deleted"})
    );
}

#[tokio::test]
async fn delete_resource_kind_is_case_insensitive_and_bounded() {
    let (fake, router) = router();

    router
        .dispatch(
            "delete_resource",
            args(json!({"kind": "deployment", "name": "web"})),
        )
        .await
        .unwrap();
    assert_eq!(
        fake.calls(),
        vec![Call::Delete {
            kind: ResourceKind::Deployment,
            name: "web".to_string(),
            namespace: "default".to_string(),
        }]
    );

    let err = router
        .dispatch(
            "delete_resource",
            args(json!({"kind": "ConfigMap", "name": "settings"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, K3sError::UnsupportedKind(_)));
    // no second deletion reached the cluster
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn logs_and_exec_output_are_returned_verbatim() {
    let (fake, router) = router();

    let logs = router
        .dispatch("get_logs", args(json!({"pod_name": "web-0"})))
        .await
        .unwrap();
    assert_eq!(logs, "line one\nline two");

    let output = router
        .dispatch(
            "execute_command",
            args(json!({"pod_name": "web-0", "command": ["ls", "-la"]})),
        )
        .await
        .unwrap();
    assert_eq!(output, "total 0");

    assert_eq!(
        fake.calls(),
        vec![
            Call::PodLogs {
                pod: "web-0".to_string(),
                namespace: "default".to_string(),
                container: None,
                tail_lines: 100,
            },
            Call::Exec {
                pod: "web-0".to_string(),
                namespace: "default".to_string(),
                command: vec!["ls".to_string(), "-la".to_string()],
                container: None,
            },
        ]
    );
}

#[tokio::test]
async fn restart_pod_deletes_through_the_pod_endpoint() {
    let (fake, router) = router();

    let payload = router
        .dispatch("restart_pod", args(json!({"name": "web-0"})))
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![Call::DeletePod {
            name: "web-0".to_string(),
            namespace: "default".to_string(),
        }]
    );
    let parsed: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(parsed["name"], "web-0");
    assert_eq!(
        parsed["status"],
        "deleted (pod will be recreated by its controller)"
    );
}

#[tokio::test]
async fn structured_results_are_json_payloads() {
    let (fake, router) = router();

    let payload = router.dispatch("get_namespaces", Map::new()).await.unwrap();
    let parsed: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(parsed[0]["name"], "default");
    assert_eq!(parsed[0]["status"], "Active");

    let payload = router.dispatch("get_cluster_info", Map::new()).await.unwrap();
    let parsed: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(parsed["nodes"]["total"], 0);

    assert_eq!(fake.calls(), vec![Call::ListNamespaces, Call::ClusterInfo]);
}

#[tokio::test]
async fn wrong_argument_type_is_rejected_before_dispatch() {
    let (fake, router) = router();

    let err = router
        .dispatch(
            "scale_deployment",
            args(json!({"name": "web", "replicas": "three"})),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, K3sError::InvalidArguments(_)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn explicit_namespace_is_passed_through() {
    let (fake, router) = router();

    router
        .dispatch(
            "get_logs",
            args(json!({
                "pod_name": "web-0",
                "namespace": "prod",
                "container": "sidecar",
                "tail_lines": 25
            })),
        )
        .await
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec![Call::PodLogs {
            pod: "web-0".to_string(),
            namespace: "prod".to_string(),
            container: Some("sidecar".to_string()),
            tail_lines: 25,
        }]
    );
}
