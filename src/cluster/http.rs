// SPDX-License-Identifier: MIT

//! Production cluster client: the Kubernetes REST API over reqwest/rustls,
//! configured from a kubeconfig file.

use crate::cluster::kubeconfig::{ConnectionInfo, Kubeconfig};
use crate::cluster::model::{
    AppliedResource, ClusterInfo, DeploymentSummary, NamespaceSummary, NamespaceTotals,
    NodeSummary, NodeTotals, PodSummary, ServiceSummary, VersionInfo,
};
use crate::cluster::{ClusterApi, ClusterError, ResourceKind};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, Method};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::process::Command;
use url::Url;

pub struct HttpClusterClient {
    http: Client,
    base: Url,
    token: Option<String>,
    basic_auth: Option<(String, String)>,
    // kept for kubectl-delegated exec
    kubeconfig_path: PathBuf,
}

impl HttpClusterClient {
    /// Load the kubeconfig named by the configuration and build the long-lived
    /// client. Any failure here is fatal at startup.
    pub fn connect(config: &Config) -> Result<Self, ClusterError> {
        let kubeconfig = Kubeconfig::load(&config.kubeconfig)?;
        let info = kubeconfig.resolve()?;
        Self::from_connection(info, config.kubeconfig.clone())
    }

    fn from_connection(
        info: ConnectionInfo,
        kubeconfig_path: PathBuf,
    ) -> Result<Self, ClusterError> {
        let base = Url::parse(&info.server).map_err(|e| {
            ClusterError::kubeconfig(format!("invalid server URL '{}': {}", info.server, e))
        })?;

        let mut builder = Client::builder().use_rustls_tls();
        if let Some(ca) = &info.ca_pem {
            builder = builder.add_root_certificate(Certificate::from_pem(ca)?);
        }
        if let Some(identity) = &info.identity_pem {
            builder = builder.identity(Identity::from_pem(identity)?);
        }
        if info.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
            base,
            token: info.token,
            basic_auth: info.basic_auth,
            kubeconfig_path,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ClusterError> {
        let url = self.base.join(path)?;
        let mut req = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        } else if let Some((username, password)) = &self.basic_auth {
            req = req.basic_auth(username, Some(password.clone()));
        }
        Ok(req)
    }

    async fn api_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClusterError> {
        log::debug!("{} {}", method, path);
        let mut req = self.request(method, path)?;
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = Self::check(req.send().await?).await?;
        Ok(resp.json::<Value>().await?)
    }

    async fn api_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, ClusterError> {
        log::debug!("GET {}", path);
        let resp = Self::check(self.request(Method::GET, path)?.query(query).send().await?).await?;
        Ok(resp.text().await?)
    }

    async fn api_delete(&self, path: &str) -> Result<(), ClusterError> {
        log::debug!("DELETE {}", path);
        Self::check(self.request(Method::DELETE, path)?.send().await?).await?;
        Ok(())
    }

    /// Turn a non-2xx response into an error carrying the apiserver's
    /// `Status.message` when the body has one.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClusterError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        Err(ClusterError::api(status.as_u16(), message))
    }
}

fn pods_path(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("/api/v1/namespaces/{}/pods", ns),
        None => "/api/v1/pods".to_string(),
    }
}

fn deployments_path(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("/apis/apps/v1/namespaces/{}/deployments", ns),
        None => "/apis/apps/v1/deployments".to_string(),
    }
}

fn services_path(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("/api/v1/namespaces/{}/services", ns),
        None => "/api/v1/services".to_string(),
    }
}

fn resource_path(kind: ResourceKind, namespace: &str) -> String {
    match kind {
        ResourceKind::Pod => pods_path(Some(namespace)),
        ResourceKind::Deployment => deployments_path(Some(namespace)),
        ResourceKind::Service => services_path(Some(namespace)),
    }
}

fn items(list: &Value) -> &[Value] {
    list.get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[async_trait]
impl ClusterApi for HttpClusterClient {
    async fn list_pods(
        &self,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodSummary>, ClusterError> {
        let mut query = Vec::new();
        if let Some(labels) = label_selector {
            query.push(("labelSelector", labels.to_string()));
        }
        let list = self
            .api_json(Method::GET, &pods_path(namespace), &query, None)
            .await?;
        Ok(items(&list).iter().map(PodSummary::from_api).collect())
    }

    async fn pod_logs(
        &self,
        pod: &str,
        namespace: &str,
        container: Option<&str>,
        tail_lines: i64,
    ) -> Result<String, ClusterError> {
        let mut query = vec![("tailLines", tail_lines.to_string())];
        if let Some(container) = container {
            query.push(("container", container.to_string()));
        }
        self.api_text(
            &format!("/api/v1/namespaces/{}/pods/{}/log", namespace, pod),
            &query,
        )
        .await
    }

    async fn exec_in_pod(
        &self,
        pod: &str,
        namespace: &str,
        command: &[String],
        container: Option<&str>,
    ) -> Result<String, ClusterError> {
        // The exec endpoint needs a SPDY/WebSocket upgrade the plain HTTP
        // client does not speak; kubectl handles that for us.
        let mut cmd = Command::new("kubectl");
        cmd.arg("--kubeconfig")
            .arg(&self.kubeconfig_path)
            .arg("exec")
            .arg(pod)
            .arg("-n")
            .arg(namespace);
        if let Some(container) = container {
            cmd.arg("-c").arg(container);
        }
        cmd.arg("--");
        for part in command {
            cmd.arg(part);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| ClusterError::Exec(format!("failed to run kubectl: {}", e)))?;
        if !output.status.success() {
            return Err(ClusterError::Exec(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr.trim_end());
        }
        Ok(text)
    }

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        self.api_delete(&format!("/api/v1/namespaces/{}/pods/{}", namespace, name))
            .await
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<DeploymentSummary>, ClusterError> {
        let list = self
            .api_json(Method::GET, &deployments_path(namespace), &[], None)
            .await?;
        Ok(items(&list).iter().map(DeploymentSummary::from_api).collect())
    }

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<DeploymentSummary, ClusterError> {
        let deployment = self
            .api_json(
                Method::GET,
                &format!("/apis/apps/v1/namespaces/{}/deployments/{}", namespace, name),
                &[],
                None,
            )
            .await?;
        Ok(DeploymentSummary::from_api(&deployment))
    }

    async fn scale_deployment(
        &self,
        name: &str,
        namespace: &str,
        replicas: i32,
    ) -> Result<(), ClusterError> {
        let path = format!(
            "/apis/apps/v1/namespaces/{}/deployments/{}/scale",
            namespace, name
        );
        log::debug!("PATCH {}", path);
        let body = json!({"spec": {"replicas": replicas}});
        let req = self
            .request(Method::PATCH, &path)?
            .header("Content-Type", "application/merge-patch+json")
            .body(body.to_string());
        Self::check(req.send().await?).await?;
        Ok(())
    }

    async fn list_services(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ServiceSummary>, ClusterError> {
        let list = self
            .api_json(Method::GET, &services_path(namespace), &[], None)
            .await?;
        Ok(items(&list).iter().map(ServiceSummary::from_api).collect())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSummary>, ClusterError> {
        let list = self.api_json(Method::GET, "/api/v1/nodes", &[], None).await?;
        Ok(items(&list).iter().map(NodeSummary::from_api).collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>, ClusterError> {
        let list = self
            .api_json(Method::GET, "/api/v1/namespaces", &[], None)
            .await?;
        Ok(items(&list).iter().map(NamespaceSummary::from_api).collect())
    }

    async fn cluster_info(&self) -> Result<ClusterInfo, ClusterError> {
        let version = self.api_json(Method::GET, "/version", &[], None).await?;
        let nodes = self.list_nodes().await?;
        let namespaces = self.list_namespaces().await?;

        Ok(ClusterInfo {
            version: VersionInfo::from_api(&version),
            nodes: NodeTotals {
                total: nodes.len(),
                ready: nodes.iter().filter(|n| n.status == "Ready").count(),
            },
            namespaces: NamespaceTotals {
                total: namespaces.len(),
                list: namespaces.into_iter().map(|n| n.name).collect(),
            },
        })
    }

    async fn create_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        manifest: &Value,
    ) -> Result<AppliedResource, ClusterError> {
        let created = self
            .api_json(
                Method::POST,
                &resource_path(kind, namespace),
                &[],
                Some(manifest),
            )
            .await?;
        let metadata = &created["metadata"];
        Ok(AppliedResource {
            kind: kind.as_str().to_string(),
            name: metadata
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            namespace: metadata
                .get("namespace")
                .and_then(Value::as_str)
                .unwrap_or(namespace)
                .to_string(),
            status: "created".to_string(),
        })
    }

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<(), ClusterError> {
        let path = match kind {
            ResourceKind::Pod => format!("/api/v1/namespaces/{}/pods/{}", namespace, name),
            ResourceKind::Deployment => {
                format!("/apis/apps/v1/namespaces/{}/deployments/{}", namespace, name)
            }
            ResourceKind::Service => {
                format!("/api/v1/namespaces/{}/services/{}", namespace, name)
            }
        };
        self.api_delete(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_paths_scope_by_namespace() {
        assert_eq!(pods_path(None), "/api/v1/pods");
        assert_eq!(pods_path(Some("prod")), "/api/v1/namespaces/prod/pods");
        assert_eq!(deployments_path(None), "/apis/apps/v1/deployments");
        assert_eq!(
            deployments_path(Some("prod")),
            "/apis/apps/v1/namespaces/prod/deployments"
        );
        assert_eq!(services_path(Some("prod")), "/api/v1/namespaces/prod/services");
    }

    #[test]
    fn items_tolerates_missing_or_malformed_lists() {
        assert!(items(&json!({"items": []})).is_empty());
        assert!(items(&json!({})).is_empty());
        assert!(items(&json!({"items": "nope"})).is_empty());
        assert_eq!(items(&json!({"items": [1, 2]})).len(), 2);
    }
}
