//! Minimal kubeconfig loading: just enough of the format to resolve one
//! context into connection material for the HTTP client.

use crate::cluster::ClusterError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Kubeconfig {
    #[serde(rename = "current-context", default)]
    pub current_context: Option<String>,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
pub struct ClusterEntry {
    pub server: String,
    #[serde(rename = "certificate-authority-data", default)]
    pub certificate_authority_data: Option<String>,
    #[serde(rename = "certificate-authority", default)]
    pub certificate_authority: Option<PathBuf>,
    #[serde(rename = "insecure-skip-tls-verify", default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserEntry {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "client-certificate-data", default)]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data", default)]
    pub client_key_data: Option<String>,
    #[serde(rename = "client-certificate", default)]
    pub client_certificate: Option<PathBuf>,
    #[serde(rename = "client-key", default)]
    pub client_key: Option<PathBuf>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Connection material resolved from one kubeconfig context.
#[derive(Debug)]
pub struct ConnectionInfo {
    pub server: String,
    pub ca_pem: Option<Vec<u8>>,
    /// Client certificate followed by its key, PEM-concatenated
    pub identity_pem: Option<Vec<u8>>,
    pub token: Option<String>,
    pub basic_auth: Option<(String, String)>,
    pub insecure: bool,
}

impl Kubeconfig {
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClusterError::kubeconfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ClusterError> {
        serde_yaml::from_str(text)
            .map_err(|e| ClusterError::kubeconfig(format!("invalid kubeconfig: {}", e)))
    }

    /// Resolve the current context (falling back to the first context, then to
    /// the first cluster and user) into connection material.
    pub fn resolve(&self) -> Result<ConnectionInfo, ClusterError> {
        let (cluster, user) = self.select_context()?;

        let ca_pem = pem_material(
            cluster.certificate_authority_data.as_deref(),
            cluster.certificate_authority.as_deref(),
        )?;
        let cert = pem_material(
            user.client_certificate_data.as_deref(),
            user.client_certificate.as_deref(),
        )?;
        let key = pem_material(user.client_key_data.as_deref(), user.client_key.as_deref())?;

        let identity_pem = match (cert, key) {
            (Some(mut cert), Some(key)) => {
                cert.push(b'\n');
                cert.extend_from_slice(&key);
                Some(cert)
            }
            (None, None) => None,
            _ => {
                return Err(ClusterError::kubeconfig(
                    "client certificate and key must both be present",
                ))
            }
        };

        let basic_auth = match (&user.username, &user.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(ConnectionInfo {
            server: cluster.server.clone(),
            ca_pem,
            identity_pem,
            token: user.token.clone(),
            basic_auth,
            insecure: cluster.insecure_skip_tls_verify,
        })
    }

    fn select_context(&self) -> Result<(&ClusterEntry, &UserEntry), ClusterError> {
        let named = self
            .current_context
            .as_deref()
            .and_then(|name| self.contexts.iter().find(|c| c.name == name))
            .or_else(|| self.contexts.first());

        if let Some(named) = named {
            let cluster = self
                .clusters
                .iter()
                .find(|c| c.name == named.context.cluster)
                .ok_or_else(|| {
                    ClusterError::kubeconfig(format!(
                        "context '{}' references unknown cluster '{}'",
                        named.name, named.context.cluster
                    ))
                })?;
            let user = self
                .users
                .iter()
                .find(|u| u.name == named.context.user)
                .ok_or_else(|| {
                    ClusterError::kubeconfig(format!(
                        "context '{}' references unknown user '{}'",
                        named.name, named.context.user
                    ))
                })?;
            return Ok((&cluster.cluster, &user.user));
        }

        match (self.clusters.first(), self.users.first()) {
            (Some(cluster), Some(user)) => Ok((&cluster.cluster, &user.user)),
            _ => Err(ClusterError::kubeconfig(
                "kubeconfig has no usable context, cluster or user",
            )),
        }
    }
}

fn pem_material(
    data: Option<&str>,
    file: Option<&Path>,
) -> Result<Option<Vec<u8>>, ClusterError> {
    if let Some(encoded) = data {
        let bytes = BASE64.decode(encoded.trim().as_bytes()).map_err(|e| {
            ClusterError::kubeconfig(format!("invalid base64 material in kubeconfig: {}", e))
        })?;
        return Ok(Some(bytes));
    }
    if let Some(path) = file {
        return Ok(Some(std::fs::read(path)?));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_CONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: k3s
clusters:
  - name: k3s
    cluster:
      server: https://10.0.0.5:6443
      insecure-skip-tls-verify: true
contexts:
  - name: k3s
    context:
      cluster: k3s
      user: admin
users:
  - name: admin
    user:
      token: sekret
"#;

    // "Y2VydA==" is "cert", "a2V5" is "key"
    const CERT_CONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: second
clusters:
  - name: first
    cluster:
      server: https://first:6443
  - name: second
    cluster:
      server: https://second:6443
      certificate-authority-data: Y2VydA==
contexts:
  - name: first
    context:
      cluster: first
      user: first
  - name: second
    context:
      cluster: second
      user: second
users:
  - name: first
    user:
      token: first-token
  - name: second
    user:
      client-certificate-data: Y2VydA==
      client-key-data: a2V5
"#;

    #[test]
    fn resolves_token_auth() {
        let info = Kubeconfig::parse(TOKEN_CONFIG).unwrap().resolve().unwrap();
        assert_eq!(info.server, "https://10.0.0.5:6443");
        assert_eq!(info.token.as_deref(), Some("sekret"));
        assert!(info.identity_pem.is_none());
        assert!(info.insecure);
    }

    #[test]
    fn current_context_selects_among_several() {
        let info = Kubeconfig::parse(CERT_CONFIG).unwrap().resolve().unwrap();
        assert_eq!(info.server, "https://second:6443");
        assert_eq!(info.ca_pem.as_deref(), Some(b"cert".as_slice()));
        assert_eq!(info.identity_pem.as_deref(), Some(b"cert\nkey".as_slice()));
        assert!(info.token.is_none());
    }

    #[test]
    fn dangling_cluster_reference_is_an_error() {
        let config = r#"
current-context: broken
clusters: []
contexts:
  - name: broken
    context:
      cluster: missing
      user: missing
users: []
"#;
        let err = Kubeconfig::parse(config).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("unknown cluster 'missing'"));
    }

    #[test]
    fn empty_kubeconfig_is_an_error() {
        let err = Kubeconfig::parse("apiVersion: v1").unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("no usable context"));
    }

    #[test]
    fn certificate_without_key_is_rejected() {
        let config = r#"
clusters:
  - name: c
    cluster:
      server: https://c:6443
contexts:
  - name: c
    context:
      cluster: c
      user: u
users:
  - name: u
    user:
      client-certificate-data: Y2VydA==
"#;
        let err = Kubeconfig::parse(config).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("must both be present"));
    }
}
