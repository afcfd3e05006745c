use std::env;
use std::path::PathBuf;

/// Process configuration, read once at startup.
///
/// - `KUBECONFIG`: path to the kubeconfig file (default: `~/.kube/config`)
/// - `K3S_DEFAULT_NAMESPACE`: default namespace for namespaced operations
///   (default: `default`)
/// - `K3S_DEBUG`: enable debug logging (default: false)
#[derive(Debug, Clone)]
pub struct Config {
    pub kubeconfig: PathBuf,
    pub default_namespace: String,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let kubeconfig = env::var("KUBECONFIG").map(PathBuf::from).unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".kube")
                .join("config")
        });
        let default_namespace =
            env::var("K3S_DEFAULT_NAMESPACE").unwrap_or_else(|_| "default".to_string());
        let debug = env::var("K3S_DEBUG")
            .map(|v| truthy(&v))
            .unwrap_or(false);

        Self {
            kubeconfig,
            default_namespace,
            debug,
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_accepts_common_spellings() {
        assert!(truthy("true"));
        assert!(truthy("TRUE"));
        assert!(truthy("1"));
        assert!(truthy("yes"));
        assert!(!truthy("false"));
        assert!(!truthy("0"));
        assert!(!truthy(""));
    }
}
