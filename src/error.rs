// SPDX-License-Identifier: MIT

//! Typed error handling for k3s-mcp-rs
//!
//! Per-call failures never escape the MCP boundary as protocol errors; the
//! server converts them to error content and keeps serving. Startup failures
//! (configuration, kubeconfig) are fatal before any request is handled.

use crate::cluster::ClusterError;
use thiserror::Error;

/// Top-level error type for tool routing and dispatch.
#[derive(Debug, Error)]
pub enum K3sError {
    /// The requested tool is not in the catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument was absent; carries the first missing field
    #[error("Missing required argument '{field}' for tool '{tool}'")]
    MissingArgument { tool: String, field: String },

    /// apply/delete against a kind outside the supported set
    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),

    /// The argument bag did not deserialize into the tool's parameter struct
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Manifest text was not usable YAML
    #[error("Failed to parse YAML manifest: {0}")]
    Manifest(String),

    /// Any failure raised by the cluster capability, message preserved
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// JSON serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl K3sError {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn missing_argument(tool: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingArgument {
            tool: tool.into(),
            field: field.into(),
        }
    }

    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedKind(kind.into())
    }
}
