//! Contract Artifacts - Build Output Loading and ABI Validation
//!
//! Loads the JSON build artifact of each contract (one file per
//! contract, `abi` field required) and checks that it exposes every
//! function the typed binding will call. Any problem here is a
//! `ContractBinding` error: a proxy is never built on a broken artifact.

use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::ClientError;

use super::bindings::RequiredFunction;

/// Parsed contract build artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    /// Contract name recorded by the build tool, if any.
    #[serde(rename = "contractName", default)]
    pub contract_name: Option<String>,
    /// Callable interface.
    pub abi: JsonAbi,
}

impl ContractArtifact {
    /// Read and parse an artifact file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(contract: &str, path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::binding(contract, format!("cannot read artifact {}: {e}", path.display()))
        })?;

        let artifact = Self::from_json(contract, &content)?;
        debug!(
            contract,
            functions = artifact.abi.functions().count(),
            "Artifact loaded"
        );
        Ok(artifact)
    }

    /// Parse artifact JSON already in memory.
    pub fn from_json(contract: &str, json: &str) -> Result<Self, ClientError> {
        serde_json::from_str(json)
            .map_err(|e| ClientError::binding(contract, format!("malformed artifact: {e}")))
    }

    /// Whether the ABI exposes a function with this selector.
    pub fn exposes(&self, selector: [u8; 4]) -> bool {
        self.abi.functions().any(|f| f.selector().0 == selector)
    }

    /// Fail unless every required function is present in the ABI.
    pub fn ensure_exposes(&self, contract: &str, required: &[RequiredFunction]) -> Result<(), ClientError> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, selector)| !self.exposes(*selector))
            .map(|(signature, _)| *signature)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClientError::binding(
                contract,
                format!("artifact ABI lacks {}", missing.join(", ")),
            ))
        }
    }
}

/// Location of the build artifacts of a contract project.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    /// Artifacts live under `<project_dir>/build/contracts/`.
    pub fn for_project(project_dir: impl AsRef<Path>) -> Self {
        Self {
            root: project_dir.as_ref().join("build").join("contracts"),
        }
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn load(&self, contract: &str, file_name: &str) -> Result<ContractArtifact, ClientError> {
        ContractArtifact::load(contract, &self.path_of(file_name))
    }
}
