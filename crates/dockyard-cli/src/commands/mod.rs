//! CLI commands

pub mod app;
pub mod deploy;
pub mod expose;
pub mod lifecycle;
pub mod status;

use miette::{IntoDiagnostic, Result};

use dockyard_core::FileStore;
use dockyard_kube::KubeGateway;

/// Open the file-backed application store under the user data dir
pub fn open_store() -> Result<FileStore> {
    let store_path = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("dockyard")
        .join("applications");

    FileStore::new(store_path).into_diagnostic()
}

/// Connect to the cluster via the default kubeconfig/in-cluster config
pub async fn connect() -> Result<KubeGateway> {
    KubeGateway::try_default().await.into_diagnostic()
}

/// Parse repeated KEY=VALUE flags into a JSON env object
pub fn parse_env_pairs(pairs: &[String]) -> Result<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(miette::miette!(
                "invalid env entry '{pair}': expected KEY=VALUE"
            ));
        };
        map.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }
    Ok(serde_json::Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_env_pairs_in_order() {
        let env = parse_env_pairs(&["A=1".to_string(), "B=two=three".to_string()]).unwrap();
        assert_eq!(env, json!({"A": "1", "B": "two=three"}));
    }

    #[test]
    fn rejects_entries_without_separator() {
        assert!(parse_env_pairs(&["MALFORMED".to_string()]).is_err());
    }
}
