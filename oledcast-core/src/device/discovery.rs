//! Locating the device service through its `coreProps.json` file.
//!
//! The vendor service writes its loopback address into a JSON file at a
//! platform-defined location. The first candidate that exists wins.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::OledError;

#[derive(Debug, Deserialize)]
struct CoreProps {
    address: Option<String>,
}

/// Platform default locations, most specific first.
pub fn default_core_props_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if cfg!(target_os = "windows") {
        let program_data = std::env::var_os("PROGRAMDATA")
            .map_or_else(|| PathBuf::from(r"C:\ProgramData"), PathBuf::from);
        let vendor = program_data.join("SteelSeries");
        paths.push(vendor.join("SteelSeries Engine 3").join("coreProps.json"));
        paths.push(vendor.join("GG").join("coreProps.json"));
    } else if cfg!(target_os = "macos") {
        let support = PathBuf::from("/Library/Application Support");
        paths.push(support.join("SteelSeries Engine 3").join("coreProps.json"));
        paths.push(support.join("SteelSeries GG").join("coreProps.json"));
    }

    paths
}

/// First candidate that exists on disk.
pub fn locate(candidates: &[PathBuf]) -> Option<&Path> {
    candidates.iter().map(PathBuf::as_path).find(|p| p.is_file())
}

/// Parse a discovery file into an `http://host:port` base URL.
pub async fn read_address(path: &Path) -> Result<String, OledError> {
    let text = tokio::fs::read_to_string(path).await?;
    let props: CoreProps =
        serde_json::from_str(&text).map_err(|e| OledError::InvalidDiscoveryFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    match props.address.map(|a| a.trim().to_string()) {
        Some(addr) if !addr.is_empty() => Ok(format!("http://{addr}")),
        _ => Err(OledError::InvalidDiscoveryFile {
            path: path.to_path_buf(),
            reason: "missing `address` field".into(),
        }),
    }
}

/// Locate and parse in one step.
pub async fn discover(candidates: &[PathBuf]) -> Result<String, OledError> {
    let path = locate(candidates).ok_or(OledError::DiscoveryFileMissing {
        searched: candidates.len(),
    })?;
    read_address(path).await
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[tokio::test]
    async fn reads_address_with_scheme_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"address":"127.0.0.1:51234","encrypted_address":"x"}"#;
        let p = write(&dir, "coreProps.json", body);
        assert_eq!(read_address(&p).await.unwrap(), "http://127.0.0.1:51234");
    }

    #[tokio::test]
    async fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let second = write(&dir, "b.json", r#"{"address":"127.0.0.1:2"}"#);
        let third = write(&dir, "c.json", r#"{"address":"127.0.0.1:3"}"#);

        let addr = discover(&[missing, second, third]).await.unwrap();
        assert_eq!(addr, "http://127.0.0.1:2");
    }

    #[tokio::test]
    async fn no_candidates_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&[dir.path().join("x.json")]).await.unwrap_err();
        assert!(matches!(err, OledError::DiscoveryFileMissing { searched: 1 }));
    }

    #[tokio::test]
    async fn missing_address_field_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "coreProps.json", r#"{"other":1}"#);
        assert!(matches!(
            read_address(&p).await,
            Err(OledError::InvalidDiscoveryFile { .. })
        ));

        let p = write(&dir, "broken.json", "not json");
        assert!(read_address(&p).await.is_err());
    }
}
