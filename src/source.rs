use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::StatsError;

/// Ranking criterion for the top-anime panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Episodes,
    Size,
}

/// One backend summary. Each refresh fetches all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Overview,
    Resolution,
    Codec,
    Hdr,
    Container,
    TopAnimes(SortKey),
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Overview,
        Endpoint::Resolution,
        Endpoint::Codec,
        Endpoint::Hdr,
        Endpoint::Container,
        Endpoint::TopAnimes(SortKey::Episodes),
        Endpoint::TopAnimes(SortKey::Size),
    ];

    /// File holding this summary inside a snapshot directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Endpoint::Overview => "stats.json",
            Endpoint::Resolution => "resolution.json",
            Endpoint::Codec => "codec.json",
            Endpoint::Hdr => "hdr.json",
            Endpoint::Container => "container.json",
            Endpoint::TopAnimes(SortKey::Episodes) => "top_animes_episodes.json",
            Endpoint::TopAnimes(SortKey::Size) => "top_animes_size.json",
        }
    }
}

/// Delivers raw backend payloads. Failures are reported as `TransportFailure`.
pub trait PayloadSource {
    fn fetch(&self, endpoint: Endpoint) -> Result<Value, StatsError>;
}

/// Reads payloads saved as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl PayloadSource for DirectorySource {
    fn fetch(&self, endpoint: Endpoint) -> Result<Value, StatsError> {
        let path = self.root.join(endpoint.file_name());
        debug!(?endpoint, path = %path.display(), "fetching payload");

        let text = fs::read_to_string(&path)
            .map_err(|e| StatsError::TransportFailure(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| StatsError::TransportFailure(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("codec.json"), r#"{"distribution": {"AV1": 2}}"#).unwrap();

        let source = DirectorySource::new(dir.path());
        let payload = source.fetch(Endpoint::Codec).unwrap();
        assert_eq!(payload["distribution"]["AV1"], 2);
    }

    #[test]
    fn test_missing_file_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(matches!(
            source.fetch(Endpoint::Hdr),
            Err(StatsError::TransportFailure(_))
        ));
    }

    #[test]
    fn test_bad_json_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stats.json"), "<html>502</html>").unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(matches!(
            source.fetch(Endpoint::Overview),
            Err(StatsError::TransportFailure(_))
        ));
    }

    #[test]
    fn test_file_names_are_distinct() {
        let mut names: Vec<_> = Endpoint::ALL.iter().map(|e| e.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Endpoint::ALL.len());
    }
}
