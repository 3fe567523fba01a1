use glob::glob;
use std::path::Path;

use crate::{MultipleErrors, TopologyError, TopologyYaml};

/// Reads a single topology file.
pub fn load_topology(path: &Path) -> Result<TopologyYaml, TopologyError> {
    let path_str = path.display().to_string();

    let data = std::fs::read_to_string(path).map_err(|e| TopologyError::Io {
        path: path_str.clone(),
        source: e,
    })?;

    serde_yaml::from_str(&data).map_err(|e| TopologyError::Yaml {
        path: path_str,
        source: e,
    })
}

/// Reads and merges every `*.yaml` file below `dir`. Per-file failures are
/// collected rather than stopping at the first one.
pub fn load_topology_dir(dir: &Path) -> Result<TopologyYaml, TopologyError> {
    // path checks
    if !dir.exists() {
        return Err(TopologyError::IoPath {
            path: dir.to_path_buf(),
            message: "Path does not exist".into(),
        });
    }
    if !dir.is_dir() {
        return Err(TopologyError::IoPath {
            path: dir.to_path_buf(),
            message: "Path is not a directory".into(),
        });
    }

    let pattern = format!("{}/**/*.yaml", dir.display());

    let mut topology = TopologyYaml::default();
    let mut errors = Vec::new();

    for entry in glob(&pattern)? {
        match entry {
            Ok(path) => match load_topology(&path) {
                Ok(file) => {
                    tracing::debug!("Loaded topology file {}", path.display());
                    topology.merge(file);
                }
                Err(e) => errors.push(e),
            },
            Err(e) => errors.push(TopologyError::Glob(e)),
        }
    }

    if errors.is_empty() {
        Ok(topology)
    } else {
        Err(TopologyError::Multiple(MultipleErrors(errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const NETWORKS: &str = "networks:\n  - name: site\n    cidr: 10.0.2.0/24\n";
    const HOSTS: &str = "hosts:\n  - hostname: s1\n    type: slave\n    ports:\n      - network: site\n        ip: 10.0.2.16\n";

    #[test]
    fn merges_every_file_below_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("networks.yaml"), NETWORKS).unwrap();
        fs::create_dir(dir.path().join("hosts")).unwrap();
        fs::write(dir.path().join("hosts/s1.yaml"), HOSTS).unwrap();
        fs::write(dir.path().join("notes.txt"), "not yaml: [").unwrap();

        let topology = load_topology_dir(dir.path()).unwrap();

        assert_eq!(topology.networks.len(), 1);
        assert_eq!(topology.hosts.len(), 1);
        assert_eq!(topology.hosts[0].hostname, "s1");
    }

    #[test]
    fn collects_every_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "networks: {").unwrap();
        fs::write(dir.path().join("b.yaml"), "hosts: 3").unwrap();
        fs::write(dir.path().join("c.yaml"), NETWORKS).unwrap();

        match load_topology_dir(dir.path()).unwrap_err() {
            TopologyError::Multiple(MultipleErrors(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors
                    .iter()
                    .all(|e| matches!(e, TopologyError::Yaml { .. })));
            }
            other => panic!("expected aggregated errors, got {other}"),
        }
    }

    #[test]
    fn rejects_missing_and_non_dir_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lab.yaml");
        fs::write(&file, NETWORKS).unwrap();

        assert!(matches!(
            load_topology_dir(&dir.path().join("nope")),
            Err(TopologyError::IoPath { .. })
        ));
        assert!(matches!(
            load_topology_dir(&file),
            Err(TopologyError::IoPath { .. })
        ));
    }

    #[test]
    fn single_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");

        let err = load_topology(&missing).unwrap_err();
        assert!(matches!(err, TopologyError::Io { ref path, .. } if path.ends_with("missing.yaml")));

        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        fs::write(file.path(), "hosts: [").unwrap();
        assert!(matches!(
            load_topology(file.path()),
            Err(TopologyError::Yaml { .. })
        ));
    }
}
