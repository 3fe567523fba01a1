use models::inventory::InfraError;
use thiserror::Error;

#[derive(Debug)]
pub struct MultipleErrors(pub Vec<TopologyError>);

impl std::fmt::Display for MultipleErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for error in &self.0 {
            writeln!(f, "   {}", error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("parsing YAML `{path}`: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("reading `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Glob(#[from] glob::GlobError),

    #[error("{0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid topology path `{path}`: {message}")]
    IoPath {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("host `{hostname}` has a port on undeclared network `{network}`")]
    UnknownNetwork { hostname: String, network: String },

    #[error("Error(s) encountered while attempting to parse topology files: \n {0} ")]
    Multiple(MultipleErrors),
}
