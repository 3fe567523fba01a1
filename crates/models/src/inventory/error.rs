use strum_macros::Display;
use thiserror::Error;

use crate::inventory::HostType;

/// What kind of record a lookup or uniqueness check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecordKind {
    #[strum(serialize = "host")]
    Host,
    #[strum(serialize = "network")]
    Network,
    #[strum(serialize = "cmc host")]
    Cmc,
    #[strum(serialize = "slave host")]
    Slave,
}

impl From<HostType> for RecordKind {
    fn from(value: HostType) -> Self {
        match value {
            HostType::Cmc => RecordKind::Cmc,
            HostType::Slave => RecordKind::Slave,
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("no {kind} named `{key}`")]
    Lookup { kind: RecordKind, key: String },

    #[error("no host with role `{0}` exists in this infra")]
    EmptyRoleSet(HostType),

    #[error("duplicate {kind} `{key}`")]
    DuplicateKey { kind: RecordKind, key: String },

    #[error("host `{hostname}` has more than one port on network `{network}`")]
    DuplicatePort { hostname: String, network: String },

    #[error("host `{hostname}` references network `{network}` which is not part of this infra")]
    DanglingNetworkReference { hostname: String, network: String },

    #[error("invalid CIDR `{value}`: {reason}")]
    InvalidCidr { value: String, reason: String },

    #[error("invalid IP address `{value}`: {source}")]
    InvalidAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("host `{0}` is not a cmc and has no provisioned SSH coordinates")]
    NotController(String),
}

impl InfraError {
    pub(crate) fn lookup(kind: impl Into<RecordKind>, key: impl Into<String>) -> Self {
        InfraError::Lookup {
            kind: kind.into(),
            key: key.into(),
        }
    }

    pub(crate) fn duplicate(kind: RecordKind, key: impl Into<String>) -> Self {
        InfraError::DuplicateKey {
            kind,
            key: key.into(),
        }
    }
}
