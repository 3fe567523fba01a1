use crate::inventory::{Cidr, InfraError};

/// A named network segment of the test bed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Network {
    name: String,
    cidr: Cidr,
}

impl Network {
    pub fn new(name: impl Into<String>, cidr: &str) -> Result<Self, InfraError> {
        Ok(Self::with_cidr(name, cidr.parse()?))
    }

    pub fn with_cidr(name: impl Into<String>, cidr: Cidr) -> Self {
        Self {
            name: name.into(),
            cidr,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cidr(&self) -> &Cidr {
        &self.cidr
    }
}
