use ipnet::IpNet;
use std::{fmt, net::IpAddr, str::FromStr};

use crate::inventory::InfraError;

/// An IPv4 or IPv6 network block in `addr/prefix` notation.
///
/// The address is kept exactly as written, host bits included, so a block
/// prints back the way it was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr(IpNet);

impl Cidr {
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self, InfraError> {
        IpNet::new(addr, prefix_len)
            .map(Self)
            .map_err(|e| InfraError::InvalidCidr {
                value: format!("{addr}/{prefix_len}"),
                reason: e.to_string(),
            })
    }

    pub fn addr(&self) -> IpAddr {
        self.0.addr()
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Whether `ip` falls inside this block. Addresses of the other family
    /// are never contained.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.contains(&ip)
    }

    /// The block's network address, with host bits cleared.
    pub fn network(&self) -> IpAddr {
        self.0.network()
    }
}

impl FromStr for Cidr {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpNet>()
            .map(Self)
            .map_err(|e| InfraError::InvalidCidr {
                value: s.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl PartialEq<str> for Cidr {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Cidr {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parses_and_prints_v4_block() {
        let cidr: Cidr = "10.0.2.0/24".parse().unwrap();
        assert_eq!(cidr.prefix_len(), 24);
        assert_eq!(cidr.addr(), IpAddr::V4(Ipv4Addr::new(10, 0, 2, 0)));
        assert_eq!(cidr.to_string(), "10.0.2.0/24");
        assert!(cidr == "10.0.2.0/24");
    }

    #[test]
    fn parses_v6_block() {
        let cidr: Cidr = "fd00::/64".parse().unwrap();
        assert_eq!(cidr.prefix_len(), 64);
        assert!(cidr.contains("fd00::1".parse().unwrap()));
        assert!(!cidr.contains("fd01::1".parse().unwrap()));
    }

    #[test]
    fn rejects_malformed_blocks() {
        for bad in [
            "10.0.2.0",
            "10.0.2.0/33",
            "10.0.2/24",
            "site/24",
            "10.0.2.0/x",
            "10.0.2.0/+24",
            " 10.0.2.0/24\n",
            "10.0.2.0 /24",
            "",
        ] {
            let err = bad.parse::<Cidr>().unwrap_err();
            assert!(
                matches!(err, InfraError::InvalidCidr { ref value, .. } if value == bad),
                "unexpected error for {bad}: {err:?}"
            );
        }
    }

    #[test]
    fn oversized_prefix_is_rejected_by_new() {
        let err = Cidr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 2, 0)), 33).unwrap_err();
        assert!(matches!(err, InfraError::InvalidCidr { ref value, .. } if value == "10.0.2.0/33"));
    }

    #[test]
    fn membership_respects_prefix() {
        let cidr: Cidr = "10.142.0.0/24".parse().unwrap();
        assert!(cidr.contains("10.142.0.1".parse().unwrap()));
        assert!(cidr.contains("10.142.0.255".parse().unwrap()));
        assert!(!cidr.contains("10.142.1.1".parse().unwrap()));
        assert!(!cidr.contains("::1".parse().unwrap()));
    }

    #[test]
    fn zero_prefix_contains_everything_in_family() {
        let cidr: Cidr = "0.0.0.0/0".parse().unwrap();
        assert!(cidr.contains("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn network_clears_host_bits() {
        let cidr: Cidr = "10.0.2.15/24".parse().unwrap();
        assert_eq!(cidr.network(), IpAddr::V4(Ipv4Addr::new(10, 0, 2, 0)));
        assert_eq!(cidr.to_string(), "10.0.2.15/24");
    }

    proptest! {
        #[test]
        fn every_block_contains_its_own_address(raw in any::<u32>(), prefix_len in 0u8..=32) {
            let addr = IpAddr::V4(Ipv4Addr::from(raw));
            let cidr = Cidr::new(addr, prefix_len).unwrap();
            prop_assert!(cidr.contains(addr));
            prop_assert!(cidr.contains(cidr.network()));
        }
    }
}
