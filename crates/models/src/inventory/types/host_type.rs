use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Role tag of a host within a test bed.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Debug,
    Hash,
    Copy,
    EnumString,
    Display,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
pub enum HostType {
    /// Controller node. Its SSH coordinates come from the provisioning backend.
    #[serde(rename = "cmc")]
    #[strum(serialize = "cmc")]
    Cmc,
    /// Worker node.
    #[serde(rename = "slave")]
    #[strum(serialize = "slave")]
    Slave,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    impl Arbitrary for HostType {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            prop_oneof![Just(HostType::Cmc), Just(HostType::Slave)].boxed()
        }
    }

    proptest! {
        #[test]
        fn display_parses_back(ty in any::<HostType>()) {
            prop_assert_eq!(HostType::from_str(&ty.to_string()).unwrap(), ty);
        }
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(HostType::from_str("switch").is_err());
    }
}
