//! Inventory model for test infrastructure: the networks a test bed is wired
//! into, the hosts attached to them, and the registry tests use to find and
//! drive those hosts.

pub mod inventory;
