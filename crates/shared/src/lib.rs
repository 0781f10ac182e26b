//! Wire model shared between the surface client and its tooling.

pub mod domain;
pub mod error;
pub mod protocol;
