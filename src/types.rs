//! Data types of the staking views.

pub mod account;
pub mod common;
pub mod global;
