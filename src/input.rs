//! Input data from the chain.

pub mod chain;
