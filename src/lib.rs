pub mod calc;
pub mod collator;
pub mod context;
pub mod error;
pub mod input;
pub mod ledger;
pub mod metrics;
pub mod types;

pub use error::{Error, Result};
