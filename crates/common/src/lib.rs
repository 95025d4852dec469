pub mod chain;
pub mod error;
pub mod units;

pub use chain::normalize_chain_name;
pub use error::UnitsError;
pub use units::*;
