pub mod amount;
pub mod parser;
pub mod payload;
pub mod statements;

pub use parser::parse_cma;
pub use statements::{CmaModel, TrustTier, YearData};
