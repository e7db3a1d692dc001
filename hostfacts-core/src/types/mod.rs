pub mod facts;
pub mod report;

pub use facts::*;
pub use report::*;
