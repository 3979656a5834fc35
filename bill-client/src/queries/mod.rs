pub mod bill_queries;

pub use bill_queries::*;
