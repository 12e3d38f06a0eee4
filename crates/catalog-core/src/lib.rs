pub mod errors;
pub mod model;
pub mod planner;
pub mod query;

pub use errors::*;
pub use model::*;
pub use planner::*;
pub use query::*;
