mod games;
mod schema;
mod stats;

pub use games::*;
pub use schema::*;
pub use stats::*;
