mod challenge;
mod users;

pub use challenge::*;
pub use users::*;
