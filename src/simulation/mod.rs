mod controller;
mod registry;
mod state;

pub use controller::*;
pub use registry::*;
pub use state::*;
