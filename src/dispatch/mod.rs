mod command;
mod console;
mod error;
mod gateway;
mod handler;

pub use command::*;
pub use console::*;
pub use error::*;
pub use gateway::*;
pub use handler::*;
