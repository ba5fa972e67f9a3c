mod game;
mod outcome;
mod player;

pub use game::*;
pub use outcome::*;
pub use player::*;
