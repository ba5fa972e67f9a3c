use crate::Heuristic;
use crate::othello::Tile;
use tokio::sync::oneshot;

/// The two questions the engine can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// one move, the engine's choice
    BestMove,
    /// every legal move with its evaluation
    RankedMoves,
}

/// A tile with the engine's scalar evaluation of playing it.
/// Positive favours Black, negative favours White.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredTile {
    pub tile: Tile,
    pub score: Heuristic,
}

impl std::fmt::Display for ScoredTile {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({:+.2})", self.tile, self.score)
    }
}

/// One unit of work for the shell worker. The reply channel receives
/// exactly one result and closes.
#[derive(Debug)]
pub(crate) struct Query {
    pub kind: Kind,
    pub ggf: String,
    pub depth: u8,
    pub reply: oneshot::Sender<anyhow::Result<Vec<ScoredTile>>>,
}
