use crate::gameplay::Game;
use serde::Serialize;
use uuid::Uuid;

/// One message through the chat platform: text, an optional rendered
/// board, and an optional row of interactive controls. Editing a
/// message with `actions: None` strips its control row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
    pub fn with_board(mut self, board: String) -> Self {
        self.board = Some(board);
        self
    }
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = Some(actions);
        self
    }
}

/// The chat platform, reduced to what the dispatcher needs. Each
/// interaction is acknowledged exactly once with `send`; everything
/// after that goes through `edit`.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, trace: Uuid, reply: Reply);
    async fn edit(&self, trace: Uuid, reply: Reply);
}

/// The board image producer. Pure presentation; the service never
/// looks at what it returns.
pub trait Renderer: Send + Sync {
    fn render(&self, game: &Game) -> String;
}
