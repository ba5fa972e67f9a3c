/// Everything a handler can refuse with. `Display` is exactly the
/// sentence the gateway shows; anything unexpected hides behind
/// [`Fault::Internal`] and surfaces only in the logs.
#[derive(Debug)]
pub enum Fault {
    /// an option failed validation
    Option {
        name: &'static str,
        invalid: String,
        expected: &'static str,
    },
    /// unknown or missing subcommand
    SubCmd { name: String, expected: &'static str },
    /// command arrived without a user attached
    UserNotProvided,
    GameNotFound,
    InvalidMove(String),
    NotYourTurn,
    AlreadyPlaying,
    UnknownChallenge,
    Engine,
    Timeout,
    Internal(anyhow::Error),
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Option {
                name,
                invalid,
                expected,
            } => write!(
                f,
                "Invalid value '{}' for option {}: expected {}.",
                invalid, name, expected
            ),
            Self::SubCmd { name, expected } => {
                write!(f, "Unknown subcommand '{}': expected {}.", name, expected)
            }
            Self::UserNotProvided => write!(f, "Please invoke from a channel context."),
            Self::GameNotFound => write!(f, "You're not currently playing a game."),
            Self::InvalidMove(tile) => write!(f, "Can't make a move to {}.", tile),
            Self::NotYourTurn => write!(f, "It isn't your turn."),
            Self::AlreadyPlaying => write!(f, "You're already in a game."),
            Self::UnknownChallenge => {
                write!(f, "Cannot accept a challenge that does not exist.")
            }
            Self::Engine => write!(
                f,
                "Failed to retrieve analysis/simulation data from engine."
            ),
            Self::Timeout => write!(f, "Timed out while waiting for a response."),
            Self::Internal(_) => write!(f, "An unexpected error occurred."),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Fault {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl From<tokio_postgres::Error> for Fault {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Internal(e.into())
    }
}
