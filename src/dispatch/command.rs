use super::error::Fault;
use crate::othello::Tile;
use uuid::Uuid;

/// The user-facing command grammar, fully validated: levels sit in
/// 1..=5, delays in 1..=5 seconds, tiles match `[a-h][1-8]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChallengeUser { opponent: String },
    ChallengeBot { level: u8 },
    Accept { challenger: String },
    Forfeit,
    Move { tile: Tile },
    View,
    Analyze { level: u8 },
    Simulate { black: u8, white: u8, delay: u64 },
    Stats { player: Option<String> },
    Leaderboard,
    Ggf,
    Pause { id: Uuid },
    Resume { id: Uuid },
    Stop { id: Uuid },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, Fault> {
        let words = line.split_whitespace().collect::<Vec<_>>();
        match words.split_first() {
            Some((&"challenge", rest)) => match rest.split_first() {
                Some((&"user", args)) => Ok(Self::ChallengeUser {
                    opponent: required(args.first(), "opponent")?,
                }),
                Some((&"bot", args)) => Ok(Self::ChallengeBot {
                    level: level(args.first(), "level")?,
                }),
                other => Err(Fault::SubCmd {
                    name: other.map(|(w, _)| *w).unwrap_or_default().to_string(),
                    expected: "'user' or 'bot'",
                }),
            },
            Some((&"accept", args)) => Ok(Self::Accept {
                challenger: required(args.first(), "challenger")?,
            }),
            Some((&"forfeit", _)) => Ok(Self::Forfeit),
            Some((&"move", args)) => Ok(Self::Move {
                tile: tile(args.first())?,
            }),
            Some((&"view", _)) => Ok(Self::View),
            Some((&"analyze", args)) => Ok(Self::Analyze {
                level: level(args.first(), "level")?,
            }),
            Some((&"simulate", args)) => Ok(Self::Simulate {
                black: level(args.first(), "black-level")?,
                white: level(args.get(1), "white-level")?,
                delay: delay(args.get(2))?,
            }),
            Some((&"stats", args)) => Ok(Self::Stats {
                player: args.first().map(|s| s.to_string()),
            }),
            Some((&"leaderboard", _)) => Ok(Self::Leaderboard),
            Some((&"ggf", _)) => Ok(Self::Ggf),
            Some((&"pause", args)) => Ok(Self::Pause {
                id: simulation(args.first())?,
            }),
            Some((&"resume", args)) => Ok(Self::Resume {
                id: simulation(args.first())?,
            }),
            Some((&"stop", args)) => Ok(Self::Stop {
                id: simulation(args.first())?,
            }),
            other => Err(Fault::SubCmd {
                name: other.map(|(w, _)| *w).unwrap_or_default().to_string(),
                expected: "one of challenge, accept, forfeit, move, view, analyze, \
                           simulate, stats, leaderboard, ggf, pause, resume, stop",
            }),
        }
    }
}

fn required(arg: Option<&&str>, name: &'static str) -> Result<String, Fault> {
    arg.map(|s| s.to_string()).ok_or(Fault::Option {
        name,
        invalid: String::new(),
        expected: "a user reference",
    })
}

fn level(arg: Option<&&str>, name: &'static str) -> Result<u8, Fault> {
    match arg {
        None => Ok(crate::DEFAULT_LEVEL),
        Some(s) => s
            .parse::<u8>()
            .ok()
            .filter(|l| (crate::MIN_LEVEL..=crate::MAX_LEVEL).contains(l))
            .ok_or(Fault::Option {
                name,
                invalid: s.to_string(),
                expected: "a level between 1 and 5",
            }),
    }
}

fn delay(arg: Option<&&str>) -> Result<u64, Fault> {
    match arg {
        None => Ok(crate::DEFAULT_DELAY),
        Some(s) => s
            .parse::<u64>()
            .ok()
            .filter(|d| (crate::MIN_DELAY..=crate::MAX_DELAY).contains(d))
            .ok_or(Fault::Option {
                name: "delay",
                invalid: s.to_string(),
                expected: "a delay between 1 and 5 seconds",
            }),
    }
}

fn tile(arg: Option<&&str>) -> Result<Tile, Fault> {
    let s = arg.ok_or(Fault::Option {
        name: "tile",
        invalid: String::new(),
        expected: "a tile like d3",
    })?;
    Tile::try_from(*s).map_err(|_| Fault::Option {
        name: "tile",
        invalid: s.to_string(),
        expected: "a tile like d3",
    })
}

fn simulation(arg: Option<&&str>) -> Result<Uuid, Fault> {
    let s = arg.ok_or(Fault::Option {
        name: "simulation",
        invalid: String::new(),
        expected: "a simulation id",
    })?;
    Uuid::parse_str(s).map_err(|_| Fault::Option {
        name: "simulation",
        invalid: s.to_string(),
        expected: "a simulation id",
    })
}
