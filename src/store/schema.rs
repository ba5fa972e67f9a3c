use const_format::concatcp;

/// Table for per-player ratings and win/draw/loss tallies.
pub const STATS: &str = "stats";
/// Table for in-progress games, one row per game.
pub const GAMES: &str = "games";

/// `expire_time` is epoch seconds; the sweeper compares it against
/// "now" without any timezone bookkeeping.
pub const CREATES: &str = concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    STATS,
    " (
        player_id   TEXT PRIMARY KEY,
        elo         FLOAT NOT NULL DEFAULT 1500,
        won         INT NOT NULL DEFAULT 0,
        drawn       INT NOT NULL DEFAULT 0,
        lost        INT NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS ",
    GAMES,
    " (
        id          TEXT PRIMARY KEY,
        board       TEXT NOT NULL,
        white_id    TEXT NOT NULL,
        black_id    TEXT NOT NULL,
        white_name  TEXT NOT NULL,
        black_name  TEXT NOT NULL,
        moves       TEXT NOT NULL,
        expire_time BIGINT NOT NULL
    );"
);

pub const INDICES: &str = concatcp!(
    "CREATE INDEX IF NOT EXISTS idx_stats_elo ON ",
    STATS,
    " (elo DESC);
    CREATE INDEX IF NOT EXISTS idx_games_expire_time ON ",
    GAMES,
    " (expire_time);
    CREATE INDEX IF NOT EXISTS idx_games_player_ids ON ",
    GAMES,
    " (white_id, black_id);"
);
