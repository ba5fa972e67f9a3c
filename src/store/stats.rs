use super::games::Store;
use super::schema::STATS;
use crate::Elo;
use crate::dispatch::Fault;
use crate::gameplay::GameResult;
use crate::gameplay::Player;
use crate::lobby::Users;
use const_format::concatcp;
use tokio_postgres::Transaction;

/// One rating row. Players appear here the first time a game of
/// theirs completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub player_id: String,
    pub elo: Elo,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
}

impl Stats {
    pub fn fresh(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            elo: crate::ELO_INITIAL,
            won: 0,
            drawn: 0,
            lost: 0,
        }
    }
}

impl From<&tokio_postgres::Row> for Stats {
    fn from(row: &tokio_postgres::Row) -> Self {
        Self {
            player_id: row.get(0),
            elo: row.get(1),
            won: row.get(2),
            drawn: row.get(3),
            lost: row.get(4),
        }
    }
}

/// Rating deltas applied by one result; zero for draws.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Exchange {
    pub winner: Elo,
    pub loser: Elo,
}

/// Expected score of `rating` against `opponent`.
fn expectancy(rating: Elo, opponent: Elo) -> Elo {
    1. / (1. + (10 as Elo).powf((opponent - rating) / 400.))
}

/// Rating movement for a decisive result. The winner is evaluated
/// first and the loser's expectancy uses the winner's updated rating,
/// matching the engine room's historical ledger tick for tick.
pub fn exchange(winner: Elo, loser: Elo) -> Exchange {
    let won = crate::ELO_K * (1. - expectancy(winner, loser));
    let lost = crate::ELO_K * expectancy(loser, winner + won);
    Exchange {
        winner: won,
        loser: -lost,
    }
}

/// A leaderboard row with its display name resolved.
#[derive(Debug, Clone)]
pub struct Standing {
    pub name: String,
    pub stats: Stats,
}

const SELECT: &str = concatcp!(
    "SELECT player_id, elo, won, drawn, lost ",
    "FROM   ",
    STATS,
    " ",
    "WHERE  player_id = $1"
);
const BOOTSTRAP: &str = concatcp!(
    "INSERT INTO ",
    STATS,
    " (player_id, elo, won, drawn, lost) ",
    "VALUES ($1, 1500, 0, 0, 0) ",
    "ON CONFLICT (player_id) DO NOTHING"
);
const TOP: &str = concatcp!(
    "SELECT player_id, elo, won, drawn, lost ",
    "FROM   ",
    STATS,
    " ",
    "ORDER BY elo DESC ",
    "LIMIT  $1"
);
const DRAWN: &str = concatcp!(
    "UPDATE ",
    STATS,
    " SET drawn = drawn + 1 WHERE player_id = $1"
);
const WON: &str = concatcp!(
    "UPDATE ",
    STATS,
    " SET elo = $2, won = won + 1 WHERE player_id = $1"
);
const LOST: &str = concatcp!(
    "UPDATE ",
    STATS,
    " SET elo = $2, lost = lost + 1 WHERE player_id = $1"
);

/// Apply `result` inside the caller's transaction. Draws and the
/// degenerate self-result move no rating.
pub(crate) async fn update(tx: &Transaction<'_>, result: &GameResult) -> anyhow::Result<Exchange> {
    let winner = bootstrap(tx, result.winner().id()).await?;
    let loser = bootstrap(tx, result.loser().id()).await?;
    if winner.player_id == loser.player_id {
        return Ok(Exchange::default());
    }
    if result.is_draw() {
        tx.execute(DRAWN, &[&winner.player_id]).await?;
        tx.execute(DRAWN, &[&loser.player_id]).await?;
        return Ok(Exchange::default());
    }
    let delta = exchange(winner.elo, loser.elo);
    tx.execute(WON, &[&winner.player_id, &(winner.elo + delta.winner)])
        .await?;
    tx.execute(LOST, &[&loser.player_id, &(loser.elo + delta.loser)])
        .await?;
    Ok(delta)
}

/// Read a row inside the transaction, inserting the 1500 default first.
async fn bootstrap(tx: &Transaction<'_>, player_id: &str) -> anyhow::Result<Stats> {
    tx.execute(BOOTSTRAP, &[&player_id]).await?;
    Ok(Stats::from(&tx.query_one(SELECT, &[&player_id]).await?))
}

// rating reads
impl Store {
    /// a player's card, defaulted when they have not finished a game
    pub async fn stats(&self, player_id: &str) -> Result<Stats, Fault> {
        let client = self.client().lock().await;
        Ok(client
            .query_opt(SELECT, &[&player_id])
            .await
            .map_err(anyhow::Error::from)?
            .as_ref()
            .map(Stats::from)
            .unwrap_or_else(|| Stats::fresh(player_id)))
    }

    /// top `n` rows by rating, display names resolved concurrently;
    /// the first failed lookup cancels the rest
    pub async fn leaderboard(&self, users: &Users, n: i64) -> Result<Vec<Standing>, Fault> {
        let rows = {
            let client = self.client().lock().await;
            client
                .query(TOP, &[&n])
                .await
                .map_err(anyhow::Error::from)?
        };
        let stats = rows.iter().map(Stats::from).collect::<Vec<_>>();
        let names = futures::future::try_join_all(stats.iter().map(|s| resolve(users, s)))
            .await
            .map_err(Fault::from)?;
        Ok(names
            .into_iter()
            .zip(stats)
            .map(|(name, stats)| Standing { name, stats })
            .collect())
    }
}

async fn resolve(users: &Users, stats: &Stats) -> anyhow::Result<String> {
    match stats.player_id.parse::<u8>() {
        Ok(level) if (crate::MIN_LEVEL..=crate::MAX_LEVEL).contains(&level) => {
            Ok(Player::bot(level).name().to_string())
        }
        _ => Ok(users.player(&stats.player_id).await?.name().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_match_tick() {
        let delta = exchange(1500., 1500.);
        assert_eq!(delta.winner.round(), 15.);
        assert_eq!(delta.loser.round(), -14.);
        assert_eq!((1500. + delta.winner).round(), 1515.);
        assert_eq!((1500. + delta.loser).round(), 1486.);
    }

    #[test]
    fn underdog_gains_more() {
        let upset = exchange(1400., 1600.);
        let expected = exchange(1600., 1400.);
        assert!(upset.winner > expected.winner);
        assert!(upset.loser < expected.loser);
    }

    #[test]
    fn near_conservation() {
        for (a, b) in [(1500., 1500.), (1650., 1430.), (1200., 1900.)] {
            let delta = exchange(a, b);
            let drift = delta.winner + delta.loser;
            assert!(drift >= 0.);
            assert!(drift < 1.5, "drift {} too large", drift);
        }
    }

    #[test]
    fn fresh_card() {
        let stats = Stats::fresh("1001");
        assert_eq!(stats.elo, 1500.);
        assert_eq!(stats.won + stats.drawn + stats.lost, 0);
    }
}
