use super::schema;
use super::schema::GAMES;
use super::stats;
use super::stats::Exchange;
use crate::dispatch::Fault;
use crate::gameplay::Game;
use crate::gameplay::GameResult;
use crate::gameplay::MoveOutcome;
use crate::gameplay::Player;
use crate::othello;
use crate::othello::Board;
use crate::othello::Tile;
use const_format::concatcp;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;
use tokio::sync::Mutex;
use tokio_postgres::Client;
use tokio_postgres::IsolationLevel;
use tokio_postgres::Transaction;
use uuid::Uuid;

const COLUMNS: &str = "id, board, white_id, black_id, white_name, black_name, moves, expire_time";

const BY_PLAYER: &str = concatcp!(
    "SELECT ",
    COLUMNS,
    " FROM ",
    GAMES,
    " WHERE white_id = $1 OR black_id = $1"
);
const PLAYING: &str = concatcp!(
    "SELECT 1 FROM ",
    GAMES,
    " WHERE white_id = $1 OR black_id = $1"
);
const EXPIRED: &str = concatcp!(
    "SELECT ",
    COLUMNS,
    " FROM ",
    GAMES,
    " WHERE expire_time < $1"
);
const INSERT: &str = concatcp!(
    "INSERT INTO ",
    GAMES,
    " (",
    COLUMNS,
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
);
const UPDATE: &str = concatcp!(
    "UPDATE ",
    GAMES,
    " SET board = $2, moves = $3, expire_time = $4 WHERE id = $1"
);
const DELETE: &str = concatcp!("DELETE FROM ", GAMES, " WHERE id = $1");

/// Durable home of all active games and ratings.
///
/// Every state transition runs inside a SERIALIZABLE transaction; two
/// concurrent moves on the same game serialize through the database,
/// not through in-process locks. The single client is mutex-guarded
/// because transactions need exclusive use of the connection.
pub struct Store {
    client: Mutex<Client>,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
    pub(crate) fn client(&self) -> &Mutex<Client> {
        &self.client
    }
    /// create tables and indices
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let client = self.client.lock().await;
        client.batch_execute(schema::CREATES).await?;
        client.batch_execute(schema::INDICES).await?;
        Ok(())
    }
}

impl Store {
    /// Open a fresh game. Fails with `AlreadyPlaying` when any human
    /// participant already has a row; bots may appear in any number
    /// of games.
    pub async fn create_game(&self, black: Player, white: Player) -> Result<Game, Fault> {
        if black.id() == white.id() && !black.is_bot() {
            return Err(Fault::AlreadyPlaying);
        }
        let mut client = self.client.lock().await;
        let tx = serializable(&mut client).await?;
        for player in [&black, &white] {
            if player.is_bot() {
                continue;
            }
            if tx
                .query_opt(PLAYING, &[&player.id()])
                .await
                .map_err(anyhow::Error::from)?
                .is_some()
            {
                return Err(Fault::AlreadyPlaying);
            }
        }
        let game = Game::new(black, white);
        Self::insert(&tx, &game).await.map_err(Fault::from)?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        log::info!(
            "created game {} ({} vs {})",
            game.id(),
            game.black(),
            game.white()
        );
        Ok(game)
    }

    /// the single game `player_id` participates in
    pub async fn game_of(&self, player_id: &str) -> Result<Game, Fault> {
        let client = self.client.lock().await;
        let row = client
            .query_opt(BY_PLAYER, &[&player_id])
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(Fault::GameNotFound)?;
        decode(&row).map_err(Fault::from)
    }

    /// Validate and apply one human move. The bot continuation is
    /// returned unpersisted: the caller finishes the engine's moves
    /// synchronously and calls [`update_game`](Self::update_game).
    pub async fn make_move(&self, player_id: &str, tile: Tile) -> Result<MoveOutcome, Fault> {
        let mut client = self.client.lock().await;
        let tx = serializable(&mut client).await?;
        let row = tx
            .query_opt(BY_PLAYER, &[&player_id])
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(Fault::GameNotFound)?;
        let mut game = decode(&row).map_err(Fault::from)?;
        game.advance(player_id, tile)?;
        if game.is_over() {
            let result = game.result();
            let exchange = Self::finish(&tx, &game, &result).await.map_err(Fault::from)?;
            tx.commit().await.map_err(anyhow::Error::from)?;
            return Ok(MoveOutcome::Over(game, result, exchange));
        }
        if game.current().is_bot() {
            tx.rollback().await.map_err(anyhow::Error::from)?;
            return Ok(MoveOutcome::BotTurn(game));
        }
        Self::persist(&tx, &game).await.map_err(Fault::from)?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(MoveOutcome::Completed(game))
    }

    /// Persist a game the bot path advanced in memory, or settle it
    /// if the engine's moves ended it.
    pub async fn update_game(&self, game: Game) -> Result<MoveOutcome, Fault> {
        let mut client = self.client.lock().await;
        let tx = serializable(&mut client).await?;
        if game.is_over() {
            let result = game.result();
            let exchange = Self::finish(&tx, &game, &result).await.map_err(Fault::from)?;
            tx.commit().await.map_err(anyhow::Error::from)?;
            return Ok(MoveOutcome::Over(game, result, exchange));
        }
        Self::persist(&tx, &game).await.map_err(Fault::from)?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(MoveOutcome::Completed(game))
    }

    /// End the caller's game in the opponent's favour.
    pub async fn forfeit(&self, player_id: &str) -> Result<(GameResult, Exchange), Fault> {
        let mut client = self.client.lock().await;
        let tx = serializable(&mut client).await?;
        let row = tx
            .query_opt(BY_PLAYER, &[&player_id])
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(Fault::GameNotFound)?;
        let game = decode(&row).map_err(Fault::from)?;
        let result = game.forfeit_by(player_id);
        let exchange = Self::finish(&tx, &game, &result).await.map_err(Fault::from)?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        log::info!("forfeited game {}: {}", game.id(), result);
        Ok((result, exchange))
    }

    /// Sweep rows past their expiry. The side on move is considered
    /// to have abandoned the game and loses.
    pub async fn expire(&self) -> Result<usize, Fault> {
        let now = epoch(SystemTime::now());
        let mut client = self.client.lock().await;
        let tx = serializable(&mut client).await?;
        let rows = tx
            .query(EXPIRED, &[&now])
            .await
            .map_err(anyhow::Error::from)?;
        for row in rows.iter() {
            let game = decode(row).map_err(Fault::from)?;
            let result = GameResult::win(game.opponent().clone(), game.current().clone());
            Self::finish(&tx, &game, &result).await.map_err(Fault::from)?;
            log::info!("expired game {}: {}", game.id(), result);
        }
        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(rows.len())
    }
}

impl Store {
    /// delete the row and move ratings, atomically with the caller
    async fn finish(
        tx: &Transaction<'_>,
        game: &Game,
        result: &GameResult,
    ) -> anyhow::Result<Exchange> {
        tx.execute(DELETE, &[&game.id().to_string()]).await?;
        stats::update(tx, result).await
    }
    async fn insert(tx: &Transaction<'_>, game: &Game) -> anyhow::Result<()> {
        tx.execute(
            INSERT,
            &[
                &game.id().to_string(),
                &game.board().marshal(),
                &game.white().id(),
                &game.black().id(),
                &game.white().name(),
                &game.black().name(),
                &othello::marshal_moves(game.moves()),
                &epoch(game.expires()),
            ],
        )
        .await?;
        Ok(())
    }
    async fn persist(tx: &Transaction<'_>, game: &Game) -> anyhow::Result<()> {
        tx.execute(
            UPDATE,
            &[
                &game.id().to_string(),
                &game.board().marshal(),
                &othello::marshal_moves(game.moves()),
                &epoch(game.expires()),
            ],
        )
        .await?;
        Ok(())
    }
}

async fn serializable(client: &mut Client) -> Result<Transaction<'_>, Fault> {
    client
        .build_transaction()
        .isolation_level(IsolationLevel::Serializable)
        .start()
        .await
        .map_err(anyhow::Error::from)
        .map_err(Fault::from)
}

fn epoch(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

fn decode(row: &tokio_postgres::Row) -> anyhow::Result<Game> {
    let id = Uuid::parse_str(row.get(0))?;
    let board = Board::unmarshal(row.get(1))?;
    let white = Player::from_columns(row.get(2), row.get(4));
    let black = Player::from_columns(row.get(3), row.get(5));
    let moves = othello::unmarshal_moves(row.get(6))?;
    let secs: i64 = row.get(7);
    let expires = UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64);
    Ok(Game::restore(id, board, black, white, moves, expires))
}
