use super::outcome::GameResult;
use super::player::Player;
use crate::dispatch::Fault;
use crate::othello;
use crate::othello::Board;
use crate::othello::Disc;
use crate::othello::Move;
use crate::othello::Tile;
use std::time::SystemTime;
use uuid::Uuid;

/// A live game between two participants, at most one of them on move.
///
/// The board is always reproducible by replaying `moves` from the
/// initial position; passes are recorded explicitly so the replay and
/// the GGF export stay aligned. Every mutation refreshes the expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    id: Uuid,
    board: Board,
    black: Player,
    white: Player,
    moves: Vec<Move>,
    expires: SystemTime,
}

impl Game {
    pub fn new(black: Player, white: Player) -> Self {
        Self {
            id: Uuid::now_v7(),
            board: Board::initial(),
            black,
            white,
            moves: Vec::new(),
            expires: SystemTime::now() + crate::GAME_TTL,
        }
    }
    /// rebuild a stored row
    pub fn restore(
        id: Uuid,
        board: Board,
        black: Player,
        white: Player,
        moves: Vec<Move>,
        expires: SystemTime,
    ) -> Self {
        Self {
            id,
            board,
            black,
            white,
            moves,
            expires,
        }
    }
}

impl Game {
    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn black(&self) -> &Player {
        &self.black
    }
    pub fn white(&self) -> &Player {
        &self.white
    }
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
    pub fn expires(&self) -> SystemTime {
        self.expires
    }
    /// the participant on move
    pub fn current(&self) -> &Player {
        if self.board.black_to_move() {
            &self.black
        } else {
            &self.white
        }
    }
    /// the participant waiting
    pub fn opponent(&self) -> &Player {
        if self.board.black_to_move() {
            &self.white
        } else {
            &self.black
        }
    }
    pub fn legal(&self) -> Vec<Tile> {
        self.board.moves()
    }
    pub fn is_over(&self) -> bool {
        self.board.is_over()
    }
}

impl Game {
    /// validate and apply a move on behalf of `player_id`
    pub fn advance(&mut self, player_id: &str, tile: Tile) -> Result<(), Fault> {
        if self.current().id() != player_id {
            return Err(Fault::NotYourTurn);
        }
        if !self.board.is_legal(tile) {
            return Err(Fault::InvalidMove(tile.to_string()));
        }
        self.apply(tile);
        Ok(())
    }
    /// apply a legal move, auto-appending the opponent's forced pass
    pub fn apply(&mut self, tile: Tile) {
        self.board = self.board.play(tile);
        self.moves.push(Move::place(tile));
        if self.board.must_pass() {
            self.board = self.board.pass();
            self.moves.push(Move::pass());
        }
        self.touch();
    }
    pub fn touch(&mut self) {
        self.expires = SystemTime::now() + crate::GAME_TTL;
    }
    /// disc-count verdict for a finished game
    pub fn result(&self) -> GameResult {
        let blacks = self.board.count(Disc::Black);
        let whites = self.board.count(Disc::White);
        if blacks > whites {
            GameResult::win(self.black.clone(), self.white.clone())
        } else if whites > blacks {
            GameResult::win(self.white.clone(), self.black.clone())
        } else {
            GameResult::draw(self.black.clone(), self.white.clone())
        }
    }
    /// verdict against the participant who walked away
    pub fn forfeit_by(&self, loser_id: &str) -> GameResult {
        if self.black.id() == loser_id {
            GameResult::win(self.white.clone(), self.black.clone())
        } else {
            GameResult::win(self.black.clone(), self.white.clone())
        }
    }
    /// replay the history from the initial position
    pub fn replay(&self) -> Board {
        self.moves.iter().fold(Board::initial(), |board, mv| {
            if mv.is_pass() {
                board.pass()
            } else {
                board.play(mv.tile())
            }
        })
    }
    pub fn ggf(&self) -> String {
        othello::ggf::marshal(self.black.name(), self.white.name(), &self.moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Game {
        Game::new(
            Player::human("1001", "alice"),
            Player::human("1002", "bob"),
        )
    }

    #[test]
    fn black_opens() {
        let game = fixture();
        assert_eq!(game.current().id(), "1001");
        assert_eq!(game.opponent().id(), "1002");
        assert!(!game.is_over());
    }

    #[test]
    fn turn_is_enforced() {
        let mut game = fixture();
        let tile = Tile::try_from("c4").unwrap();
        assert!(matches!(
            game.advance("1002", tile),
            Err(Fault::NotYourTurn)
        ));
        assert!(game.advance("1001", tile).is_ok());
        assert_eq!(game.current().id(), "1002");
    }

    #[test]
    fn legality_is_enforced() {
        let mut game = fixture();
        let tile = Tile::try_from("a1").unwrap();
        assert!(matches!(
            game.advance("1001", tile),
            Err(Fault::InvalidMove(_))
        ));
        assert!(game.moves().is_empty());
    }

    #[test]
    fn replay_matches_board() {
        let mut game = fixture();
        for (player, tile) in [("1001", "c4"), ("1002", "c3"), ("1001", "d3")] {
            game.advance(player, Tile::try_from(tile).unwrap()).unwrap();
            assert_eq!(game.replay(), *game.board());
        }
    }

    #[test]
    fn forced_pass_is_recorded() {
        // black a1 wipes out white's mobility (b2 flips) while white
        // keeps the b6/b7 pair, so a white pass must follow
        let mut board = Board::empty();
        board.place(Tile::new(2, 2), Disc::Black);
        board.place(Tile::new(7, 1), Disc::Black);
        board.place(Tile::new(1, 1), Disc::White);
        board.place(Tile::new(5, 1), Disc::White);
        board.place(Tile::new(6, 1), Disc::White);
        let mut game = Game::restore(
            Uuid::now_v7(),
            board,
            Player::human("1001", "alice"),
            Player::human("1002", "bob"),
            Vec::new(),
            SystemTime::now() + crate::GAME_TTL,
        );
        game.advance("1001", Tile::new(0, 0)).unwrap();
        assert_eq!(game.moves().len(), 2);
        assert!(game.moves()[1].is_pass());
        assert_eq!(game.current().id(), "1001");
        assert!(!game.is_over());
    }

    #[test]
    fn wipeout_ends_game() {
        // black e1 captures white's last disc; no pass is recorded
        let mut board = Board::empty();
        board.place(Tile::new(0, 2), Disc::Black);
        board.place(Tile::new(0, 3), Disc::White);
        let mut game = Game::restore(
            Uuid::now_v7(),
            board,
            Player::human("1001", "alice"),
            Player::human("1002", "bob"),
            Vec::new(),
            SystemTime::now() + crate::GAME_TTL,
        );
        game.advance("1001", Tile::new(0, 4)).unwrap();
        assert!(game.is_over());
        assert_eq!(game.moves().len(), 1);
        let result = game.result();
        assert!(!result.is_draw());
        assert_eq!(result.winner().id(), "1001");
    }

    #[test]
    fn forfeit_verdict() {
        let game = fixture();
        let result = game.forfeit_by("1001");
        assert_eq!(result.winner().id(), "1002");
        assert_eq!(result.loser().id(), "1001");
    }
}
