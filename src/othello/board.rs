use super::tile::Tile;

/// A placed disc. Black discs count positive in engine heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disc {
    Black,
    White,
}

const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Full game position in between moves.
///
/// Two disc bitboards (bit index row * 8 + col) plus the side to move.
/// The immutable methods are pure functions representing the rules of
/// how play may proceed; `play` and `pass` return child positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    black: u64,
    white: u64,
    black_move: bool,
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            black: 0,
            white: 0,
            black_move: true,
        }
    }
    /// starting pattern: white d4/e5, black e4/d5, black to move
    pub fn initial() -> Self {
        let mut board = Self::empty();
        board.place(Tile::new(3, 3), Disc::White);
        board.place(Tile::new(3, 4), Disc::Black);
        board.place(Tile::new(4, 3), Disc::Black);
        board.place(Tile::new(4, 4), Disc::White);
        board
    }
    pub fn black_to_move(&self) -> bool {
        self.black_move
    }
    pub fn set_black_to_move(&mut self, black_move: bool) {
        self.black_move = black_move;
    }
    pub fn at(&self, tile: Tile) -> Option<Disc> {
        if self.black & tile.to_bits() != 0 {
            Some(Disc::Black)
        } else if self.white & tile.to_bits() != 0 {
            Some(Disc::White)
        } else {
            None
        }
    }
    /// overwrite a cell. setup and deserialization only; not a move.
    pub fn place(&mut self, tile: Tile, disc: Disc) {
        match disc {
            Disc::Black => {
                self.black |= tile.to_bits();
                self.white &= !tile.to_bits();
            }
            Disc::White => {
                self.white |= tile.to_bits();
                self.black &= !tile.to_bits();
            }
        }
    }
    pub fn count(&self, disc: Disc) -> u32 {
        match disc {
            Disc::Black => self.black.count_ones(),
            Disc::White => self.white.count_ones(),
        }
    }
}

impl Board {
    /// legal tiles for the side to move, row-major
    pub fn moves(&self) -> Vec<Tile> {
        (0..64)
            .map(Tile::from)
            .filter(|t| self.flips(*t) != 0)
            .collect()
    }
    pub fn is_legal(&self, tile: Tile) -> bool {
        self.flips(tile) != 0
    }
    /// the mover has no legal move but the opponent still has one
    pub fn must_pass(&self) -> bool {
        self.moves().is_empty() && !self.pass().moves().is_empty()
    }
    pub fn is_over(&self) -> bool {
        self.moves().is_empty() && self.pass().moves().is_empty()
    }
    /// child position after the side to move places on `tile`
    pub fn play(&self, tile: Tile) -> Self {
        debug_assert!(self.is_legal(tile), "illegal move {}", tile);
        self.force(tile)
    }
    /// like [`play`](Self::play) but with no legality requirement: the
    /// mover's disc is placed and whatever runs it flanks are flipped.
    /// deserialization and fixture setup only.
    pub fn force(&self, tile: Tile) -> Self {
        let flips = self.flips(tile);
        let mut next = *self;
        if next.black_move {
            next.black |= tile.to_bits() | flips;
            next.white &= !flips;
        } else {
            next.white |= tile.to_bits() | flips;
            next.black &= !flips;
        }
        next.black_move = !next.black_move;
        next
    }
    /// child position after a pass; discs are untouched
    pub fn pass(&self) -> Self {
        Self {
            black_move: !self.black_move,
            ..*self
        }
    }
    /// bitmask of opposing discs captured by playing `tile`; 0 iff illegal
    fn flips(&self, tile: Tile) -> u64 {
        if self.at(tile).is_some() {
            return 0;
        }
        let (mine, theirs) = if self.black_move {
            (self.black, self.white)
        } else {
            (self.white, self.black)
        };
        let mut flipped = 0u64;
        for (dr, dc) in DIRECTIONS {
            let mut run = 0u64;
            let mut row = tile.row() as i8 + dr;
            let mut col = tile.col() as i8 + dc;
            while (0..8).contains(&row) && (0..8).contains(&col) {
                let bit = 1u64 << (row * 8 + col);
                if theirs & bit != 0 {
                    run |= bit;
                } else {
                    if mine & bit != 0 {
                        flipped |= run;
                    }
                    break;
                }
                row += dr;
                col += dc;
            }
        }
        flipped
    }
}

impl Board {
    /// text form: side marker, '+', then a left-to-right top-to-bottom
    /// scan of all 64 cells with runs of empties as decimal counts
    pub fn marshal(&self) -> String {
        let mut s = String::from(if self.black_move { "b+" } else { "w+" });
        let mut empties = 0;
        for n in 0..64u8 {
            match self.at(Tile::from(n)) {
                None => empties += 1,
                Some(disc) => {
                    if empties > 0 {
                        s.push_str(&empties.to_string());
                        empties = 0;
                    }
                    s.push(match disc {
                        Disc::Black => 'b',
                        Disc::White => 'w',
                    });
                }
            }
        }
        if empties > 0 {
            s.push_str(&empties.to_string());
        }
        s
    }
    pub fn unmarshal(s: &str) -> anyhow::Result<Self> {
        let (side, body) = s
            .split_once('+')
            .ok_or_else(|| anyhow::anyhow!("missing side marker in board text: {}", s))?;
        let mut board = Self::empty();
        board.black_move = match side {
            "b" => true,
            "w" => false,
            _ => anyhow::bail!("invalid side marker in board text: {}", side),
        };
        let mut cell = 0usize;
        let mut run = 0usize;
        for c in body.chars() {
            match c {
                '0'..='9' => run = run * 10 + (c as usize - '0' as usize),
                'b' | 'w' => {
                    cell += run;
                    run = 0;
                    if cell >= 64 {
                        anyhow::bail!("board text overflows 64 cells: {}", s);
                    }
                    let disc = if c == 'b' { Disc::Black } else { Disc::White };
                    board.place(Tile::from(cell as u8), disc);
                    cell += 1;
                }
                _ => anyhow::bail!("invalid character '{}' in board text: {}", c, s),
            }
        }
        cell += run;
        if cell != 64 {
            anyhow::bail!("board text covers {} of 64 cells: {}", cell, s);
        }
        Ok(board)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "  a b c d e f g h")?;
        for row in 0..8u8 {
            write!(f, "{}", row + 1)?;
            for col in 0..8u8 {
                match self.at(Tile::new(row, col)) {
                    Some(Disc::Black) => write!(f, " b")?,
                    Some(Disc::White) => write!(f, " w")?,
                    None => write!(f, " .")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tiles: &[Tile]) -> Vec<String> {
        let mut v = tiles.iter().map(Tile::to_string).collect::<Vec<_>>();
        v.sort();
        v
    }

    #[test]
    fn initial_pattern() {
        let board = Board::initial();
        assert_eq!(board.at(Tile::new(3, 3)), Some(Disc::White));
        assert_eq!(board.at(Tile::new(3, 4)), Some(Disc::Black));
        assert_eq!(board.at(Tile::new(4, 3)), Some(Disc::Black));
        assert_eq!(board.at(Tile::new(4, 4)), Some(Disc::White));
        assert_eq!(board.count(Disc::Black), 2);
        assert_eq!(board.count(Disc::White), 2);
        assert!(board.black_to_move());
    }

    #[test]
    fn initial_legal_moves() {
        let board = Board::initial();
        assert_eq!(names(&board.moves()), vec!["c4", "d3", "e6", "f5"]);
    }

    #[test]
    fn replies_after_c4() {
        let board = Board::initial().play(Tile::try_from("c4").unwrap());
        assert!(!board.black_to_move());
        assert_eq!(board.at(Tile::new(3, 3)), Some(Disc::Black));
        assert_eq!(names(&board.moves()), vec!["c3", "c5", "e3"]);
    }

    #[test]
    fn replies_after_c4_c3() {
        let board = Board::initial()
            .play(Tile::try_from("c4").unwrap())
            .play(Tile::try_from("c3").unwrap());
        assert_eq!(board.at(Tile::new(3, 3)), Some(Disc::White));
        assert_eq!(names(&board.moves()), vec!["c2", "d3", "e6", "f5"]);
    }

    #[test]
    fn no_cell_reverts_to_empty() {
        let mut board = Board::initial();
        let mut occupied = 4u32;
        while let Some(tile) = board.moves().first().copied() {
            board = board.play(tile);
            if board.must_pass() {
                board = board.pass();
            }
            let count = board.count(Disc::Black) + board.count(Disc::White);
            assert_eq!(count, occupied + 1);
            occupied = count;
            if board.is_over() {
                break;
            }
        }
        assert!(occupied > 4);
    }

    #[test]
    fn marshal_initial() {
        assert_eq!(Board::initial().marshal(), "b+27wb6bw27");
    }

    #[test]
    fn marshal_corner_discs() {
        let mut board = Board::initial();
        board.place(Tile::new(0, 0), Disc::Black);
        board.place(Tile::new(0, 1), Disc::Black);
        board.place(Tile::new(1, 0), Disc::White);
        board.place(Tile::new(1, 1), Disc::White);
        assert_eq!(board.marshal(), "b+bb6ww17wb6bw27");
        assert_eq!(Board::unmarshal("b+bb6ww17wb6bw27").unwrap(), board);
    }

    #[test]
    fn marshal_round_trip() {
        let mut board = Board::initial();
        for tile in ["c4", "c3", "d3"] {
            board = board.play(Tile::try_from(tile).unwrap());
            let text = board.marshal();
            assert_eq!(Board::unmarshal(&text).unwrap(), board);
        }
    }

    #[test]
    fn unmarshal_rejects_garbage() {
        assert!(Board::unmarshal("27wb6bw27").is_err());
        assert!(Board::unmarshal("x+27wb6bw27").is_err());
        assert!(Board::unmarshal("b+27wb6bw28").is_err());
        assert!(Board::unmarshal("b+64b").is_err());
        assert!(Board::unmarshal("b+27zb6bw27").is_err());
    }

    #[test]
    fn forced_pass() {
        let board = Board::unmarshal("w+wbbw60").unwrap();
        assert!(board.moves().is_empty());
        assert!(board.must_pass());
        assert!(!board.is_over());
        let passed = board.pass();
        assert!(passed.black_to_move());
        assert!(names(&passed.moves()).contains(&"e1".to_string()));
    }

    #[test]
    fn dead_position() {
        let board = Board::unmarshal("b+b62w").unwrap();
        assert!(board.is_over());
        assert!(!board.must_pass());
        assert_eq!(board.count(Disc::Black), board.count(Disc::White));
    }
}
