use super::tile::Tile;

/// notation for a pass, shared by the move-list codec and GGF
pub const PASS: &str = "PA";

/// One entry in a game's move history. A pass carries no tile and is
/// recorded only when the mover had no legal move while the opponent did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    tile: Tile,
    pass: bool,
}

impl Move {
    pub fn place(tile: Tile) -> Self {
        Self { tile, pass: false }
    }
    pub fn pass() -> Self {
        Self {
            tile: Tile::default(),
            pass: true,
        }
    }
    pub fn tile(&self) -> Tile {
        self.tile
    }
    pub fn is_pass(&self) -> bool {
        self.pass
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.pass {
            write!(f, "{}", PASS)
        } else {
            write!(f, "{}", self.tile)
        }
    }
}

impl TryFrom<&str> for Move {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.eq_ignore_ascii_case(PASS) {
            Ok(Self::pass())
        } else {
            Ok(Self::place(Tile::try_from(s)?))
        }
    }
}

/// comma-joined move history, no trailing separator
pub fn marshal_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(Move::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// inverse of [`marshal_moves`]; empty segments (trailing commas) are
/// rejected rather than silently decoded
pub fn unmarshal_moves(s: &str) -> anyhow::Result<Vec<Move>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(Move::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_round_trip() {
        let moves = vec![
            Move::place(Tile::new(2, 3)),
            Move::pass(),
            Move::place(Tile::new(5, 4)),
        ];
        let text = marshal_moves(&moves);
        assert_eq!(text, "d3,PA,e6");
        assert_eq!(unmarshal_moves(&text).unwrap(), moves);
    }

    #[test]
    fn empty_list() {
        assert_eq!(marshal_moves(&[]), "");
        assert_eq!(unmarshal_moves("").unwrap(), Vec::new());
    }

    #[test]
    fn trailing_comma_rejected() {
        assert!(unmarshal_moves("a1,").is_err());
        assert!(unmarshal_moves(",a1").is_err());
        assert!(unmarshal_moves("a1,,b2").is_err());
    }

    #[test]
    fn case_insensitive_pass() {
        assert_eq!(Move::try_from("pa").unwrap(), Move::pass());
        assert_eq!(Move::try_from("PA").unwrap(), Move::pass());
    }
}
