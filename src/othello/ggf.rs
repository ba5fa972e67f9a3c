use super::board::Board;
use super::board::Disc;
use super::moves::Move;
use super::moves::PASS;
use super::tile::Tile;

/// A game record lifted out of its GGF text form.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub black: String,
    pub white: String,
    pub moves: Vec<Move>,
    pub board: Board,
}

/// GGF text for a game: player names, the starting position, and the
/// alternating move tags (black first, `PA` for passes).
pub fn marshal(black: &str, white: &str, moves: &[Move]) -> String {
    let mut s = String::from("(;GM[Othello]");
    s.push_str(&format!("PB[{}]", black));
    s.push_str(&format!("PW[{}]", white));
    s.push_str("TY[8]BO[8 ");
    let start = Board::initial();
    for n in 0..64u8 {
        s.push(match start.at(Tile::from(n)) {
            Some(Disc::Black) => '*',
            Some(Disc::White) => 'O',
            None => '-',
        });
    }
    s.push_str(" *]");
    for (n, mv) in moves.iter().enumerate() {
        let tag = if n % 2 == 0 { 'B' } else { 'W' };
        let token = if mv.is_pass() {
            PASS.to_string()
        } else {
            mv.tile().notation()
        };
        s.push_str(&format!("{}[{}]", tag, token));
    }
    s.push_str(";)");
    s
}

/// Inverse of [`marshal`]. The final board is rebuilt by replaying the
/// move tags over the recorded starting position; moves are applied by
/// placement so historic records with setup moves survive the trip.
pub fn unmarshal(s: &str) -> anyhow::Result<Record> {
    let body = s
        .strip_prefix("(;")
        .and_then(|b| b.strip_suffix(";)"))
        .ok_or_else(|| anyhow::anyhow!("not a GGF record: {}", s))?;
    let mut black = None;
    let mut white = None;
    let mut board = None;
    let mut moves = Vec::new();
    for (tag, value) in tags(body)? {
        match tag.as_str() {
            "GM" if value != "Othello" => anyhow::bail!("not an Othello record: {}", value),
            "PB" => black = Some(value),
            "PW" => white = Some(value),
            "BO" => board = Some(position(&value)?),
            "B" | "W" => moves.push((tag == "B", Move::try_from(value.as_str())?)),
            _ => continue,
        }
    }
    let mut board = board.ok_or_else(|| anyhow::anyhow!("GGF record without BO tag"))?;
    for (is_black, mv) in moves.iter() {
        board = match mv.is_pass() {
            true => board.pass(),
            false => {
                let mut side = board;
                side.set_black_to_move(*is_black);
                side.force(mv.tile())
            }
        };
    }
    Ok(Record {
        black: black.ok_or_else(|| anyhow::anyhow!("GGF record without PB tag"))?,
        white: white.ok_or_else(|| anyhow::anyhow!("GGF record without PW tag"))?,
        moves: moves.into_iter().map(|(_, mv)| mv).collect(),
        board,
    })
}

/// split `TAG[value]TAG[value]...` into pairs
fn tags(body: &str) -> anyhow::Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let open = rest
            .find('[')
            .ok_or_else(|| anyhow::anyhow!("unbalanced GGF tag in: {}", rest))?;
        let close = rest[open..]
            .find(']')
            .map(|n| open + n)
            .ok_or_else(|| anyhow::anyhow!("unbalanced GGF tag in: {}", rest))?;
        pairs.push((
            rest[..open].trim().to_string(),
            rest[open + 1..close].to_string(),
        ));
        rest = &rest[close + 1..];
    }
    Ok(pairs)
}

/// decode a `BO[8 <64 cells> <side>]` value
fn position(value: &str) -> anyhow::Result<Board> {
    let mut words = value.split_whitespace();
    match words.next() {
        Some("8") => {}
        other => anyhow::bail!("unsupported board size: {:?}", other),
    }
    let cells = words
        .next()
        .ok_or_else(|| anyhow::anyhow!("BO tag without cells: {}", value))?;
    let side = words
        .next()
        .ok_or_else(|| anyhow::anyhow!("BO tag without side marker: {}", value))?;
    if cells.chars().count() != 64 {
        anyhow::bail!("BO tag with {} cells: {}", cells.chars().count(), value);
    }
    let mut board = Board::empty();
    for (n, c) in cells.chars().enumerate() {
        match c {
            '*' => board.place(Tile::from(n as u8), Disc::Black),
            'O' => board.place(Tile::from(n as u8), Disc::White),
            '-' => {}
            _ => anyhow::bail!("invalid cell '{}' in BO tag: {}", c, value),
        }
    }
    board.set_black_to_move(match side {
        "*" => true,
        "O" => false,
        _ => anyhow::bail!("invalid side marker '{}' in BO tag: {}", side, value),
    });
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_setup_record() {
        let moves = ["a1", "a2", "b1", "b2"]
            .iter()
            .map(|s| Move::place(Tile::try_from(*s).unwrap()))
            .collect::<Vec<_>>();
        let text = marshal("Player2", "Player1", &moves);
        assert_eq!(
            text,
            "(;GM[Othello]PB[Player2]PW[Player1]TY[8]BO[8 \
             ---------------------------O*------*O--------------------------- *]\
             B[A1]W[A2]B[B1]W[B2];)"
        );
        let record = unmarshal(&text).unwrap();
        assert_eq!(record.black, "Player2");
        assert_eq!(record.white, "Player1");
        assert_eq!(record.moves, moves);
        let mut expected = Board::initial();
        expected.place(Tile::new(0, 0), Disc::Black);
        expected.place(Tile::new(0, 1), Disc::Black);
        expected.place(Tile::new(1, 0), Disc::White);
        expected.place(Tile::new(1, 1), Disc::White);
        assert_eq!(record.board, expected);
    }

    #[test]
    fn live_game_round_trip() {
        let mut board = Board::initial();
        let mut moves = Vec::new();
        for tile in ["c4", "c3", "d3"] {
            let tile = Tile::try_from(tile).unwrap();
            board = board.play(tile);
            moves.push(Move::place(tile));
        }
        let record = unmarshal(&marshal("alice", "bob", &moves)).unwrap();
        assert_eq!(record.board, board);
        assert_eq!(record.moves, moves);
    }

    #[test]
    fn pass_token_round_trip() {
        let moves = vec![
            Move::place(Tile::try_from("c4").unwrap()),
            Move::pass(),
            Move::place(Tile::try_from("d3").unwrap()),
        ];
        let text = marshal("alice", "bob", &moves);
        assert!(text.contains("W[PA]"));
        assert_eq!(unmarshal(&text).unwrap().moves, moves);
    }

    #[test]
    fn rejects_foreign_records() {
        assert!(unmarshal("(;GM[Chess]PB[a]PW[b];)").is_err());
        assert!(unmarshal("GM[Othello]").is_err());
        assert!(unmarshal("(;GM[Othello]PB[a]PW[b];)").is_err());
    }
}
