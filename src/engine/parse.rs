use super::request::ScoredTile;
use crate::Heuristic;
use crate::othello::PASS;
use crate::othello::Tile;
use std::collections::BTreeMap;

/// Decode the payload of a move announcement (the remainder of a line
/// containing `=== `): `<notation>[/<heuristic>[/...]]`. A `PA` token
/// means the engine was asked about a position it considers finished.
pub fn best(payload: &str) -> anyhow::Result<ScoredTile> {
    let mut parts = payload.trim().split('/');
    let notation = parts.next().unwrap_or_default();
    if notation.eq_ignore_ascii_case(PASS) {
        anyhow::bail!("engine passed on a position that still has moves");
    }
    let tile = Tile::try_from(notation)?;
    let score = match parts.next() {
        Some(h) => h
            .trim()
            .parse::<Heuristic>()
            .map_err(|e| anyhow::anyhow!("bad heuristic '{}': {}", h, e))?,
        None => 0.0,
    };
    Ok(ScoredTile { tile, score })
}

/// Accumulator for `hint` output. Lines starting with `search` or
/// `book` carry `<kw> <notation> <heuristic>`; a later entry for the
/// same tile supersedes an earlier one, which lets book lines override
/// search lines the way the engine itself ranks them. Everything else
/// is ignored until the `status` terminator.
#[derive(Debug, Default)]
pub struct Hints {
    ranks: BTreeMap<Tile, Heuristic>,
}

impl Hints {
    pub fn new() -> Self {
        Self::default()
    }
    /// feed one output line; true once the terminator was consumed
    pub fn feed(&mut self, line: &str) -> anyhow::Result<bool> {
        let line = line.trim();
        if line == "status" {
            return Ok(true);
        }
        if line.starts_with("search") || line.starts_with("book") {
            let mut words = line.split_whitespace();
            let _kw = words.next();
            match (words.next(), words.next()) {
                (Some(notation), Some(h)) => {
                    let tile = Tile::try_from(notation)?;
                    let score = h
                        .parse::<Heuristic>()
                        .map_err(|e| anyhow::anyhow!("bad heuristic '{}': {}", h, e))?;
                    self.ranks.insert(tile, score);
                }
                _ => anyhow::bail!("short hint line: {}", line),
            }
        }
        Ok(false)
    }
    /// accumulated evaluations, row-major over the grid
    pub fn ranked(self) -> Vec<ScoredTile> {
        self.ranks
            .into_iter()
            .map(|(tile, score)| ScoredTile { tile, score })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_with_heuristic() {
        let scored = best("d3/1.50").unwrap();
        assert_eq!(scored.tile, Tile::try_from("d3").unwrap());
        assert!((scored.score - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn best_without_heuristic() {
        let scored = best("C4").unwrap();
        assert_eq!(scored.tile, Tile::try_from("c4").unwrap());
        assert_eq!(scored.score, 0.0);
    }

    #[test]
    fn best_rejects_pass() {
        assert!(best("PA").is_err());
        assert!(best("PA/0.00").is_err());
    }

    #[test]
    fn best_rejects_garbage() {
        assert!(best("").is_err());
        assert!(best("z9/1.0").is_err());
        assert!(best("d3/alpha").is_err());
    }

    #[test]
    fn hints_accumulate_until_status() {
        let mut hints = Hints::new();
        for line in [
            "search d3 1.00",
            "search c4 -0.25",
            "thinking very hard",
            "book d3 1.50",
        ] {
            assert!(!hints.feed(line).unwrap());
        }
        assert!(hints.feed("status").unwrap());
        let ranked = hints.ranked();
        assert_eq!(ranked.len(), 2);
        // row-major: d3 sits on row 2, c4 on row 3
        assert_eq!(ranked[0].tile, Tile::try_from("d3").unwrap());
        assert!((ranked[0].score - 1.5).abs() < f32::EPSILON);
        assert_eq!(ranked[1].tile, Tile::try_from("c4").unwrap());
    }

    #[test]
    fn hints_reject_short_lines() {
        let mut hints = Hints::new();
        assert!(hints.feed("search d3").is_err());
        assert!(hints.feed("book").is_err());
    }
}
