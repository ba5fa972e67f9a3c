#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    row: u8,
    col: u8,
}

impl Tile {
    pub fn new(row: u8, col: u8) -> Self {
        assert!(row < 8 && col < 8);
        Self { row, col }
    }
    pub fn row(&self) -> u8 {
        self.row
    }
    pub fn col(&self) -> u8 {
        self.col
    }
    pub fn to_int(&self) -> u8 {
        self.row * 8 + self.col
    }
    pub fn to_bits(&self) -> u64 {
        1 << self.to_int()
    }
    /// engine wire form, "A1".."H8"
    pub fn notation(&self) -> String {
        self.to_string().to_uppercase()
    }
}

// u8 isomorphism
impl From<Tile> for u8 {
    fn from(t: Tile) -> u8 {
        t.to_int()
    }
}
impl From<u8> for Tile {
    fn from(n: u8) -> Self {
        Self {
            row: (n / 8) % 8,
            col: n % 8,
        }
    }
}

impl TryFrom<&str> for Tile {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut chars = s.chars();
        let col = chars.next();
        let row = chars.next();
        match (col.map(|c| c.to_ascii_lowercase()), row, chars.next()) {
            (Some(c), Some(r), None) if ('a'..='h').contains(&c) && ('1'..='8').contains(&r) => {
                Ok(Self {
                    row: r as u8 - b'1',
                    col: c as u8 - b'a',
                })
            }
            _ => Err(anyhow::anyhow!("invalid tile notation: {}", s)),
        }
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

use std::fmt::Display;
use std::fmt::Formatter;
