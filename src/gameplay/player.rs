/// A game participant. `level == 0` is a human identified by their
/// platform id; `1..=5` is the engine at that difficulty, whose id is
/// the decimal level (platform ids are long snowflakes, so the two id
/// spaces never collide).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: String,
    name: String,
    level: u8,
}

impl Player {
    pub fn human(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: 0,
        }
    }
    pub fn bot(level: u8) -> Self {
        debug_assert!((crate::MIN_LEVEL..=crate::MAX_LEVEL).contains(&level));
        Self {
            id: level.to_string(),
            name: format!("Bot level {}", level),
            level,
        }
    }
    /// rebuild from stored id/name columns
    pub fn from_columns(id: String, name: String) -> Self {
        let level = id
            .parse::<u8>()
            .ok()
            .filter(|l| (crate::MIN_LEVEL..=crate::MAX_LEVEL).contains(l))
            .unwrap_or(0);
        Self { id, name, level }
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn level(&self) -> u8 {
        self.level
    }
    pub fn is_bot(&self) -> bool {
        self.level > 0
    }
    /// engine search depth for this bot's difficulty
    pub fn depth(&self) -> u8 {
        debug_assert!(self.is_bot());
        crate::depth(self.level)
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_identity() {
        let bot = Player::bot(3);
        assert_eq!(bot.id(), "3");
        assert!(bot.is_bot());
        assert_eq!(bot.depth(), 12);
    }

    #[test]
    fn human_identity() {
        let human = Player::human("81726354091823", "alice");
        assert!(!human.is_bot());
        assert_eq!(human.to_string(), "alice");
    }

    #[test]
    fn column_round_trip() {
        let bot = Player::bot(5);
        let human = Player::human("81726354091823", "alice");
        for player in [bot, human] {
            let restored =
                Player::from_columns(player.id().to_string(), player.name().to_string());
            assert_eq!(restored, player);
        }
    }
}
