use arena_model::Side;

/// Command names and reserved reply tokens of one engine protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    pub genmove: String,
    pub play: String,
    pub quit: String,
    /// Asked of the white session once no move is left.
    pub winner: String,
    /// `genmove` reply that concedes the game.
    pub resign: String,
    /// `genmove` reply meaning the game is over.
    pub no_move: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            genmove: "genmove".into(),
            play: "play".into(),
            quit: "quit".into(),
            winner: "havannah_winner".into(),
            resign: "resign".into(),
            no_move: "none".into(),
        }
    }
}

impl Dialect {
    pub fn genmove_cmd(&self, side: Side) -> String {
        format!("{} {side}", self.genmove)
    }

    pub fn play_cmd(&self, side: Side, mv: &str) -> String {
        format!("{} {side} {mv}", self.play)
    }

    #[inline]
    pub fn is_resign(&self, mv: &str) -> bool {
        mv.eq_ignore_ascii_case(&self.resign)
    }

    #[inline]
    pub fn is_no_move(&self, mv: &str) -> bool {
        mv.eq_ignore_ascii_case(&self.no_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_commands() {
        let d = Dialect::default();
        assert_eq!(d.genmove_cmd(Side::White), "genmove white");
        assert_eq!(d.play_cmd(Side::Black, "d4"), "play black d4");
        assert!(d.is_resign("Resign"));
        assert!(d.is_no_move("none"));
        assert!(!d.is_no_move("a1"));
    }
}
