use std::fmt::Write as _;

use arena_model::Winner;

/// Head-to-head wins between `n` numbered players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinMatrix {
    n: usize,
    /// `beat[i * n + j]`: games player `i` won against player `j`.
    beat: Vec<u32>,
    played: Vec<u32>,
}

impl WinMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            beat: vec![0; n * n],
            played: vec![0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Count a game with `white` against `black`. `None` (no decision) counts
    /// as played, and so lands in the tie column.
    pub fn record(&mut self, white: usize, black: usize, winner: Option<Winner>) {
        if white >= self.n || black >= self.n {
            return;
        }
        self.played[white] += 1;
        self.played[black] += 1;
        match winner {
            Some(Winner::White) => self.beat[white * self.n + black] += 1,
            Some(Winner::Black) => self.beat[black * self.n + white] += 1,
            Some(Winner::Draw) | None => {}
        }
    }

    pub fn beat(&self, i: usize, j: usize) -> u32 {
        self.beat[i * self.n + j]
    }

    pub fn wins(&self, i: usize) -> u32 {
        (0..self.n).filter(|&j| j != i).map(|j| self.beat(i, j)).sum()
    }

    pub fn losses(&self, i: usize) -> u32 {
        (0..self.n).filter(|&j| j != i).map(|j| self.beat(j, i)).sum()
    }

    pub fn ties(&self, i: usize) -> u32 {
        self.played[i] - self.wins(i) - self.losses(i)
    }

    pub fn render(&self, names: &[String]) -> String {
        let mut out = String::new();
        for i in 0..self.n {
            let name = names.get(i).map(String::as_str).unwrap_or("?");
            let _ = writeln!(out, "Player {}: {name}", i + 1);
        }

        out.push_str("Win vs Loss Matrix:\n   ");
        for i in 1..=self.n {
            let _ = write!(out, "{i:>3}");
        }
        out.push('\n');

        for i in 0..self.n {
            let _ = write!(out, "{:>2}:", i + 1);
            for j in 0..self.n {
                if i == j {
                    out.push_str("   ");
                } else {
                    let _ = write!(out, "{:>3}", self.beat(i, j));
                }
            }
            let _ = writeln!(
                out,
                " : {} wins, {} losses, {} ties",
                self.wins(i),
                self.losses(i),
                self.ties(i)
            );
        }
        out
    }
}
