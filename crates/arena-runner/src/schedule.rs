/// One game of a schedule, numbered from 1. Indices refer to the player list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub number: usize,
    pub white: usize,
    pub black: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub games: Vec<Pairing>,
}

impl Schedule {
    /// Every ordered pair `(i, j)` with `i != j`, `rounds` times.
    pub fn round_robin(n: usize, rounds: usize) -> Self {
        let mut games = Vec::with_capacity(rounds * n * n.saturating_sub(1));
        for _ in 0..rounds {
            for white in 0..n {
                for black in (0..n).filter(|&b| b != white) {
                    games.push(Pairing {
                        number: games.len() + 1,
                        white,
                        black,
                    });
                }
            }
        }
        Self { games }
    }

    /// Player 0 against every other player, once with each colour, `rounds` times.
    pub fn against(n: usize, rounds: usize) -> Self {
        let mut games = Vec::with_capacity(rounds * 2 * n.saturating_sub(1));
        for _ in 0..rounds {
            for other in 1..n {
                for (white, black) in [(0, other), (other, 0)] {
                    games.push(Pairing {
                        number: games.len() + 1,
                        white,
                        black,
                    });
                }
            }
        }
        Self { games }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
