use std::{collections::BTreeMap, time::Duration};

use arena_model::{GameRecord, GameResult, Outcome, OutcomeStatus, Payload, Side};
use serde::Serialize;
use tracing::debug;

use crate::SolveSummary;

/// Pairing, board size and time class one cell accumulates over.
///
/// `player` and `opponent` are stored in sorted order so both colour
/// assignments of the same pairing land in the same cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellKey {
    pub player: String,
    pub opponent: String,
    pub size: String,
    pub time_class: String,
}

impl CellKey {
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        size: impl Into<String>,
        time_class: impl Into<String>,
    ) -> Self {
        let (a, b) = (a.into(), b.into());
        let (player, opponent) = if a <= b { (a, b) } else { (b, a) };
        Self {
            player,
            opponent,
            size: size.into(),
            time_class: time_class.into(),
        }
    }

    /// Key for a game, and the side `player` sat on.
    fn for_game(game: &GameRecord) -> (Self, Side) {
        let key = Self::new(&game.white, &game.black, &game.size, &game.time_class);
        let side = if key.player == game.white { Side::White } else { Side::Black };
        (key, side)
    }
}

/// Results of one pairing, from `player`'s point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateCell {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub games: u32,
    pub time: Duration,
    pub states: u64,
}

impl AggregateCell {
    pub fn add(&mut self, result: GameResult, elapsed: Duration, states: u64) {
        match result {
            GameResult::Win => self.wins += 1,
            GameResult::Loss => self.losses += 1,
            GameResult::Tie => self.ties += 1,
        }
        self.games += 1;
        self.time += elapsed;
        self.states += states;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    cells: BTreeMap<CellKey, AggregateCell>,
    solves: BTreeMap<String, SolveSummary>,
    /// Outcomes with status `error`.
    pub errors: u32,
    /// Outcomes with status `no-result`.
    pub unfinished: u32,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(outcomes: &[Outcome]) -> Self {
        let mut agg = Self::new();
        for outcome in outcomes {
            agg.push(outcome);
        }
        debug!(
            target: "arena.report",
            outcomes = outcomes.len(),
            cells = agg.cells.len(),
            errors = agg.errors,
            unfinished = agg.unfinished,
            "outcomes folded"
        );
        agg
    }

    pub fn push(&mut self, outcome: &Outcome) {
        match outcome.status {
            OutcomeStatus::Error => {
                self.errors += 1;
                return;
            }
            OutcomeStatus::NoResult => self.unfinished += 1,
            OutcomeStatus::Decided => {}
        }

        match &outcome.payload {
            Payload::Game(game) if outcome.is_decided() => {
                let Some(winner) = game.winner else {
                    return;
                };
                let (key, side) = CellKey::for_game(game);
                self.record(key, winner.result_for(side), outcome.elapsed, 0);
            }
            // An unfinished solve still counts towards the total.
            Payload::Solve(solve) => {
                self.solves.entry(solve.size.clone()).or_default().add(
                    outcome.is_decided(),
                    outcome.elapsed,
                    solve.states,
                );
            }
            _ => {}
        }
    }

    /// Add a result whose perspective the caller already knows.
    pub fn record(&mut self, key: CellKey, result: GameResult, elapsed: Duration, states: u64) {
        self.cells.entry(key).or_default().add(result, elapsed, states);
    }

    pub fn get(&self, key: &CellKey) -> Option<&AggregateCell> {
        self.cells.get(key)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &AggregateCell)> {
        self.cells.iter()
    }

    /// Solve totals per board size.
    pub fn solves(&self) -> impl Iterator<Item = (&str, &SolveSummary)> {
        self.solves.iter().map(|(size, s)| (size.as_str(), s))
    }

    pub fn solve_summary(&self, size: &str) -> Option<&SolveSummary> {
        self.solves.get(size)
    }
}

#[cfg(test)]
mod tests {
    use arena_model::{SolveRecord, SolveResult, Winner};

    use super::*;

    fn game(white: &str, black: &str, winner: Option<Winner>) -> Payload {
        Payload::Game(GameRecord {
            white: white.into(),
            black: black.into(),
            size: "5".into(),
            time_class: "1s".into(),
            winner,
            moves: 20,
            log: String::new(),
        })
    }

    fn decided(payload: Payload) -> Outcome {
        Outcome::decided("g", Duration::from_secs(2), payload)
    }

    #[test]
    fn win_loss_tie_for_one_pairing() {
        let outcomes = vec![
            decided(game("P1", "P2", Some(Winner::White))),
            decided(game("P1", "P2", Some(Winner::Black))),
            decided(game("P2", "P1", Some(Winner::Draw))),
        ];
        let agg = Aggregate::fold(&outcomes);

        let cell = agg.get(&CellKey::new("P1", "P2", "5", "1s")).unwrap();
        assert_eq!((cell.wins, cell.losses, cell.ties, cell.games), (1, 1, 1, 3));
        assert_eq!(cell.time, Duration::from_secs(6));
        assert_eq!(agg.cells().count(), 1);
    }

    #[test]
    fn colour_does_not_change_perspective() {
        let outcomes = vec![
            decided(game("alpha", "beta", Some(Winner::White))),
            decided(game("beta", "alpha", Some(Winner::Black))),
        ];
        let agg = Aggregate::fold(&outcomes);
        let cell = agg.get(&CellKey::new("beta", "alpha", "5", "1s")).unwrap();
        assert_eq!(cell.wins, 2);
        assert_eq!(cell.losses, 0);
    }

    #[test]
    fn undecided_outcomes_stay_out_of_cells() {
        let outcomes = vec![
            Outcome::error("g1", Duration::ZERO, game("a", "b", None), "engine died"),
            Outcome::no_result("g2", Duration::ZERO, game("a", "b", None), "cancelled"),
        ];
        let agg = Aggregate::fold(&outcomes);
        assert_eq!(agg.errors, 1);
        assert_eq!(agg.unfinished, 1);
        assert_eq!(agg.cells().count(), 0);
    }

    #[test]
    fn solves_summarised_per_size() {
        let solve = |result| {
            Payload::Solve(SolveRecord {
                size: "4".into(),
                result,
                best_move: None,
                depth: 3,
                states: 50,
                polls: 1,
            })
        };
        let outcomes = vec![
            decided(solve(SolveResult::White)),
            Outcome::no_result("t2", Duration::from_secs(10), solve(SolveResult::Unknown), "budget exhausted"),
        ];
        let agg = Aggregate::fold(&outcomes);
        let summary = agg.solve_summary("4").unwrap();
        assert_eq!((summary.solved, summary.total), (1, 2));
        assert_eq!(summary.solved_time, Duration::from_secs(2));
        assert_eq!(summary.total_time, Duration::from_secs(12));
        assert_eq!(summary.states, 100);
    }

    #[test]
    fn record_with_known_perspective() {
        let mut agg = Aggregate::new();
        let key = CellKey::new("p", "b", "8", "10s");
        agg.record(key.clone(), GameResult::Loss, Duration::from_secs(1), 40);
        assert_eq!(key.player, "b");
        let cell = agg.get(&key).unwrap();
        assert_eq!((cell.losses, cell.games, cell.states), (1, 1, 40));
    }
}
