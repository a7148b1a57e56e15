use std::{fmt::Write as _, time::Duration};

use serde::Serialize;

/// Solved versus attempted problems and the time spent on each group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SolveSummary {
    pub solved: u32,
    pub total: u32,
    pub solved_time: Duration,
    pub total_time: Duration,
    pub states: u64,
}

impl SolveSummary {
    pub fn add(&mut self, solved: bool, elapsed: Duration, states: u64) {
        self.total += 1;
        self.total_time += elapsed;
        self.states += states;
        if solved {
            self.solved += 1;
            self.solved_time += elapsed;
        }
    }

    pub fn merge(&mut self, other: &SolveSummary) {
        self.solved += other.solved;
        self.total += other.total;
        self.solved_time += other.solved_time;
        self.total_time += other.total_time;
        self.states += other.states;
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "           solved    total");
        let _ = writeln!(out, "problems {:>8} {:>8}", self.solved, self.total);
        let _ = writeln!(
            out,
            "time sec {:>8.1} {:>8.1}",
            self.solved_time.as_secs_f64(),
            self.total_time.as_secs_f64()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_columns() {
        let mut s = SolveSummary::default();
        s.add(true, Duration::from_millis(1300), 10);
        s.add(false, Duration::from_secs(10), 90);

        assert_eq!(
            s.render(),
            "           solved    total\nproblems        1        2\ntime sec      1.3     11.3\n"
        );
        assert_eq!(s.states, 100);
    }

    #[test]
    fn merge_adds_fields() {
        let mut a = SolveSummary::default();
        a.add(true, Duration::from_secs(1), 5);
        let mut b = SolveSummary::default();
        b.add(false, Duration::from_secs(3), 7);
        a.merge(&b);
        assert_eq!((a.solved, a.total, a.states), (1, 2, 12));
        assert_eq!(a.total_time, Duration::from_secs(4));
    }
}
