//! Scoring - reference score sink and level-goal tracking
//!
//! Both types consume engine notifications through `BoardListener`.
//! `ScoreBoard` is the plain score accumulator; `LevelGoal` layers stars,
//! the move/time budget, and the input gate on top of one.

use crate::events::{BoardListener, InputGate};
use crate::level::LevelBoard;
use crate::types::{GoalCurrency, GROUP_BONUS, PIECE_SCORE};

/// Score accumulator with a cascade multiplier chain.
///
/// The multiplier resets to 1 when the player moves and grows by one for
/// each cascade iteration after the first, so pieces cleared deeper in a
/// chain are worth more.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    score: u32,
    multiplier: u32,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self {
            score: 0,
            multiplier: 1,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }
}

impl BoardListener for ScoreBoard {
    fn piece_cleared(&mut self, _x: i32, _y: i32, _was_bomb: bool) {
        self.score += PIECE_SCORE * self.multiplier;
    }

    fn group_cleared(&mut self, group_size: usize) {
        if group_size >= 4 {
            self.score += group_size as u32 * GROUP_BONUS;
        }
    }

    fn bonus_chain_updated(&mut self, increasing: bool) {
        if increasing {
            self.multiplier += 1;
        } else {
            self.multiplier = 1;
        }
    }

    fn user_moved(&mut self) {
        self.multiplier = 1;
    }
}

/// Goal tracking for one level: ascending score thresholds, a move or time
/// budget, and the gate that stops play when the budget runs out or the
/// final goal is reached.
#[derive(Debug, Clone)]
pub struct LevelGoal {
    board: ScoreBoard,
    goals: Vec<u32>,
    currency: GoalCurrency,
    /// Moves left, or milliseconds left, per `currency`
    remaining: u32,
}

impl LevelGoal {
    pub fn new(level: &LevelBoard) -> Self {
        let remaining = match level.currency {
            GoalCurrency::Moves => level.budget,
            GoalCurrency::Seconds => level.budget.saturating_mul(1000),
        };
        Self {
            board: ScoreBoard::new(),
            goals: level.score_goals.clone(),
            currency: level.currency,
            remaining,
        }
    }

    pub fn score(&self) -> u32 {
        self.board.score()
    }

    /// Number of goals met so far
    pub fn stars(&self) -> usize {
        self.goals
            .iter()
            .filter(|&&goal| self.board.score() >= goal)
            .count()
    }

    /// Whether the final goal has been reached
    pub fn is_won(&self) -> bool {
        self.goals
            .last()
            .is_some_and(|&last| self.board.score() >= last)
    }

    /// Moves left, or milliseconds left for timed levels
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance the clock for timed levels; a no-op for move-limited ones
    pub fn tick(&mut self, elapsed_ms: u32) {
        if self.currency == GoalCurrency::Seconds {
            self.remaining = self.remaining.saturating_sub(elapsed_ms);
        }
    }
}

impl BoardListener for LevelGoal {
    fn piece_cleared(&mut self, x: i32, y: i32, was_bomb: bool) {
        self.board.piece_cleared(x, y, was_bomb);
    }

    fn group_cleared(&mut self, group_size: usize) {
        self.board.group_cleared(group_size);
    }

    fn bonus_chain_updated(&mut self, increasing: bool) {
        self.board.bonus_chain_updated(increasing);
    }

    fn user_moved(&mut self) {
        self.board.user_moved();
        if self.currency == GoalCurrency::Moves {
            self.remaining = self.remaining.saturating_sub(1);
        }
    }
}

impl InputGate for LevelGoal {
    fn can_play(&self) -> bool {
        !self.is_won() && self.remaining > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_level(budget: u32) -> LevelBoard {
        let mut level = LevelBoard::basic(1, 8, 8, budget);
        level.currency = GoalCurrency::Seconds;
        level
    }

    #[test]
    fn test_multiplier_chain() {
        let mut board = ScoreBoard::new();
        board.piece_cleared(0, 0, false);
        assert_eq!(board.score(), 20);

        board.bonus_chain_updated(true);
        board.piece_cleared(0, 0, false);
        assert_eq!(board.score(), 60);

        board.user_moved();
        assert_eq!(board.multiplier(), 1);
        board.piece_cleared(0, 0, false);
        assert_eq!(board.score(), 80);
    }

    #[test]
    fn test_group_bonus_from_four() {
        let mut board = ScoreBoard::new();
        board.group_cleared(3);
        assert_eq!(board.score(), 0);
        board.group_cleared(4);
        assert_eq!(board.score(), 80);
        board.group_cleared(5);
        assert_eq!(board.score(), 180);
    }

    #[test]
    fn test_stars_track_goals() {
        let level = LevelBoard::basic(1, 8, 8, 30);
        let mut goal = LevelGoal::new(&level);
        assert_eq!(goal.stars(), 0);

        // 60 pieces at base value crosses the first goal (1000)
        for _ in 0..60 {
            goal.piece_cleared(0, 0, false);
        }
        assert_eq!(goal.score(), 1200);
        assert_eq!(goal.stars(), 1);
        assert!(!goal.is_won());

        for _ in 0..90 {
            goal.piece_cleared(0, 0, false);
        }
        assert_eq!(goal.stars(), 3);
        assert!(goal.is_won());
        assert!(!goal.can_play());
    }

    #[test]
    fn test_moves_budget_gates_input() {
        let level = LevelBoard::basic(1, 8, 8, 2);
        let mut goal = LevelGoal::new(&level);
        assert!(goal.can_play());

        goal.user_moved();
        assert!(goal.can_play());
        goal.user_moved();
        assert_eq!(goal.remaining(), 0);
        assert!(!goal.can_play());
    }

    #[test]
    fn test_timed_budget_counts_down() {
        let mut goal = LevelGoal::new(&timed_level(2));
        assert_eq!(goal.remaining(), 2000);

        goal.tick(1500);
        assert!(goal.can_play());
        goal.tick(1500);
        assert_eq!(goal.remaining(), 0);
        assert!(!goal.can_play());

        // Moves do not consume time
        goal.user_moved();
        assert_eq!(goal.remaining(), 0);
    }
}
