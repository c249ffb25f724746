//! "Guess the Card": the trivia variant. Cards come up obscured and are
//! revealed in steps; guessing earlier scores more.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{Card, Catalog};

/// Fully revealed. Levels run 0 (hidden) through 4 (clear).
pub const MAX_REVEAL: u8 = 4;

/// A correct guess at reveal level `l` scores `5 - l` points.
pub const MAX_POINTS: u32 = 5;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TriviaError {
    #[error("catalog is empty")]
    EmptyCatalog,
    #[error("round already complete")]
    RoundComplete,
}

/// Outcome of one guess, answer included so the caller can show it.
#[derive(Debug, Clone)]
pub struct GuessOutcome {
    pub correct: bool,
    pub points: u32,
    pub answer: Card,
    pub complete: bool,
}

/// One guessing run over the shuffled catalog.
#[derive(Debug, Clone)]
pub struct TriviaSession {
    order: Vec<String>,
    position: usize,
    reveal_level: u8,
    score: u32,
    guesses: u32,
    streak: u32,
    best_streak: u32,
}

impl TriviaSession {
    pub fn start(catalog: &Catalog, rng: &mut impl Rng) -> Result<Self, TriviaError> {
        if catalog.is_empty() {
            return Err(TriviaError::EmptyCatalog);
        }
        let mut order: Vec<String> = catalog.cards().iter().map(|c| c.id.clone()).collect();
        order.shuffle(rng);
        Ok(Self {
            order,
            position: 0,
            reveal_level: 0,
            score: 0,
            guesses: 0,
            streak: 0,
            best_streak: 0,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.order.len()
    }

    pub fn reveal_level(&self) -> u8 {
        self.reveal_level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn guesses(&self) -> u32 {
        self.guesses
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// The card being guessed. Callers serving clients must not leak its id
    /// or name before the guess lands.
    pub fn current_card<'a>(&self, catalog: &'a Catalog) -> Option<&'a Card> {
        self.order.get(self.position).and_then(|id| catalog.get(id))
    }

    /// Uncover one more step, capped at fully revealed.
    pub fn reveal(&mut self) -> Result<u8, TriviaError> {
        if self.is_complete() {
            return Err(TriviaError::RoundComplete);
        }
        if self.reveal_level < MAX_REVEAL {
            self.reveal_level += 1;
        }
        Ok(self.reveal_level)
    }

    /// Judge a guess against the current card, score it, and advance.
    /// One guess per card; a miss zeroes the streak.
    pub fn guess(&mut self, catalog: &Catalog, card_id: &str) -> Result<GuessOutcome, TriviaError> {
        let answer = self
            .current_card(catalog)
            .cloned()
            .ok_or(TriviaError::RoundComplete)?;

        self.guesses += 1;
        let correct = answer.id == card_id;
        let points = if correct {
            MAX_POINTS - u32::from(self.reveal_level)
        } else {
            0
        };
        if correct {
            self.score += points;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }

        self.position += 1;
        self.reveal_level = 0;
        Ok(GuessOutcome {
            correct,
            points,
            answer,
            complete: self.is_complete(),
        })
    }

    /// Points earned as a share of the maximum possible, rounded. A perfect
    /// run of instant guesses scores 100.
    pub fn accuracy(&self) -> u8 {
        if self.guesses == 0 {
            return 0;
        }
        let max = self.guesses * MAX_POINTS;
        ((self.score as f64 / max as f64) * 100.0).round() as u8
    }
}
