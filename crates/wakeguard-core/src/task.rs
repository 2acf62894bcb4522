//! Verification tasks.
//!
//! One type per task kind behind the [`VerificationTask`] union. Each
//! variant is initialized from the alarm's difficulty at ringing-start,
//! accumulates its own transient progress, and reports a single
//! `satisfied()` signal the ringing state maps to completion. Wrong input
//! is expected and recoverable: it resets local progress and nothing else.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alarm::{Difficulty, TaskKind};

/// Symbols dealt onto the memory grid, largest difficulty first-N.
const MEMORY_SYMBOLS: [&str; 8] = ["🔥", "⭐", "💎", "🍀", "🍎", "🌈", "🌊", "🍄"];

/// Maximum digits accepted by the math answer field.
const MATH_INPUT_LIMIT: usize = 4;

/// A single random addition problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathTask {
    a: u32,
    b: u32,
    input: String,
    solved: bool,
}

impl MathTask {
    pub fn new(difficulty: Difficulty, rng: &mut impl Rng) -> Self {
        let (min, max) = match difficulty {
            Difficulty::Easy => (1, 10),
            Difficulty::Medium => (10, 50),
            Difficulty::Hard => (25, 99),
        };
        Self {
            a: rng.gen_range(min..max),
            b: rng.gen_range(min..max),
            input: String::new(),
            solved: false,
        }
    }

    pub fn prompt(&self) -> String {
        format!("{} + {}", self.a, self.b)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_digit(&mut self, digit: char) {
        if digit.is_ascii_digit() && self.input.len() < MATH_INPUT_LIMIT {
            self.input.push(digit);
        }
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Submit the current input. A wrong answer clears the field.
    pub fn submit(&mut self) -> bool {
        if self.input.parse::<u32>() == Ok(self.a + self.b) {
            self.solved = true;
        } else {
            self.input.clear();
        }
        self.solved
    }

    /// Replace the input wholesale and submit, for line-oriented frontends.
    pub fn answer(&mut self, text: &str) -> bool {
        self.input = text.chars().filter(char::is_ascii_digit).take(MATH_INPUT_LIMIT).collect();
        self.submit()
    }

    pub fn satisfied(&self) -> bool {
        self.solved
    }

    /// The expected sum. Frontends must not display this; it exists for
    /// verification plumbing and tests.
    pub fn solution(&self) -> u32 {
        self.a + self.b
    }
}

/// Repetition counter standing in for motion-sensor shakes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShakeTask {
    count: u32,
    target: u32,
}

impl ShakeTask {
    pub fn new(difficulty: Difficulty) -> Self {
        let target = match difficulty {
            Difficulty::Easy => 15,
            Difficulty::Medium => 30,
            Difficulty::Hard => 50,
        };
        Self { count: 0, target }
    }

    pub fn shake(&mut self) {
        self.count = (self.count + 1).min(self.target);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn satisfied(&self) -> bool {
        self.count >= self.target
    }
}

/// One card on the memory grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCard {
    pub symbol: String,
    pub face_up: bool,
    pub matched: bool,
}

/// Outcome of flipping a memory card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Flip ignored: out of range, already revealed, or a mismatch is
    /// still settling.
    Ignored,
    /// First card of a pair turned up.
    Revealed,
    /// Second card matched the first.
    Matched,
    /// Second card did not match; both revert on the next settle.
    Mismatched,
}

/// Pair-matching grid. Mismatches stay face-up until the next 1-second
/// tick settles them; there is no attempt limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTask {
    cards: Vec<MemoryCard>,
    first_pick: Option<usize>,
    pending_revert: Option<(usize, usize)>,
}

impl MemoryTask {
    pub fn new(difficulty: Difficulty, rng: &mut impl Rng) -> Self {
        let pairs = match difficulty {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 6,
        };
        let mut cards: Vec<MemoryCard> = MEMORY_SYMBOLS
            .iter()
            .take(pairs)
            .flat_map(|&s| {
                let card = MemoryCard {
                    symbol: s.to_string(),
                    face_up: false,
                    matched: false,
                };
                [card.clone(), card]
            })
            .collect();
        cards.shuffle(rng);
        Self {
            cards,
            first_pick: None,
            pending_revert: None,
        }
    }

    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        if self.pending_revert.is_some() {
            return FlipOutcome::Ignored;
        }
        let Some(card) = self.cards.get(index) else {
            return FlipOutcome::Ignored;
        };
        if card.face_up || card.matched {
            return FlipOutcome::Ignored;
        }
        self.cards[index].face_up = true;

        let Some(first) = self.first_pick.take() else {
            self.first_pick = Some(index);
            return FlipOutcome::Revealed;
        };

        if self.cards[first].symbol == self.cards[index].symbol {
            self.cards[first].matched = true;
            self.cards[index].matched = true;
            FlipOutcome::Matched
        } else {
            self.pending_revert = Some((first, index));
            FlipOutcome::Mismatched
        }
    }

    /// Turn a settled mismatch back face-down. Called once per tick.
    pub fn settle(&mut self) {
        if let Some((a, b)) = self.pending_revert.take() {
            self.cards[a].face_up = false;
            self.cards[b].face_up = false;
        }
    }

    pub fn satisfied(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }
}

/// Tap 1..=N strictly in order; any wrong tap resets progress to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceTask {
    order: Vec<u32>,
    reached: u32,
}

impl SequenceTask {
    pub fn new(difficulty: Difficulty, rng: &mut impl Rng) -> Self {
        let count = match difficulty {
            Difficulty::Easy => 5,
            Difficulty::Medium => 8,
            Difficulty::Hard => 12,
        };
        let mut order: Vec<u32> = (1..=count).collect();
        order.shuffle(rng);
        Self { order, reached: 0 }
    }

    /// Display order of the scrambled number grid.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Highest number tapped so far in the correct run.
    pub fn reached(&self) -> u32 {
        self.reached
    }

    pub fn tap(&mut self, number: u32) -> bool {
        if number == self.reached + 1 {
            self.reached = number;
            true
        } else {
            self.reached = 0;
            false
        }
    }

    pub fn satisfied(&self) -> bool {
        self.reached as usize == self.order.len()
    }
}

/// Black-box external confirmation, e.g. a successful scan match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrTask {
    confirmed: bool,
}

impl QrTask {
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    pub fn satisfied(&self) -> bool {
        self.confirmed
    }
}

/// The polymorphic verification task held by a ringing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum VerificationTask {
    Math(MathTask),
    Shake(ShakeTask),
    Memory(MemoryTask),
    Sequence(SequenceTask),
    Qr(QrTask),
}

impl VerificationTask {
    pub fn new(kind: TaskKind, difficulty: Difficulty, rng: &mut impl Rng) -> Self {
        match kind {
            TaskKind::Math => VerificationTask::Math(MathTask::new(difficulty, rng)),
            TaskKind::Shake => VerificationTask::Shake(ShakeTask::new(difficulty)),
            TaskKind::Memory => VerificationTask::Memory(MemoryTask::new(difficulty, rng)),
            TaskKind::Sequence => VerificationTask::Sequence(SequenceTask::new(difficulty, rng)),
            TaskKind::Qr => VerificationTask::Qr(QrTask::default()),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            VerificationTask::Math(_) => TaskKind::Math,
            VerificationTask::Shake(_) => TaskKind::Shake,
            VerificationTask::Memory(_) => TaskKind::Memory,
            VerificationTask::Sequence(_) => TaskKind::Sequence,
            VerificationTask::Qr(_) => TaskKind::Qr,
        }
    }

    pub fn satisfied(&self) -> bool {
        match self {
            VerificationTask::Math(t) => t.satisfied(),
            VerificationTask::Shake(t) => t.satisfied(),
            VerificationTask::Memory(t) => t.satisfied(),
            VerificationTask::Sequence(t) => t.satisfied(),
            VerificationTask::Qr(t) => t.satisfied(),
        }
    }

    /// Advance time-delayed task state by one tick.
    pub fn settle(&mut self) {
        if let VerificationTask::Memory(t) = self {
            t.settle();
        }
    }
}
