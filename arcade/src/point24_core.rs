//! 24-Point: combine four cards with + − × ÷ until a single 24 remains.
//!
//! Subtraction and division take exactly two operands and orient themselves (`max − min`,
//! `max / min`); division must be exact. Addition and multiplication take two to four operands.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::round_timer::RoundTimer;

pub const TARGET: i64 = 24;
pub const CARD_COUNT: usize = 4;
pub const CARD_MIN: i64 = 1;
pub const CARD_MAX: i64 = 10;
pub const ROUND_TIME: Duration = Duration::from_secs(60);
pub const BASE_POINTS: u32 = 100;
pub const POINTS_PER_SECOND: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub const ALL: [Op; 4] = [Op::Add, Op::Sub, Op::Mul, Op::Div];

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }

    fn is_variadic(self) -> bool {
        matches!(self, Op::Add | Op::Mul)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    TooFewOperands,
    /// Subtraction and division take exactly two operands.
    TwoOperandsOnly,
    NotDivisible,
    RoundOver,
}

/// Result of applying an operator to two or more values.
pub fn apply(op: Op, values: &[i64]) -> Result<i64, Rejected> {
    if values.len() < 2 {
        return Err(Rejected::TooFewOperands);
    }
    match op {
        Op::Add => Ok(values.iter().sum()),
        Op::Mul => Ok(values.iter().product()),
        Op::Sub | Op::Div => {
            let &[a, b] = values else {
                return Err(Rejected::TwoOperandsOnly);
            };
            let (hi, lo) = (a.max(b), a.min(b));
            if op == Op::Sub {
                return Ok(hi - lo);
            }
            if lo == 0 || hi % lo != 0 {
                return Err(Rejected::NotDivisible);
            }
            Ok(hi / lo)
        }
    }
}

/// A value on the table together with how it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub value: i64,
    pub expr: String,
}

impl Card {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            expr: value.to_string(),
        }
    }
}

fn combine_cards(op: Op, cards: &[&Card]) -> Result<Card, Rejected> {
    let values: Vec<i64> = cards.iter().map(|c| c.value).collect();
    let value = apply(op, &values)?;
    let mut parts: Vec<&Card> = cards.to_vec();
    if !op.is_variadic() && parts[0].value < parts[1].value {
        parts.swap(0, 1);
    }
    let exprs: Vec<&str> = parts.iter().map(|c| c.expr.as_str()).collect();
    let expr = if parts.len() == 1 {
        exprs.concat()
    } else {
        format!("({})", exprs.join(&format!(" {op} ")))
    };
    Ok(Card { value, expr })
}

fn search(cards: &[Card]) -> Option<String> {
    if let [only] = cards {
        return (only.value == TARGET).then(|| only.expr.clone());
    }
    for i in 0..cards.len() {
        for j in i + 1..cards.len() {
            let rest: Vec<Card> = cards
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != i && k != j)
                .map(|(_, c)| c.clone())
                .collect();
            for op in Op::ALL {
                let Ok(card) = combine_cards(op, &[&cards[i], &cards[j]]) else {
                    continue;
                };
                let mut next = rest.clone();
                next.push(card);
                if let Some(expr) = search(&next) {
                    return Some(expr);
                }
            }
        }
    }
    None
}

/// One way to reach 24 from `values` under the table rules, if any.
pub fn solve(values: &[i64]) -> Option<String> {
    let cards: Vec<Card> = values.iter().map(|&v| Card::new(v)).collect();
    let expr = search(&cards)?;
    // Drop the outermost parentheses for display.
    Some(
        expr.strip_prefix('(')
            .and_then(|e| e.strip_suffix(')'))
            .map_or(expr.clone(), str::to_string),
    )
}

/// Four cards in `1..=10` that can make 24.
pub fn deal(rng: &mut StdRng) -> [i64; CARD_COUNT] {
    loop {
        let hand: [i64; CARD_COUNT] = std::array::from_fn(|_| rng.random_range(CARD_MIN..=CARD_MAX));
        if solve(&hand).is_some() {
            return hand;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOutcome {
    Combined(i64),
    /// The last card is 24; carries the points earned.
    Solved(u32),
    /// Every card is used and the result is not 24.
    DeadEnd(i64),
    Rejected(Rejected),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    /// The round just solved; waiting to deal the next one.
    Solved,
    TimeUp,
}

/// A run of 60-second rounds; solving one adds `100 + 5 × seconds left` and deals the next.
#[derive(Debug, Clone)]
pub struct Point24Session {
    rng: StdRng,
    hand: [i64; CARD_COUNT],
    cards: Vec<Card>,
    history: Vec<Vec<Card>>,
    timer: RoundTimer,
    state: SessionState,
    score: u32,
    rounds_won: u32,
    last_points: u32,
}

impl Point24Session {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let hand = deal(&mut rng);
        Self::from_parts(rng, hand)
    }

    /// A session that opens with a fixed hand.
    pub fn with_hand(hand: [i64; CARD_COUNT], seed: u64) -> Self {
        Self::from_parts(StdRng::seed_from_u64(seed), hand)
    }

    fn from_parts(rng: StdRng, hand: [i64; CARD_COUNT]) -> Self {
        Self {
            rng,
            hand,
            cards: hand.iter().map(|&v| Card::new(v)).collect(),
            history: Vec::new(),
            timer: RoundTimer::new(ROUND_TIME),
            state: SessionState::Playing,
            score: 0,
            rounds_won: 0,
            last_points: 0,
        }
    }

    pub fn hand(&self) -> [i64; CARD_COUNT] {
        self.hand
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn rounds_won(&self) -> u32 {
        self.rounds_won
    }

    pub fn last_points(&self) -> u32 {
        self.last_points
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    /// Combines the cards at `indices` with `op`. Indices refer to `cards()`.
    pub fn combine(&mut self, indices: &[usize], op: Op) -> CombineOutcome {
        if self.state != SessionState::Playing {
            return CombineOutcome::Rejected(Rejected::RoundOver);
        }
        let mut picked: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.cards.len())
            .collect();
        picked.sort_unstable();
        picked.dedup();
        let chosen: Vec<&Card> = picked.iter().map(|&i| &self.cards[i]).collect();
        let card = match combine_cards(op, &chosen) {
            Ok(card) => card,
            Err(reason) => return CombineOutcome::Rejected(reason),
        };
        self.history.push(self.cards.clone());
        let value = card.value;
        let insert_at = picked[0];
        for &i in picked.iter().rev() {
            self.cards.remove(i);
        }
        self.cards.insert(insert_at.min(self.cards.len()), card);
        if self.cards.len() > 1 {
            return CombineOutcome::Combined(value);
        }
        if value != TARGET {
            return CombineOutcome::DeadEnd(value);
        }
        let points = BASE_POINTS + POINTS_PER_SECOND * self.timer.remaining().as_secs() as u32;
        self.score += points;
        self.rounds_won += 1;
        self.last_points = points;
        self.state = SessionState::Solved;
        CombineOutcome::Solved(points)
    }

    pub fn undo(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        match self.history.pop() {
            Some(cards) => {
                self.cards = cards;
                true
            }
            None => false,
        }
    }

    /// Puts the four dealt cards back; the clock keeps running.
    pub fn reset_round(&mut self) {
        if self.state == SessionState::Playing {
            self.cards = self.hand.iter().map(|&v| Card::new(v)).collect();
            self.history.clear();
        }
    }

    pub fn hint(&self) -> Option<String> {
        solve(&self.hand)
    }

    /// Deals a fresh hand with a full clock after a solved round.
    pub fn next_round(&mut self) {
        if self.state != SessionState::Solved {
            return;
        }
        self.hand = deal(&mut self.rng);
        self.cards = self.hand.iter().map(|&v| Card::new(v)).collect();
        self.history.clear();
        self.timer.reset();
        self.state = SessionState::Playing;
    }

    pub fn update(&mut self, dt: Duration) {
        self.timer
            .tick_if_running(dt, self.state == SessionState::Playing);
        if self.state == SessionState::Playing && self.timer.is_up() {
            self.state = SessionState::TimeUp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtraction_and_division_orient_themselves() {
        assert_eq!(apply(Op::Sub, &[3, 10]), Ok(7));
        assert_eq!(apply(Op::Div, &[3, 12]), Ok(4));
        assert_eq!(apply(Op::Div, &[5, 12]), Err(Rejected::NotDivisible));
        assert_eq!(apply(Op::Div, &[0, 4]), Err(Rejected::NotDivisible));
        assert_eq!(apply(Op::Sub, &[1, 2, 3]), Err(Rejected::TwoOperandsOnly));
        assert_eq!(apply(Op::Add, &[1, 2, 3, 4]), Ok(10));
        assert_eq!(apply(Op::Mul, &[2, 3, 4]), Ok(24));
        assert_eq!(apply(Op::Mul, &[2]), Err(Rejected::TooFewOperands));
    }

    #[test]
    fn solver_respects_exact_division() {
        assert!(solve(&[4, 6, 1, 1]).is_some());
        assert!(solve(&[1, 1, 1, 1]).is_none());
        // 5 × (5 − 1/5) needs a fraction.
        assert!(solve(&[1, 5, 5, 5]).is_none());
    }

    #[test]
    fn dealt_hands_are_in_range_and_solvable() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..20 {
            let hand = deal(&mut rng);
            assert!(hand.iter().all(|v| (CARD_MIN..=CARD_MAX).contains(v)));
            assert!(solve(&hand).is_some());
        }
    }
}
