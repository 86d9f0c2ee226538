//! Per-archetype trajectory forecasting.
//!
//! A forecast is a finite, non-restartable iterator of future position
//! samples for one zombie, built from the *prototype* (historically observed
//! worst-case) stats of its type rather than today's possibly partial
//! observation. The only per-zombie inputs are its position, facing and the
//! current-turn wait gate.

use crate::position::Position;
use crate::units::{Zombie, ZombieProto, ZombieType};
use std::collections::VecDeque;

/// Number of future turns simulated by forecasts and the spawn wave.
pub const LOOK_AHEAD: usize = 10;

/// Per-effective-turn damage decay factor.
pub const TIME_FACTOR: f64 = 0.9;

/// One forecasted arrival: where the zombie is, which way it faces, how many
/// turns from now, and the time-discounted damage it would deal there.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FutureSample {
    pub pos: Position,
    pub dir: Position,
    pub step: usize,
    pub damage: f64,
}

/// Build the forecast for one zombie over `horizon` turns.
pub fn forecast(zombie: &Zombie, proto: &ZombieProto, horizon: usize) -> Forecast {
    // The first move is gated by the wait actually reported this turn; every
    // later gap assumes the prototype-maximum wait.
    let first_turn = zombie.wait_turns.max(0) as usize;
    let gap = (proto.wait_turns.max(1)) as usize;

    match zombie.kind {
        ZombieType::ChaosKnight => Forecast::Knight(KnightForecast {
            queue: VecDeque::from([Branch {
                pos: zombie.position,
                dir: zombie.direction,
                damage: proto.attack as f64,
            }]),
            next_queue: VecDeque::new(),
            pending: None,
            turn: first_turn,
            gap,
            horizon,
        }),
        _ => Forecast::March(MarchForecast {
            pos: zombie.position,
            dir: zombie.direction,
            damage: proto.attack as f64,
            speed: proto.speed.max(0),
            emitted_in_turn: 0,
            turn: first_turn,
            gap,
            horizon,
        }),
    }
}

pub enum Forecast {
    March(MarchForecast),
    Knight(KnightForecast),
}

impl Iterator for Forecast {
    type Item = FutureSample;

    fn next(&mut self) -> Option<FutureSample> {
        match self {
            Forecast::March(forecast) => forecast.next(),
            Forecast::Knight(forecast) => forecast.next(),
        }
    }
}

/// Straight-line walker: normal, fast, bomber, liner and juggernaut all
/// advance `speed` cells along their facing on each effective turn, emitting
/// one sample per intermediate cell.
pub struct MarchForecast {
    pos: Position,
    dir: Position,
    damage: f64,
    speed: i32,
    emitted_in_turn: i32,
    turn: usize,
    gap: usize,
    horizon: usize,
}

impl Iterator for MarchForecast {
    type Item = FutureSample;

    fn next(&mut self) -> Option<FutureSample> {
        loop {
            if self.turn >= self.horizon {
                return None;
            }

            if self.emitted_in_turn == 0 {
                self.damage *= TIME_FACTOR;
            }

            if self.emitted_in_turn < self.speed {
                self.emitted_in_turn += 1;
                self.pos += self.dir;
                return Some(FutureSample {
                    pos: self.pos,
                    dir: self.dir,
                    step: self.turn,
                    damage: self.damage,
                });
            }

            self.turn += self.gap;
            self.emitted_in_turn = 0;
        }
    }
}

#[derive(Copy, Clone)]
struct Branch {
    pos: Position,
    dir: Position,
    damage: f64,
}

/// Chaos knight: fixed effective speed; each effective turn a branch advances
/// two cells forward, then turns 90 degrees and advances one more. The future
/// rotation is unknowable, so both outcomes are enumerated deterministically
/// and the union of the branches is emitted.
pub struct KnightForecast {
    queue: VecDeque<Branch>,
    next_queue: VecDeque<Branch>,
    pending: Option<FutureSample>,
    turn: usize,
    gap: usize,
    horizon: usize,
}

impl Iterator for KnightForecast {
    type Item = FutureSample;

    fn next(&mut self) -> Option<FutureSample> {
        if let Some(sample) = self.pending.take() {
            return Some(sample);
        }

        if self.queue.is_empty() {
            std::mem::swap(&mut self.queue, &mut self.next_queue);
            self.turn += self.gap;
        }

        if self.turn >= self.horizon {
            return None;
        }

        let branch = self.queue.pop_front()?;
        let damage = branch.damage * TIME_FACTOR;
        let ahead = branch.pos + branch.dir * 2;

        let left_dir = branch.dir.rotated_ccw();
        let left = Branch {
            pos: ahead + left_dir,
            dir: left_dir,
            damage,
        };
        let right_dir = -left_dir;
        let right = Branch {
            pos: ahead + right_dir,
            dir: right_dir,
            damage,
        };

        self.next_queue.push_back(left);
        self.next_queue.push_back(right);

        self.pending = Some(FutureSample {
            pos: right.pos,
            dir: right.dir,
            step: self.turn,
            damage,
        });
        Some(FutureSample {
            pos: left.pos,
            dir: left.dir,
            step: self.turn,
            damage,
        })
    }
}
