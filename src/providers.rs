//! Provider system for primitive value generation
//!
//! The dispatcher never draws primitive values itself. It hands the current
//! [`Target`] and [`Constraint`] to a [`PrimitiveProvider`], which turns them into
//! a value. Two providers ship with the crate:
//!
//! - [`RandomProvider`]: seeded `ChaCha8Rng` draws within the ranges of a
//!   [`ProviderConfig`]
//! - [`ReplayProvider`]: feeds the terminal values of a recorded
//!   [`DecisionLog`] back into a new session, falling back to an inner provider
//!   once the replay misaligns

use crate::decisions::{Choice, Constraint, DecisionLog, Target};
use crate::value::Value;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Random value generator consumed by the dispatcher.
///
/// Every method receives the target being generated and its resolved
/// constraint. Implementations must be deterministic for a given seed.
pub trait PrimitiveProvider: std::fmt::Debug {
    fn get_int(&mut self, target: &Target, constraint: &Constraint) -> i32;
    fn get_long(&mut self, target: &Target, constraint: &Constraint) -> i64;
    fn get_char(&mut self, target: &Target, constraint: &Constraint) -> char;
    fn get_float(&mut self, target: &Target, constraint: &Constraint) -> f32;
    fn get_double(&mut self, target: &Target, constraint: &Constraint) -> f64;
    fn get_bool(&mut self, target: &Target, constraint: &Constraint) -> bool;
    fn get_byte(&mut self, target: &Target, constraint: &Constraint) -> i8;
    fn get_short(&mut self, target: &Target, constraint: &Constraint) -> i16;
    fn get_string(&mut self, target: &Target, constraint: &Constraint) -> String;

    /// Index into `variants`, which is never empty.
    fn get_enum(&mut self, target: &Target, constraint: &Constraint, variants: &[String]) -> usize;

    /// Integer in `[lo, hi]`, inclusive on both ends.
    fn from_range(&mut self, lo: i64, hi: i64) -> i64;

    /// Underlying random source for collaborators that need raw randomness.
    fn random(&mut self) -> &mut dyn RngCore;

    /// Whether the null gate fires for a nullable target.
    ///
    /// Called for every gated target, with `None` when no null probability is
    /// bound. An unbound gate never fires and draws nothing from the random source.
    fn decide_null(&mut self, _target: &Target, null_prob: Option<f64>) -> bool {
        match null_prob {
            Some(p) => self.random().gen::<f64>() < p,
            None => false,
        }
    }

    /// Non-negative integer below `2^bits`.
    fn get_big_int(&mut self, _target: &Target, _constraint: &Constraint, bits: u32) -> i128 {
        let bits = bits.clamp(1, 126);
        self.random().gen_range(0..(1i128 << bits))
    }
}

/// Ranges used by [`RandomProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Inclusive bounds for integer kinds, clamped to each kind's width.
    pub integer_bounds: (i64, i64),

    /// Inclusive bounds for floating-point kinds.
    pub float_bounds: (f64, f64),

    /// Inclusive bounds on generated text length, in characters.
    pub text_length: (usize, usize),

    /// Characters used for text and `char` values.
    pub alphabet: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            integer_bounds: (-1000, 1000),
            float_bounds: (-1000.0, 1000.0),
            text_length: (0, 16),
            alphabet: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string(),
        }
    }
}

/// Seeded provider drawing uniformly within the configured ranges.
///
/// A constraint's `prob` biases draws: for booleans it is `P(true)`, for the
/// other kinds it is the probability of picking a boundary of the range.
#[derive(Debug)]
pub struct RandomProvider {
    rng: ChaCha8Rng,
    config: ProviderConfig,
    alphabet: Vec<char>,
}

impl RandomProvider {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, ProviderConfig::default())
    }

    /// Non-finite float bounds and an empty alphabet fall back to the defaults.
    pub fn with_config(seed: u64, mut config: ProviderConfig) -> Self {
        let (lo, hi) = config.float_bounds;
        if !lo.is_finite() || !hi.is_finite() {
            log::warn!("float bounds ({}, {}) are not finite, using defaults", lo, hi);
            config.float_bounds = ProviderConfig::default().float_bounds;
        }
        let mut alphabet: Vec<char> = config.alphabet.chars().collect();
        if alphabet.is_empty() {
            alphabet = ProviderConfig::default().alphabet.chars().collect();
        }
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            alphabet,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn boundary_draw(&mut self, constraint: &Constraint) -> bool {
        match constraint.prob {
            Some(p) => self.rng.gen::<f64>() < p,
            None => false,
        }
    }

    fn integer_in(&mut self, lo: i64, hi: i64, constraint: &Constraint) -> i64 {
        let (lo, hi) = ordered(lo, hi);
        if self.boundary_draw(constraint) {
            let mut edges = vec![lo, hi];
            if lo < 0 && hi > 0 {
                edges.push(0);
            }
            return edges[self.rng.gen_range(0..edges.len())];
        }
        self.rng.gen_range(lo..=hi)
    }

    fn clamped(&mut self, min: i64, max: i64, constraint: &Constraint) -> i64 {
        let (lo, hi) = self.config.integer_bounds;
        let (lo, hi) = ordered(lo, hi);
        self.integer_in(lo.clamp(min, max), hi.clamp(min, max), constraint)
    }

    fn pick_char(&mut self) -> char {
        self.alphabet[self.rng.gen_range(0..self.alphabet.len())]
    }
}

/// Widest float span sampled with `gen_range`, which overflows near `f64::MAX`.
const WIDE_FLOAT_SPAN: f64 = f64::MAX / 4.0;

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PrimitiveProvider for RandomProvider {
    fn get_int(&mut self, _target: &Target, constraint: &Constraint) -> i32 {
        self.clamped(i32::MIN as i64, i32::MAX as i64, constraint) as i32
    }

    fn get_long(&mut self, _target: &Target, constraint: &Constraint) -> i64 {
        self.clamped(i64::MIN, i64::MAX, constraint)
    }

    fn get_char(&mut self, _target: &Target, _constraint: &Constraint) -> char {
        self.pick_char()
    }

    fn get_float(&mut self, target: &Target, constraint: &Constraint) -> f32 {
        let value = self.get_double(target, constraint);
        value.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32
    }

    fn get_double(&mut self, _target: &Target, constraint: &Constraint) -> f64 {
        let (lo, hi) = ordered(self.config.float_bounds.0, self.config.float_bounds.1);
        if self.boundary_draw(constraint) {
            let mut edges = vec![lo, hi];
            if lo < 0.0 && hi > 0.0 {
                edges.push(0.0);
            }
            return edges[self.rng.gen_range(0..edges.len())];
        }
        if lo == hi {
            return lo;
        }
        if hi - lo < WIDE_FLOAT_SPAN {
            return self.rng.gen_range(lo..=hi);
        }
        // Too wide for a uniform range; interpolate between the bounds instead.
        let t = self.rng.gen::<f64>();
        (lo * (1.0 - t) + hi * t).clamp(lo, hi)
    }

    fn get_bool(&mut self, _target: &Target, constraint: &Constraint) -> bool {
        let p = constraint.prob.unwrap_or(0.5).clamp(0.0, 1.0);
        self.rng.gen_bool(p)
    }

    fn get_byte(&mut self, _target: &Target, constraint: &Constraint) -> i8 {
        self.clamped(i8::MIN as i64, i8::MAX as i64, constraint) as i8
    }

    fn get_short(&mut self, _target: &Target, constraint: &Constraint) -> i16 {
        self.clamped(i16::MIN as i64, i16::MAX as i64, constraint) as i16
    }

    fn get_string(&mut self, _target: &Target, constraint: &Constraint) -> String {
        let (min, max) = ordered(self.config.text_length.0, self.config.text_length.1);
        let len = if self.boundary_draw(constraint) {
            if self.rng.gen_bool(0.5) {
                min
            } else {
                max
            }
        } else {
            self.rng.gen_range(min..=max)
        };
        (0..len).map(|_| self.pick_char()).collect()
    }

    fn get_enum(&mut self, _target: &Target, _constraint: &Constraint, variants: &[String]) -> usize {
        self.rng.gen_range(0..variants.len().max(1))
    }

    fn from_range(&mut self, lo: i64, hi: i64) -> i64 {
        let (lo, hi) = ordered(lo, hi);
        self.rng.gen_range(lo..=hi)
    }

    fn random(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }
}

/// Provider that replays the terminal values of a prior decision log.
///
/// The inner provider is always consulted first so that its random stream
/// advances exactly as in the recorded run; the recorded value then replaces
/// the fresh one. A target or value-kind mismatch marks the replay misaligned,
/// after which the inner provider's values are used unchanged.
#[derive(Debug)]
pub struct ReplayProvider {
    inner: Box<dyn PrimitiveProvider>,
    choices: Vec<Choice>,
    position: usize,
    /// Position of the first mismatch and the kind recorded there.
    misaligned_at: Option<(usize, &'static str)>,
}

impl ReplayProvider {
    pub fn new(log: &DecisionLog, inner: Box<dyn PrimitiveProvider>) -> Self {
        Self {
            inner,
            choices: log.choices().to_vec(),
            position: 0,
            misaligned_at: None,
        }
    }

    /// Replay over a [`RandomProvider`] seeded with the log's own seed.
    pub fn seeded(log: &DecisionLog, config: ProviderConfig) -> Self {
        Self::new(log, Box::new(RandomProvider::with_config(log.seed(), config)))
    }

    pub fn replayed(&self) -> usize {
        self.position
    }

    pub fn is_misaligned(&self) -> bool {
        self.misaligned_at.is_some()
    }

    pub fn misalignment_position(&self) -> Option<usize> {
        self.misaligned_at.map(|(position, _)| position)
    }

    /// Kind of the recorded choice that failed to line up, `"null"` for a null marker.
    pub fn misaligned_kind(&self) -> Option<&'static str> {
        self.misaligned_at.map(|(_, kind)| kind)
    }

    fn current(&self) -> Option<&Choice> {
        if self.misaligned_at.is_some() {
            return None;
        }
        self.choices.get(self.position)
    }

    fn replay<T>(&mut self, target: &Target, fresh: T, extract: impl Fn(&Value) -> Option<T>) -> T {
        let (recorded, kind) = match self.current() {
            Some(choice) => {
                let kind = choice.value.as_ref().map_or("null", Value::kind_name);
                let value = if choice.target.same_location(target) {
                    choice.value.as_ref().and_then(&extract)
                } else {
                    None
                };
                (value, kind)
            }
            None => return fresh,
        };
        match recorded {
            Some(value) => {
                self.position += 1;
                value
            }
            None => {
                log::warn!(
                    "replay misaligned at choice {}: recorded {} does not fit {}",
                    self.position,
                    kind,
                    target
                );
                self.misaligned_at = Some((self.position, kind));
                fresh
            }
        }
    }
}

impl PrimitiveProvider for ReplayProvider {
    fn get_int(&mut self, target: &Target, constraint: &Constraint) -> i32 {
        let fresh = self.inner.get_int(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Int(x) => Some(*x),
            _ => None,
        })
    }

    fn get_long(&mut self, target: &Target, constraint: &Constraint) -> i64 {
        let fresh = self.inner.get_long(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Long(x) => Some(*x),
            _ => None,
        })
    }

    fn get_char(&mut self, target: &Target, constraint: &Constraint) -> char {
        let fresh = self.inner.get_char(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Char(x) => Some(*x),
            _ => None,
        })
    }

    fn get_float(&mut self, target: &Target, constraint: &Constraint) -> f32 {
        let fresh = self.inner.get_float(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Float(x) => Some(*x),
            _ => None,
        })
    }

    fn get_double(&mut self, target: &Target, constraint: &Constraint) -> f64 {
        let fresh = self.inner.get_double(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Double(x) => Some(*x),
            _ => None,
        })
    }

    fn get_bool(&mut self, target: &Target, constraint: &Constraint) -> bool {
        let fresh = self.inner.get_bool(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Bool(x) => Some(*x),
            _ => None,
        })
    }

    fn get_byte(&mut self, target: &Target, constraint: &Constraint) -> i8 {
        let fresh = self.inner.get_byte(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Byte(x) => Some(*x),
            _ => None,
        })
    }

    fn get_short(&mut self, target: &Target, constraint: &Constraint) -> i16 {
        let fresh = self.inner.get_short(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Short(x) => Some(*x),
            _ => None,
        })
    }

    fn get_string(&mut self, target: &Target, constraint: &Constraint) -> String {
        let fresh = self.inner.get_string(target, constraint);
        self.replay(target, fresh, |v| match v {
            Value::Text(x) => Some(x.clone()),
            _ => None,
        })
    }

    fn get_enum(&mut self, target: &Target, constraint: &Constraint, variants: &[String]) -> usize {
        let fresh = self.inner.get_enum(target, constraint, variants);
        self.replay(target, fresh, |v| match v {
            Value::Enum { variant, .. } => variants.iter().position(|known| known == variant),
            _ => None,
        })
    }

    fn get_big_int(&mut self, target: &Target, constraint: &Constraint, bits: u32) -> i128 {
        let fresh = self.inner.get_big_int(target, constraint, bits);
        self.replay(target, fresh, |v| match v {
            Value::BigInt(x) => Some(*x),
            _ => None,
        })
    }

    fn decide_null(&mut self, target: &Target, null_prob: Option<f64>) -> bool {
        let fresh = self.inner.decide_null(target, null_prob);
        match self.current() {
            Some(choice) if choice.is_null() && choice.target.same_location(target) => {
                self.position += 1;
                true
            }
            Some(_) => false,
            None => fresh,
        }
    }

    fn from_range(&mut self, lo: i64, hi: i64) -> i64 {
        self.inner.from_range(lo, hi)
    }

    fn random(&mut self) -> &mut dyn RngCore {
        self.inner.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let target = Target::at("i32");
        let constraint = Constraint::new();
        let mut a = RandomProvider::new(11);
        let mut b = RandomProvider::new(11);
        for _ in 0..50 {
            assert_eq!(a.get_int(&target, &constraint), b.get_int(&target, &constraint));
            assert_eq!(a.get_string(&target, &constraint), b.get_string(&target, &constraint));
        }
    }

    #[test]
    fn test_values_stay_within_default_bounds() {
        let target = Target::at("x");
        let constraint = Constraint::new();
        let mut provider = RandomProvider::new(3);
        for _ in 0..500 {
            let i = provider.get_int(&target, &constraint);
            assert!((-1000..=1000).contains(&i));
            let d = provider.get_double(&target, &constraint);
            assert!((-1000.0..=1000.0).contains(&d));
            let s = provider.get_string(&target, &constraint);
            assert!(s.chars().count() <= 16);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
            let r = provider.from_range(0, 10);
            assert!((0..=10).contains(&r));
        }
    }

    #[test]
    fn test_prob_one_draws_boundaries() {
        let target = Target::at("i8");
        let constraint = Constraint::new().with_prob(1.0);
        let mut provider = RandomProvider::new(5);
        for _ in 0..100 {
            let b = provider.get_byte(&target, &constraint);
            assert!(b == i8::MIN || b == i8::MAX || b == 0, "unexpected {}", b);
        }
        assert!(provider.get_bool(&target, &constraint));
        assert!(!provider.get_bool(&target, &Constraint::new().with_prob(0.0)));
    }

    #[test]
    fn test_full_range_float_bounds_do_not_overflow() {
        let config = ProviderConfig {
            float_bounds: (f64::MIN, f64::MAX),
            ..ProviderConfig::default()
        };
        let mut provider = RandomProvider::with_config(9, config);
        let target = Target::at("f64");
        for constraint in [Constraint::new(), Constraint::new().with_prob(1.0)] {
            for _ in 0..200 {
                let d = provider.get_double(&target, &constraint);
                assert!(d.is_finite());
                let f = provider.get_float(&target, &constraint);
                assert!(f.is_finite());
            }
        }
    }

    #[test]
    fn test_non_finite_float_bounds_fall_back_to_defaults() {
        let config = ProviderConfig {
            float_bounds: (f64::NEG_INFINITY, f64::NAN),
            ..ProviderConfig::default()
        };
        let provider = RandomProvider::with_config(1, config);
        assert_eq!(provider.config().float_bounds, (-1000.0, 1000.0));
    }

    #[test]
    fn test_unbound_null_gate_never_fires() {
        let target = Target::at("String");
        let mut a = RandomProvider::new(4);
        let mut b = RandomProvider::new(4);
        assert!(!a.decide_null(&target, None));
        assert!(a.decide_null(&target, Some(1.0)));
        b.decide_null(&target, Some(1.0));
        assert_eq!(a.get_int(&target, &Constraint::new()), b.get_int(&target, &Constraint::new()));
    }

    #[test]
    fn test_replay_overrides_and_detects_misalignment() {
        let mut log = DecisionLog::new(1, None);
        log.push(Choice::value(Target::at("A.i32"), Value::Int(42)));
        log.push(Choice::value(Target::at("A.String"), Value::Int(7)));

        let mut replay = ReplayProvider::seeded(&log, ProviderConfig::default());
        let constraint = Constraint::new();
        assert_eq!(replay.get_int(&Target::at("A.i32"), &constraint), 42);
        assert!(!replay.is_misaligned());

        let text = replay.get_string(&Target::at("A.String"), &constraint);
        assert!(text.chars().count() <= 16);
        assert_eq!(replay.misalignment_position(), Some(1));
        assert_eq!(replay.misaligned_kind(), Some("int"));
        assert_eq!(replay.replayed(), 1);
    }
}
