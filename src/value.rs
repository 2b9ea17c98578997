use std::collections::{hash_map::Entry, HashMap};

use crate::config::ROUNDING_DIGITS;

/// Rounds to `digits` fractional digits, absorbing evaluator noise. Values
/// too large to scale are returned as they are; no fraction survives at
/// that magnitude anyway.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let mult = 10f64.powi(digits);
    let scaled = value * mult;

    if !scaled.is_finite() {
        return value;
    }

    scaled.round() / mult
}

/// A finite, already rounded value, usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueKey(u64);

impl ValueKey {
    pub fn new(rounded: f64) -> Option<Self> {
        if !rounded.is_finite() {
            return None;
        }

        // -0.0 and 0.0 must collide
        let normal = if rounded == 0.0 { 0.0 } else { rounded };

        Some(Self(normal.to_bits()))
    }

    /// Rounds `value` with the crate-wide precision first.
    pub fn of(value: f64) -> Option<Self> {
        Self::new(round_to(value, ROUNDING_DIGITS))
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Shortest known equation per value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMap {
    entries: HashMap<ValueKey, String>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `equation` for `key` unless an equation at least as short is
    /// already known. Returns whether the map changed.
    pub fn offer(&mut self, key: ValueKey, equation: String) -> bool {
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(equation);
                true
            },
            Entry::Occupied(mut slot) => {
                if equation.len() < slot.get().len() {
                    slot.insert(equation);
                    return true;
                }

                false
            },
        }
    }

    pub fn get(&self, key: ValueKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    /// Looks up an unrounded value.
    pub fn lookup(&self, value: f64) -> Option<&str> {
        self.get(ValueKey::of(value)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &str)> {
        self.entries.iter().map(|(k, eq)| (k.value(), eq.as_str()))
    }

    /// Entries in ascending order of value.
    pub fn sorted(&self) -> Vec<(f64, &str)> {
        let mut res = self.iter().collect::<Vec<_>>();
        res.sort_by(|a, b| a.0.total_cmp(&b.0));

        res
    }
}
