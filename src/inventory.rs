//! Counted stock over a closed key domain.

use std::collections::HashMap;
use std::fmt;

use crate::model::{Catalog, Coin};
use crate::Amount;

/// Non-negative count for every key of a [`Catalog`].
///
/// Every key is present from construction, so `add` and `deduct` never see a
/// missing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory<K: Catalog> {
    counts: HashMap<K, u32>,
}

impl<K: Catalog> Inventory<K> {
    /// Inventory with every key at zero.
    pub fn new() -> Self {
        Self::stocked(0)
    }

    /// Inventory with every key at `count`.
    pub fn stocked(count: u32) -> Self {
        Self {
            counts: K::ALL.iter().map(|key| (*key, count)).collect(),
        }
    }

    pub fn put(&mut self, key: K, count: u32) {
        self.counts.insert(key, count);
    }

    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_default() += 1;
    }

    /// Remove one unit of `key`.
    ///
    /// # Panics
    ///
    /// If the count is already zero. Callers check `has` first.
    pub fn deduct(&mut self, key: K) {
        let count = self.counts.entry(key).or_default();
        assert!(*count > 0, "deduct on empty inventory slot {key:?}");
        *count -= 1;
    }

    pub fn has(&self, key: K) -> bool {
        self.count(key) > 0
    }

    pub fn count(&self, key: K) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Zero every count.
    pub fn clear(&mut self) {
        for count in self.counts.values_mut() {
            *count = 0;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|count| *count == 0)
    }

    /// Keys and counts in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        K::ALL.iter().map(|key| (*key, self.count(*key)))
    }
}

impl Inventory<Coin> {
    /// Cash value held.
    pub fn total(&self) -> Amount {
        self.iter()
            .map(|(coin, count)| Amount::from_cents(coin.denomination().cents() * count as u64))
            .sum()
    }
}

impl<K: Catalog> Default for Inventory<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Catalog> fmt::Display for Inventory<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (key, count)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={count}", key.name())?;
        }
        f.write_str("}")
    }
}
