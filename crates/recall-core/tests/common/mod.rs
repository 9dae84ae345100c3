//! Shared test fixtures: operation strategies and a `VecDeque` reference model.

#![allow(dead_code)]

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};

pub fn arb_capacity() -> impl Strategy<Value = usize> {
    1usize..=20
}

pub fn arb_key() -> impl Strategy<Value = u16> {
    0u16..30
}

pub fn arb_value() -> impl Strategy<Value = i32> {
    any::<i32>()
}

/// A cache operation for state-machine testing.
#[derive(Debug, Clone)]
pub enum Op {
    Put(u16, i32),
    Get(u16),
    Peek(u16),
    Remove(u16),
    Contains(u16),
    Clear,
}

pub fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (arb_key(), arb_value()).prop_map(|(k, v)| Op::Put(k, v)),
        4 => arb_key().prop_map(Op::Get),
        2 => arb_key().prop_map(Op::Peek),
        2 => arb_key().prop_map(Op::Remove),
        2 => arb_key().prop_map(Op::Contains),
        1 => Just(Op::Clear),
    ]
}

pub fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..max)
}

/// Reference model tracking recency order as a VecDeque (front=MRU, back=LRU).
pub struct RefModel {
    capacity: usize,
    order: VecDeque<u16>,
    map: HashMap<u16, i32>,
}

impl RefModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            map: HashMap::new(),
        }
    }

    fn promote(&mut self, key: u16) {
        if let Some(pos) = self.order.iter().position(|&k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key);
    }

    pub fn put(&mut self, key: u16, value: i32) -> Option<(u16, i32)> {
        if let std::collections::hash_map::Entry::Occupied(mut e) = self.map.entry(key) {
            e.insert(value);
            self.promote(key);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            let lru_key = self.order.pop_back().unwrap();
            let lru_val = self.map.remove(&lru_key).unwrap();
            Some((lru_key, lru_val))
        } else {
            None
        };

        self.map.insert(key, value);
        self.order.push_front(key);
        evicted
    }

    pub fn get(&mut self, key: u16) -> Option<i32> {
        let value = self.map.get(&key).copied()?;
        self.promote(key);
        Some(value)
    }

    pub fn peek(&self, key: u16) -> Option<i32> {
        self.map.get(&key).copied()
    }

    pub fn remove(&mut self, key: u16) -> Option<i32> {
        let val = self.map.remove(&key)?;
        if let Some(pos) = self.order.iter().position(|&k| k == key) {
            self.order.remove(pos);
        }
        Some(val)
    }

    pub fn contains(&self, key: u16) -> bool {
        self.map.contains_key(&key)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn mru_order(&self) -> Vec<u16> {
        self.order.iter().copied().collect()
    }
}
