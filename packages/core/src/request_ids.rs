//! Reusable request ids for correlated transports.

use crate::{Error, Result};

pub const DEFAULT_CAPACITY: usize = 1024;

/// A bounded pool of request ids.
///
/// An id is taken when a request is sent and returned when its reply
/// arrives, so at most `capacity` requests can be in flight.
#[derive(Debug)]
pub struct RequestIdPool {
    capacity: usize,
    free: Vec<i64>,
}

impl RequestIdPool {
    pub fn new(capacity: usize) -> Self {
        // Reversed so that ids are handed out lowest first.
        let free = (0..capacity as i64).rev().collect();
        Self { capacity, free }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.capacity - self.free.len()
    }

    pub fn acquire(&mut self) -> Result<i64> {
        self.free.pop().ok_or(Error::IdentifierExhausted {
            capacity: self.capacity,
        })
    }

    /// Return an id to the pool. Ids outside the pool and ids that are
    /// already free are ignored.
    pub fn release(&mut self, id: i64) {
        let in_range = id >= 0 && (id as usize) < self.capacity;
        if in_range && !self.free.contains(&id) {
            self.free.push(id);
        }
    }
}

impl Default for RequestIdPool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
