use std::collections::VecDeque;

use crate::error::{BufferError, Result};

/// Fixed-capacity FIFO that can evict its oldest element when full.
///
/// Not synchronized; the registries wrap it in a mutex.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. A capacity of zero is raised to one.
    ///
    /// Storage is allocated as values arrive, so idle buffers cost nothing.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Append `value`.
    ///
    /// When full, `overwrite` evicts the oldest element; otherwise the push
    /// fails with [`BufferError::Full`] and the contents are left as they were.
    pub fn push(&mut self, value: T, overwrite: bool) -> Result<()> {
        if self.is_full() && !overwrite {
            return Err(BufferError::Full {
                capacity: self.capacity,
            });
        }
        self.push_overwrite(value);
        Ok(())
    }

    /// Append `value`, returning the evicted element if the buffer was full.
    pub fn push_overwrite(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        evicted
    }

    /// Newest element.
    pub fn peek_latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest element.
    pub fn peek_oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Remove and return the oldest element.
    pub fn pop_oldest(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Remove every element, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }
}
