use std::collections::VecDeque;

/// Moving average over the last `capacity` readings of one signal.
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    buffer: VecDeque<f64>,
    capacity: usize,
}

impl SignalSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends `value`, evicting the oldest reading past capacity, and
    /// returns the mean of what remains.
    pub fn push(&mut self, value: f64) -> f64 {
        self.buffer.push_back(value);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }

    pub fn mean(&self) -> Option<f64> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.iter().sum::<f64>() / self.buffer.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
