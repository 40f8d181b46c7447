use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Bounded byte buffer that keeps only the most recent `cap` bytes.
#[derive(Debug)]
pub struct RingBytes {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(64 * 1024))),
            cap,
        })
    }

    pub fn push(&self, data: &[u8]) {
        if self.cap == 0 {
            return;
        }
        let mut g = self.lock();
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.lock();
        let mut vec = Vec::with_capacity(g.len());
        vec.extend(g.iter().copied());
        vec
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A pump that panicked mid-push leaves the bytes valid, so keep using them.
    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_bytes() {
        let ring = RingBytes::new(5);
        ring.push(b"abc");
        ring.push(b"defg");
        assert_eq!(ring.to_bytes(), b"cdefg");

        ring.push(b"0123456789");
        assert_eq!(ring.to_bytes(), b"56789");
        assert_eq!(ring.len(), 5);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let ring = RingBytes::new(0);
        ring.push(b"abc");
        assert!(ring.is_empty());
    }
}
