//! Fixed-capacity multichannel history addressed by absolute sample index.

/// Planar ring buffer with a monotonic write cursor.
///
/// Sample `n` (counted since the last clear) lives at `n % capacity` for as
/// long as `cursor - capacity <= n < cursor`.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    channels: Vec<Vec<f32>>,
    capacity: usize,
    cursor: u64,
}

impl RingBuffer {
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: vec![vec![0.0; capacity]; num_channels.max(1)],
            capacity,
            cursor: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Absolute index of the next sample to be written.
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Samples of valid history currently held.
    #[inline]
    pub fn valid_len(&self) -> usize {
        self.cursor.min(self.capacity as u64) as usize
    }

    /// Write `samples` to channel `ch` starting at the cursor. The cursor
    /// does not move until [`advance`](Self::advance).
    pub fn write_channel(&mut self, ch: usize, samples: impl Iterator<Item = f32>) {
        let capacity = self.capacity;
        let Some(data) = self.channels.get_mut(ch) else {
            return;
        };
        let mut idx = (self.cursor % capacity as u64) as usize;
        for s in samples {
            data[idx] = s;
            idx += 1;
            if idx == capacity {
                idx = 0;
            }
        }
    }

    pub fn advance(&mut self, n: usize) {
        self.cursor += n as u64;
    }

    /// Sample at absolute index `index` of channel `ch` (clamped to the last channel).
    #[inline]
    pub fn at(&self, ch: usize, index: u64) -> f32 {
        let ch = ch.min(self.channels.len() - 1);
        self.channels[ch][(index % self.capacity as u64) as usize]
    }

    /// Copy `dest.len()` samples of channel `ch` starting at absolute `start`.
    ///
    /// The caller guarantees the range is still held.
    pub fn read_into(&self, ch: usize, start: u64, dest: &mut [f32]) {
        let ch = ch.min(self.channels.len() - 1);
        let data = &self.channels[ch];
        let first = (start % self.capacity as u64) as usize;
        let head = dest.len().min(self.capacity - first);
        dest[..head].copy_from_slice(&data[first..first + head]);
        let rest = dest.len() - head;
        if rest > 0 {
            dest[head..].copy_from_slice(&data[..rest]);
        }
    }

    /// Zero the history and rewind the cursor.
    pub fn clear(&mut self) {
        for data in &mut self.channels {
            data.fill(0.0);
        }
        self.cursor = 0;
    }
}
