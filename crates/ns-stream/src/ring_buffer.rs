//! Fixed-capacity per-channel circular sample storage
//!
//! All channels share one monotonic write cursor, so slot `i` holds the same
//! sample instant in every channel and a single read window applies to all of
//! them.

use ns_core::{config_error, Channel, Frame, NsResult, CHANNEL_COUNT};

#[derive(Debug, Clone)]
pub struct RingBuffer {
    capacity: usize,
    channels: [Vec<f32>; CHANNEL_COUNT],
    cursor: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> NsResult<Self> {
        if capacity == 0 {
            return Err(config_error!("ring buffer capacity must be non-zero"));
        }
        Ok(Self {
            capacity,
            channels: std::array::from_fn(|_| vec![0.0; capacity]),
            cursor: 0,
        })
    }

    /// Append every sample of `frame`. Work is proportional to the frame, not
    /// to the capacity.
    pub fn write_frame(&mut self, frame: &Frame) {
        for offset in 0..frame.sample_count() {
            let slot = self.next_slot();
            for channel in Channel::ALL {
                self.channels[channel.index()][slot] = frame.channel(channel)[offset];
            }
            self.cursor += 1;
        }
    }

    /// Zero every slot in place and rewind the cursor
    pub fn clear(&mut self) {
        for samples in &mut self.channels {
            samples.fill(0.0);
        }
        self.cursor = 0;
    }

    /// Total samples ever written since the last clear
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot the next sample will be written to
    pub fn next_slot(&self) -> usize {
        (self.cursor % self.capacity as u64) as usize
    }

    /// Number of valid samples held per channel: `min(cursor, capacity)`
    pub fn len(&self) -> usize {
        self.cursor.min(self.capacity as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// The underlying circular array for one channel, in slot order
    pub fn raw(&self, channel: Channel) -> &[f32] {
        &self.channels[channel.index()]
    }

    /// Retained samples for one channel, oldest first
    pub fn window(&self, channel: Channel) -> Vec<f32> {
        let samples = self.raw(channel);
        if self.cursor <= self.capacity as u64 {
            return samples[..self.len()].to_vec();
        }

        let split = self.next_slot();
        let mut ordered = Vec::with_capacity(self.capacity);
        ordered.extend_from_slice(&samples[split..]);
        ordered.extend_from_slice(&samples[..split]);
        ordered
    }

    /// Most recently written sample for one channel
    pub fn latest(&self, channel: Channel) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let slot = ((self.cursor - 1) % self.capacity as u64) as usize;
        Some(self.channels[channel.index()][slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::{BandPower, BrainState};

    /// Frame whose sample values encode (channel, global sample index)
    fn numbered_frame(start: u64, count: usize) -> Frame {
        let channels = std::array::from_fn(|ch| {
            (0..count as u64)
                .map(|i| ch as f32 * 10_000.0 + (start + i) as f32)
                .collect()
        });
        Frame::new(
            0, 0, 256.0, start, BrainState::Relaxed,
            channels, BandPower::uniform(), [0.9; CHANNEL_COUNT],
        )
        .unwrap()
    }

    fn expected_window(channel: Channel, written: u64, capacity: usize) -> Vec<f32> {
        let first = written.saturating_sub(capacity as u64);
        (first..written)
            .map(|i| channel.index() as f32 * 10_000.0 + i as f32)
            .collect()
    }

    #[test]
    fn test_holds_most_recent_min_w_c_samples() {
        let capacity = 10;
        let mut ring = RingBuffer::new(capacity).unwrap();
        let mut written = 0_u64;

        for count in [3, 4, 1, 5, 9, 2, 7] {
            ring.write_frame(&numbered_frame(written, count));
            written += count as u64;

            assert_eq!(ring.cursor(), written);
            assert_eq!(ring.len(), (written as usize).min(capacity));
            assert_eq!(ring.next_slot(), (written % capacity as u64) as usize);
            for channel in Channel::ALL {
                assert_eq!(ring.window(channel), expected_window(channel, written, capacity));
            }
        }
    }

    #[test]
    fn test_channels_stay_index_aligned() {
        let mut ring = RingBuffer::new(8).unwrap();
        ring.write_frame(&numbered_frame(0, 13));

        for slot in 0..8 {
            let reference = ring.raw(Channel::Fp1)[slot];
            for channel in Channel::ALL {
                let offset = channel.index() as f32 * 10_000.0;
                assert_eq!(ring.raw(channel)[slot] - offset, reference);
            }
        }
        assert_eq!(ring.latest(Channel::O2), Some(6.0 * 10_000.0 + 12.0));
    }

    #[test]
    fn test_clear_zeroes_in_place() {
        let mut ring = RingBuffer::new(16).unwrap();
        ring.write_frame(&numbered_frame(0, 20));
        let before = ring.raw(Channel::Cz).as_ptr();

        ring.clear();

        assert_eq!(ring.cursor(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.latest(Channel::Cz), None);
        assert!(ring.window(Channel::Cz).is_empty());
        assert!(Channel::ALL.iter().all(|ch| ring.raw(*ch).iter().all(|s| *s == 0.0)));
        assert_eq!(ring.raw(Channel::Cz).as_ptr(), before);
        assert_eq!(ring.raw(Channel::Cz).len(), 16);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(RingBuffer::new(0).is_err());
    }
}
