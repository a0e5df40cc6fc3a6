//! Bounded FIFO of raw frames kept for export

use ns_core::{config_error, Frame, NsResult};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct FrameHistory {
    frames: VecDeque<Frame>,
    max_frames: usize,
}

impl FrameHistory {
    pub fn new(max_frames: usize) -> NsResult<Self> {
        if max_frames == 0 {
            return Err(config_error!("history must retain at least one frame"));
        }
        Ok(Self {
            frames: VecDeque::with_capacity(max_frames),
            max_frames,
        })
    }

    /// Append a frame, evicting the oldest one when over the bound
    pub fn push(&mut self, frame: Frame) -> Option<Frame> {
        self.frames.push_back(frame);
        if self.frames.len() > self.max_frames {
            self.frames.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Owned copy for handing to an exporter off the consumer's thread
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.iter().cloned().collect()
    }

    /// Samples per channel across all retained frames
    pub fn total_samples(&self) -> usize {
        self.frames.iter().map(Frame::sample_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::{BandPower, BrainState, CHANNEL_COUNT};

    fn frame(sequence: u64) -> Frame {
        Frame::new(
            sequence, 0, 256.0, sequence * 4, BrainState::Focused,
            std::array::from_fn(|_| vec![0.0; 4]),
            BandPower::uniform(), [0.8; CHANNEL_COUNT],
        )
        .unwrap()
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = FrameHistory::new(3).unwrap();
        for seq in 0..3 {
            assert!(history.push(frame(seq)).is_none());
        }

        let evicted = history.push(frame(3)).unwrap();
        assert_eq!(evicted.sequence, 0);
        assert_eq!(history.len(), 3);

        let kept: Vec<u64> = history.iter().map(|f| f.sequence).collect();
        assert_eq!(kept, vec![1, 2, 3]);
        assert_eq!(history.total_samples(), 12);
    }

    #[test]
    fn test_clear_and_snapshot() {
        let mut history = FrameHistory::new(5).unwrap();
        history.push(frame(0));
        history.push(frame(1));

        let snapshot = history.snapshot();
        history.clear();

        assert!(history.is_empty());
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_zero_bound_rejected() {
        assert!(FrameHistory::new(0).is_err());
    }
}
