//! Descending quality levels tried by the re-encoder for JPEG and WebP.

/// An ordered, strictly descending sequence of encoder quality settings.
///
/// The first level is always tried. Later levels are produced while they stay at
/// or above `floor` and fewer than `max_steps` levels have been produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityLadder {
    start: u8,
    step: u8,
    floor: u8,
    max_steps: usize,
}

impl QualityLadder {
    pub fn new(start: u8, step: u8, floor: u8, max_steps: usize) -> Self {
        Self {
            start: start.clamp(1, 100),
            step: step.max(1),
            floor,
            max_steps: max_steps.max(1),
        }
    }

    pub fn levels(&self) -> Vec<u8> {
        self.iter().collect()
    }

    pub fn iter(&self) -> LadderIter {
        LadderIter {
            next: Some(self.start),
            remaining: self.max_steps,
            ladder: *self,
            first: true,
        }
    }
}

impl IntoIterator for &QualityLadder {
    type Item = u8;
    type IntoIter = LadderIter;

    fn into_iter(self) -> LadderIter {
        self.iter()
    }
}

/// Iterator over the levels of a [`QualityLadder`].
#[derive(Debug, Clone)]
pub struct LadderIter {
    next: Option<u8>,
    remaining: usize,
    ladder: QualityLadder,
    first: bool,
}

impl Iterator for LadderIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        let quality = self.next?;
        if !self.first && quality < self.ladder.floor {
            self.next = None;
            return None;
        }
        self.first = false;
        self.remaining -= 1;
        self.next = quality.checked_sub(self.ladder.step).filter(|q| *q > 0);
        Some(quality)
    }
}
