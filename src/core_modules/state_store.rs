// THEORY:
// The `StateStore` closes the feedback loop. Three values survive from one invocation
// to the next: the reduced frame, the motion field and the focus point. Each lives in
// a `PingPong` pair of slots:
//
// - the **read** slot holds what the previous invocation stored, and is what the
//   detect and resolve stages read as "previous";
// - the **write** slot holds the buffer from two invocations ago, which the current
//   invocation takes, overwrites and hands back through `publish`.
//
// `publish` stores into the write slot and flips the roles in one move, so nothing a
// stage is reading is ever mutated in place, and the state written at the end of
// invocation N is exactly the state read at the start of invocation N+1. Buffers are
// recycled rather than appended to, so memory stays flat over a session.
//
// `PipelineState` bundles the three pairs with a frame counter. It is a plain value:
// the pipeline takes it by value and returns the successor.

use crate::core_modules::frame_sampler::ReducedFrame;
use crate::core_modules::motion_detector::MotionField;
use crate::core_modules::point::Point;

/// Two storage slots whose read/write roles alternate on every publish.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [Option<T>; 2],
    read_slot: usize,
}

impl<T> Default for PingPong<T> {
    fn default() -> Self {
        Self {
            slots: [None, None],
            read_slot: 0,
        }
    }
}

impl<T> PingPong<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value published most recently.
    pub fn read(&self) -> Option<&T> {
        self.slots[self.read_slot].as_ref()
    }

    /// Takes the recyclable buffer out of the write slot, if there is one.
    pub fn take_write(&mut self) -> Option<T> {
        self.slots[1 - self.read_slot].take()
    }

    /// Stores `value` in the write slot and makes it the new read slot.
    pub fn publish(&mut self, value: T) {
        let write_slot = 1 - self.read_slot;
        self.slots[write_slot] = Some(value);
        self.read_slot = write_slot;
    }

    pub fn clear(&mut self) {
        self.slots = [None, None];
        self.read_slot = 0;
    }
}

/// Everything the pipeline carries from one frame to the next.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    frames: PingPong<ReducedFrame>,
    motion: PingPong<MotionField>,
    focus: PingPong<Point>,
    frames_processed: u64,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_frame(&self) -> Option<&ReducedFrame> {
        self.frames.read()
    }

    pub fn previous_motion(&self) -> Option<&MotionField> {
        self.motion.read()
    }

    /// The stored focus, or the screen center at session start.
    pub fn previous_focus(&self) -> Point {
        self.focus.read().copied().unwrap_or(Point::SCREEN_CENTER)
    }

    /// Number of invocations stored since session start.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// A reduced-frame buffer to overwrite this invocation.
    pub fn take_frame_buffer(&mut self) -> Option<ReducedFrame> {
        self.frames.take_write()
    }

    /// A motion-field buffer to overwrite this invocation.
    pub fn take_motion_buffer(&mut self) -> Option<MotionField> {
        self.motion.take_write()
    }

    /// Publishes this invocation's results as next invocation's "previous" and returns
    /// the index of the frame just stored.
    pub fn store(&mut self, frame: ReducedFrame, motion: MotionField, focus: Point) -> u64 {
        self.frames.publish(frame);
        self.motion.publish(motion);
        self.focus.publish(focus);
        let index = self.frames_processed;
        self.frames_processed += 1;
        index
    }

    /// Returns to session-start state.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.motion.clear();
        self.focus.clear();
        self.frames_processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_flips_read_and_write() {
        let mut slots = PingPong::new();
        assert!(slots.read().is_none());
        assert!(slots.take_write().is_none());

        slots.publish(1);
        assert_eq!(slots.read(), Some(&1));
        assert!(slots.take_write().is_none());

        slots.publish(2);
        assert_eq!(slots.read(), Some(&2));

        // The write slot now holds the value from two publishes ago.
        assert_eq!(slots.take_write(), Some(1));
        assert_eq!(slots.read(), Some(&2));
    }

    #[test]
    fn taking_the_write_slot_never_touches_the_read_slot() {
        let mut slots = PingPong::new();
        slots.publish(vec![1, 2, 3]);
        slots.publish(vec![4, 5, 6]);
        let mut recycled = slots.take_write().expect("recycled buffer");
        recycled.clear();
        recycled.push(7);
        assert_eq!(slots.read(), Some(&vec![4, 5, 6]));
        slots.publish(recycled);
        assert_eq!(slots.read(), Some(&vec![7]));
    }

    #[test]
    fn state_starts_centered_and_counts_frames() {
        let mut state = PipelineState::new();
        assert_eq!(state.previous_focus(), Point::SCREEN_CENTER);
        assert!(state.previous_frame().is_none());

        let index = state.store(ReducedFrame::blank(2, 2), MotionField::zeros(2, 2), Point::new(0.2, 0.3));
        assert_eq!(index, 0);
        assert_eq!(state.frames_processed(), 1);
        assert_eq!(state.previous_focus(), Point::new(0.2, 0.3));
        assert_eq!(state.previous_motion().map(MotionField::dimensions), Some((2, 2)));

        state.reset();
        assert_eq!(state.previous_focus(), Point::SCREEN_CENTER);
        assert_eq!(state.frames_processed(), 0);
        assert!(state.previous_motion().is_none());
    }
}
