mod __test__;

use std::sync::Arc;

use crate::format::FormatPlan;
use crate::level::Level;
use crate::record::Slot;

/// Everything guarded by the logger's queue mutex: the active staging
/// buffer, its cursor, the drop counter and the per-level format plans.
///
/// The swap partner is owned by the consumer thread; a drain is one
/// `swap_out` call, a pointer-level exchange of the two slot vectors.
#[derive(Debug)]
pub struct QueueState {
  pub slots: Vec<Slot>,
  pub cursor: usize,
  pub dropped: u64,
  pub plans: [Arc<FormatPlan>; Level::COUNT],
}

impl QueueState {
  pub fn new(
    queue_size: usize,
    message_max: usize,
    plans: [Arc<FormatPlan>; Level::COUNT],
  ) -> QueueState {
    QueueState {
      slots: make_slots(queue_size, message_max),
      cursor: 0,
      dropped: 0,
      plans,
    }
  }

  /// Exchange the active buffer with the consumer's spare and reset the
  /// cursor. Returns how many slots the caller now holds in `spare`.
  pub fn swap_out(&mut self, spare: &mut Vec<Slot>) -> usize {
    std::mem::swap(&mut self.slots, spare);
    let drained = self.cursor;
    self.cursor = 0;
    drained
  }

  pub fn is_empty(&self) -> bool {
    self.cursor == 0
  }
}

/// Allocate a buffer of `queue_size` slots, each with `message_max` bytes
/// of payload storage reserved up front.
pub fn make_slots(queue_size: usize, message_max: usize) -> Vec<Slot> {
  (0..queue_size).map(|_| Slot::new(message_max)).collect()
}
