#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crate::format::FormatPlan;
  use crate::level::Level;
  use crate::queue::{make_slots, QueueState};

  fn state(queue_size: usize) -> QueueState {
    let plan = Arc::new(FormatPlan::compile("test", "{message}"));
    QueueState::new(queue_size, 64, std::array::from_fn(|_| Arc::clone(&plan)))
  }

  #[test]
  fn test_new_state_is_empty() {
    let state = state(8);
    assert!(state.is_empty());
    assert_eq!(state.cursor, 0);
    assert_eq!(state.dropped, 0);
    assert_eq!(state.slots.len(), 8);
    assert_eq!(state.plans.len(), Level::COUNT);
  }

  #[test]
  fn test_swap_out_resets_cursor() {
    let mut state = state(4);
    state.slots[0].fill_str("a", 64);
    state.slots[1].fill_str("b", 64);
    state.cursor = 2;

    let mut spare = make_slots(4, 64);
    let drained = state.swap_out(&mut spare);

    assert_eq!(drained, 2);
    assert!(state.is_empty());
    assert_eq!(spare[0].payload(), "a");
    assert_eq!(spare[1].payload(), "b");
  }

  #[test]
  fn test_swap_does_not_move_payload_storage() {
    let mut state = state(2);
    state.slots[0].fill_str("stable", 64);
    state.cursor = 1;
    let before = state.slots[0].payload().as_ptr();

    let mut spare = make_slots(2, 64);
    state.swap_out(&mut spare);

    assert_eq!(spare[0].payload().as_ptr(), before);
    assert_eq!(spare[0].payload(), "stable");
  }

  #[test]
  fn test_swapped_in_buffer_is_reusable() {
    let mut state = state(2);
    state.slots[0].fill_str("one", 64);
    state.cursor = 1;

    let mut spare = make_slots(2, 64);
    state.swap_out(&mut spare);

    state.slots[0].fill_str("two", 64);
    state.cursor = 1;
    let drained = state.swap_out(&mut spare);
    assert_eq!(drained, 1);
    assert_eq!(spare[0].payload(), "two");
  }
}
