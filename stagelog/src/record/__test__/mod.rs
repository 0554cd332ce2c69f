#[cfg(test)]
mod tests {
  use crate::record::{CallSite, Slot};

  #[test]
  fn test_fill_str_within_bound() {
    let mut slot = Slot::new(16);
    slot.fill_str("hello", 16);
    assert_eq!(slot.payload(), "hello");
  }

  #[test]
  fn test_fill_str_truncates_at_bound_minus_one() {
    let mut slot = Slot::new(16);
    slot.fill_str("abcdefghijklmnop12345", 16);
    assert_eq!(slot.payload(), "abcdefghijklmno");
    assert_eq!(slot.payload().len(), 15);
  }

  #[test]
  fn test_fill_str_respects_char_boundaries() {
    let mut slot = Slot::new(6);
    // 'é' is two bytes; cutting at byte 5 would split it
    slot.fill_str("abcdé", 6);
    assert_eq!(slot.payload(), "abcd");
  }

  #[test]
  fn test_fill_args_truncates() {
    let mut slot = Slot::new(8);
    slot.fill_args(format_args!("{}-{}", "abcd", "efgh"), 8);
    assert_eq!(slot.payload(), "abcd-ef");
  }

  #[test]
  fn test_refill_replaces_payload() {
    let mut slot = Slot::new(32);
    slot.fill_str("first", 32);
    slot.fill_str("second", 32);
    assert_eq!(slot.payload(), "second");
  }

  #[test]
  fn test_payload_storage_is_stable() {
    let mut slot = Slot::new(64);
    slot.fill_str("warm-up", 64);
    let before = slot.payload().as_ptr();
    slot.fill_str("another payload that still fits the preallocated region", 64);
    assert_eq!(slot.payload().as_ptr(), before);
  }

  #[test]
  fn test_call_site_short_filename() {
    let site = CallSite {
      path: "src/worker/ingress.rs",
      line: 42,
      function: "crate::worker",
    };
    assert_eq!(site.file(), "ingress.rs");

    let windows = CallSite {
      path: "src\\worker\\ingress.rs",
      line: 42,
      function: "crate::worker",
    };
    assert_eq!(windows.file(), "ingress.rs");
  }
}
