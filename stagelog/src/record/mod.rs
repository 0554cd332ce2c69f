mod __test__;

use std::fmt::{self, Write as _};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::level::Level;

/// Call-site metadata captured by the logging macros.
///
/// All strings are `'static` literals produced by `file!()` and
/// `module_path!()`; the core borrows them and never copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
  pub path: &'static str,
  pub line: u32,
  pub function: &'static str,
}

impl CallSite {
  /// Short filename, the component after the last path separator.
  pub fn file(&self) -> &'static str {
    self.path.rsplit(['/', '\\']).next().unwrap_or(self.path)
  }
}

/// One cell of a staging buffer.
///
/// The payload `String` is allocated to its full capacity when the logger
/// is constructed and is only ever truncated and refilled afterwards, so
/// its backing storage never moves. Swapping the buffer pair swaps the two
/// slot vectors, not the payload bytes.
#[derive(Debug)]
pub struct Slot {
  pub level: Level,
  pub sec: i64,
  pub nsec: u32,
  pub site: Option<CallSite>,
  pub tid: u32,
  payload: String,
}

impl Slot {
  pub fn new(message_max: usize) -> Slot {
    Slot {
      level: Level::Debug,
      sec: 0,
      nsec: 0,
      site: None,
      tid: 0,
      payload: String::with_capacity(message_max),
    }
  }

  pub fn payload(&self) -> &str {
    &self.payload
  }

  /// Copy a finished string into the slot, truncating at
  /// `message_max - 1` bytes on a char boundary.
  pub fn fill_str(&mut self, message: &str, message_max: usize) {
    self.payload.clear();
    let limit = message_max.saturating_sub(1);
    if message.len() <= limit {
      self.payload.push_str(message);
    } else {
      let mut end = limit;
      while end > 0 && !message.is_char_boundary(end) {
        end -= 1;
      }
      self.payload.push_str(&message[..end]);
    }
  }

  /// Format `args` directly into the slot, truncating at
  /// `message_max - 1` bytes. Formatting stops as soon as the bound is
  /// reached.
  pub fn fill_args(&mut self, args: fmt::Arguments<'_>, message_max: usize) {
    self.payload.clear();
    let mut writer = TruncatingWriter {
      buf: &mut self.payload,
      limit: message_max.saturating_sub(1),
    };
    let _ = writer.write_fmt(args);
  }
}

/// `fmt::Write` adapter that drops everything past `limit` bytes,
/// keeping the buffer on a char boundary. Returns `fmt::Error` once full
/// so upstream formatting aborts instead of rendering bytes nobody keeps.
struct TruncatingWriter<'a> {
  buf: &'a mut String,
  limit: usize,
}

impl fmt::Write for TruncatingWriter<'_> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    let remaining = self.limit.saturating_sub(self.buf.len());
    if s.len() <= remaining {
      self.buf.push_str(s);
      return Ok(());
    }
    let mut end = remaining;
    while end > 0 && !s.is_char_boundary(end) {
      end -= 1;
    }
    self.buf.push_str(&s[..end]);
    Err(fmt::Error)
  }
}

/// Realtime clock as whole seconds plus nanoseconds.
pub(crate) fn realtime_now() -> (i64, u32) {
  let elapsed = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default();
  (elapsed.as_secs() as i64, elapsed.subsec_nanos())
}

/// Stable numeric identifier for the current thread, a hash of the opaque
/// `ThreadId`.
pub(crate) fn current_thread_id() -> u32 {
  use std::collections::hash_map::DefaultHasher;
  use std::hash::{Hash, Hasher};
  let mut hasher = DefaultHasher::new();
  std::thread::current().id().hash(&mut hasher);
  hasher.finish() as u32
}
