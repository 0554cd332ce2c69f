
/// Severity of a log record, ordered by increasing verbosity.
///
/// The discriminants match POSIX `syslog` values so external code can
/// round-trip them through `from_u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
  Emergency = 0,
  Alert = 1,
  Critical = 2,
  Error = 3,
  Warning = 4,
  Notice = 5,
  Info = 6,
  Debug = 7,
}

impl Level {
  pub const COUNT: usize = 8;

  pub const ALL: [Level; Level::COUNT] = [
    Level::Emergency,
    Level::Alert,
    Level::Critical,
    Level::Error,
    Level::Warning,
    Level::Notice,
    Level::Info,
    Level::Debug,
  ];

  pub fn from_u8(value: u8) -> Option<Level> {
    match value {
      0 => Some(Level::Emergency),
      1 => Some(Level::Alert),
      2 => Some(Level::Critical),
      3 => Some(Level::Error),
      4 => Some(Level::Warning),
      5 => Some(Level::Notice),
      6 => Some(Level::Info),
      7 => Some(Level::Debug),
      _ => None,
    }
  }

  /// Canonical short name used by the `{level}` placeholder.
  pub fn as_str(self) -> &'static str {
    match self {
      Level::Emergency => "EMERG",
      Level::Alert => "ALERT",
      Level::Critical => "CRIT",
      Level::Error => "ERROR",
      Level::Warning => "WARN",
      Level::Notice => "NOTICE",
      Level::Info => "INFO",
      Level::Debug => "DEBUG",
    }
  }

  /// Position of this level in a filter bitmask.
  #[inline]
  pub fn bit(self) -> u32 {
    1u32 << (self as u32)
  }

  /// Bitmask with every level enabled.
  pub fn all_bits() -> u32 {
    Level::ALL.iter().fold(0, |mask, level| mask | level.bit())
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
