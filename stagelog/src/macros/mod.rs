//! Call-site-capturing macro façade.
//!
//! Every macro checks `is_printable` before touching its arguments, so a
//! disabled level costs one atomic load and a branch, with no formatting.

/// Capture the current call site as `'static` metadata.
#[macro_export]
macro_rules! call_site {
  () => {
    $crate::record::CallSite {
      path: file!(),
      line: line!(),
      function: module_path!(),
    }
  };
}

/// Log to an explicit logger instance.
///
/// ```ignore
/// log_to!(logger, Level::Notice, "listening on {}", addr);
/// ```
#[macro_export]
macro_rules! log_to {
  ($logger:expr, $level:expr, $($arg:tt)+) => {{
    let logger = &$logger;
    let level = $level;
    if logger.is_printable(level) {
      logger.append_formatted(level, $crate::call_site!(), format_args!($($arg)+));
    }
  }};
}

#[macro_export]
macro_rules! emerg {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Emergency, $($arg)+)
  };
}

#[macro_export]
macro_rules! alert {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Alert, $($arg)+)
  };
}

#[macro_export]
macro_rules! crit {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Critical, $($arg)+)
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Error, $($arg)+)
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Warning, $($arg)+)
  };
}

#[macro_export]
macro_rules! notice {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Notice, $($arg)+)
  };
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Info, $($arg)+)
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)+) => {
    $crate::log_to!($crate::logger::main_logger(), $crate::level::Level::Debug, $($arg)+)
  };
}
