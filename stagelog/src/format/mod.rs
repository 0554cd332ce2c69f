//! Format plan compiler.
//!
//! A pattern such as `"{level:%-6s} [{pid}:{tid}] {time}.{decimal:%03d}
//! {message}"` is compiled once per level into an ordered list of render
//! actions. Literal text, pre-rendered logger constants (`{name}`,
//! `{pid}`, `{tid}`) and ANSI colour escapes are folded into the
//! neighbouring actions' templates, so the per-record hot path walks only
//! record-dependent actions and performs no parsing.
//!
//! Compilation is total: unknown keys and unbalanced braces degrade to
//! literal text, never to an error. A misconfigured format must not
//! suppress logging.

mod __test__;

use std::fmt::Write as _;

use chrono::TimeZone;
use smallvec::SmallVec;

use crate::printf::{self, Arg};
use crate::record::Slot;

/// Sub-format used by `{time}` when the placeholder carries no spec.
pub const DEFAULT_TIME_FORMAT: &str = "%x %X";

// Sentinel bytes standing in for unescaped '{', ':' and '}' during the
// scan, so escaped occurrences survive as plain text.
const OPEN: u8 = 0xD7;
const SEP: u8 = 0xD6;
const CLOSE: u8 = 0xD5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
  Print,
  Name,
  Level,
  Path,
  File,
  Line,
  Func,
  Pid,
  Tid,
  Time,
  Decimal,
  Message,
}

/// One step of a compiled plan: a printf template with at most one
/// conversion, applied to the value selected by `kind`.
#[derive(Debug, Clone)]
pub struct Action {
  pub kind: ActionKind,
  pub format: String,
}

/// Compiled representation of a pattern for one severity.
#[derive(Debug, Clone)]
pub struct FormatPlan {
  pub actions: SmallVec<[Action; 8]>,
  pub time_format: String,
  pub nsec_divisor: i64,
}

impl FormatPlan {
  /// Compile `pattern` for a logger called `logger_name`.
  pub fn compile(logger_name: &str, pattern: &str) -> FormatPlan {
    let bytes = serialize(pattern);
    let mut actions: Vec<Action> = Vec::new();
    let mut time_format = String::new();
    let mut nsec_divisor = 1i64;

    let mut last = 0usize;
    let mut next_open = find_byte(&bytes, OPEN, 0);
    while let Some(start) = next_open {
      let end = match find_byte(&bytes, CLOSE, start) {
        Some(end) => end,
        None => break,
      };
      if start > last {
        actions.push(print_literal(&bytes[last..start]));
      }
      last = end + 1;
      let sep = find_byte(&bytes, SEP, start).filter(|&pos| pos < end);
      match sep {
        None => {
          let key = deserialize(&bytes[start + 1..end]);
          match keyword(&key) {
            Some(kind) => {
              if kind == ActionKind::Time {
                time_format = DEFAULT_TIME_FORMAT.to_string();
              }
              actions.push(Action {
                kind,
                format: default_conversion(kind).to_string(),
              });
            }
            None => actions.push(Action {
              kind: ActionKind::Print,
              format: color_escape(&key).to_string(),
            }),
          }
        }
        Some(sep) => {
          let key = deserialize(&bytes[start + 1..sep]);
          let spec = deserialize(&bytes[sep + 1..end]);
          match keyword(&key) {
            Some(kind) => {
              let format = match kind {
                ActionKind::Time => {
                  time_format = spec;
                  "%s".to_string()
                }
                ActionKind::Decimal => {
                  nsec_divisor = decimal_divisor(&spec);
                  spec
                }
                _ => spec,
              };
              actions.push(Action { kind, format });
            }
            None => actions.push(Action {
              kind: ActionKind::Print,
              format: escape_percent(&spec),
            }),
          }
        }
      }
      next_open = find_byte(&bytes, OPEN, start + 1);
    }
    if last < bytes.len() {
      actions.push(print_literal(&bytes[last..]));
    }

    if !actions.iter().any(|a| a.kind == ActionKind::Message) {
      actions.push(Action {
        kind: ActionKind::Message,
        format: default_conversion(ActionKind::Message).to_string(),
      });
    }
    actions.push(Action {
      kind: ActionKind::Print,
      format: "\n".to_string(),
    });

    prerender_constants(&mut actions, logger_name);

    FormatPlan {
      actions: fold(actions),
      time_format,
      nsec_divisor,
    }
  }

  /// Render one record through this plan.
  ///
  /// Records without a call site skip the `path`/`file`/`line`/`func`
  /// actions entirely, folded literals included.
  pub fn render(&self, slot: &Slot, out: &mut String) {
    for action in &self.actions {
      match action.kind {
        ActionKind::Print => printf::render(&action.format, Arg::None, out),
        ActionKind::Level => printf::render(&action.format, Arg::Str(slot.level.as_str()), out),
        ActionKind::Path => {
          if let Some(site) = slot.site {
            printf::render(&action.format, Arg::Str(site.path), out);
          }
        }
        ActionKind::File => {
          if let Some(site) = slot.site {
            printf::render(&action.format, Arg::Str(site.file()), out);
          }
        }
        ActionKind::Line => {
          if let Some(site) = slot.site {
            printf::render(&action.format, Arg::Int(i64::from(site.line)), out);
          }
        }
        ActionKind::Func => {
          if let Some(site) = slot.site {
            printf::render(&action.format, Arg::Str(site.function), out);
          }
        }
        ActionKind::Time => {
          let mut clock = String::new();
          if let Some(datetime) = chrono::Local.timestamp_opt(slot.sec, slot.nsec).single() {
            let _ = write!(clock, "{}", datetime.format(&self.time_format));
          }
          printf::render(&action.format, Arg::Str(&clock), out);
        }
        ActionKind::Decimal => {
          printf::render(
            &action.format,
            Arg::Int(i64::from(slot.nsec) / self.nsec_divisor),
            out,
          );
        }
        ActionKind::Message => printf::render(&action.format, Arg::Str(slot.payload()), out),
        // pre-rendered into Print during compilation
        ActionKind::Name | ActionKind::Pid | ActionKind::Tid => {}
      }
    }
  }
}

/// Escape pre-pass: a backslash consumes itself and keeps the next byte
/// literal; unescaped braces and colons become sentinel bytes.
fn serialize(pattern: &str) -> Vec<u8> {
  let src = pattern.as_bytes();
  let mut out = Vec::with_capacity(src.len());
  let mut i = 0;
  while i < src.len() {
    let byte = src[i];
    if byte == b'\\' && i + 1 < src.len() {
      out.push(src[i + 1]);
      i += 2;
      continue;
    }
    out.push(match byte {
      b'{' => OPEN,
      b':' => SEP,
      b'}' => CLOSE,
      other => other,
    });
    i += 1;
  }
  out
}

/// Restore sentinel bytes to their literal characters.
fn deserialize(bytes: &[u8]) -> String {
  let restored: Vec<u8> = bytes
    .iter()
    .map(|&byte| match byte {
      OPEN => b'{',
      SEP => b':',
      CLOSE => b'}',
      other => other,
    })
    .collect();
  String::from_utf8_lossy(&restored).into_owned()
}

/// Double `%` so literal text passes through the printf primitive intact.
fn escape_percent(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if c == '%' {
      out.push('%');
    }
    out.push(c);
  }
  out
}

fn print_literal(bytes: &[u8]) -> Action {
  Action {
    kind: ActionKind::Print,
    format: escape_percent(&deserialize(bytes)),
  }
}

fn find_byte(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
  bytes
    .get(from..)
    .and_then(|tail| tail.iter().position(|&b| b == needle))
    .map(|pos| from + pos)
}

fn keyword(key: &str) -> Option<ActionKind> {
  match key {
    "name" => Some(ActionKind::Name),
    "level" => Some(ActionKind::Level),
    "path" => Some(ActionKind::Path),
    "file" => Some(ActionKind::File),
    "line" => Some(ActionKind::Line),
    "func" => Some(ActionKind::Func),
    "pid" => Some(ActionKind::Pid),
    "tid" => Some(ActionKind::Tid),
    "time" => Some(ActionKind::Time),
    "decimal" => Some(ActionKind::Decimal),
    "message" => Some(ActionKind::Message),
    _ => None,
  }
}

fn default_conversion(kind: ActionKind) -> &'static str {
  match kind {
    ActionKind::Line | ActionKind::Pid | ActionKind::Decimal => "%d",
    ActionKind::Tid => "%X",
    _ => "%s",
  }
}

/// Nanosecond divisor deduced from a `{decimal}` spec: width `w` selects
/// `10^(9-w)`, clamped to at least 1.
fn decimal_divisor(spec: &str) -> i64 {
  let Some(percent) = spec.find('%') else {
    return 1;
  };
  let tail = &spec.as_bytes()[percent + 1..];
  let mut i = 0;
  if i < tail.len() && (tail[i] == b'-' || tail[i] == b'+') {
    i += 1;
  }
  let mut width = 0i64;
  let mut saw_digit = false;
  while i < tail.len() && tail[i].is_ascii_digit() {
    width = width * 10 + i64::from(tail[i] - b'0');
    saw_digit = true;
    i += 1;
  }
  if !saw_digit {
    return 1;
  }
  let magnitude = 9 - width.abs();
  if magnitude <= 0 {
    return 1;
  }
  10i64.pow(magnitude as u32)
}

fn color_escape(key: &str) -> &'static str {
  match key {
    "color_reset" => "\x1b[0m",
    "color_bold" => "\x1b[1m",
    "color_dim" => "\x1b[2m",
    "color_italic" => "\x1b[3m",
    "color_underline" => "\x1b[4m",
    "color_blink" => "\x1b[5m",
    "color_rev" => "\x1b[7m",
    "color_hide" => "\x1b[8m",
    "fg_black" => "\x1b[30m",
    "fg_red" => "\x1b[31m",
    "fg_green" => "\x1b[32m",
    "fg_yellow" => "\x1b[33m",
    "fg_blue" => "\x1b[34m",
    "fg_magenta" => "\x1b[35m",
    "fg_cyan" => "\x1b[36m",
    "fg_white" => "\x1b[37m",
    "bg_black" => "\x1b[40m",
    "bg_red" => "\x1b[41m",
    "bg_green" => "\x1b[42m",
    "bg_yellow" => "\x1b[43m",
    "bg_blue" => "\x1b[44m",
    "bg_magenta" => "\x1b[45m",
    "bg_cyan" => "\x1b[46m",
    "bg_white" => "\x1b[47m",
    _ => "",
  }
}

/// Replace the record-independent actions with their rendered text. The
/// process id and the configuring thread's id are resolved here, once per
/// compilation.
fn prerender_constants(actions: &mut [Action], logger_name: &str) {
  for action in actions.iter_mut() {
    let arg = match action.kind {
      ActionKind::Name => Arg::Str(logger_name),
      ActionKind::Pid => Arg::Uint(u64::from(std::process::id())),
      ActionKind::Tid => Arg::Uint(u64::from(crate::record::current_thread_id())),
      _ => continue,
    };
    let mut rendered = String::new();
    printf::render(&action.format, arg, &mut rendered);
    action.kind = ActionKind::Print;
    action.format = escape_percent(&rendered);
  }
}

/// Fold every Print action into the template of the following action (the
/// trailing run folds backward), leaving only record-dependent actions.
fn fold(actions: Vec<Action>) -> SmallVec<[Action; 8]> {
  let mut folded: SmallVec<[Action; 8]> = SmallVec::new();
  let mut pending = String::new();
  for action in actions {
    if action.kind == ActionKind::Print {
      pending.push_str(&action.format);
    } else {
      let mut format = std::mem::take(&mut pending);
      format.push_str(&action.format);
      folded.push(Action {
        kind: action.kind,
        format,
      });
    }
  }
  if !pending.is_empty() {
    match folded.last_mut() {
      Some(last) => last.format.push_str(&pending),
      None => folded.push(Action {
        kind: ActionKind::Print,
        format: pending,
      }),
    }
  }
  folded
}
