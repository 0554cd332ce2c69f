//! The logger instance: a bounded, double-buffered staging queue fed by
//! any number of producer threads and drained by one dedicated consumer
//! thread that renders records through per-level compiled format plans.


use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use once_cell::sync::Lazy;

use crate::error::Error;
use crate::format::FormatPlan;
use crate::level::Level;
use crate::queue::{self, QueueState};
use crate::record::{self, CallSite, Slot};
use crate::sink::{self, Sink};

pub const DEFAULT_QUEUE_SIZE: usize = 2048;
pub const DEFAULT_MESSAGE_MAX: usize = 2048;
pub const DEFAULT_FORMAT: &str =
  "{level:%-6s} [{pid}:{tid}] {name:%10s}: {time}.{decimal:%03d}:{file: %25s:}{line:%-3d} {message}";

/// What a producer does when the active buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
  /// Block on the not-full condition until the consumer drains.
  Wait,
  /// Discard the record and count it; the consumer reports the count as
  /// a synthetic WARNING at most once per second.
  DropOverflow,
}

#[derive(Debug, Clone)]
pub struct Options {
  /// Slot count per staging buffer.
  pub queue_size: usize,
  /// Per-slot payload byte bound; payloads truncate at one byte less.
  pub message_max: usize,
  /// Pattern installed for every level at construction.
  pub default_format: String,
  pub policy: OverflowPolicy,
  /// Wrap the default format in per-level ANSI colours.
  pub colored: bool,
}

impl Default for Options {
  fn default() -> Options {
    Options {
      queue_size: DEFAULT_QUEUE_SIZE,
      message_max: DEFAULT_MESSAGE_MAX,
      default_format: DEFAULT_FORMAT.to_string(),
      policy: OverflowPolicy::Wait,
      colored: false,
    }
  }
}

/// A named asynchronous logger owning its staging buffers, format plans,
/// sink and consumer thread. Dropping it drains what is staged, joins the
/// consumer and releases everything.
pub struct Logger {
  shared: Arc<Shared>,
  consumer: Option<JoinHandle<()>>,
}

struct Shared {
  name: String,
  filter: AtomicU32,
  started: AtomicBool,
  queue: Mutex<QueueState>,
  not_full: Condvar,
  drained: Condvar,
  // Bounded channel serving as the counting wake semaphore: post is
  // `try_send(())`, wait is `recv()`, the value is `len()`.
  wake_tx: Sender<()>,
  wake_rx: Receiver<()>,
  producer: Mutex<ProducerState>,
  sink: Mutex<Sink>,
  appended: AtomicU64,
  rendered: AtomicU64,
  queue_size: usize,
  message_max: usize,
  policy: OverflowPolicy,
}

/// Guarded by the producer mutex; serialises payload formatting and holds
/// the scratch slot `log_synchronously` renders from.
struct ProducerState {
  scratch: Slot,
}

/// Performance counters, sampled with [`Logger::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
  /// Records accepted into the staging buffer.
  pub appended: u64,
  /// Records rendered to the sink (synthetic drop reports included).
  pub rendered: u64,
  /// Records discarded under [`OverflowPolicy::DropOverflow`].
  pub dropped: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Logger {
  pub fn new(name: &str) -> Result<Logger, Error> {
    Logger::with_options(name, Options::default())
  }

  pub fn with_options(name: &str, options: Options) -> Result<Logger, Error> {
    if options.queue_size < 2 {
      return Err(Error::InvalidOptions("queue_size must be at least 2"));
    }
    if options.message_max < 2 {
      return Err(Error::InvalidOptions("message_max must be at least 2"));
    }

    let plans: [Arc<FormatPlan>; Level::COUNT] = if options.colored {
      Level::ALL.map(|level| {
        Arc::new(FormatPlan::compile(
          name,
          &colored_pattern(level, &options.default_format),
        ))
      })
    } else {
      let plan = Arc::new(FormatPlan::compile(name, &options.default_format));
      std::array::from_fn(|_| Arc::clone(&plan))
    };

    let (wake_tx, wake_rx) = bounded::<()>(options.queue_size);
    let shared = Arc::new(Shared {
      name: name.to_string(),
      filter: AtomicU32::new(Level::all_bits()),
      started: AtomicBool::new(true),
      queue: Mutex::new(QueueState::new(options.queue_size, options.message_max, plans)),
      not_full: Condvar::new(),
      drained: Condvar::new(),
      wake_tx,
      wake_rx,
      producer: Mutex::new(ProducerState {
        scratch: Slot::new(options.message_max),
      }),
      sink: Mutex::new(sink::stdout()),
      appended: AtomicU64::new(0),
      rendered: AtomicU64::new(0),
      queue_size: options.queue_size,
      message_max: options.message_max,
      policy: options.policy,
    });

    let consumer = thread::Builder::new()
      .name(format!("stagelog-{name}"))
      .spawn({
        let shared = Arc::clone(&shared);
        move || consumer_loop(&shared)
      })
      .map_err(Error::ThreadSpawn)?;

    Ok(Logger {
      shared,
      consumer: Some(consumer),
    })
  }

  pub fn name(&self) -> &str {
    &self.shared.name
  }

  /// Lock-free fast path the façade checks before formatting anything.
  #[inline]
  pub fn is_printable(&self, level: Level) -> bool {
    self.shared.filter.load(Ordering::Relaxed) & level.bit() != 0
  }

  pub fn enable_level(&self, level: Level) {
    self.shared.filter.fetch_or(level.bit(), Ordering::Relaxed);
  }

  pub fn disable_level(&self, level: Level) {
    self.shared.filter.fetch_and(!level.bit(), Ordering::Relaxed);
  }

  /// Replace one level's format plan. Compilation is total, and the swap
  /// happens under the queue mutex so it is atomic with respect to
  /// rendering.
  pub fn set_format(&self, level: Level, pattern: &str) {
    let plan = Arc::new(FormatPlan::compile(&self.shared.name, pattern));
    lock(&self.shared.queue).plans[level as usize] = plan;
  }

  pub fn set_all_formats(&self, pattern: &str) {
    let plan = Arc::new(FormatPlan::compile(&self.shared.name, pattern));
    let mut queue = lock(&self.shared.queue);
    for slot in queue.plans.iter_mut() {
      *slot = Arc::clone(&plan);
    }
  }

  pub fn set_sink(&self, sink: Sink) {
    *lock(&self.shared.sink) = sink;
  }

  pub fn stats(&self) -> Stats {
    Stats {
      appended: self.shared.appended.load(Ordering::Relaxed),
      rendered: self.shared.rendered.load(Ordering::Relaxed),
      dropped: lock(&self.shared.queue).dropped,
    }
  }

  /// Stage one record: printf-style payload.
  pub fn append_formatted(&self, level: Level, site: CallSite, args: fmt::Arguments<'_>) {
    self.append_with(level, Some(site), |slot, max| slot.fill_args(args, max));
  }

  /// Stage one record: finished string payload.
  pub fn append_string(&self, level: Level, site: CallSite, message: &str) {
    self.append_with(level, Some(site), |slot, max| slot.fill_str(message, max));
  }

  /// Stage one record without call-site metadata.
  pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
    self.append_with(level, None, |slot, max| slot.fill_args(args, max));
  }

  pub fn emergency(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Emergency, args);
  }

  pub fn alert(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Alert, args);
  }

  pub fn critical(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Critical, args);
  }

  pub fn error(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Error, args);
  }

  pub fn warning(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Warning, args);
  }

  pub fn notice(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Notice, args);
  }

  pub fn info(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Info, args);
  }

  pub fn debug(&self, args: fmt::Arguments<'_>) {
    self.log(Level::Debug, args);
  }

  /// Bypass the staging buffer: format and render in the caller, under
  /// the producer mutex. The queue mutex is taken only long enough to
  /// clone the level's plan.
  pub fn log_synchronously(&self, level: Level, site: Option<CallSite>, args: fmt::Arguments<'_>) {
    let shared = &*self.shared;
    let mut producer = lock(&shared.producer);
    let plan = Arc::clone(&lock(&shared.queue).plans[level as usize]);

    let slot = &mut producer.scratch;
    let (sec, nsec) = record::realtime_now();
    slot.sec = sec;
    slot.nsec = nsec;
    slot.level = level;
    slot.site = site;
    slot.tid = record::current_thread_id();
    slot.fill_args(args, shared.message_max);

    let mut line = String::new();
    plan.render(slot, &mut line);
    let _ = lock(&shared.sink).write_all(line.as_bytes());
  }

  /// Block until every record staged strictly before this call has been
  /// rendered, then flush the sink. Nothing is promised about records
  /// arriving concurrently.
  pub fn flush(&self) {
    let shared = &*self.shared;
    let mut queue = lock(&shared.queue);
    let mut pending = 1usize;
    while shared.started.load(Ordering::Acquire) && (pending > 0 || queue.cursor > 0) {
      pending = shared.wake_tx.len();
      if pending == 0 {
        let _ = shared.wake_tx.try_send(());
      }
      queue = shared
        .drained
        .wait(queue)
        .unwrap_or_else(PoisonError::into_inner);
    }
    drop(queue);
    let _ = lock(&shared.sink).flush();
  }

  fn append_with<F>(&self, level: Level, site: Option<CallSite>, fill: F)
  where
    F: FnOnce(&mut Slot, usize),
  {
    let shared = &*self.shared;
    let _producer = lock(&shared.producer);
    let mut queue = lock(&shared.queue);

    match shared.policy {
      OverflowPolicy::Wait => {
        while queue.cursor >= shared.queue_size - 1 {
          queue = shared
            .not_full
            .wait(queue)
            .unwrap_or_else(PoisonError::into_inner);
        }
      }
      OverflowPolicy::DropOverflow => {
        if queue.cursor == shared.queue_size {
          queue.dropped += 1;
          return;
        }
      }
    }

    // empty -> non-empty edge wakes the consumer exactly once
    if queue.cursor == 0 {
      let _ = shared.wake_tx.try_send(());
    }

    let cursor = queue.cursor;
    let (sec, nsec) = record::realtime_now();
    let slot = &mut queue.slots[cursor];
    slot.sec = sec;
    slot.nsec = nsec;
    fill(slot, shared.message_max);
    slot.level = level;
    slot.site = site;
    slot.tid = record::current_thread_id();
    queue.cursor += 1;
    shared.appended.fetch_add(1, Ordering::Relaxed);
  }
}

impl Drop for Logger {
  fn drop(&mut self) {
    self.shared.started.store(false, Ordering::Release);
    let _ = self.shared.wake_tx.try_send(());
    if let Some(handle) = self.consumer.take() {
      let _ = handle.join();
    }
  }
}

fn consumer_loop(shared: &Shared) {
  let mut spare = queue::make_slots(shared.queue_size, shared.message_max);
  let mut line = String::new();
  let mut reported_dropped = 0u64;
  let (mut last_report_sec, _) = record::realtime_now();

  while shared.started.load(Ordering::Acquire) || !shared.wake_rx.is_empty() {
    if shared.wake_rx.recv().is_err() {
      break;
    }
    let mut queue = lock(&shared.queue);
    if queue.is_empty() {
      // a flush or shutdown kicked us
      shared.not_full.notify_all();
      shared.drained.notify_all();
      continue;
    }

    let drained = queue.swap_out(&mut spare);
    shared.not_full.notify_all();
    let plans = queue.plans.clone();

    if shared.policy == OverflowPolicy::DropOverflow {
      let (now_sec, now_nsec) = record::realtime_now();
      if now_sec > last_report_sec {
        last_report_sec = now_sec;
        let delta = queue.dropped - reported_dropped;
        if delta > 0 {
          reported_dropped = queue.dropped;
          fill_drop_report(&mut queue.slots[0], delta, now_sec, now_nsec, shared.message_max);
          queue.cursor = 1;
          let _ = shared.wake_tx.try_send(());
        }
      }
    }
    drop(queue);

    for slot in &spare[..drained] {
      line.clear();
      plans[slot.level as usize].render(slot, &mut line);
      let _ = lock(&shared.sink).write_all(line.as_bytes());
      shared.rendered.fetch_add(1, Ordering::Relaxed);
    }
    shared.drained.notify_all();
  }

  // report drops that never crossed the one-second threshold
  let mut queue = lock(&shared.queue);
  let delta = queue.dropped - reported_dropped;
  if delta > 0 {
    let plan = Arc::clone(&queue.plans[Level::Warning as usize]);
    drop(queue);
    let (sec, nsec) = record::realtime_now();
    fill_drop_report(&mut spare[0], delta, sec, nsec, shared.message_max);
    line.clear();
    plan.render(&spare[0], &mut line);
    let _ = lock(&shared.sink).write_all(line.as_bytes());
    shared.rendered.fetch_add(1, Ordering::Relaxed);
  }
}

fn fill_drop_report(slot: &mut Slot, dropped: u64, sec: i64, nsec: u32, message_max: usize) {
  slot.sec = sec;
  slot.nsec = nsec;
  slot.level = Level::Warning;
  slot.site = Some(CallSite {
    path: file!(),
    line: line!(),
    function: module_path!(),
  });
  slot.tid = record::current_thread_id();
  slot.fill_args(format_args!("Message dropped: {dropped}"), message_max);
}

fn colored_pattern(level: Level, base: &str) -> String {
  let prefix = match level {
    Level::Emergency => "{bg_magenta}{fg_black}",
    Level::Alert => "{fg_magenta}",
    Level::Critical => "{bg_red}{fg_black}",
    Level::Error => "{fg_red}",
    Level::Warning => "{fg_yellow}",
    Level::Notice => "{fg_cyan}",
    Level::Info => "{fg_blue}",
    Level::Debug => "{fg_green}",
  };
  format!("{prefix}{base}{{color_reset}}")
}

static MAIN: Lazy<Logger> =
  Lazy::new(|| Logger::new("main").expect("stagelog: failed to start the main logger"));

/// The process-wide default instance, lazily constructed on first use.
/// The only global state in the crate.
pub fn main_logger() -> &'static Logger {
  &MAIN
}
