
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Byte destination for rendered records. The consumer thread is the only
/// writer; `Logger::flush` additionally calls `flush` on it.
pub type Sink = Box<dyn Write + Send>;

/// The default sink.
pub fn stdout() -> Sink {
  Box::new(io::stdout())
}

pub fn file(path: impl AsRef<Path>) -> io::Result<Sink> {
  Ok(Box::new(File::create(path)?))
}

/// Shared in-memory sink. Cloning hands out another handle onto the same
/// byte stream, so a test can keep one handle and give the other to the
/// logger.
#[derive(Debug, Clone, Default)]
pub struct Memory {
  bytes: Arc<Mutex<Vec<u8>>>,
}

impl Memory {
  pub fn new() -> Memory {
    Memory::default()
  }

  pub fn contents(&self) -> Vec<u8> {
    self
      .bytes
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn utf8(&self) -> String {
    String::from_utf8_lossy(&self.contents()).into_owned()
  }
}

impl Write for Memory {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self
      .bytes
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}
