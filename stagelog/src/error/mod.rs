use std::io;

use thiserror::Error;

/// Failures raised while bringing a logger instance up. Once a logger is
/// running, nothing in the hot path returns an error.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to spawn the consumer thread: {0}")]
  ThreadSpawn(#[source] io::Error),

  #[error("invalid logger options: {0}")]
  InvalidOptions(&'static str),
}
