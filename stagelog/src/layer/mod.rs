//! Bridge from the `tracing` ecosystem into a stagelog logger.


use std::sync::Arc;

use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::level::Level;
use crate::logger::Logger;
use crate::record::CallSite;

/// A `tracing_subscriber` layer that forwards events to a logger.
///
/// ```ignore
/// let subscriber = Registry::default().with(ForwardLayer::new(logger));
/// tracing::subscriber::set_global_default(subscriber)?;
/// ```
pub struct ForwardLayer {
  target: Arc<Logger>,
}

impl ForwardLayer {
  pub fn new(target: Arc<Logger>) -> ForwardLayer {
    ForwardLayer { target }
  }
}

fn map_level(metadata: &Metadata<'_>) -> Level {
  let level = *metadata.level();
  if level == tracing::Level::ERROR {
    Level::Error
  } else if level == tracing::Level::WARN {
    Level::Warning
  } else if level == tracing::Level::INFO {
    Level::Info
  } else {
    Level::Debug
  }
}

impl<S> Layer<S> for ForwardLayer
where
  S: Subscriber + for<'a> LookupSpan<'a>,
{
  fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
    let metadata = event.metadata();
    let level = map_level(metadata);
    if !self.target.is_printable(level) {
      return;
    }

    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    let message = visitor.message.as_deref().unwrap_or("");

    match (metadata.file(), metadata.line()) {
      (Some(path), Some(line)) => {
        let site = CallSite {
          path,
          line,
          function: metadata.target(),
        };
        self.target.append_string(level, site, message);
      }
      _ => self.target.log(level, format_args!("{message}")),
    }
  }
}

/// Extracts the `message` field of a tracing event, preferring string
/// values over debug formatting.
#[derive(Default)]
struct MessageVisitor {
  message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
  fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
    if field.name() == "message" {
      self.message = Some(value.to_string());
    }
  }

  fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
    if field.name() == "message" && self.message.is_none() {
      self.message = Some(format!("{value:?}"));
    }
  }
}
