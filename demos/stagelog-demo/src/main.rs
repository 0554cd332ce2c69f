use stagelog::logger::{main_logger, Logger, Options, OverflowPolicy};
use stagelog::{debug, error, info, log_to, notice, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
  println!("stagelog quick start");

  // The "main" singleton logs to stdout with the default format.
  info!("application started");
  notice!("listening on {}:{}", "127.0.0.1", 8080);
  warn!("cache miss rate at {:.1}%", 12.5);
  error!("database connection lost, retrying");
  debug!("worker pool sized to {}", 4);
  main_logger().flush();

  // A dedicated instance with its own format, sink and overflow policy.
  let audit = Logger::with_options(
    "audit",
    Options {
      queue_size: 256,
      policy: OverflowPolicy::DropOverflow,
      default_format: "{time:%H\\:%M\\:%S}.{decimal:%03d} {level:%-6s} {message}".to_string(),
      ..Options::default()
    },
  )?;
  audit.set_sink(stagelog::sink::file("./stagelog-demo.log")?);

  for user in ["alice", "bob", "carol"] {
    log_to!(audit, stagelog::level::Level::Info, "user {user} signed in");
  }
  audit.flush();

  println!("audit records written to ./stagelog-demo.log");
  Ok(())
}
