pub mod error;
pub mod format;
pub mod layer;
pub mod level;
pub mod logger;
pub mod macros;
pub mod printf;
pub mod queue;
pub mod record;
pub mod sink;
