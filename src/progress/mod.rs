//! Progress reporting for generation runs

mod channel;
mod handler;
mod logging;

pub use channel::{ChannelHandler, CompositeHandler};
pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
