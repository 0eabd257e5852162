//! Forwarding progress events to a live stream

use super::{ProgressEvent, ProgressHandler};
use tokio::sync::mpsc;
use tracing::debug;

/// Sends every event into an unbounded channel, in emission order
///
/// A dropped receiver is not an error; events are then discarded.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressHandler for ChannelHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(thread = event.thread_id(), "Progress receiver dropped");
        }
    }
}

/// Fans one event out to several handlers
#[derive(Default)]
pub struct CompositeHandler {
    handlers: Vec<Box<dyn ProgressHandler>>,
}

impl CompositeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl ProgressHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }
}

impl ProgressHandler for CompositeHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        for handler in &self.handlers {
            handler.on_progress(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::Stage;
    use crate::progress::LoggingHandler;

    fn started(stage: Stage) -> ProgressEvent {
        ProgressEvent::StageStarted {
            thread_id: "t".to_string(),
            stage,
        }
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (handler, mut rx) = ChannelHandler::new();
        for stage in Stage::ALL {
            handler.on_progress(&started(stage));
        }
        drop(handler);

        let mut seen = Vec::new();
        while let Some(ProgressEvent::StageStarted { stage, .. }) = rx.recv().await {
            seen.push(stage);
        }
        assert_eq!(seen, Stage::ALL.to_vec());
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (handler, rx) = ChannelHandler::new();
        drop(rx);
        handler.on_progress(&started(Stage::Deployment));
    }

    #[test]
    fn test_composite_forwards_to_all() {
        let (a, mut rx_a) = ChannelHandler::new();
        let (b, mut rx_b) = ChannelHandler::new();
        let composite = CompositeHandler::new().with(a).with(b).with(LoggingHandler);

        composite.on_progress(&started(Stage::Validation));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }
}
