use crate::errors::{AutomatorError, Result};
use crate::types::{StatusMessage, StatusSnapshot};
use tokio::sync::broadcast;

/// Somewhere status updates can be pushed. There may be nobody listening.
pub trait StatusSink: Send + Sync {
    fn publish(&self, message: &StatusMessage) -> Result<()>;
}

/// Builds snapshots and hands them to the sink. Delivery failures are
/// logged and dropped; reporting never fails the caller.
pub struct StatusReporter<S: StatusSink> {
    sink: S,
}

impl<S: StatusSink> StatusReporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn report(&self, status: StatusSnapshot) {
        let message = StatusMessage { status };
        if let Err(err) = self.sink.publish(&message) {
            tracing::debug!(error = %err, "status not delivered");
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Fans status out to every subscribed receiver.
#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<StatusMessage>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusMessage> {
        self.sender.subscribe()
    }
}

impl StatusSink for BroadcastSink {
    fn publish(&self, message: &StatusMessage) -> Result<()> {
        self.sender
            .send(message.clone())
            .map(|_| ())
            .map_err(|_| AutomatorError::NoListener)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish(&self, _message: &StatusMessage) -> Result<()> {
        Err(AutomatorError::NoListener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(index: usize) -> StatusSnapshot {
        StatusSnapshot {
            running: true,
            paused: false,
            index,
            total: 3,
            error: None,
        }
    }

    #[test]
    fn report_without_listener_is_swallowed() {
        let reporter = StatusReporter::new(BroadcastSink::new(4));
        reporter.report(snapshot(0));

        let reporter = StatusReporter::new(NullSink);
        reporter.report(snapshot(1));
    }

    #[test]
    fn subscribers_receive_reports_in_order() {
        let sink = BroadcastSink::new(8);
        let mut receiver = sink.subscribe();
        let reporter = StatusReporter::new(sink);

        reporter.report(snapshot(0));
        reporter.report(snapshot(1));

        assert_eq!(receiver.try_recv().unwrap().status.index, 0);
        assert_eq!(receiver.try_recv().unwrap().status.index, 1);
        assert!(receiver.try_recv().is_err());
    }
}
