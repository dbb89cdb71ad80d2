//! Progress events emitted while a turn runs.
//!
//! The loop reports what it is doing over an unbounded channel so a UI can
//! show a status line while waiting. Sending never blocks, and a dropped
//! receiver is ignored.

use serde::Serialize;
use tokio::sync::mpsc;

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// A new progress channel.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Waiting on the model; `round` counts gateway calls from 1.
    AwaitingModel { round: u32 },

    ResolvingTool { name: String },

    ExecutingTool { name: String },

    ToolFinished { name: String, success: bool },

    /// The model answered in text.
    GeneratingResponse,

    /// The turn ended with an error.
    Failed { message: String },
}

impl ProgressEvent {
    /// A short status line for display.
    pub fn status(&self) -> String {
        match self {
            Self::AwaitingModel { round: 1 } => "Thinking...".into(),
            Self::AwaitingModel { round } => format!("Thinking (step {round})..."),
            Self::ResolvingTool { name } => format!("Preparing {name}..."),
            Self::ExecutingTool { name } => format!("Looking up {name}..."),
            Self::ToolFinished { name, success: true } => format!("{name} done"),
            Self::ToolFinished { name, success: false } => format!("{name} returned no data"),
            Self::GeneratingResponse => "Writing answer...".into(),
            Self::Failed { message } => format!("Failed: {message}"),
        }
    }
}

/// Optional sender wrapper used by the loop.
#[derive(Clone, Default)]
pub(crate) struct Progress(Option<ProgressSender>);

impl Progress {
    pub(crate) fn new(sender: Option<ProgressSender>) -> Self {
        Self(sender)
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&ProgressEvent::ToolFinished {
            name: "get_courses".into(),
            success: true,
        })
        .unwrap();
        assert!(json.contains(r#""type":"tool_finished""#));
        assert!(json.contains(r#""success":true"#));

        let json = serde_json::to_string(&ProgressEvent::GeneratingResponse).unwrap();
        assert_eq!(json, r#"{"type":"generating_response"}"#);
    }

    #[test]
    fn status_lines() {
        assert_eq!(ProgressEvent::AwaitingModel { round: 1 }.status(), "Thinking...");
        assert_eq!(
            ProgressEvent::AwaitingModel { round: 3 }.status(),
            "Thinking (step 3)..."
        );
        assert_eq!(
            ProgressEvent::ExecutingTool { name: "get_events".into() }.status(),
            "Looking up get_events..."
        );
    }

    #[test]
    fn emit_after_receiver_dropped_is_harmless() {
        let (tx, rx) = channel();
        drop(rx);
        Progress::new(Some(tx)).emit(ProgressEvent::GeneratingResponse);
        Progress::default().emit(ProgressEvent::GeneratingResponse);
    }

    #[test]
    fn emit_delivers_in_order() {
        let (tx, mut rx) = channel();
        let progress = Progress::new(Some(tx));
        progress.emit(ProgressEvent::AwaitingModel { round: 1 });
        progress.emit(ProgressEvent::GeneratingResponse);
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::AwaitingModel { round: 1 });
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::GeneratingResponse);
    }
}
