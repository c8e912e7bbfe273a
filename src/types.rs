use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Point-in-time view of the run, as sent to the control panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub paused: bool,
    pub index: usize,
    pub total: usize,
    pub error: Option<String>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            running: false,
            paused: false,
            index: 0,
            total: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running,
    Paused,
    Error,
    Completed,
}

impl StatusSnapshot {
    pub fn phase(&self) -> RunPhase {
        if self.error.is_some() {
            RunPhase::Error
        } else if self.running && self.paused {
            RunPhase::Paused
        } else if self.total > 0 && self.index >= self.total {
            RunPhase::Completed
        } else if self.running {
            RunPhase::Running
        } else {
            RunPhase::Idle
        }
    }

    /// True once the run can make no further progress without a new command.
    pub fn is_settled(&self) -> bool {
        !self.running
    }
}

/// Payload of a `start` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub input_selector: Option<String>,
    #[serde(default)]
    pub button_selector: Option<String>,
    #[serde(default)]
    pub typing_speed: Option<f64>,
    #[serde(default)]
    pub delay_between: Option<f64>,
}

impl StartRequest {
    pub fn new(prompts: Vec<String>) -> Self {
        Self {
            prompts,
            ..Default::default()
        }
    }

    pub fn with_selectors(mut self, input: Option<String>, button: Option<String>) -> Self {
        self.input_selector = input;
        self.button_selector = button;
        self
    }

    pub fn with_timing(mut self, typing_speed: f64, delay_between: f64) -> Self {
        self.typing_speed = Some(typing_speed);
        self.delay_between = Some(delay_between);
        self
    }
}

/// Commands accepted from the control panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Start(StartRequest),
    Stop,
    Resume,
    Cancel,
    StatusRequest,
}

impl Command {
    /// Decodes a raw panel message. Messages without a recognised `type`
    /// are answered like a status request.
    pub fn from_message(message: Value) -> Self {
        match serde_json::from_value::<Command>(message) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(error = %err, "unrecognised message, treating as status request");
                Command::StatusRequest
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start(_) => "start",
            Command::Stop => "stop",
            Command::Resume => "resume",
            Command::Cancel => "cancel",
            Command::StatusRequest => "status_request",
        }
    }
}

/// Synchronous answer to every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub status: StatusSnapshot,
}

/// Asynchronous broadcast pushed after every state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "status")]
pub struct StatusMessage {
    pub status: StatusSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_message_decodes_camel_case_fields() {
        let command = Command::from_message(json!({
            "type": "start",
            "prompts": ["a cat", "a dog"],
            "inputSelector": "#prompt",
            "buttonSelector": "",
            "typingSpeed": 5,
            "delayBetween": 250.5
        }));

        match command {
            Command::Start(request) => {
                assert_eq!(request.prompts, vec!["a cat", "a dog"]);
                assert_eq!(request.input_selector.as_deref(), Some("#prompt"));
                assert_eq!(request.button_selector.as_deref(), Some(""));
                assert_eq!(request.typing_speed, Some(5.0));
                assert_eq!(request.delay_between, Some(250.5));
            }
            other => panic!("expected start, got {:?}", other),
        }
    }

    #[test]
    fn unknown_or_missing_type_is_a_status_request() {
        assert_eq!(
            Command::from_message(json!({ "type": "explode" })),
            Command::StatusRequest
        );
        assert_eq!(Command::from_message(json!({})), Command::StatusRequest);
        assert_eq!(
            Command::from_message(json!({ "type": "stop" })),
            Command::Stop
        );
    }

    #[test]
    fn status_message_wire_shape() {
        let message = StatusMessage {
            status: StatusSnapshot {
                running: true,
                paused: false,
                index: 2,
                total: 5,
                error: None,
            },
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "status",
                "status": {
                    "running": true,
                    "paused": false,
                    "index": 2,
                    "total": 5,
                    "error": null
                }
            })
        );
    }

    #[test]
    fn phase_distinguishes_completed_from_idle() {
        let mut snapshot = StatusSnapshot::default();
        assert_eq!(snapshot.phase(), RunPhase::Idle);

        snapshot.total = 3;
        snapshot.index = 3;
        assert_eq!(snapshot.phase(), RunPhase::Completed);

        snapshot.running = true;
        snapshot.paused = true;
        assert_eq!(snapshot.phase(), RunPhase::Paused);

        snapshot.error = Some("Input not found".to_string());
        assert_eq!(snapshot.phase(), RunPhase::Error);
    }
}
