use serde_json::Value;

/// Pulls the agent message and session id out of backend JSON lines.
///
/// Understands the three stream shapes:
/// - codex: `{"type":"thread.started","thread_id":..}` and
///   `{"type":"item.completed","item":{"type":"agent_message","text":..}}`
/// - claude: `session_id` on every event, assistant content blocks and a final
///   `{"type":"result","result":..}`
/// - gemini: `{"type":"init","session_id":..}` and
///   `{"type":"message","role":"assistant","content":..,"delta":true}`
///
/// Lines that are not JSON objects are ignored here; the caller falls back to
/// raw stdout when no message was decoded.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    session_id: Option<String>,
    last_message: Option<String>,
    final_result: Option<String>,
    delta_buf: String,
    json_lines: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) {
        let s = line.trim();
        if !(s.starts_with('{') && s.ends_with('}')) {
            return;
        }
        let Ok(v) = serde_json::from_str::<Value>(s) else {
            tracing::debug!(line = %preview(s), "undecodable json line");
            return;
        };
        self.json_lines += 1;

        self.capture_session_id(&v);

        match v.get("type").and_then(Value::as_str).unwrap_or("") {
            "item.completed" => {
                let item = v.get("item");
                let is_agent_message = item
                    .and_then(|i| i.get("type"))
                    .and_then(Value::as_str)
                    == Some("agent_message");
                if is_agent_message {
                    if let Some(text) = item.and_then(|i| i.get("text")).and_then(Value::as_str) {
                        self.set_message(text);
                    }
                }
            }
            "assistant" => {
                if let Some(text) = claude_text(&v) {
                    self.set_message(&text);
                }
            }
            "result" => {
                if let Some(text) = v.get("result").and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        self.final_result = Some(text.to_string());
                    }
                }
            }
            "message" => {
                if v.get("role").and_then(Value::as_str) != Some("assistant") {
                    return;
                }
                let Some(content) = v.get("content").and_then(Value::as_str) else {
                    return;
                };
                if v.get("delta").and_then(Value::as_bool).unwrap_or(false) {
                    self.delta_buf.push_str(content);
                } else {
                    self.set_message(content);
                }
            }
            _ => {}
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn json_lines(&self) -> usize {
        self.json_lines
    }

    /// Best message seen so far: the final result, then streamed deltas, then
    /// the last complete assistant message.
    pub fn message(&self) -> String {
        if let Some(r) = &self.final_result {
            return r.clone();
        }
        if !self.delta_buf.trim().is_empty() {
            return self.delta_buf.clone();
        }
        self.last_message.clone().unwrap_or_default()
    }

    fn set_message(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.last_message = Some(text.to_string());
        }
    }

    fn capture_session_id(&mut self, v: &Value) {
        if self.session_id.is_some() {
            return;
        }
        let id = if v.get("type").and_then(Value::as_str) == Some("thread.started") {
            v.get("thread_id").and_then(Value::as_str)
        } else {
            ["session_id", "sessionId"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str))
        };
        if let Some(id) = id.map(str::trim).filter(|s| !s.is_empty()) {
            self.session_id = Some(id.to_string());
        }
    }
}

fn claude_text(v: &Value) -> Option<String> {
    let items = v
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)?;

    let text: Vec<&str> = items
        .iter()
        .filter(|item| {
            matches!(
                item.get("type").and_then(Value::as_str),
                Some("text") | Some("output_text")
            )
        })
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

fn preview(s: &str) -> String {
    s.chars().take(120).collect()
}
