use axum::extract::ws::Message;

/// Frame serialized once per broadcast and cloned per recipient.
#[derive(Debug, Clone)]
pub enum PreparedFrame {
    Text(String),
}

impl PreparedFrame {
    /// Relay frame carrying the message JSON exactly as received.
    pub fn text(raw: &str) -> Self {
        PreparedFrame::Text(raw.to_owned())
    }

    pub fn to_ws_message(&self) -> Message {
        match self {
            PreparedFrame::Text(s) => Message::Text(s.clone()),
        }
    }
}
