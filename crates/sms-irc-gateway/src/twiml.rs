//! Provider reply markup documents.
//!
//! Every valid webhook request is answered with one of these; an empty
//! `<Response/>` means "no reply to the sender".

/// A webhook reply document carrying at most one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwimlResponse {
    message: Option<String>,
}

impl TwimlResponse {
    /// A reply that sends nothing back to the sender.
    pub fn empty() -> Self {
        Self { message: None }
    }

    /// A reply that texts `text` back to the sender.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
        }
    }

    /// Render the document.
    pub fn to_xml(&self) -> String {
        match &self.message {
            None => r#"<?xml version="1.0" encoding="UTF-8"?><Response/>"#.to_string(),
            Some(text) => format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Response><Message>{}</Message></Response>"#,
                escape_xml(text)
            ),
        }
    }
}

/// Escape text content for XML.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
