// src/server/events.rs

use serde::Serialize;

/// How connected browsers should react to a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    Full,
    Inject,
}

/// Produced by a unit run that changed output and asked for reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub unit: String,
    pub kind: ReloadKind,
    /// Changed files, relative to the output root.
    pub paths: Vec<String>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireMessage<'a> {
    Reload,
    Inject { paths: &'a [String] },
}

impl ReloadEvent {
    /// JSON payload pushed to clients:
    /// `{"type":"reload"}` or `{"type":"inject","paths":[...]}`.
    pub fn to_message(&self) -> String {
        let msg = match self.kind {
            ReloadKind::Full => WireMessage::Reload,
            ReloadKind::Inject => WireMessage::Inject { paths: &self.paths },
        };
        serde_json::to_string(&msg).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let full = ReloadEvent {
            unit: "html".into(),
            kind: ReloadKind::Full,
            paths: vec!["index.html".into()],
        };
        assert_eq!(full.to_message(), r#"{"type":"reload"}"#);

        let inject = ReloadEvent {
            unit: "styles".into(),
            kind: ReloadKind::Inject,
            paths: vec!["css/style.min.css".into()],
        };
        assert_eq!(
            inject.to_message(),
            r#"{"type":"inject","paths":["css/style.min.css"]}"#
        );
    }
}
