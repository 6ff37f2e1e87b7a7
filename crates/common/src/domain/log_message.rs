use serde::Deserialize;

/// Validated shape of one inbound log event.
///
/// Producers publish JSON objects with these six string fields. Missing
/// fields default to the empty string and unknown fields are ignored, so
/// parsing confirms the payload is a well-formed object of the expected
/// shape rather than enforcing a strict schema. The struct lives only for
/// the duration of one delivery; the store always receives the original raw
/// payload, never a re-serialization of this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LogMessage {
    pub user_id: String,
    pub message: String,
    pub request_name: String,
    pub request_id: String,
    pub severity: String,
    pub metadata: String,
}

impl LogMessage {
    /// Parse a raw payload into the log message shape.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let raw = r#"{"UserId":"u1","Message":"hello","RequestName":"r","RequestId":"1","Severity":"info","Metadata":"{}"}"#;

        let msg = LogMessage::parse(raw).unwrap();

        assert_eq!(msg.user_id, "u1");
        assert_eq!(msg.message, "hello");
        assert_eq!(msg.request_name, "r");
        assert_eq!(msg.request_id, "1");
        assert_eq!(msg.severity, "info");
        assert_eq!(msg.metadata, "{}");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let msg = LogMessage::parse(r#"{"UserId":"u1"}"#).unwrap();

        assert_eq!(msg.user_id, "u1");
        assert_eq!(msg.message, "");
        assert_eq!(msg.severity, "");
    }

    #[test]
    fn test_empty_object_is_accepted() {
        let msg = LogMessage::parse("{}").unwrap();
        assert_eq!(msg, LogMessage::default());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = r#"{"UserId":"u1","Hostname":"node-7","TraceId":"abc"}"#;

        let msg = LogMessage::parse(raw).unwrap();
        assert_eq!(msg.user_id, "u1");
    }

    #[test]
    fn test_non_json_payload_fails() {
        assert!(LogMessage::parse("not-json").is_err());
    }

    #[test]
    fn test_non_object_payload_fails() {
        assert!(LogMessage::parse("[1,2,3]").is_err());
        assert!(LogMessage::parse("\"UserId\"").is_err());
    }
}
