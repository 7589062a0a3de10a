use anyhow::{Context, Result};
use attr_match::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::debug;

/// One log line as delivered by the logs backend.
///
/// Reserved fields live at the top level; everything else the service
/// attached sits in `log_attributes`, possibly nested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: Option<String>,
    pub level: Option<String>,
    pub message: Option<String>,
    pub environment: Option<String>,
    #[serde(alias = "secureSessionId", alias = "secureSessionID")]
    pub secure_session_id: Option<String>,
    #[serde(alias = "serviceName")]
    pub service_name: Option<String>,
    #[serde(alias = "serviceVersion")]
    pub service_version: Option<String>,
    pub source: Option<String>,
    #[serde(alias = "spanId", alias = "spanID")]
    pub span_id: Option<String>,
    #[serde(alias = "traceId", alias = "traceID")]
    pub trace_id: Option<String>,
    #[serde(default, alias = "logAttributes")]
    pub log_attributes: Map<String, Value>,
}

impl LogRecord {
    /// Flattened `log_attributes` followed by the reserved fields. A reserved
    /// field replaces a same-named attribute.
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::from_json_object(&self.log_attributes);
        let reserved = [
            ("environment", &self.environment),
            ("level", &self.level),
            ("message", &self.message),
            ("secure_session_id", &self.secure_session_id),
            ("service_name", &self.service_name),
            ("service_version", &self.service_version),
            ("source", &self.source),
            ("span_id", &self.span_id),
            ("trace_id", &self.trace_id),
        ];
        for (key, value) in reserved {
            if let Some(value) = value {
                attrs.insert(key, value.as_str());
            }
        }
        attrs
    }
}

/// Reads JSON-lines records. Blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("Malformed log record on line {line_no}"))?;
        records.push(record);
    }
    debug!(count = records.len(), "log records read");
    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<LogRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
    read_records(BufReader::new(file)).with_context(|| format!("Failed to load {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attr_match::AttrValue;

    #[test]
    fn camel_case_fields_are_accepted() {
        let record: LogRecord = serde_json::from_str(
            r#"{"message":"hi","serviceName":"api","traceId":"t1","logAttributes":{"a":{"b":1}}}"#,
        )
        .unwrap();
        assert_eq!(record.service_name.as_deref(), Some("api"));
        assert_eq!(record.trace_id.as_deref(), Some("t1"));
        assert_eq!(record.attributes().get("a.b"), Some(&AttrValue::Number(1.0)));
    }

    #[test]
    fn reserved_fields_follow_attributes_and_win() {
        let record = LogRecord {
            level: Some("error".to_string()),
            message: Some("boom".to_string()),
            log_attributes: serde_json::json!({"user": "ann", "level": "shadowed"})
                .as_object()
                .cloned()
                .unwrap(),
            ..LogRecord::default()
        };
        let attrs = record.attributes();
        let keys: Vec<_> = attrs.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["user", "level", "message"]);
        assert_eq!(attrs.get("level"), Some(&AttrValue::from("error")));
    }

    #[test]
    fn absent_reserved_fields_are_skipped() {
        let attrs = LogRecord::default().attributes();
        assert!(attrs.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let input = "{\"message\":\"a\"}\n\n   \n{\"message\":\"b\"}\n";
        let records = read_records(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].message.as_deref(), Some("b"));
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let input = "{\"message\":\"a\"}\nnot json\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Malformed log record on line 2");
    }
}
