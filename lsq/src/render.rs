use anyhow::{Context, Result};
use loglens::{LogRecord, MatchError, MatchedAttribute, ParseError, SearchState, TokenGroup};
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Copy)]
pub struct RenderFlags {
    pub tokens: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct QueryOutput<'s, 'q> {
    query: &'q str,
    canonical: &'s str,
    errors: &'s [ParseError],
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<TokenGroup<'s, 'q>>>,
    matches: Vec<RecordOutput<'s>>,
}

#[derive(Serialize)]
struct RecordOutput<'r> {
    index: usize,
    record: &'r LogRecord,
    attributes: Vec<MatchedAttribute>,
    errors: Vec<MatchError>,
}

/// Prints the outcome of one query against the loaded records.
pub fn render<W: Write>(
    out: &mut W,
    state: &SearchState<'_>,
    records: &[LogRecord],
    flags: RenderFlags,
) -> Result<()> {
    let matches: Vec<_> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| state.matches(record))
        .map(|(index, record)| {
            let report = state.matched_attributes(record);
            RecordOutput {
                index,
                record,
                attributes: report.attributes,
                errors: report.errors,
            }
        })
        .collect();

    if flags.json {
        let output = QueryOutput {
            query: state.query(),
            canonical: state.canonical(),
            errors: state.errors(),
            groups: flags.tokens.then(|| state.groups()),
            matches,
        };
        serde_json::to_writer(&mut *out, &output).context("Failed to encode output")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "query: {}", state.canonical())?;
    for error in state.errors() {
        writeln!(out, "error: {error}")?;
    }
    if flags.tokens {
        for group in state.groups() {
            writeln!(
                out,
                "  {:<9} {:>3}..{:<3} {}",
                format!("{:?}", group.kind),
                group.start(),
                group.end(),
                group.text(state.query())
            )?;
        }
    }
    if records.is_empty() {
        return Ok(());
    }
    writeln!(out, "{} of {} records match", matches.len(), records.len())?;
    for matched in &matches {
        let title = matched.record.message.as_deref().unwrap_or("");
        writeln!(out, "#{} {title}", matched.index + 1)?;
        for attr in &matched.attributes {
            let marker = if attr.matched { '*' } else { ' ' };
            writeln!(out, "  {marker} {} = {}", attr.key, marked_value(attr))?;
        }
        for error in &matched.errors {
            writeln!(out, "  ! {error}")?;
        }
    }
    Ok(())
}

/// The attribute value with its matched span bracketed.
fn marked_value(attr: &MatchedAttribute) -> String {
    let text = attr.value.to_string();
    let Some(span) = attr.matched_span else {
        return text;
    };
    let end = span.start + span.len;
    match (text.get(..span.start), text.get(span.start..end), text.get(end..)) {
        (Some(head), Some(hit), Some(tail)) => format!("{head}[{hit}]{tail}"),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglens::SearchOptions;

    fn records() -> Vec<LogRecord> {
        loglens::read_records(
            concat!(
                r#"{"level":"error","message":"connection timeout"}"#,
                "\n",
                r#"{"level":"info","message":"all good"}"#,
            )
            .as_bytes(),
        )
        .unwrap()
    }

    fn text_output(query: &str, tokens: bool) -> String {
        let state = SearchState::new(query, &SearchOptions::default());
        let mut out = Vec::new();
        let flags = RenderFlags {
            tokens,
            json: false,
        };
        render(&mut out, &state, &records(), flags).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_output_marks_matches() {
        let output = text_output("timeout", false);
        assert_eq!(
            output,
            "query: timeout\n\
             1 of 2 records match\n\
             #1 connection timeout\n\
             \u{20} * message = connection [timeout]\n\
             \u{20}   level = error\n"
        );
    }

    #[test]
    fn text_output_lists_errors_and_groups() {
        let output = text_output("(level:error", true);
        assert!(output.starts_with("query: (level:error)\n"));
        assert!(output.contains("error: unbalanced parenthesis (at byte 0)\n"));
        assert!(output.contains("Grouping"));
        assert!(output.contains("KeyValue"));
    }

    #[test]
    fn json_output_is_one_document() {
        let state = SearchState::new("level:info", &SearchOptions::default());
        let mut out = Vec::new();
        let flags = RenderFlags {
            tokens: true,
            json: true,
        };
        render(&mut out, &state, &records(), flags).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["canonical"], "level:info");
        assert_eq!(value["matches"].as_array().unwrap().len(), 1);
        assert_eq!(value["matches"][0]["index"], 1);
        assert_eq!(value["groups"][0]["kind"], "KeyValue");
        assert_eq!(value["matches"][0]["attributes"][1]["key"], "level");
        assert_eq!(value["matches"][0]["attributes"][1]["matched"], true);
    }
}
