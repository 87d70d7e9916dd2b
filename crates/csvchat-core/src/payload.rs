//! Display-side interpretation of assistant message content.
//!
//! Nothing here mutates stored messages; content is re-classified on every
//! render.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Indicator shown when content looks like JSON but cannot be decoded.
pub const PARSE_ERROR_TEXT: &str = "could not parse response";

/// Lenient view of a CSV analysis response body.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub explanation: Option<Value>,
    /// Usually a sequence of row objects.
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, rename = "downloadUrl")]
    pub download_url: Option<Value>,
}

impl QueryResponse {
    pub fn summary_text(&self) -> Option<String> {
        self.summary.as_ref().map(value_text)
    }

    pub fn explanation_text(&self) -> Option<String> {
        self.explanation.as_ref().map(value_text)
    }

    pub fn download_text(&self) -> Option<String> {
        self.download_url.as_ref().map(value_text)
    }

    fn from_object(mut object: Map<String, Value>) -> Self {
        let mut take = |key: &str| object.remove(key).filter(|value| !value.is_null());
        Self {
            summary: take("summary"),
            explanation: take("explanation"),
            result: take("result"),
            download_url: take("downloadUrl"),
        }
    }

    /// Tabulate `result`; `None` when it is not a sequence of objects.
    pub fn table(&self) -> Option<ResultTable> {
        let rows = self.result.as_ref()?.as_array()?;
        let objects: Vec<&Map<String, Value>> =
            rows.iter().filter_map(Value::as_object).collect();
        if objects.is_empty() {
            return None;
        }
        Some(ResultTable::from_objects(&objects))
    }
}

/// Rows rendered as text cells under the union of their keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    fn from_objects(objects: &[&Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for object in objects {
            for key in object.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = objects
            .iter()
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(column).map(value_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}

/// How an assistant message should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantView {
    Text(String),
    Table(QueryResponse),
    ParseError,
}

impl AssistantView {
    pub fn classify(content: &str) -> Self {
        let trimmed = content.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return AssistantView::Text(content.to_string());
        }
        let value = match serde_json::from_str::<Value>(content) {
            Ok(value) => value,
            Err(_) => return AssistantView::ParseError,
        };
        match value {
            Value::Object(object) if object.contains_key("summary") => {
                AssistantView::Table(QueryResponse::from_object(object))
            }
            _ => AssistantView::Text(content.to_string()),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Compact relative time: `now`, `Nm`, `Nh`, or `Nd`.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    format!("{}d", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::{AssistantView, ResultTable, format_time_ago};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_stays_text() {
        assert_eq!(
            AssistantView::classify("on it"),
            AssistantView::Text("on it".to_string())
        );
    }

    #[test]
    fn json_without_summary_is_text() {
        let content = r#"{"rows":[]}"#;
        assert_eq!(
            AssistantView::classify(content),
            AssistantView::Text(content.to_string())
        );
    }

    #[test]
    fn broken_json_is_parse_error() {
        assert_eq!(AssistantView::classify("{\"summary\":"), AssistantView::ParseError);
    }

    #[test]
    fn summary_payload_builds_table() {
        let content = r#"{
            "summary": "2 companies",
            "explanation": "filtered by amount",
            "result": [{"name": "Acme", "amount": 120}, {"name": "Globex", "city": "Springfield"}],
            "downloadUrl": "https://example.test/out.csv"
        }"#;
        let AssistantView::Table(response) = AssistantView::classify(content) else {
            panic!("expected table view");
        };
        assert_eq!(response.summary_text().as_deref(), Some("2 companies"));
        assert_eq!(
            response.explanation_text().as_deref(),
            Some("filtered by amount")
        );
        assert_eq!(
            response.download_text().as_deref(),
            Some("https://example.test/out.csv")
        );
        let table = response.table().expect("table");
        assert_eq!(
            table,
            ResultTable {
                columns: vec!["name".into(), "amount".into(), "city".into()],
                rows: vec![
                    vec!["Acme".into(), "120".into(), String::new()],
                    vec!["Globex".into(), String::new(), "Springfield".into()],
                ],
            }
        );
    }

    #[test]
    fn non_row_result_has_no_table() {
        let AssistantView::Table(response) =
            AssistantView::classify(r#"{"summary": "42", "result": 42}"#)
        else {
            panic!("expected table view");
        };
        assert!(response.table().is_none());
    }

    #[test]
    fn odd_field_types_still_render() {
        let AssistantView::Table(response) = AssistantView::classify(
            r#"{"summary": "x", "downloadUrl": 5, "explanation": null}"#,
        ) else {
            panic!("expected table view");
        };
        assert_eq!(response.download_text().as_deref(), Some("5"));
        assert_eq!(response.explanation_text(), None);
    }

    #[test]
    fn columns_follow_response_order() {
        let AssistantView::Table(response) = AssistantView::classify(
            r#"{"summary": "s", "result": [{"zeta": 1, "alpha": 2, "mid": 3}]}"#,
        ) else {
            panic!("expected table view");
        };
        let table = response.table().expect("table");
        assert_eq!(table.columns, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_time_ago(now - Duration::seconds(30), now), "now");
        assert_eq!(format_time_ago(now - Duration::minutes(30), now), "30m");
        assert_eq!(format_time_ago(now - Duration::hours(2), now), "2h");
        assert_eq!(format_time_ago(now - Duration::days(3), now), "3d");
    }
}
