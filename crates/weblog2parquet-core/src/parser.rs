// Access-log line parsing.
//
// A line is matched against a fixed regular-expression grammar. Lines that do
// not match yield an empty field map, not an error; rows are only built from
// non-empty maps. Numeric and timestamp conversion failures surface as
// `FormatError` so the consumer can drop the offending line and move on.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::fields::{LogField, ParsedFields, PROJECTED_FIELDS};

// Space-separated fields; quoted-or-dash alternation for the request URI,
// referrer and user agent; the trailing extension group (host id through TLS
// version) is optional and only present on newer log lines.
const LINE_GRAMMAR: &str = r#"^([^ ]*) ([^ ]*) \[(.*?)\] ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ("[^"]*"|-) (-|[0-9]*) ([^ ]*) ([^ ]*) ([^ ]*) ("[^"]*"|-) ("[^"]*"|-) ([^ ]*)(?: ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*))?.*$"#;

static LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LINE_GRAMMAR).expect("line grammar must compile"));

// [16/Apr/2021:23:15:06 +0000] -> the part before the timezone offset
const REQUEST_DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("field {field} is not numeric: {value:?}")]
    NonNumeric { field: &'static str, value: String },

    #[error("unparseable request timestamp: {value:?}")]
    Timestamp { value: String },

    #[error("matched line is missing field {0}")]
    Missing(&'static str),
}

/// One typed output row, field order matching the output schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub bucket: String,
    pub timestamp: NaiveDateTime,
    pub remote_ip: String,
    pub operation: String,
    pub key: String,
    pub request_uri: String,
    pub http_status: i32,
    pub total_time: i32,
    pub referrer: String,
    pub user_agent: String,
    pub version_id: String,
    /// Lives in the optional trailing extension fields; absent on older lines.
    pub endpoint: Option<String>,
}

/// Parses raw log lines into field maps.
#[derive(Debug, Default)]
pub struct LineParser;

impl LineParser {
    pub fn new() -> Self {
        Self
    }

    /// Match one line against the grammar. A non-matching or empty line
    /// yields an empty map.
    pub fn parse(&self, line: &str) -> ParsedFields {
        let mut fields = ParsedFields::new();
        if line.is_empty() {
            return fields;
        }
        if let Some(caps) = LINE_RE.captures(line) {
            for field in PROJECTED_FIELDS {
                if let Some(m) = caps.get(field.capture_group()) {
                    fields.insert(field, m.as_str().to_string());
                }
            }
        }
        fields
    }
}

/// Convert the bracket-delimited request time to a naive timestamp: cut at
/// the first `+` (the timezone offset marker), trim, then parse
/// `dd/Mon/yyyy:HH:mm:ss`.
fn convert_request_date(raw: &str) -> Result<NaiveDateTime, FormatError> {
    let stripped = raw.strip_prefix('[').unwrap_or(raw);
    let cut = match stripped.find('+') {
        Some(ix) => &stripped[..ix],
        None => stripped,
    };
    NaiveDateTime::parse_from_str(cut.trim(), REQUEST_DATE_FORMAT).map_err(|_| {
        FormatError::Timestamp {
            value: raw.to_string(),
        }
    })
}

fn require(fields: &ParsedFields, field: LogField) -> Result<String, FormatError> {
    fields
        .get(&field)
        .cloned()
        .ok_or(FormatError::Missing(field.column_name()))
}

fn require_i32(fields: &ParsedFields, field: LogField) -> Result<i32, FormatError> {
    let value = require(fields, field)?;
    value.parse::<i32>().map_err(|_| FormatError::NonNumeric {
        field: field.column_name(),
        value,
    })
}

/// Project a field map into a typed row in output-column order. An empty map
/// yields `Ok(None)`: nothing to emit.
pub fn build_row(fields: &ParsedFields) -> Result<Option<LogRow>, FormatError> {
    if fields.is_empty() {
        return Ok(None);
    }
    let request_date = require(fields, LogField::RequestDate)?;
    Ok(Some(LogRow {
        bucket: require(fields, LogField::BucketName)?,
        timestamp: convert_request_date(&request_date)?,
        remote_ip: require(fields, LogField::RemoteIp)?,
        operation: require(fields, LogField::Operation)?,
        key: require(fields, LogField::Key)?,
        request_uri: require(fields, LogField::RequestUri)?,
        http_status: require_i32(fields, LogField::HttpStatus)?,
        total_time: require_i32(fields, LogField::TotalTime)?,
        referrer: require(fields, LogField::Referrer)?,
        user_agent: require(fields, LogField::UserAgent)?,
        version_id: require(fields, LogField::VersionId)?,
        endpoint: fields.get(&LogField::EndPoint).cloned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE_LINE: &str = r#"192.0.2.1 mybucket [16/Apr/2021:23:15:06 +0000] 1.2.3.4 - - WEBSITE.GET.OBJECT key "GET /key HTTP/1.1" 200 - 32 - "-" "-" - - - - - -"#;

    #[test]
    fn parses_sample_line_into_typed_row() {
        let parser = LineParser::new();
        let fields = parser.parse(SAMPLE_LINE);
        assert!(!fields.is_empty());

        let row = build_row(&fields).unwrap().expect("row expected");
        assert_eq!(row.bucket, "mybucket");
        assert_eq!(row.http_status, 200);
        assert_eq!(row.total_time, 32);
        assert_eq!(row.remote_ip, "1.2.3.4");
        assert_eq!(row.operation, "WEBSITE.GET.OBJECT");
        assert_eq!(row.request_uri, r#""GET /key HTTP/1.1""#);
        let expected = NaiveDate::from_ymd_opt(2021, 4, 16)
            .unwrap()
            .and_hms_opt(23, 15, 6)
            .unwrap();
        assert_eq!(row.timestamp, expected);
    }

    #[test]
    fn line_with_extension_fields_captures_endpoint() {
        let line = r#"owner mybucket [16/Apr/2021:23:15:06 +0000] 1.2.3.4 - req-1 REST.GET.OBJECT idx.html "GET / HTTP/1.1" 200 - 17 3 "https://example.com/" "Mozilla/5.0" vers host-id SigV4 TLS_AES_128 AuthHeader mybucket.example.com TLSv1.2"#;
        let parser = LineParser::new();
        let row = build_row(&parser.parse(line)).unwrap().expect("row");
        assert_eq!(row.referrer, r#""https://example.com/""#);
        assert_eq!(row.user_agent, r#""Mozilla/5.0""#);
        assert_eq!(row.endpoint.as_deref(), Some("mybucket.example.com"));
        assert_eq!(row.total_time, 17);
    }

    #[test]
    fn missing_bracketed_timestamp_yields_empty_fields() {
        let line = r#"owner mybucket 16/Apr/2021:23:15:06 1.2.3.4 - - OP key "GET / HTTP/1.1" 200 - 1 - "-" "-" -"#;
        let parser = LineParser::new();
        let fields = parser.parse(line);
        assert!(fields.is_empty());
        assert!(build_row(&fields).unwrap().is_none());
    }

    #[test]
    fn empty_and_garbage_lines_yield_empty_fields() {
        let parser = LineParser::new();
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("not an access log line").is_empty());
    }

    #[test]
    fn dash_status_is_a_format_error() {
        let line = r#"owner b [16/Apr/2021:23:15:06 +0000] ip - - OP k "GET / HTTP/1.1" - - 5 - "-" "-" -"#;
        let parser = LineParser::new();
        let fields = parser.parse(line);
        assert!(!fields.is_empty());
        let err = build_row(&fields).unwrap_err();
        assert!(matches!(err, FormatError::NonNumeric { field, .. } if field == "http_status"));
    }

    #[test]
    fn non_numeric_total_time_is_a_format_error() {
        let line = r#"owner b [16/Apr/2021:23:15:06 +0000] ip - - OP k "GET / HTTP/1.1" 200 - abc - "-" "-" -"#;
        let parser = LineParser::new();
        let err = build_row(&parser.parse(line)).unwrap_err();
        assert!(matches!(err, FormatError::NonNumeric { field, .. } if field == "total_time"));
    }

    #[test]
    fn unparseable_timestamp_is_a_format_error() {
        let line = r#"owner b [99/Zzz/2021:23:15:06 +0000] ip - - OP k "GET / HTTP/1.1" 200 - 5 - "-" "-" -"#;
        let parser = LineParser::new();
        let err = build_row(&parser.parse(line)).unwrap_err();
        assert!(matches!(err, FormatError::Timestamp { .. }));
    }

    #[test]
    fn timestamp_without_offset_still_parses() {
        let ts = convert_request_date("16/Apr/2021:23:15:06").unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2021-04-16");
    }
}
