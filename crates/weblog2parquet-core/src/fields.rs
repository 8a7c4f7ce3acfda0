// The closed set of fields captured by the access-log line grammar.
//
// Each variant corresponds to one capture group in `parser::LINE_GRAMMAR`.
// Only the projected subset becomes output columns; the rest are captured so
// the grammar can consume a full line but are never materialized.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    BucketOwner,
    BucketName,
    RequestDate,
    RemoteIp,
    Requester,
    RequestId,
    Operation,
    Key,
    RequestUri,
    HttpStatus,
    ErrorCode,
    TotalTime,
    TurnaroundTime,
    Referrer,
    UserAgent,
    VersionId,
    HostId,
    SigV,
    CipherSuite,
    AuthType,
    EndPoint,
    TlsVersion,
}

impl LogField {
    /// 1-based capture group index within the line grammar.
    pub const fn capture_group(self) -> usize {
        match self {
            LogField::BucketOwner => 1,
            LogField::BucketName => 2,
            LogField::RequestDate => 3,
            LogField::RemoteIp => 4,
            LogField::Requester => 5,
            LogField::RequestId => 6,
            LogField::Operation => 7,
            LogField::Key => 8,
            LogField::RequestUri => 9,
            LogField::HttpStatus => 10,
            LogField::ErrorCode => 11,
            LogField::TotalTime => 12,
            LogField::TurnaroundTime => 13,
            LogField::Referrer => 14,
            LogField::UserAgent => 15,
            LogField::VersionId => 16,
            LogField::HostId => 17,
            LogField::SigV => 18,
            LogField::CipherSuite => 19,
            LogField::AuthType => 20,
            LogField::EndPoint => 21,
            LogField::TlsVersion => 22,
        }
    }

    pub const fn column_name(self) -> &'static str {
        match self {
            LogField::BucketOwner => "bucket_owner",
            LogField::BucketName => "bucket_name",
            LogField::RequestDate => "request_date",
            LogField::RemoteIp => "remote_ip",
            LogField::Requester => "requester",
            LogField::RequestId => "request_id",
            LogField::Operation => "operation",
            LogField::Key => "key",
            LogField::RequestUri => "request_uri",
            LogField::HttpStatus => "http_status",
            LogField::ErrorCode => "error_code",
            LogField::TotalTime => "total_time",
            LogField::TurnaroundTime => "turnaround_time",
            LogField::Referrer => "referrer",
            LogField::UserAgent => "user_agent",
            LogField::VersionId => "version_id",
            LogField::HostId => "host_id",
            LogField::SigV => "sig_v",
            LogField::CipherSuite => "cipher_suite",
            LogField::AuthType => "auth_type",
            LogField::EndPoint => "end_point",
            LogField::TlsVersion => "tls_version",
        }
    }
}

/// Fields projected into output rows, in output-column order.
pub const PROJECTED_FIELDS: [LogField; 12] = [
    LogField::BucketName,
    LogField::RequestDate,
    LogField::RemoteIp,
    LogField::Operation,
    LogField::Key,
    LogField::RequestUri,
    LogField::HttpStatus,
    LogField::TotalTime,
    LogField::Referrer,
    LogField::UserAgent,
    LogField::VersionId,
    LogField::EndPoint,
];

/// Raw string values keyed by field. Empty when a line did not match the
/// grammar; an empty map must never be turned into a row.
pub type ParsedFields = HashMap<LogField, String>;
