//! Audit log entry types.
//!
//! A [`LogEntry`] is the canonical record flowing through the pipeline:
//! enqueued by the ingress layer, stored in the primary store and indexed
//! for search. [`LogSubmission`] is the client-supplied shape before the
//! pipeline assigns identity and a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Action recorded by a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    // ===== Mutations =====
    /// Resource was created.
    Create,
    /// Resource was updated.
    Update,
    /// Resource was deleted.
    Delete,

    // ===== Reads =====
    /// Resource was viewed in a UI context.
    View,
    /// Resource was read programmatically.
    Read,

    // ===== Sessions =====
    /// User logged in.
    Login,
    /// User logged out.
    Logout,

    // ===== Data movement =====
    /// Data was imported.
    Import,
    /// Data was exported.
    Export,
}

impl std::fmt::Display for LogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::View => write!(f, "VIEW"),
            Self::Read => write!(f, "READ"),
            Self::Login => write!(f, "LOGIN"),
            Self::Logout => write!(f, "LOGOUT"),
            Self::Import => write!(f, "IMPORT"),
            Self::Export => write!(f, "EXPORT"),
        }
    }
}

/// Error for parsing an enum from its wire name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct ParseEnumError(String);

impl std::str::FromStr for LogAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "VIEW" => Ok(Self::View),
            "READ" => Ok(Self::Read),
            "LOGIN" => Ok(Self::Login),
            "LOGOUT" => Ok(Self::Logout),
            "IMPORT" => Ok(Self::Import),
            "EXPORT" => Ok(Self::Export),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogSeverity {
    /// Routine activity.
    #[default]
    Info,
    /// Unusual but non-failing activity.
    Warning,
    /// A failed operation.
    Error,
    /// A failure requiring attention.
    Critical,
}

impl std::fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for LogSeverity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

/// A complete audit log entry.
///
/// `(tenant_id, log_id)` is the identity of the entry everywhere in the
/// pipeline: the queue deduplication key, the primary store unique key and
/// the search document id all derive from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique entry ID within the tenant. Doubles as the idempotency key.
    pub log_id: Uuid,

    /// Owning tenant.
    pub tenant_id: String,

    /// Acting user.
    pub user_id: String,

    /// Session the action happened in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// What the user did.
    pub action: LogAction,

    /// Type of the affected resource (e.g., "order", "customer").
    pub resource_type: String,

    /// ID of the affected resource.
    pub resource_id: String,

    /// When the action occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity classification.
    #[serde(default)]
    pub severity: LogSeverity,

    /// Human-readable description.
    pub message: String,

    // ===== Mutation detail =====
    /// Resource state before the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_state: Option<serde_json::Value>,

    /// Resource state after the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_state: Option<serde_json::Value>,

    /// Additional structured metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,

    // ===== Request context =====
    /// Originating request ID. Submissions carrying the same request ID
    /// map to the same `log_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Client user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl LogEntry {
    /// Deduplication key: tenant scope plus entry identity.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.tenant_id, self.log_id)
    }
}

/// A client-supplied log entry, before the pipeline assigns identity.
///
/// `log_id` is never client-supplied. The enqueuer derives it from
/// `request_id` when present (so retried submissions converge on one entry)
/// and mints a fresh one otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSubmission {
    /// Tenant the entry belongs to. Must match the authenticated tenant.
    pub tenant_id: String,

    /// Acting user.
    pub user_id: String,

    /// Session the action happened in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// What the user did.
    pub action: LogAction,

    /// Type of the affected resource.
    pub resource_type: String,

    /// ID of the affected resource.
    pub resource_id: String,

    /// When the action occurred. Stamped at enqueue time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Severity classification.
    #[serde(default)]
    pub severity: LogSeverity,

    /// Human-readable description.
    pub message: String,

    /// Resource state before the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_state: Option<serde_json::Value>,

    /// Resource state after the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_state: Option<serde_json::Value>,

    /// Additional structured metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,

    /// Originating request ID, if the client retries submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Client IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl LogSubmission {
    /// Create a builder with the required fields.
    pub fn builder(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        action: LogAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> LogSubmissionBuilder {
        LogSubmissionBuilder::new(tenant_id, user_id, action, resource_type, resource_id, message)
    }

    /// Convert into a complete [`LogEntry`] with an assigned identity.
    ///
    /// The submission's own timestamp wins when present.
    pub fn into_entry(self, log_id: Uuid, fallback_timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            log_id,
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            session_id: self.session_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            timestamp: self.timestamp.unwrap_or(fallback_timestamp),
            severity: self.severity,
            message: self.message,
            before_state: self.before_state,
            after_state: self.after_state,
            metadata: self.metadata,
            request_id: self.request_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        }
    }
}

/// Builder for log submissions.
#[derive(Debug)]
pub struct LogSubmissionBuilder {
    submission: LogSubmission,
}

impl LogSubmissionBuilder {
    /// Create a new builder with required fields.
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        action: LogAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            submission: LogSubmission {
                tenant_id: tenant_id.into(),
                user_id: user_id.into(),
                session_id: None,
                action,
                resource_type: resource_type.into(),
                resource_id: resource_id.into(),
                timestamp: None,
                severity: LogSeverity::Info,
                message: message.into(),
                before_state: None,
                after_state: None,
                metadata: serde_json::Value::Null,
                request_id: None,
                ip_address: None,
                user_agent: None,
            },
        }
    }

    /// Set the session ID.
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.submission.session_id = Some(id.into());
        self
    }

    /// Set the occurrence timestamp.
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.submission.timestamp = Some(ts);
        self
    }

    /// Set the severity.
    pub fn severity(mut self, severity: LogSeverity) -> Self {
        self.submission.severity = severity;
        self
    }

    /// Set the state before the action.
    pub fn before_state(mut self, state: serde_json::Value) -> Self {
        self.submission.before_state = Some(state);
        self
    }

    /// Set the state after the action.
    pub fn after_state(mut self, state: serde_json::Value) -> Self {
        self.submission.after_state = Some(state);
        self
    }

    /// Set additional metadata.
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.submission.metadata = metadata;
        self
    }

    /// Set the originating request ID.
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.submission.request_id = Some(id.into());
        self
    }

    /// Set the client IP address.
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.submission.ip_address = Some(ip.into());
        self
    }

    /// Set the client user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.submission.user_agent = Some(agent.into());
        self
    }

    /// Build the submission.
    pub fn build(self) -> LogSubmission {
        self.submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_builder() {
        let submission = LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Update,
            "order",
            "ord-42",
            "Order updated",
        )
        .severity(LogSeverity::Warning)
        .session_id("sess-9")
        .request_id("req-123")
        .build();

        assert_eq!(submission.tenant_id, "client_a");
        assert_eq!(submission.action, LogAction::Update);
        assert_eq!(submission.severity, LogSeverity::Warning);
        assert_eq!(submission.request_id, Some("req-123".to_string()));
        assert!(submission.timestamp.is_none());
    }

    #[test]
    fn test_into_entry_stamps_timestamp_when_absent() {
        let submission = LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Create,
            "order",
            "ord-1",
            "Order created",
        )
        .build();

        let log_id = Uuid::new_v4();
        let now = Utc::now();
        let entry = submission.into_entry(log_id, now);

        assert_eq!(entry.log_id, log_id);
        assert_eq!(entry.timestamp, now);
    }

    #[test]
    fn test_into_entry_keeps_client_timestamp() {
        let ts = "2024-03-01T12:00:00Z".parse().unwrap();
        let submission = LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Create,
            "order",
            "ord-1",
            "Order created",
        )
        .timestamp(ts)
        .build();

        let entry = submission.into_entry(Uuid::new_v4(), Utc::now());
        assert_eq!(entry.timestamp, ts);
    }

    #[test]
    fn test_action_wire_format_is_uppercase() {
        let json = serde_json::to_string(&LogAction::Create).unwrap();
        assert_eq!(json, "\"CREATE\"");

        let parsed: LogAction = serde_json::from_str("\"EXPORT\"").unwrap();
        assert_eq!(parsed, LogAction::Export);
    }

    #[test]
    fn test_severity_defaults_to_info() {
        let json = r#"{
            "tenant_id": "client_a",
            "user_id": "user-1",
            "action": "VIEW",
            "resource_type": "report",
            "resource_id": "rep-7",
            "message": "Report viewed"
        }"#;

        let submission: LogSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.severity, LogSeverity::Info);
    }

    #[test]
    fn test_dedup_key_combines_tenant_and_log_id() {
        let entry = LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Delete,
            "order",
            "ord-1",
            "Order deleted",
        )
        .build()
        .into_entry(Uuid::nil(), Utc::now());

        assert_eq!(
            entry.dedup_key(),
            "client_a:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(format!("{}", LogAction::Create), "CREATE");
        assert_eq!(format!("{}", LogAction::Login), "LOGIN");
        assert_eq!(format!("{}", LogSeverity::Critical), "CRITICAL");
    }

    #[test]
    fn test_parse_round_trips_display() {
        for action in [
            LogAction::Create,
            LogAction::Update,
            LogAction::Delete,
            LogAction::View,
            LogAction::Read,
            LogAction::Login,
            LogAction::Logout,
            LogAction::Import,
            LogAction::Export,
        ] {
            assert_eq!(action.to_string().parse::<LogAction>().unwrap(), action);
        }
        for severity in [
            LogSeverity::Info,
            LogSeverity::Warning,
            LogSeverity::Error,
            LogSeverity::Critical,
        ] {
            assert_eq!(
                severity.to_string().parse::<LogSeverity>().unwrap(),
                severity
            );
        }
        assert!("SHRED".parse::<LogAction>().is_err());
    }
}
