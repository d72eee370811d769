use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ExtractFileFields,
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskType::ExtractFileFields => write!(f, "extract_file_fields"),
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract_file_fields" => Ok(TaskType::ExtractFileFields),
            _ => Err(anyhow::anyhow!("Invalid task type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Scheduled,
    Cancelled,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "scheduled" => Ok(TaskStatus::Scheduled),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 3,
    #[default]
    Normal = 5,
    High = 7,
}

impl Priority {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            i32::MIN..=3 => Priority::Low,
            4..=6 => Priority::Normal,
            _ => Priority::High,
        }
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority as i32
    }
}

/// A queued unit of deferred work.
///
/// The row is owned by the queue: it is created by the submitter, claimed by
/// exactly one worker at a time and finished as completed or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Task {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Task {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            task_type: row
                .try_get::<String, _>("task_type")?
                .parse()
                .map_err(|e| {
                    sqlx::Error::Decode(format!("Failed to parse task_type: {}", e).into())
                })?,
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            payload: row.try_get("payload")?,
            result: row.try_get("result")?,
            scheduled_at: row.try_get("scheduled_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            retry_count: row.try_get("retry_count")?,
            max_retries: row.try_get("max_retries")?,
            timeout_seconds: row.try_get("timeout_seconds")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Task {
    pub fn is_ready_to_run(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::Scheduled)
            && self.scheduled_at <= Utc::now()
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Extract the payload as a typed struct.
    /// Returns None if deserialization fails.
    pub fn payload_as<P: TaskPayload>(&self) -> Option<P> {
        serde_json::from_value(self.payload.clone()).ok()
    }

    pub fn try_payload_as<P: TaskPayload>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    pub fn payload_from<P: TaskPayload>(payload: &P) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(payload)
    }
}

/// Trait for type-safe task payloads
pub trait TaskPayload: Serialize + for<'de> Deserialize<'de> {
    fn task_type() -> TaskType;
}

/// Job payload: extract invoice fields for one file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractFileFieldsPayload {
    pub file_id: Uuid,
}

impl TaskPayload for ExtractFileFieldsPayload {
    fn task_type() -> TaskType {
        TaskType::ExtractFileFields
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            task_type: task.task_type,
            status: task.status,
            payload: task.payload,
            result: task.result,
            scheduled_at: task.scheduled_at,
            started_at: task.started_at,
            completed_at: task.completed_at,
            retry_count: task.retry_count,
            max_retries: task.max_retries,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    pub scheduled: i64,
    pub cancelled: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(status: TaskStatus, scheduled_at: DateTime<Utc>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            task_type: TaskType::ExtractFileFields,
            status,
            priority: Priority::Normal.as_i32(),
            payload: serde_json::json!({ "file_id": Uuid::nil() }),
            result: None,
            scheduled_at,
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries: 3,
            timeout_seconds: Some(300),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn task_type_round_trips_through_text() {
        let t: TaskType = "extract_file_fields".parse().unwrap();
        assert_eq!(t, TaskType::ExtractFileFields);
        assert_eq!(t.to_string(), "extract_file_fields");
        assert!("video_transcode".parse::<TaskType>().is_err());
    }

    #[test]
    fn scheduled_task_is_not_ready_before_its_time() {
        let future = Utc::now() + chrono::Duration::seconds(15);
        assert!(!task_with(TaskStatus::Scheduled, future).is_ready_to_run());

        let past = Utc::now() - chrono::Duration::seconds(1);
        assert!(task_with(TaskStatus::Scheduled, past).is_ready_to_run());
        assert!(!task_with(TaskStatus::Running, past).is_ready_to_run());
    }

    #[test]
    fn retry_budget() {
        let mut task = task_with(TaskStatus::Failed, Utc::now());
        assert!(task.can_retry());
        task.retry_count = 3;
        assert!(!task.can_retry());
    }

    #[test]
    fn payload_is_typed() {
        let file_id = Uuid::new_v4();
        let mut task = task_with(TaskStatus::Pending, Utc::now());
        task.payload = Task::payload_from(&ExtractFileFieldsPayload { file_id }).unwrap();

        let payload: ExtractFileFieldsPayload = task.try_payload_as().unwrap();
        assert_eq!(payload.file_id, file_id);
        assert_eq!(ExtractFileFieldsPayload::task_type(), TaskType::ExtractFileFields);
    }

    #[test]
    fn malformed_payload_is_none() {
        let mut task = task_with(TaskStatus::Pending, Utc::now());
        task.payload = serde_json::json!({ "video_id": "nope" });
        assert!(task.payload_as::<ExtractFileFieldsPayload>().is_none());
    }

    #[test]
    fn priority_buckets() {
        assert_eq!(Priority::from_i32(1), Priority::Low);
        assert_eq!(Priority::from_i32(5), Priority::Normal);
        assert_eq!(Priority::from_i32(10), Priority::High);
        assert!(Priority::High > Priority::Normal);
    }

    #[test]
    fn finished_statuses() {
        assert!(TaskStatus::Failed.is_finished());
        assert!(!TaskStatus::Scheduled.is_finished());
    }
}
