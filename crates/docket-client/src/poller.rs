//! Upload status poller.
//!
//! After an upload the server record stays `uploaded` until a worker has run
//! extraction, which is deliberately delayed. The poller lists the tenant's
//! files on a fixed interval and stops once nothing recent is still waiting.
//! The cutoff only ends local polling: a record whose job never finishes
//! keeps its `uploaded` status on the server.
//!
//! [`reconcile`] holds all of the decision logic and takes the current time
//! as an argument, so it is tested without timers. [`poll_until_settled`]
//! only drives it.

use chrono::{DateTime, TimeDelta, Utc};
use docket_core::models::{FileResponse, FileStatus};
use std::time::Duration;

use crate::ApiClient;

const DEFAULT_INTERVAL_SECS: u64 = 5;
const DEFAULT_STALENESS_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between two list requests
    pub interval: Duration,
    /// How long after upload a file still counts as in flight
    pub staleness_window: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            staleness_window: Duration::from_secs(DEFAULT_STALENESS_SECS),
        }
    }
}

impl PollConfig {
    /// POLL_INTERVAL_SECS and POLL_STALENESS_SECS, falling back to 5s and 30s.
    pub fn from_env() -> Self {
        fn secs(name: &str, default: u64) -> Duration {
            let value = std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default);
            Duration::from_secs(value)
        }

        Self {
            interval: secs("POLL_INTERVAL_SECS", DEFAULT_INTERVAL_SECS),
            staleness_window: secs("POLL_STALENESS_SECS", DEFAULT_STALENESS_SECS),
        }
    }

    fn staleness(&self) -> TimeDelta {
        TimeDelta::from_std(self.staleness_window).unwrap_or(TimeDelta::MAX)
    }
}

/// A file accepted by an upload that the last listing did not show yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    /// Local clock at upload time
    pub uploaded_at: DateTime<Utc>,
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub file: FileResponse,
    pub is_loading: bool,
}

/// Everything the client currently shows.
#[derive(Debug, Clone, Default)]
pub struct LocalState {
    pub pending: Vec<PendingUpload>,
    pub files: Vec<TrackedFile>,
}

impl LocalState {
    /// Record names just uploaded so they show as loading before the next
    /// listing returns them.
    pub fn with_uploads<I, S>(mut self, file_names: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending
            .extend(file_names.into_iter().map(|name| PendingUpload {
                file_name: name.into(),
                uploaded_at: now,
                is_loading: true,
            }));
        self
    }

    pub fn is_loading(&self) -> bool {
        self.pending.iter().any(|p| p.is_loading) || self.files.iter().any(|f| f.is_loading)
    }
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub next: LocalState,
    pub keep_polling: bool,
}

fn is_recent(uploaded_at: DateTime<Utc>, now: DateTime<Utc>, staleness: TimeDelta) -> bool {
    now.signed_duration_since(uploaded_at) < staleness
}

/// Merge the latest listing into the local state.
///
/// Each pending upload is matched to a distinct listed record with the same
/// file name uploaded no earlier than one staleness window before it; the
/// window absorbs clock skew between client and server. Matched and expired
/// pending entries are dropped. A file is loading while its status is
/// `uploaded` and it is younger than the window.
pub fn reconcile(
    prev: &LocalState,
    server: &[FileResponse],
    now: DateTime<Utc>,
    config: &PollConfig,
) -> Reconciliation {
    let staleness = config.staleness();
    let mut claimed = vec![false; server.len()];

    let mut pending = Vec::with_capacity(prev.pending.len());
    for p in &prev.pending {
        let earliest = p.uploaded_at - staleness;
        let matched = server.iter().enumerate().position(|(i, f)| {
            !claimed[i] && f.file_name == p.file_name && f.uploaded_at >= earliest
        });
        if let Some(i) = matched {
            claimed[i] = true;
            continue;
        }
        if is_recent(p.uploaded_at, now, staleness) {
            pending.push(p.clone());
        }
    }

    let files: Vec<TrackedFile> = server
        .iter()
        .map(|file| TrackedFile {
            is_loading: file.status == FileStatus::Uploaded
                && is_recent(file.uploaded_at, now, staleness),
            file: file.clone(),
        })
        .collect();

    let next = LocalState { pending, files };
    let keep_polling = next.is_loading();

    Reconciliation { next, keep_polling }
}

/// List and reconcile until nothing is loading, sleeping `interval` between
/// rounds. A failed listing is logged and the round reuses the last known
/// files, so an unreachable server still settles once the window passes.
pub async fn poll_until_settled(
    client: &ApiClient,
    initial: LocalState,
    config: &PollConfig,
) -> LocalState {
    let mut state = initial;

    loop {
        let server = match client.list_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "Status poll failed");
                state.files.iter().map(|f| f.file.clone()).collect()
            }
        };

        let Reconciliation { next, keep_polling } = reconcile(&state, &server, Utc::now(), config);
        state = next;

        if !keep_polling {
            tracing::debug!(files = state.files.len(), "Polling settled");
            return state;
        }

        tokio::time::sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use docket_core::models::ExtractedFields;
    use serde_json::json;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_710_000_000 + secs, 0).unwrap()
    }

    fn file(name: &str, status: FileStatus, uploaded_at: DateTime<Utc>) -> FileResponse {
        FileResponse {
            id: Uuid::new_v4(),
            file_name: name.to_string(),
            object_key: "uploads/x".to_string(),
            status,
            fields: ExtractedFields::default(),
            uploaded_at,
            updated_at: uploaded_at,
        }
    }

    #[test]
    fn fresh_upload_keeps_polling_until_listed() {
        let config = PollConfig::default();
        let state = LocalState::default().with_uploads(["a.pdf"], at(0));

        let r = reconcile(&state, &[], at(5), &config);
        assert!(r.keep_polling);
        assert_eq!(r.next.pending.len(), 1);

        let server = [file("a.pdf", FileStatus::Uploaded, at(1))];
        let r = reconcile(&r.next, &server, at(10), &config);
        assert!(r.next.pending.is_empty());
        assert!(r.next.files[0].is_loading);
        assert!(r.keep_polling);
    }

    #[test]
    fn extracted_files_stop_polling() {
        let config = PollConfig::default();
        let server = [
            file("a.pdf", FileStatus::NeedsReview, at(0)),
            file("b.pdf", FileStatus::Confirmed, at(0)),
        ];

        let r = reconcile(&LocalState::default(), &server, at(3), &config);
        assert!(!r.keep_polling);
        assert!(r.next.files.iter().all(|f| !f.is_loading));
    }

    #[test]
    fn stale_uploaded_file_stops_loading_but_keeps_status() {
        let config = PollConfig::default();
        let server = [file("a.pdf", FileStatus::Uploaded, at(0))];

        let r = reconcile(&LocalState::default(), &server, at(29), &config);
        assert!(r.keep_polling);

        let r = reconcile(&r.next, &server, at(30), &config);
        assert!(!r.keep_polling);
        assert_eq!(r.next.files[0].file.status, FileStatus::Uploaded);
        assert!(!r.next.files[0].is_loading);
    }

    #[test]
    fn old_record_with_same_name_does_not_clear_pending() {
        let config = PollConfig::default();
        let state = LocalState::default().with_uploads(["a.pdf"], at(600));
        let server = [file("a.pdf", FileStatus::Confirmed, at(0))];

        let r = reconcile(&state, &server, at(605), &config);
        assert_eq!(r.next.pending.len(), 1);
        assert!(r.keep_polling);
    }

    #[test]
    fn pending_upload_expires_after_window() {
        let config = PollConfig::default();
        let state = LocalState::default().with_uploads(["lost.pdf"], at(0));

        let r = reconcile(&state, &[], at(31), &config);
        assert!(!r.keep_polling);
        assert!(r.next.pending.is_empty());
    }

    #[test]
    fn same_named_uploads_each_need_their_own_record() {
        let config = PollConfig::default();
        let state = LocalState::default().with_uploads(["scan.pdf", "scan.pdf"], at(0));

        let one = [file("scan.pdf", FileStatus::Uploaded, at(1))];
        let r = reconcile(&state, &one, at(2), &config);
        assert_eq!(r.next.pending.len(), 1);
        assert_eq!(r.next.pending[0].file_name, "scan.pdf");

        let both = [
            file("scan.pdf", FileStatus::Uploaded, at(1)),
            file("scan.pdf", FileStatus::Uploaded, at(1)),
        ];
        let r = reconcile(&state, &both, at(2), &config);
        assert!(r.next.pending.is_empty());
        assert_eq!(r.next.files.len(), 2);
    }

    #[test]
    fn one_recent_file_is_enough_to_keep_polling() {
        let config = PollConfig::default();
        let server = [
            file("old.pdf", FileStatus::Uploaded, at(0)),
            file("new.pdf", FileStatus::Uploaded, at(100)),
        ];

        let r = reconcile(&LocalState::default(), &server, at(110), &config);
        assert!(r.keep_polling);
        assert!(!r.next.files[0].is_loading);
        assert!(r.next.files[1].is_loading);
    }

    fn listing(status: &str, uploaded_at: DateTime<Utc>) -> String {
        json!([{
            "id": Uuid::new_v4(),
            "file_name": "a.pdf",
            "object_key": "uploads/a",
            "status": status,
            "issuer_name": null,
            "invoice_date": null,
            "registration_number": null,
            "tax_8_base": null,
            "tax_8_amount": null,
            "tax_8_total": null,
            "tax_10_base": null,
            "tax_10_amount": null,
            "tax_10_total": null,
            "total_amount": null,
            "uploaded_at": uploaded_at,
            "updated_at": uploaded_at
        }])
        .to_string()
    }

    #[tokio::test]
    async fn settles_after_one_round_when_nothing_is_loading() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/files")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(listing("needs_review", Utc::now()))
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let state = poll_until_settled(&client, LocalState::default(), &PollConfig::default()).await;

        mock.assert_async().await;
        assert_eq!(state.files.len(), 1);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn gives_up_on_stuck_upload_after_window() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/files")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(listing("uploaded", Utc::now()))
            .expect_at_least(2)
            .create_async()
            .await;

        let config = PollConfig {
            interval: Duration::from_millis(50),
            staleness_window: Duration::from_millis(300),
        };
        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let state = poll_until_settled(&client, LocalState::default(), &config).await;

        mock.assert_async().await;
        assert_eq!(state.files[0].file.status, FileStatus::Uploaded);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn unreachable_server_still_settles() {
        let config = PollConfig {
            interval: Duration::from_millis(20),
            staleness_window: Duration::from_millis(100),
        };
        let client =
            ApiClient::new("http://127.0.0.1:9".to_string(), Auth::Bearer("k".to_string())).unwrap();
        let initial = LocalState::default().with_uploads(["a.pdf"], Utc::now());

        let state = poll_until_settled(&client, initial, &config).await;
        assert!(state.pending.is_empty());
        assert!(!state.is_loading());
    }
}
