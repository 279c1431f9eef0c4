use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::membership::domain::{
    ApplicantId, ChannelId, DecisionEvent, Member, MemberListing, MembershipApplication, RoleId,
};
use crate::workflows::membership::gateway::{
    DirectoryGateway, GatewayError, NotificationError, NotificationGateway, StaticDirectory,
};
use crate::workflows::membership::ledger::{LedgerError, LedgerStore, MemoryLedgerStore};
use crate::workflows::membership::resolver::DecisionResolver;
use crate::workflows::membership::review::ReviewArtifact;
use crate::workflows::membership::{
    membership_router, MembershipService, MembershipSettings, SHARED_SECRET_HEADER,
};

pub(super) const TEST_SECRET: &str = "test-secret";

pub(super) fn applicant() -> ApplicantId {
    ApplicantId("42".to_string())
}

pub(super) fn settings() -> MembershipSettings {
    MembershipSettings::default()
}

pub(super) fn quota_settings(quota: usize) -> MembershipSettings {
    MembershipSettings {
        submission_quota: quota,
        ..MembershipSettings::default()
    }
}

/// Directory holding one undecided applicant `42` and one whitelisted
/// member `77`.
pub(super) fn seeded_directory() -> StaticDirectory {
    let settings = settings();
    StaticDirectory::default()
        .with_member("42", "Mara", &[])
        .with_member("77", "Quinn", &[settings.whitelist_role])
}

pub(super) fn undecided_directory() -> StaticDirectory {
    StaticDirectory::default().with_member("42", "Mara", &[])
}

pub(super) fn whitelisted_directory() -> StaticDirectory {
    let settings = settings();
    StaticDirectory::default().with_member("42", "Mara", &[settings.whitelist_role])
}

pub(super) type TestService =
    MembershipService<StaticDirectory, RecordingNotifier, MemoryLedgerStore>;

pub(super) fn build_service(
    directory: &StaticDirectory,
    settings: MembershipSettings,
) -> (TestService, Arc<RecordingNotifier>, MemoryLedgerStore) {
    let notifier = Arc::new(RecordingNotifier::default());
    let store = MemoryLedgerStore::default();
    let service = MembershipService::open(
        Arc::new(directory.clone()),
        notifier.clone(),
        store.clone(),
        settings,
    )
    .expect("service opens");
    (service, notifier, store)
}

pub(super) fn build_resolver<N>(
    directory: &StaticDirectory,
    notifier: Arc<N>,
) -> DecisionResolver<StaticDirectory, N>
where
    N: NotificationGateway + 'static,
{
    let settings = settings();
    DecisionResolver::new(
        Arc::new(directory.clone()),
        notifier,
        settings.whitelist_role,
        settings.rejected_role,
    )
}

pub(super) fn membership_router_with_service(service: TestService) -> axum::Router {
    membership_router(Arc::new(service), TEST_SECRET)
}

pub(super) fn decision(applicant: &str, outcome: &str, reviewer: &str) -> DecisionEvent {
    DecisionEvent {
        applicant_id: ApplicantId(applicant.to_string()),
        outcome: outcome.to_string(),
        reviewer_id: reviewer.to_string(),
    }
}

pub(super) fn form(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub(super) fn numbered_form(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|index| (format!("field-{index:03}"), format!("value-{index:03}")))
        .collect()
}

pub(super) fn application(
    applicant: &ApplicantId,
    form: Vec<(String, String)>,
) -> MembershipApplication {
    MembershipApplication {
        applicant_id: applicant.clone(),
        username: "Mara".to_string(),
        form,
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    notices: Arc<Mutex<Vec<(ApplicantId, String)>>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<(ApplicantId, String)> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn send_direct_message(
        &self,
        member: &Member,
        text: &str,
    ) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push((member.id.clone(), text.to_string()));
        Ok(())
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl NotificationGateway for FailingNotifier {
    async fn send_direct_message(
        &self,
        _member: &Member,
        _text: &str,
    ) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("webhook offline".to_string()))
    }
}

pub(super) struct UnavailableDirectory;

#[async_trait]
impl DirectoryGateway for UnavailableDirectory {
    async fn resolve_member(&self, _id: &ApplicantId) -> Result<Option<Member>, GatewayError> {
        Err(GatewayError::Unavailable("directory offline".to_string()))
    }

    async fn has_role(&self, _member: &Member, _role: &RoleId) -> Result<bool, GatewayError> {
        Err(GatewayError::Unavailable("directory offline".to_string()))
    }

    async fn add_role(&self, _member: &Member, _role: &RoleId) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("directory offline".to_string()))
    }

    async fn remove_role(&self, _member: &Member, _role: &RoleId) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("directory offline".to_string()))
    }

    async fn post_review(
        &self,
        _channel: &ChannelId,
        _artifact: &ReviewArtifact,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable("directory offline".to_string()))
    }

    async fn list_members(&self) -> Result<Vec<MemberListing>, GatewayError> {
        Err(GatewayError::Unavailable("directory offline".to_string()))
    }
}

/// Directory that resolves members normally but cannot post reviews.
pub(super) struct FlakyReviewDirectory {
    inner: StaticDirectory,
}

impl FlakyReviewDirectory {
    pub(super) fn with_member(id: &str, username: &str) -> Self {
        Self {
            inner: StaticDirectory::default().with_member(id, username, &[]),
        }
    }
}

#[async_trait]
impl DirectoryGateway for FlakyReviewDirectory {
    async fn resolve_member(&self, id: &ApplicantId) -> Result<Option<Member>, GatewayError> {
        self.inner.resolve_member(id).await
    }

    async fn has_role(&self, member: &Member, role: &RoleId) -> Result<bool, GatewayError> {
        self.inner.has_role(member, role).await
    }

    async fn add_role(&self, member: &Member, role: &RoleId) -> Result<(), GatewayError> {
        self.inner.add_role(member, role).await
    }

    async fn remove_role(&self, member: &Member, role: &RoleId) -> Result<(), GatewayError> {
        self.inner.remove_role(member, role).await
    }

    async fn post_review(
        &self,
        _channel: &ChannelId,
        _artifact: &ReviewArtifact,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Unavailable(
            "review channel offline".to_string(),
        ))
    }

    async fn list_members(&self) -> Result<Vec<MemberListing>, GatewayError> {
        self.inner.list_members().await
    }
}

pub(super) struct FailingLedgerStore;

impl LedgerStore for FailingLedgerStore {
    fn load(&self) -> Result<BTreeMap<ApplicantId, Vec<i64>>, LedgerError> {
        Ok(BTreeMap::new())
    }

    fn persist(&self, _entries: &BTreeMap<ApplicantId, Vec<i64>>) -> Result<(), LedgerError> {
        Err(LedgerError::Store("disk full".to_string()))
    }
}

pub(super) fn secured_post(path: &str, body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(path)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .header(SHARED_SECRET_HEADER, TEST_SECRET)
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serialize body"),
        ))
        .expect("request builds")
}

pub(super) fn secured_get(path: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(path)
        .header(SHARED_SECRET_HEADER, TEST_SECRET)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
