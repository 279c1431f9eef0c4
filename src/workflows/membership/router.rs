use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicantId, DecisionEvent, MembershipApplication};
use super::gateway::{DirectoryGateway, NotificationGateway};
use super::ledger::{LedgerError, LedgerStore};
use super::resolver::DecisionError;
use super::service::{MembershipError, MembershipService};

/// Header carrying the static shared secret required on every API route.
pub const SHARED_SECRET_HEADER: &str = "x-gatehouse-secret";

/// Reviewer identity recorded for decisions taken through the admin endpoint.
const ADMIN_REVIEWER: &str = "admin-api";

/// Router builder exposing the membership HTTP surface.
pub fn membership_router<D, N, S>(
    service: Arc<MembershipService<D, N, S>>,
    shared_secret: &str,
) -> Router
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
    S: LedgerStore + 'static,
{
    let secret = shared_secret.to_string();
    Router::new()
        .route("/check", post(check_handler::<D, N, S>))
        .route("/apply", post(apply_handler::<D, N, S>))
        .route("/admin-action", post(admin_action_handler::<D, N, S>))
        .route("/members", get(members_handler::<D, N, S>))
        .layer(middleware::from_fn(move |request, next| {
            require_shared_secret(secret.clone(), request, next)
        }))
        .with_state(service)
}

async fn require_shared_secret(secret: String, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(SHARED_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    if presented == Some(secret.as_str()) {
        return next.run(request).await;
    }

    let payload = json!({
        "error": "missing or invalid shared secret",
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckRequest {
    user_id: Option<String>,
}

pub(crate) async fn check_handler<D, N, S>(
    State(service): State<Arc<MembershipService<D, N, S>>>,
    payload: Result<axum::Json<CheckRequest>, JsonRejection>,
) -> Response
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
    S: LedgerStore + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return invalid_payload(rejection),
    };

    let Some(user_id) = request.user_id.filter(|id| !id.is_empty()) else {
        return missing_field("userId");
    };

    match service.check_status(&ApplicantId(user_id)).await {
        Ok(status) => {
            let payload = json!({
                "status": status.label(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyRequest {
    user_id: Option<String>,
    username: Option<String>,
    form_data: Option<serde_json::Map<String, serde_json::Value>>,
}

pub(crate) async fn apply_handler<D, N, S>(
    State(service): State<Arc<MembershipService<D, N, S>>>,
    payload: Result<axum::Json<ApplyRequest>, JsonRejection>,
) -> Response
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
    S: LedgerStore + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return invalid_payload(rejection),
    };

    let Some(user_id) = request.user_id.filter(|id| !id.is_empty()) else {
        return missing_field("userId");
    };
    let Some(username) = request.username.filter(|name| !name.is_empty()) else {
        return missing_field("username");
    };
    let Some(form_data) = request.form_data else {
        return missing_field("formData");
    };

    let mut form = Vec::with_capacity(form_data.len());
    for (name, value) in form_data {
        match value {
            serde_json::Value::String(text) => form.push((name, text)),
            _ => {
                let payload = json!({
                    "error": format!("formData.{name} must be a string"),
                });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        }
    }

    let application = MembershipApplication {
        applicant_id: ApplicantId(user_id),
        username,
        form,
    };

    match service.submit_application(application).await {
        Ok(_) => {
            let payload = json!({
                "success": true,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(MembershipError::NotOnDirectory) => {
            let payload = json!({
                "error": "applicant is not a member of the directory",
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(MembershipError::Ledger(LedgerError::QuotaExceeded { limit })) => {
            let payload = json!({
                "error": format!("submission quota of {limit} reached"),
            });
            (StatusCode::TOO_MANY_REQUESTS, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminActionRequest {
    user_id: Option<String>,
    action: Option<String>,
}

pub(crate) async fn admin_action_handler<D, N, S>(
    State(service): State<Arc<MembershipService<D, N, S>>>,
    payload: Result<axum::Json<AdminActionRequest>, JsonRejection>,
) -> Response
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
    S: LedgerStore + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return invalid_payload(rejection),
    };

    let Some(user_id) = request.user_id.filter(|id| !id.is_empty()) else {
        return missing_field("userId");
    };
    let Some(action) = request.action.filter(|action| !action.is_empty()) else {
        return missing_field("action");
    };

    let event = DecisionEvent {
        applicant_id: ApplicantId(user_id),
        outcome: action,
        reviewer_id: ADMIN_REVIEWER.to_string(),
    };

    match service.admin_decide(&event).await {
        Ok(outcome) => {
            let payload = json!({
                "success": true,
                "action": outcome.as_str(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(MembershipError::Decision(DecisionError::InvalidOutcome(raw))) => {
            let payload = json!({
                "error": format!("unknown action '{raw}'"),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(MembershipError::Decision(DecisionError::RecipientGone)) => {
            let payload = json!({
                "error": "applicant is no longer present in the directory",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn members_handler<D, N, S>(
    State(service): State<Arc<MembershipService<D, N, S>>>,
) -> Response
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
    S: LedgerStore + 'static,
{
    match service.member_roster().await {
        Ok(members) => (StatusCode::OK, axum::Json(members)).into_response(),
        Err(other) => internal_error(other),
    }
}

fn missing_field(field: &str) -> Response {
    let payload = json!({
        "error": format!("{field} is required"),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn invalid_payload(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn internal_error(error: MembershipError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
