pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::company::handlers as company;
use crate::offer::handlers as offer;
use crate::pipeline::handlers as pipeline;
use crate::responses::handlers as responses;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Salary & templates
        .route(
            "/api/v1/salary/breakdown",
            post(offer::handle_salary_breakdown),
        )
        .route(
            "/api/v1/template-profiles",
            get(offer::handle_list_template_profiles),
        )
        .route(
            "/api/v1/template-profiles/resolve",
            get(offer::handle_resolve_template),
        )
        // Offer letters
        .route(
            "/api/v1/candidates/:id/offer-draft",
            get(offer::handle_offer_draft),
        )
        .route(
            "/api/v1/offer-letters",
            get(offer::handle_list_offer_letters).post(offer::handle_create_offer_letter),
        )
        .route(
            "/api/v1/offer-letters/:id",
            get(offer::handle_get_offer_letter)
                .put(offer::handle_update_offer_letter)
                .delete(offer::handle_delete_offer_letter),
        )
        .route(
            "/api/v1/offer-letters/:id/pdf",
            get(offer::handle_offer_letter_pdf),
        )
        // Editing sessions
        .route("/api/v1/offer-sessions", post(offer::handle_start_session))
        .route(
            "/api/v1/offer-sessions/:id",
            get(offer::handle_get_session).delete(offer::handle_cancel_session),
        )
        .route(
            "/api/v1/offer-sessions/:id/form",
            patch(offer::handle_update_session_form),
        )
        .route(
            "/api/v1/offer-sessions/:id/preview",
            post(offer::handle_preview_session),
        )
        .route(
            "/api/v1/offer-sessions/:id/edit",
            post(offer::handle_edit_session),
        )
        .route(
            "/api/v1/offer-sessions/:id/submit",
            post(offer::handle_submit_session),
        )
        // Company
        .route(
            "/api/v1/letterheads",
            get(company::handle_list_letterheads).post(company::handle_create_letterhead),
        )
        .route(
            "/api/v1/letterheads/:id",
            get(company::handle_get_letterhead)
                .put(company::handle_update_letterhead)
                .delete(company::handle_delete_letterhead),
        )
        .route("/api/v1/signatories", get(company::handle_list_signatories))
        .route(
            "/api/v1/signatories/director",
            get(company::handle_director_signatory),
        )
        // Pipeline
        .route("/api/v1/pipeline", get(pipeline::handle_pipeline))
        .route(
            "/api/v1/candidates/import",
            post(pipeline::handle_import_candidates),
        )
        .route(
            "/api/v1/candidates/:id/stage",
            patch(pipeline::handle_set_stage),
        )
        // Candidate responses
        .route(
            "/api/v1/candidates/:id/response-link",
            post(responses::handle_create_response_link),
        )
        .route(
            "/api/v1/public/responses/:token",
            get(responses::handle_get_response_page).post(responses::handle_submit_response),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use bytes::Bytes;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::{Config, DataSource};
    use crate::errors::AppError;
    use crate::offer::session::{OfferSession, SessionRegistry};
    use crate::offer::template::TemplateResolution;
    use crate::pdf::document::LetterDocument;
    use crate::pdf::PdfRenderer;
    use crate::store::{HrStore, MemoryStore};

    struct StubRenderer;

    #[async_trait]
    impl PdfRenderer for StubRenderer {
        async fn render(&self, _document: &LetterDocument) -> Result<Bytes, AppError> {
            Ok(Bytes::from_static(b"%PDF-1.4 stub"))
        }
    }

    fn test_config() -> Config {
        Config {
            data_source: DataSource::Memory,
            database_url: None,
            pdf_renderer_url: "http://renderer.invalid".to_string(),
            s3: None,
            company_address: "Registered Office".to_string(),
            offer_validity_days: 7,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(MemoryStore::seeded()),
            sessions: SessionRegistry::default(),
            renderer: Arc::new(StubRenderer),
            archive: None,
            config: test_config(),
        }
    }

    fn test_app() -> (Router, Arc<dyn HrStore>) {
        let state = test_state();
        let store = state.store.clone();
        (build_router(state), store)
    }

    async fn first_candidate_id(store: &Arc<dyn HrStore>) -> Uuid {
        store.list_candidates().await.unwrap()[0].id
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn valid_letter(name: &str) -> Value {
        json!({
            "candidate_name": name,
            "designation": "Backend Engineer",
            "joining_date": "2030-01-15",
            "annual_ctc": 1_200_000,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "offerdesk-api");
    }

    #[tokio::test]
    async fn test_salary_breakdown_endpoint() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/salary/breakdown",
            Some(json!({ "annual_ctc": 1_200_000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["components"][0]["name"], "Basic Salary");
        assert_eq!(body["components"][0]["annual"], 480_000);
        assert_eq!(body["components"][0]["per_month"], 40_000);
        assert_eq!(body["total_annual"], 1_200_000);
    }

    #[tokio::test]
    async fn test_offer_draft_prefills_from_candidate() {
        let (app, store) = test_app();
        let id = first_candidate_id(&store).await;
        let (status, body) =
            send(&app, "GET", &format!("/api/v1/candidates/{id}/offer-draft"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["form"]["candidate_name"], "Asha Verma");
        assert_eq!(body["form"]["designation"], "Backend Engineer");
        assert_eq!(body["form"]["annual_ctc"], 1_200_000);
        assert_eq!(body["form"]["working_location"], "Registered Office");
        assert_eq!(body["template"]["template_type"], "learned_profile");
    }

    #[tokio::test]
    async fn test_unknown_candidate_draft_is_404() {
        let (app, _) = test_app();
        let uri = format!("/api/v1/candidates/{}/offer-draft", Uuid::new_v4());
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_store() {
        let (app, store) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/offer-letters",
            Some(valid_letter("   ")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(
            store.list_offer_letters().await.unwrap().is_empty(),
            "nothing should be persisted for an invalid draft"
        );
    }

    #[tokio::test]
    async fn test_create_recomputes_stale_breakdown() {
        let (app, _) = test_app();
        let mut letter = valid_letter("Kiran Rao");
        letter["salary_breakdown"] = json!([{ "name": "Basic Salary", "per_month": 1, "annual": 12 }]);
        let (status, body) = send(&app, "POST", "/api/v1/offer-letters", Some(letter)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["salary_breakdown"][0]["annual"], 480_000);
        assert_eq!(body["status"], "generated");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (app, _) = test_app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/offer-letters",
            Some(valid_letter("Kiran Rao")),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "DELETE", &format!("/api/v1/offer-letters/{id}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONFIRMATION_REQUIRED");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/offer-letters/{id}?confirm=true"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/api/v1/offer-letters/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pdf_download() {
        let (app, _) = test_app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/offer-letters",
            Some(valid_letter("Kiran Rao")),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let request = Request::builder()
            .uri(format!("/api/v1/offer-letters/{id}/pdf"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("offer-letter-kiran-rao.pdf"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_session_form_preview_submit() {
        let (app, store) = test_app();
        let candidate_id = first_candidate_id(&store).await;

        let (status, session) = send(
            &app,
            "POST",
            "/api/v1/offer-sessions",
            Some(json!({ "candidate_id": candidate_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["state"], "form");
        let sid = session["session_id"].as_str().unwrap().to_string();

        // Prefill has no joining date, so preview must fail and stay in `form`.
        let (status, _) = send(&app, "POST", &format!("/api/v1/offer-sessions/{sid}/preview"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/v1/offer-sessions/{sid}/form"),
            Some(json!({ "joining_date": "2030-01-15" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, preview) =
            send(&app, "POST", &format!("/api/v1/offer-sessions/{sid}/preview"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["state"], "preview");

        let (status, letter) =
            send(&app, "POST", &format!("/api/v1/offer-sessions/{sid}/submit"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(letter["candidate_name"], "Asha Verma");

        let (status, body) =
            send(&app, "POST", &format!("/api/v1/offer-sessions/{sid}/submit"), None).await;
        assert_eq!(status, StatusCode::CONFLICT, "success is terminal");
        assert_eq!(body["error"]["code"], "CONFLICT");

        let (_, current) = send(&app, "GET", &format!("/api/v1/offer-sessions/{sid}"), None).await;
        assert_eq!(current["state"], "success");
        assert_eq!(current["offer_letter_id"], letter["id"]);
        assert_eq!(store.list_offer_letters().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_session_persists_nothing() {
        let (app, store) = test_app();
        let (_, session) = send(&app, "POST", "/api/v1/offer-sessions", Some(json!({}))).await;
        let sid = session["session_id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/offer-sessions/{sid}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/api/v1/offer-sessions/{sid}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(store.list_offer_letters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_response_token_accepts_one_submission() {
        let (app, store) = test_app();
        let candidate_id = first_candidate_id(&store).await;
        let (status, link) = send(
            &app,
            "POST",
            &format!("/api/v1/candidates/{candidate_id}/response-link"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = link["token"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/public/responses/{token}");

        let (_, page) = send(&app, "GET", &uri, None).await;
        assert_eq!(page["status"], "open");
        assert_eq!(page["candidate_name"], "Asha Verma");

        let answer = json!({
            "interested": true,
            "expected_ctc": 1_300_000,
            "notice_period_days": 30,
            "interview_availability": "weekdays"
        });
        let (status, _) = send(&app, "POST", &uri, Some(answer.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", &uri, Some(answer)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Your response has already been submitted");

        let (_, page) = send(&app, "GET", &uri, None).await;
        assert_eq!(page["status"], "already_submitted");
    }

    #[tokio::test]
    async fn test_unknown_response_token_is_404() {
        let (app, _) = test_app();
        let (status, _) = send(&app, "GET", "/api/v1/public/responses/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pipeline_import_and_stage_move() {
        let (app, _) = test_app();
        let (status, report) = send(
            &app,
            "POST",
            "/api/v1/candidates/import",
            Some(json!({ "cards": [
                { "name": "Nikhil Rao", "title": "Data Engineer", "location": "Hyderabad" },
                { "name": "" }
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report["skipped"], json!([1]));
        let imported_id = report["imported"][0]["id"].as_str().unwrap().to_string();

        let (_, board) = send(&app, "GET", "/api/v1/pipeline", None).await;
        assert_eq!(board.as_array().unwrap().len(), 6);
        assert_eq!(board[0]["stage"], "sourced");
        assert_eq!(board[0]["count"], 1);

        let (status, moved) = send(
            &app,
            "PATCH",
            &format!("/api/v1/candidates/{imported_id}/stage"),
            Some(json!({ "stage": "screening" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["stage"], "screening");
    }

    #[tokio::test]
    async fn test_director_signatory_lookup() {
        let (app, _) = test_app();
        let (status, body) = send(&app, "GET", "/api/v1/signatories/director", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["position"], "Managing Director");
    }

    #[tokio::test]
    async fn test_letterhead_validation_and_delete_guard() {
        let (app, _) = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/letterheads",
            Some(json!({ "name": "Alt", "company_name": "", "address": "Pune" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/letterheads",
            Some(json!({ "name": "Alt", "company_name": "Northwind", "address": "Pune" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/letterheads/{id}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/letterheads/{id}?confirm=true"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_statutory_split_survives_get_then_put() {
        let (app, _) = test_app();
        let mut letter = valid_letter("Kiran Rao");
        letter["salary_split"] = json!("statutory");
        let (status, created) = send(&app, "POST", "/api/v1/offer-letters", Some(letter)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["salary_breakdown"].as_array().unwrap().len(), 5);
        let id = created["id"].as_str().unwrap().to_string();

        let (_, fetched) = send(&app, "GET", &format!("/api/v1/offer-letters/{id}"), None).await;
        assert_eq!(fetched["salary_split"], "statutory");

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/v1/offer-letters/{id}"),
            Some(fetched),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["salary_split"], "statutory");
        assert_eq!(
            updated["salary_breakdown"], created["salary_breakdown"],
            "an unchanged letter must keep its breakdown"
        );
        assert_eq!(updated["salary_breakdown"][3]["name"], "Provident Fund");
    }

    #[tokio::test]
    async fn test_unknown_references_rejected_on_create_and_update() {
        let (app, store) = test_app();
        let mut letter = valid_letter("Kiran Rao");
        letter["letterhead_id"] = json!(Uuid::new_v4());
        letter["signatory_id"] = json!(Uuid::new_v4());
        let (status, body) = send(&app, "POST", "/api/v1/offer-letters", Some(letter)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("signatory") && message.contains("letterhead"), "got: {message}");
        assert!(store.list_offer_letters().await.unwrap().is_empty());

        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/offer-letters",
            Some(valid_letter("Kiran Rao")),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        let mut edit = valid_letter("Kiran Rao");
        edit["candidate_id"] = json!(Uuid::new_v4());
        let (status, body) = send(&app, "PUT", &format!("/api/v1/offer-letters/{id}"), Some(edit)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("candidate"));
    }

    #[tokio::test]
    async fn test_session_submit_with_unknown_letterhead_returns_to_preview() {
        let (app, store) = test_app();
        let (_, session) = send(
            &app,
            "POST",
            "/api/v1/offer-sessions",
            Some(json!({})),
        )
        .await;
        let sid = session["session_id"].as_str().unwrap().to_string();
        let mut patch = valid_letter("Kiran Rao");
        patch["letterhead_id"] = json!(Uuid::new_v4());
        send(&app, "PATCH", &format!("/api/v1/offer-sessions/{sid}/form"), Some(patch)).await;
        send(&app, "POST", &format!("/api/v1/offer-sessions/{sid}/preview"), None).await;

        let (status, _) = send(&app, "POST", &format!("/api/v1/offer-sessions/{sid}/submit"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, current) = send(&app, "GET", &format!("/api/v1/offer-sessions/{sid}"), None).await;
        assert_eq!(current["state"], "preview");
        assert!(store.list_offer_letters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_refused_while_submit_in_flight() {
        let state = test_state();
        let sessions = state.sessions.clone();
        let app = build_router(state);

        let form = serde_json::from_value(valid_letter("Kiran Rao")).unwrap();
        let sid = sessions.open(OfferSession::new(form)).await;
        sessions
            .update(sid, |s| {
                s.preview(&TemplateResolution::Fallback, chrono::Utc::now().date_naive())
                    .unwrap();
                s.begin_submit().unwrap();
            })
            .await;

        let (status, body) = send(&app, "DELETE", &format!("/api/v1/offer-sessions/{sid}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(
            sessions.get(sid).await.map(|s| s.state_name()),
            Some("submitting"),
            "the in-flight session must survive the cancel"
        );
    }

    #[tokio::test]
    async fn test_repeat_response_with_invalid_payload_still_reports_already_submitted() {
        let (app, store) = test_app();
        let candidate_id = first_candidate_id(&store).await;
        let (_, link) = send(
            &app,
            "POST",
            &format!("/api/v1/candidates/{candidate_id}/response-link"),
            None,
        )
        .await;
        let uri = format!("/api/v1/public/responses/{}", link["token"].as_str().unwrap());

        let (status, _) = send(&app, "POST", &uri, Some(json!({ "interested": false }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(json!({ "interested": true, "expected_ctc": -5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Your response has already been submitted");
    }
}
