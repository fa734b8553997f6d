pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::visa::handlers::handle_visa_timeline;
use crate::wizard::handlers;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Visa timeline (stateless)
        .route("/api/v1/visa/timeline", get(handle_visa_timeline))
        // Assessment wizard
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/documents",
            post(handlers::handle_upload_documents),
        )
        .route(
            "/api/v1/sessions/:id/match",
            post(handlers::handle_analyze_match),
        )
        .route(
            "/api/v1/sessions/:id/proceed",
            post(handlers::handle_proceed),
        )
        .route(
            "/api/v1/sessions/:id/eligibility",
            post(handlers::handle_assess_eligibility),
        )
        .route(
            "/api/v1/sessions/:id/revise",
            post(handlers::handle_revise_visa_info),
        )
        .route(
            "/api/v1/sessions/:id/back",
            post(handlers::handle_back_to_inputs),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::analysis::eligibility::fixtures::REPORT_JSON;
    use crate::config::Config;
    use crate::extraction::DocumentTextExtractor;
    use crate::llm_client::testing::ScriptedCompletion;
    use crate::wizard::store::SessionStore;

    const BOUNDARY: &str = "h1b-test-boundary";

    fn app(llm: ScriptedCompletion) -> Router {
        build_router(AppState {
            llm: Arc::new(llm),
            extractor: Arc::new(DocumentTextExtractor),
            sessions: SessionStore::new(),
            config: Config::for_tests(),
        })
    }

    enum Part<'a> {
        File {
            name: &'a str,
            file_name: &'a str,
            content: &'a str,
        },
        Text {
            name: &'a str,
            value: &'a str,
        },
    }

    fn multipart_body(parts: &[Part<'_>]) -> String {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::File {
                    name,
                    file_name,
                    content,
                } => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
                    ));
                }
                Part::Text { name, value } => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(b) => {
                request = request.header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                );
                Body::from(b)
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn session_with_documents(app: &Router) -> String {
        let (status, created) = send(app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["session_id"].as_str().unwrap().to_string();

        let body = multipart_body(&[
            Part::File {
                name: "resume",
                file_name: "resume.txt",
                content: "Rust engineer, 5 years, PostgreSQL",
            },
            Part::File {
                name: "job_description",
                file_name: "jd.txt",
                content: "Backend engineer: Rust, PostgreSQL, Kubernetes",
            },
        ]);
        let (status, view) = send(
            app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/documents"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["has_resume"], true);
        assert_eq!(view["has_job_description"], true);
        id
    }

    fn match_reply(percentage: u32) -> String {
        format!(
            r#"{{"match_percentage": {percentage}, "matching_skills": ["Rust"],
                "missing_requirements": ["Kubernetes"], "job_title_match": true,
                "required_education": "BS", "industry_alignment": "Fintech",
                "role_summary": "Backend"}}"#
        )
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(ScriptedCompletion::new()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_visa_timeline_endpoint() {
        let app = app(ScriptedCompletion::new());
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/visa/timeline?status=F1-OPT&end_date=2025-07-01&as_of=2025-05-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days_remaining"], 61);
        assert_eq!(body["risk_level"], "HIGH");
        assert_eq!(body["next_h1b_window"], "2026-01-15");
    }

    #[tokio::test]
    async fn test_visa_timeline_ignores_end_date_for_f1() {
        let app = app(ScriptedCompletion::new());
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/visa/timeline?status=F1&end_date=2025-05-11&as_of=2025-05-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["days_remaining"].is_null());
        assert_eq!(body["risk_level"], "LOW");
        assert_eq!(body["needs_immediate_action"], false);
    }

    #[tokio::test]
    async fn test_visa_timeline_requires_end_date_for_opt() {
        let app = app(ScriptedCompletion::new());
        let (status, body) = send(&app, Method::GET, "/api/v1/visa/timeline?status=H1B", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app(ScriptedCompletion::new());
        let uri = format!("/api/v1/sessions/{}", Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_rejected() {
        let app = app(ScriptedCompletion::new());
        let (_, created) = send(&app, Method::POST, "/api/v1/sessions", None).await;
        let id = created["session_id"].as_str().unwrap();

        let body = multipart_body(&[Part::File {
            name: "resume",
            file_name: "resume.rtf",
            content: "{\\rtf1}",
        }]);
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/documents"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FILE");
    }

    #[tokio::test]
    async fn test_full_wizard_flow() {
        let app = app(ScriptedCompletion::new().reply(match_reply(72)).reply(REPORT_JSON));
        let id = session_with_documents(&app).await;

        let (status, view) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/match"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "show_match");
        assert_eq!(view["match_summary"]["can_proceed"], true);
        assert_eq!(view["match_summary"]["overall_match"]["value"], "72%");

        let (status, view) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/proceed"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "collect_visa_info");

        let body = multipart_body(&[
            Part::Text { name: "visa_status", value: "STEM OPT" },
            Part::Text { name: "is_stem_degree", value: "Yes" },
            Part::Text { name: "visa_start_date", value: "2024-01-01" },
            Part::Text { name: "visa_end_date", value: "2027-01-01" },
            Part::Text { name: "has_criminal_history", value: "No" },
            Part::File {
                name: "transcript",
                file_name: "transcript.txt",
                content: "BS Computer Science, GPA 3.7",
            },
        ]);
        let (status, view) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/eligibility"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "show_eligibility");
        assert_eq!(view["visa_details"]["status"], "STEM-OPT");
        assert_eq!(view["eligibility"]["risk"]["color"], "yellow");
        assert_eq!(view["eligibility"]["tabs"].as_array().unwrap().len(), 4);
        assert_eq!(view["eligibility"]["timeline"]["current_status"], "STEM-OPT");

        let (status, view) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/back"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "collect_inputs");
        assert_eq!(view["has_resume"], true);
        assert!(view["eligibility"].is_null());
    }

    #[tokio::test]
    async fn test_low_match_blocks_proceed() {
        let app = app(ScriptedCompletion::new().reply(match_reply(30)));
        let id = session_with_documents(&app).await;

        let (_, view) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/match"), None).await;
        assert_eq!(view["match_summary"]["can_proceed"], false);

        let (status, body) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/proceed"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");

        let (_, view) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["step"], "show_match");
    }

    #[tokio::test]
    async fn test_malformed_model_reply_leaves_session_untouched() {
        let app = app(ScriptedCompletion::new().reply("I think it's a 70% match."));
        let id = session_with_documents(&app).await;

        let (status, body) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/match"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (_, view) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["step"], "collect_inputs");
        assert!(view["match_summary"].is_null());
    }

    #[tokio::test]
    async fn test_eligibility_before_match_is_conflict() {
        let app = app(ScriptedCompletion::new());
        let id = session_with_documents(&app).await;

        let body = multipart_body(&[Part::Text { name: "visa_status", value: "F1" }]);
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/eligibility"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app(ScriptedCompletion::new());
        let (_, created) = send(&app, Method::POST, "/api/v1/sessions", None).await;
        let uri = format!("/api/v1/sessions/{}", created["session_id"].as_str().unwrap());

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
