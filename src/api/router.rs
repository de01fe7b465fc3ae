//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Endpoint handlers use `State<ApiContext>`; `.with_state()` turns the
/// router into `Router<()>` so it can be served directly.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route("/drug-info/:drug_name", get(endpoints::drug_info::lookup))
        .route("/export-patients", get(endpoints::export::patients))
        .route("/calculations/:id", get(endpoints::reviews::detail))
        .route(
            "/calculations/:id/review",
            post(endpoints::reviews::submit),
        )
        .route("/audit", get(endpoints::audit::recent))
        .route(
            "/drugs",
            get(endpoints::drugs::list).post(endpoints::drugs::create),
        )
        .route("/drugs/:id", get(endpoints::drugs::detail))
        .route(
            "/drugs/:id/formulations",
            post(endpoints::drugs::add_formulation),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn(middleware::logging::log_request))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::pipeline::dosing::{LlmClient, MockLlmClient};

    const STRUCTURED_RESPONSE: &str = r#"Here you go:
        {"calculated_dose": "81 mg", "dose_form": "Tablet", "frequency": "Once daily",
         "duration": "Ongoing", "instructions": "Take with food", "warnings": "Bleeding risk",
         "market_formulations": ["81 mg tablet"], "alternatives": ["Clopidogrel"],
         "calculation_breakdown": "Low-dose cardioprotection"}"#;

    /// Router backed by a temp-dir database. Keep the guard alive for the test.
    fn test_app(llm: impl LlmClient + Send + Sync + 'static) -> (Router, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ApiContext::new(Arc::new(llm), tmp.path().join("database.db"));
        (api_router(ctx), tmp)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn patient_body() -> serde_json::Value {
        serde_json::json!({
            "name": "Jane Roe",
            "age": 30,
            "weight": 70.0,
            "height": 165.0,
            "medical_condition": "normal",
            "drug_name": "Aspirin",
            "severity": "moderate"
        })
    }

    #[tokio::test]
    async fn health_reports_model() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let response = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "mock");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let response = app.oneshot(get_request("/api/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_patient_with_remote_answer() {
        let (app, _tmp) = test_app(MockLlmClient::new(STRUCTURED_RESPONSE));
        let response = app
            .oneshot(json_request("POST", "/api/patients", patient_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["calculation_method"], "remote");
        assert_eq!(json["recommendation"]["calculated_dose"], "81 mg");
        assert_eq!(json["patient"]["dose"], "81 mg");
    }

    #[tokio::test]
    async fn create_patient_falls_back_when_remote_is_down() {
        let (app, _tmp) = test_app(MockLlmClient::failing("offline"));
        let response = app
            .oneshot(json_request("POST", "/api/patients", patient_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["calculation_method"], "fallback");
        assert_eq!(json["recommendation"]["calculated_dose"], "420.0 mg");
    }

    #[tokio::test]
    async fn invalid_patient_is_422_with_all_fields() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let body = serde_json::json!({
            "name": "J",
            "age": 130,
            "weight": 70.0,
            "medical_condition": "flu",
            "drug_name": "Aspirin",
            "severity": "moderate"
        });
        let response = app
            .oneshot(json_request("POST", "/api/patients", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        let fields: Vec<&str> = json["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"age"));
        assert!(fields.contains(&"medical_condition"));
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let req = Request::builder()
            .method("POST")
            .uri("/api/patients")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn patient_list_detail_export_and_audit() {
        let (app, _tmp) = test_app(MockLlmClient::failing("offline"));

        let created = body_json(
            app.clone()
                .oneshot(json_request("POST", "/api/patients", patient_body()))
                .await
                .unwrap(),
        )
        .await;
        let patient_id = created["patient"]["id"].as_str().unwrap().to_string();

        let list = body_json(app.clone().oneshot(get_request("/api/patients")).await.unwrap()).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let detail = app
            .clone()
            .oneshot(get_request(&format!("/api/patients/{patient_id}")))
            .await
            .unwrap();
        assert_eq!(detail.status(), StatusCode::OK);
        let detail = body_json(detail).await;
        assert_eq!(detail["calculations"][0]["calculation_method"], "fallback");
        assert_eq!(detail["calculations"][0]["factors"]["final_dose_mg"], 420.0);

        let export =
            body_json(app.clone().oneshot(get_request("/api/export-patients")).await.unwrap()).await;
        assert_eq!(export[0]["calculated_dose"], "420.0 mg");
        assert_eq!(export[0]["name"], "Jane Roe");

        let audit = body_json(app.oneshot(get_request("/api/audit?limit=5")).await.unwrap()).await;
        assert_eq!(audit[0]["calculation_method"], "fallback");
        assert_eq!(audit[0]["drug_name"], "Aspirin");
    }

    #[tokio::test]
    async fn unknown_patient_is_404_and_bad_id_is_400() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let missing = app
            .clone()
            .oneshot(get_request(&format!("/api/patients/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let bad = app.oneshot(get_request("/api/patients/not-a-uuid")).await.unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn drug_info_success_and_failure_are_both_200() {
        let (app, _tmp) = test_app(MockLlmClient::new("Aspirin is an NSAID."));
        let response = app.oneshot(get_request("/api/drug-info/Aspirin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["information"], "Aspirin is an NSAID.");

        let (app, _tmp2) = test_app(MockLlmClient::failing("offline"));
        let response = app.oneshot(get_request("/api/drug-info/Aspirin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Unable to fetch drug information:"));
    }

    #[tokio::test]
    async fn review_approves_calculation() {
        let (app, _tmp) = test_app(MockLlmClient::failing("offline"));
        let created = body_json(
            app.clone()
                .oneshot(json_request("POST", "/api/patients", patient_body()))
                .await
                .unwrap(),
        )
        .await;
        let calc_id = created["calculation_id"].as_str().unwrap().to_string();
        let patient_id = created["patient"]["id"].as_str().unwrap().to_string();

        let review = serde_json::json!({
            "expert_name": "Dr. Ada",
            "verification_status": "approved",
            "expert_notes": "Dose is appropriate"
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", &format!("/api/calculations/{calc_id}/review"), review))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let detail = body_json(
            app.clone()
                .oneshot(get_request(&format!("/api/patients/{patient_id}")))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(detail["calculations"][0]["verified_by_expert"], true);
        assert_eq!(detail["calculations"][0]["expert_notes"], "Dose is appropriate");

        let calc = body_json(
            app.clone()
                .oneshot(get_request(&format!("/api/calculations/{calc_id}")))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(calc["calculation"]["id"], calc_id.as_str());
        assert_eq!(calc["reviews"].as_array().unwrap().len(), 1);
        assert_eq!(calc["reviews"][0]["expert_name"], "Dr. Ada");
        assert_eq!(calc["reviews"][0]["verification_status"], "approved");
    }

    #[tokio::test]
    async fn review_of_unknown_calculation_is_404() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let review = serde_json::json!({"expert_name": "Dr. Ada", "verification_status": "rejected"});
        let uri = format!("/api/calculations/{}/review", uuid::Uuid::new_v4());
        let response = app.oneshot(json_request("POST", &uri, review)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_calculation_detail_is_404() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let uri = format!("/api/calculations/{}", uuid::Uuid::new_v4());
        let response = app.oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn drug_catalog_flow() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let drug = serde_json::json!({"name": "Aspirin", "drug_class": "NSAID"});

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/drugs", drug.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let drug_id = body_json(response).await["id"].as_str().unwrap().to_string();

        let duplicate = app
            .clone()
            .oneshot(json_request("POST", "/api/drugs", drug))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let formulation = serde_json::json!({"form_type": "tablet", "strength": "81 mg", "route": "oral"});
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/drugs/{drug_id}/formulations"),
                formulation,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let detail = body_json(
            app.clone()
                .oneshot(get_request(&format!("/api/drugs/{drug_id}")))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(detail["drug"]["name"], "Aspirin");
        assert_eq!(detail["formulations"][0]["route"], "oral");

        let list = body_json(app.oneshot(get_request("/api/drugs")).await.unwrap()).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn formulation_for_unknown_drug_is_404() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let uri = format!("/api/drugs/{}/formulations", uuid::Uuid::new_v4());
        let body = serde_json::json!({"form_type": "capsule", "strength": "200 mg"});
        let response = app.oneshot(json_request("POST", &uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn audit_rejects_non_numeric_limit() {
        let (app, _tmp) = test_app(MockLlmClient::new("x"));
        let response = app.oneshot(get_request("/api/audit?limit=lots")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
