// REST API client - Resource Client implementation over reqwest
use crate::application::errors::ClientError;
use crate::application::resource_repository::{ClientResult, ReportFilter, ResourceRepository};
use crate::domain::envelope::ResourceEnvelope;
use crate::domain::period::Period;
use crate::domain::records::{
    Assignment, AttendanceStats, Client, MonthlyReport, Project, ReportStatus, Role, User,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

/// Whatever the backend sends; normalized into a `ResourceEnvelope`.
#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RestApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout,
        }
    }

    fn build_url(&self, path: &str, filters: &[(&str, Option<String>)]) -> String {
        build_resource_url(&self.base_url, path, filters)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        filters: &[(&str, Option<String>)],
        body: Option<Value>,
    ) -> Result<WireEnvelope, ClientError> {
        let url = self.build_url(path, filters);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .timeout(self.timeout)
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| transport(path, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| transport(path, e))?;
        serde_json::from_slice::<WireEnvelope>(&bytes).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_one<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &[(&str, Option<String>)],
    ) -> ClientResult<T> {
        let wire = self.send(Method::GET, path, filters, None).await?;
        normalize(path, wire, |data| serde_json::from_value(data))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        collection: &str,
        filters: &[(&str, Option<String>)],
    ) -> ClientResult<Vec<T>> {
        let wire = self.send(Method::GET, path, filters, None).await?;
        normalize(path, wire, |data| {
            serde_json::from_value(unwrap_list(data, collection))
        })
    }
}

fn transport(path: &str, e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout {
            path: path.to_string(),
        }
    } else {
        ClientError::Transport {
            path: path.to_string(),
            source: e,
        }
    }
}

/// Join base, path and the present filters into a URL with an encoded query string.
pub fn build_resource_url(base_url: &str, path: &str, filters: &[(&str, Option<String>)]) -> String {
    let query: Vec<String> = filters
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", urlencoding::encode(key), urlencoding::encode(v)))
        })
        .collect();

    let path = path.trim_start_matches('/');
    if query.is_empty() {
        format!("{}/{}", base_url, path)
    } else {
        format!("{}/{}?{}", base_url, path, query.join("&"))
    }
}

/// Lists arrive bare, as `null`, or wrapped as `{ "<collection>": [...] }` / `{ "items": [...] }`.
fn unwrap_list(data: Value, collection: &str) -> Value {
    match data {
        Value::Null => Value::Array(Vec::new()),
        Value::Object(mut map) => {
            for key in [collection, "items"] {
                if let Some(list @ Value::Array(_)) = map.remove(key) {
                    return list;
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn normalize<T>(
    path: &str,
    wire: WireEnvelope,
    decode: impl FnOnce(Value) -> Result<T, serde_json::Error>,
) -> ClientResult<T> {
    let success = wire.success.unwrap_or(wire.data.is_some());
    if !success {
        return Ok(ResourceEnvelope {
            success: false,
            data: None,
            error: wire.error.or(wire.message),
        });
    }

    let data = decode(wire.data.unwrap_or(Value::Null)).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    Ok(ResourceEnvelope::ok(data))
}

#[async_trait]
impl ResourceRepository for RestApiClient {
    async fn list_users(&self, role: Option<Role>) -> ClientResult<Vec<User>> {
        let filters = [("role", role.map(|r| r.as_str().to_string()))];
        self.get_list("/users", "users", &filters).await
    }

    async fn get_user(&self, id: &str) -> ClientResult<User> {
        let path = format!("/users/{}", urlencoding::encode(id));
        self.get_one(&path, &[]).await
    }

    async fn list_clients(&self) -> ClientResult<Vec<Client>> {
        self.get_list("/clients", "clients", &[]).await
    }

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        self.get_list("/projects", "projects", &[]).await
    }

    async fn list_assignments(&self, engineer_id: Option<&str>) -> ClientResult<Vec<Assignment>> {
        let filters = [("engineerId", engineer_id.map(str::to_string))];
        self.get_list("/assignments", "assignments", &filters).await
    }

    async fn list_monthly_reports(&self, filter: &ReportFilter) -> ClientResult<Vec<MonthlyReport>> {
        let filters = [
            ("status", filter.status.map(|s| s.as_str().to_string())),
            ("engineerId", filter.engineer_id.clone()),
        ];
        self.get_list("/monthly-reports", "reports", &filters).await
    }

    async fn attendance_stats(
        &self,
        engineer_id: &str,
        period: Period,
    ) -> ClientResult<AttendanceStats> {
        let filters = [
            ("engineerId", Some(engineer_id.to_string())),
            ("year", Some(period.year.to_string())),
            ("month", Some(period.month.to_string())),
        ];
        self.get_one("/attendance/stats", &filters).await
    }

    async fn update_report_status(
        &self,
        report_id: &str,
        status: ReportStatus,
    ) -> ClientResult<MonthlyReport> {
        let path = format!("/monthly-reports/{}/status", urlencoding::encode(report_id));
        let body = serde_json::json!({ "status": status.as_str() });
        let wire = self.send(Method::PATCH, &path, &[], Some(body)).await?;
        normalize(&path, wire, |data| serde_json::from_value(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, RawQuery};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn client(base_url: &str) -> RestApiClient {
        RestApiClient::new(base_url, Some("secret".to_string()), Duration::from_secs(2))
    }

    #[test]
    fn test_build_resource_url() {
        let url = build_resource_url(
            "http://api.local/api",
            "/monthly-reports",
            &[
                ("status", Some("submitted".to_string())),
                ("engineerId", None),
                ("note", Some("a b&c".to_string())),
                ("empty", Some(String::new())),
            ],
        );
        assert_eq!(
            url,
            "http://api.local/api/monthly-reports?status=submitted&note=a%20b%26c"
        );
        assert_eq!(
            build_resource_url("http://api.local", "clients", &[]),
            "http://api.local/clients"
        );
    }

    #[test]
    fn test_unwrap_list_shapes() {
        assert_eq!(unwrap_list(json!(null), "users"), json!([]));
        assert_eq!(unwrap_list(json!([1]), "users"), json!([1]));
        assert_eq!(unwrap_list(json!({"users": [1], "total": 1}), "users"), json!([1]));
        assert_eq!(unwrap_list(json!({"items": [2]}), "users"), json!([2]));
        assert_eq!(unwrap_list(json!({"id": 1}), "users"), json!({"id": 1}));
    }

    #[test]
    fn test_normalize_infers_success_and_message() {
        let wire = WireEnvelope {
            success: None,
            data: Some(json!([{"id": "c1"}])),
            error: None,
            message: None,
        };
        let envelope: ResourceEnvelope<Vec<Client>> =
            normalize("/clients", wire, serde_json::from_value).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()[0].id, "c1");

        let wire = WireEnvelope {
            success: Some(false),
            data: Some(json!([{"id": "c1"}])),
            error: None,
            message: Some("token expired".to_string()),
        };
        let envelope: ResourceEnvelope<Vec<Client>> =
            normalize("/clients", wire, serde_json::from_value).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("token expired"));
    }

    #[tokio::test]
    async fn test_list_with_filter_and_auth() {
        let router = Router::new().route(
            "/api/users",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "success": true,
                    "data": { "users": [
                        { "_id": 1, "name": "Eli", "role": "engineer" },
                        { "_id": 2, "name": auth, "role": "engineer" },
                        { "_id": 3, "name": query.unwrap_or_default(), "role": "engineer" }
                    ]}
                }))
            }),
        );
        let base = serve(router).await;

        let users = client(&base)
            .list_users(Some(Role::Engineer))
            .await
            .unwrap()
            .into_data()
            .unwrap();

        assert_eq!(users.len(), 3);
        assert_eq!(users[0].id, "1");
        assert_eq!(users[1].name, "Bearer secret");
        assert_eq!(users[2].name, "role=engineer");
    }

    #[tokio::test]
    async fn test_single_object_and_path_encoding() {
        let router = Router::new().route(
            "/api/users/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({ "success": true, "data": { "id": id, "role": "sales" } }))
            }),
        );
        let base = serve(router).await;

        let user = client(&base).get_user("a/b").await.unwrap().into_data().unwrap();
        assert_eq!(user.id, "a/b");
        assert_eq!(user.role, Role::Sales);
    }

    #[tokio::test]
    async fn test_non_2xx_is_an_error() {
        let router = Router::new().route(
            "/api/clients",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = serve(router).await;

        let err = client(&base).list_clients().await.unwrap_err();
        match err {
            ClientError::Status { status, body, path } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
                assert_eq!(path, "/clients");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let router = Router::new().route("/api/projects", get(|| async { "<html>oops</html>" }));
        let base = serve(router).await;

        let err = client(&base).list_projects().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_wrong_payload_shape_is_a_decode_error() {
        let router = Router::new().route(
            "/api/projects",
            get(|| async { Json(json!({ "success": true, "data": { "total": 3 } })) }),
        );
        let base = serve(router).await;

        let err = client(&base).list_projects().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_backend_reported_failure_is_an_untrusted_envelope() {
        let router = Router::new().route(
            "/api/clients",
            get(|| async { Json(json!({ "success": false, "error": "db offline" })) }),
        );
        let base = serve(router).await;

        let envelope = client(&base).list_clients().await.unwrap();
        assert!(!envelope.success);
        assert!(matches!(envelope.into_data(), Err(ClientError::Rejected(msg)) if msg == "db offline"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let router = Router::new().route(
            "/api/clients",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "success": true, "data": [] }))
            }),
        );
        let base = serve(router).await;

        let client = RestApiClient::new(&base, None, Duration::from_millis(100));
        let err = client.list_clients().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{}/api", addr));
        let err = client.list_clients().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_attendance_query_and_report_update() {
        let router = Router::new()
            .route(
                "/api/attendance/stats",
                get(|RawQuery(query): RawQuery| async move {
                    let query = query.unwrap_or_default();
                    let present = if query == "engineerId=e1&year=2025&month=5" { 20 } else { 0 };
                    Json(json!({ "success": true, "data": { "workingDays": 21, "presentDays": present } }))
                }),
            )
            .route(
                "/api/monthly-reports/:id/status",
                patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({
                        "success": true,
                        "data": { "id": id, "year": 2025, "month": 5, "status": body["status"] }
                    }))
                }),
            );
        let base = serve(router).await;
        let client = client(&base);

        let stats = client
            .attendance_stats("e1", Period::new(2025, 5).unwrap())
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(stats.present_days, 20);
        assert_eq!(stats.working_days, 21);

        let report = client
            .update_report_status("r1", ReportStatus::Approved)
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(report.id, "r1");
        assert_eq!(report.status, ReportStatus::Approved);
    }
}
