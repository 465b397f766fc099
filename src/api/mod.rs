use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::CityScienceError;
use crate::batch::RegionStore;
use crate::bulletin::BulletinService;
use crate::generation::TextGenerator;
use crate::models::CityScore;
use crate::prompt::{
    BUILD_CITY_REQUIRED, BuildRequest, BulletinRequest, CitizenRequest, ManagementRequest, require,
};
use crate::report::read_report;
use crate::weather::WeatherApiClient;

pub const VIEW_PATH: &str = "/bulletin/view";

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    bulletins: BulletinService,
    regions: RegionStore,
    output_html: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        weather: WeatherApiClient,
        generator: Arc<dyn TextGenerator>,
        regions: RegionStore,
        output_html: PathBuf,
    ) -> Self {
        Self {
            bulletins: BulletinService::new(weather, generator),
            regions,
            output_html: Arc::new(output_html),
        }
    }

    fn weather(&self) -> &WeatherApiClient {
        self.bulletins.weather()
    }
}

/// Handler failure, rendered as a danger flash message
#[derive(Debug)]
pub struct ApiError(CityScienceError);

impl From<CityScienceError> for ApiError {
    fn from(err: CityScienceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CityScienceError::Validation { .. } => StatusCode::BAD_REQUEST,
            CityScienceError::Api { .. }
            | CityScienceError::Http { .. }
            | CityScienceError::Generation { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        flash(status, &self.0.user_message())
    }
}

fn flash(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "flash": {"category": "danger", "message": message}
    });
    (status, Json(body)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CitizenForm {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub prompt: String,
    pub obs: Option<String>,
}

impl From<CitizenForm> for BulletinRequest {
    fn from(form: CitizenForm) -> Self {
        BulletinRequest::Citizen(CitizenRequest {
            city: form.city,
            question: form.prompt,
            observations: form.obs.filter(|o| !o.trim().is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildForm {
    pub city: String,
    pub project_type: String,
    pub leed_goal: String,
    pub focus_area: String,
    pub project_details: String,
}

impl TryFrom<BuildForm> for BulletinRequest {
    type Error = CityScienceError;

    /// Fields are checked in form order, so a blank city wins over bad codes
    fn try_from(form: BuildForm) -> Result<Self, Self::Error> {
        require(&form.city, BUILD_CITY_REQUIRED)?;
        Ok(BulletinRequest::Build(BuildRequest {
            city: form.city,
            project_type: form.project_type.parse()?,
            leed_goal: form.leed_goal.parse()?,
            focus_area: form.focus_area.parse()?,
            project_details: form.project_details,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManagementForm {
    pub city: String,
    pub problem: String,
    pub goal: String,
    pub budget: String,
    pub timeframe: String,
    pub priority: String,
    pub expected_impact: String,
}

impl From<ManagementForm> for BulletinRequest {
    fn from(form: ManagementForm) -> Self {
        BulletinRequest::Management(ManagementRequest {
            city: form.city,
            problem: form.problem,
            goal: form.goal,
            budget: form.budget,
            timeframe: form.timeframe,
            priority: form.priority,
            expected_impact: form.expected_impact,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationReport {
    pub lat: f64,
    pub lon: f64,
    pub accuracy: Option<f64>,
    pub timestamp: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReportedLocation {
    pub city: String,
    pub state: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bulletin", post(citizen_bulletin))
        .route("/bulletin/build", post(build_bulletin))
        .route("/bulletin/management", post(management_bulletin))
        .route(VIEW_PATH, get(view_bulletin))
        .route("/api/insight", post(weather_insight))
        .route("/api/report-location", post(report_location))
        .route("/api/regions", get(get_regions))
}

async fn generate(state: &AppState, request: BulletinRequest) -> Result<Redirect, ApiError> {
    state.bulletins.generate(&request, &state.output_html).await?;
    Ok(Redirect::to(VIEW_PATH))
}

async fn citizen_bulletin(
    State(state): State<AppState>,
    Form(form): Form<CitizenForm>,
) -> Result<Redirect, ApiError> {
    generate(&state, form.into()).await
}

async fn build_bulletin(
    State(state): State<AppState>,
    Form(form): Form<BuildForm>,
) -> Result<Redirect, ApiError> {
    generate(&state, form.try_into()?).await
}

async fn management_bulletin(
    State(state): State<AppState>,
    Form(form): Form<ManagementForm>,
) -> Result<Redirect, ApiError> {
    generate(&state, form.into()).await
}

async fn view_bulletin(State(state): State<AppState>) -> Result<Response, ApiError> {
    match read_report(&state.output_html).await {
        Ok(html) => Ok(Html(html).into_response()),
        Err(CityScienceError::Io { source }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(flash(StatusCode::NOT_FOUND, "No bulletin has been generated yet."))
        }
        Err(e) => Err(e.into()),
    }
}

/// Weather and network failures are reported in the body, not as a status
async fn weather_insight(
    State(state): State<AppState>,
    Json(request): Json<InsightRequest>,
) -> (StatusCode, Json<Value>) {
    let city = request.city.trim();
    if city.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Please enter a city."})),
        );
    }

    match state.weather().current_conditions(city).await {
        Ok(conditions) => {
            info!("Insight served for '{}'", city);
            (
                StatusCode::OK,
                Json(json!({
                    "insight": conditions.summary(),
                    "conditions": conditions,
                })),
            )
        }
        Err(e) => {
            warn!("Insight for '{}' failed: {}", city, e);
            (StatusCode::OK, Json(json!({"error": e.user_message()})))
        }
    }
}

async fn report_location(
    State(state): State<AppState>,
    Json(report): Json<LocationReport>,
) -> Result<Json<ReportedLocation>, ApiError> {
    if !(-90.0..=90.0).contains(&report.lat) || !(-180.0..=180.0).contains(&report.lon) {
        return Err(CityScienceError::validation("Coordinates out of range.").into());
    }
    if let Some(accuracy) = report.accuracy {
        info!(
            "Location reported with {:.0} m accuracy at {:?}",
            accuracy, report.timestamp
        );
    }

    let location = state
        .weather()
        .lookup_coordinates(report.lat, report.lon)
        .await?;
    Ok(Json(ReportedLocation {
        city: location.name,
        state: location.region,
        country: location.country,
        lat: report.lat,
        lon: report.lon,
    }))
}

async fn get_regions(State(state): State<AppState>) -> Result<Json<Vec<CityScore>>, ApiError> {
    Ok(Json(state.regions.load().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherConfig;
    use crate::weather::weatherapi::fixtures::forecast_json;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedGenerator;

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> crate::Result<String> {
            Ok("<html>generated</html>".to_string())
        }
    }

    struct Harness {
        server: MockServer,
        dir: tempfile::TempDir,
    }

    impl Harness {
        async fn start() -> Self {
            Self {
                server: MockServer::start().await,
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn app(&self) -> Router {
            let config = WeatherConfig {
                base_url: self.server.uri(),
                ..WeatherConfig::default()
            };
            let state = AppState::new(
                WeatherApiClient::new(&config, "k").unwrap(),
                Arc::new(FixedGenerator),
                RegionStore::new(self.dir.path().join("regions.json")),
                self.dir.path().join("bulletin.html"),
            );
            router().with_state(state)
        }

        async fn mount_forecast(&self) {
            Mock::given(method("GET"))
                .and(path("/forecast.json"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(forecast_json(3, 24, true)),
                )
                .mount(&self.server)
                .await;
        }
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_citizen_bulletin_redirects_to_view() {
        let harness = Harness::start().await;
        harness.mount_forecast().await;

        let response = harness
            .app()
            .oneshot(form("/bulletin", "city=Fortaleza&prompt=Is+it+hot%3F&obs="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], VIEW_PATH);

        let view = harness
            .app()
            .oneshot(Request::get(VIEW_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(view.status(), StatusCode::OK);
        let bytes = view.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<html>generated</html>");
    }

    #[tokio::test]
    async fn test_missing_field_flashes_danger() {
        let harness = Harness::start().await;
        let response = harness
            .app()
            .oneshot(form("/bulletin", "city=&prompt=hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["flash"]["category"], "danger");
        assert_eq!(body["flash"]["message"], "City/State: this field is required.");
    }

    #[tokio::test]
    async fn test_build_form_rejects_unknown_project_type() {
        let harness = Harness::start().await;
        let response = harness
            .app()
            .oneshot(form(
                "/bulletin/build",
                "city=Natal&project_type=XYZ&leed_goal=Gold&focus_area=Energy&project_details=house",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["flash"]["message"],
            "The project type defines the applicable credits."
        );
    }

    #[tokio::test]
    async fn test_build_form_reports_missing_city_before_codes() {
        let harness = Harness::start().await;
        let response = harness
            .app()
            .oneshot(form(
                "/bulletin/build",
                "city=&project_type=&leed_goal=&focus_area=&project_details=",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["flash"]["message"],
            "The location is essential for zoning criteria and local resources."
        );
    }

    #[tokio::test]
    async fn test_management_bulletin_weather_failure_is_flashed() {
        let harness = Harness::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 1006, "message": "No matching location found."}
            })))
            .mount(&harness.server)
            .await;

        let response = harness
            .app()
            .oneshot(form(
                "/bulletin/management",
                "city=Atlantis&problem=p&goal=g&budget=b&timeframe=t&priority=High&expected_impact=e",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(!harness.dir.path().join("bulletin.html").exists());
    }

    #[tokio::test]
    async fn test_view_without_bulletin_is_not_found() {
        let harness = Harness::start().await;
        let response = harness
            .app()
            .oneshot(Request::get(VIEW_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["flash"]["message"], "No bulletin has been generated yet.");
    }

    #[tokio::test]
    async fn test_insight_returns_conditions() {
        let harness = Harness::start().await;
        harness.mount_forecast().await;

        let response = harness
            .app()
            .oneshot(json_request("/api/insight", json!({"city": "Fortaleza"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(
            body["insight"]
                .as_str()
                .unwrap()
                .starts_with("Fortaleza, Ceara, Brazil: Partly cloudy")
        );
        assert_eq!(body["conditions"]["temperature_c"], 29.0);
    }

    #[tokio::test]
    async fn test_insight_catches_api_failure() {
        let harness = Harness::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&harness.server)
            .await;

        let response = harness
            .app()
            .oneshot(json_request("/api/insight", json!({"city": "Fortaleza"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Unable to reach the weather service. Please check the city name and try again."
        );
    }

    #[tokio::test]
    async fn test_insight_failure_does_not_leak_api_key() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..WeatherConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            WeatherApiClient::new(&config, "SECRET-WEATHER-KEY").unwrap(),
            Arc::new(FixedGenerator),
            RegionStore::new(dir.path().join("regions.json")),
            dir.path().join("bulletin.html"),
        );

        let response = router()
            .with_state(state)
            .oneshot(json_request("/api/insight", json!({"city": "Fortaleza"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&bytes);
        assert!(body.contains("\"error\""));
        assert!(!body.contains("SECRET-WEATHER-KEY"));
    }

    #[tokio::test]
    async fn test_report_location() {
        let harness = Harness::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(0, 0, false)))
            .mount(&harness.server)
            .await;

        let response = harness
            .app()
            .oneshot(json_request(
                "/api/report-location",
                json!({"lat": -3.72, "lon": -38.54, "accuracy": 12.5, "timestamp": 1_700_000_000_000u64}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["city"], "Fortaleza");
        assert_eq!(body["state"], "Ceara");
        assert_eq!(body["country"], "Brazil");
        assert_eq!(body["lat"], -3.72);
    }

    #[tokio::test]
    async fn test_report_location_rejects_bad_coordinates() {
        let harness = Harness::start().await;
        let response = harness
            .app()
            .oneshot(json_request("/api/report-location", json!({"lat": 123.0, "lon": 0.0})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_regions_empty_without_file() {
        let harness = Harness::start().await;
        let response = harness
            .app()
            .oneshot(Request::get("/api/regions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([]));
    }
}
