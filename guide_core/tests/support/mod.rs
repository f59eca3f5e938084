#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use catania_guide::config::ApiSettings;
use catania_guide::http::{ApiClient, RouteRequest};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Site payloads in the shape the guide service sends.
pub fn catania_sites_json() -> Value {
    json!([
        {
            "id": 1,
            "name": "Cattedrale di Sant'Agata",
            "description": "La cattedrale",
            "detailedDescription": "Ricostruita dopo il 1693",
            "descriptionEn": "The cathedral",
            "category": "chiesa",
            "latitude": 37.5023,
            "longitude": 15.0875,
            "audioUrlIt": "https://audio.example/1-it.mp3",
            "audioUrlEn": "https://audio.example/1-en.mp3"
        },
        {
            "id": 2,
            "name": "Castello Ursino",
            "description": "Fortezza sveva",
            "detailedDescription": "Costruito da Federico II",
            "category": "castello",
            "latitude": 37.4992,
            "longitude": 15.0836,
            "audioUrlIt": "https://audio.example/2-it.mp3",
            "audioUrlEn": ""
        },
        {
            "id": 3,
            "name": "Teatro Massimo Bellini",
            "description": "Teatro d'opera",
            "detailedDescription": "Inaugurato nel 1890",
            "category": "teatri",
            "latitude": 37.5038,
            "longitude": 15.0905
        },
        {
            "id": 4,
            "name": "Villa Bellini",
            "description": "Giardino pubblico",
            "detailedDescription": "Il giardino più antico della città",
            "category": "parco",
            "latitude": 37.5105,
            "longitude": 15.0856
        },
        {
            "id": 5,
            "name": "Pescheria",
            "description": "Mercato del pesce",
            "detailedDescription": "Mercato storico",
            "category": "mercato",
            "latitude": 37.5010,
            "longitude": 15.0860
        }
    ])
}

/// What the mock service answers on each endpoint.
#[derive(Clone)]
pub struct MockBehavior {
    pub sites: (StatusCode, String),
    pub route: (StatusCode, String),
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            sites: (StatusCode::OK, catania_sites_json().to_string()),
            route: (StatusCode::OK, "[]".to_string()),
        }
    }
}

#[derive(Clone)]
struct MockState {
    behavior: Arc<Mutex<MockBehavior>>,
    route_requests: Arc<Mutex<Vec<RouteRequest>>>,
}

/// Running mock of the guide service.
pub struct MockGuideService {
    pub addr: SocketAddr,
    behavior: Arc<Mutex<MockBehavior>>,
    route_requests: Arc<Mutex<Vec<RouteRequest>>>,
}

impl MockGuideService {
    pub async fn start(behavior: MockBehavior) -> Self {
        let state = MockState {
            behavior: Arc::new(Mutex::new(behavior)),
            route_requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/api/sites", get(list_sites))
            .route("/api/sites/{id}", get(get_site))
            .route("/api/sites/category/{category}", get(sites_by_category))
            .route("/api/routes/generate", post(generate_route))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            behavior: state.behavior,
            route_requests: state.route_requests,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url(),
            timeout_secs: 5,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.settings()).unwrap()
    }

    pub fn set_route_response(&self, status: StatusCode, body: impl Into<String>) {
        self.behavior.lock().unwrap().route = (status, body.into());
    }

    pub fn set_sites_response(&self, status: StatusCode, body: impl Into<String>) {
        self.behavior.lock().unwrap().sites = (status, body.into());
    }

    pub fn route_requests(&self) -> Vec<RouteRequest> {
        self.route_requests.lock().unwrap().clone()
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [("content-type", "application/json")], body).into_response()
}

fn parse_sites(body: &str) -> Vec<Value> {
    serde_json::from_str::<Vec<Value>>(body).unwrap_or_default()
}

async fn list_sites(State(state): State<MockState>) -> Response {
    let (status, body) = state.behavior.lock().unwrap().sites.clone();
    json_response(status, body)
}

async fn get_site(State(state): State<MockState>, Path(id): Path<i64>) -> Response {
    let (_, body) = state.behavior.lock().unwrap().sites.clone();
    match parse_sites(&body)
        .into_iter()
        .find(|site| site["id"].as_i64() == Some(id))
    {
        Some(site) => Json(site).into_response(),
        None => (StatusCode::NOT_FOUND, "site not found").into_response(),
    }
}

async fn sites_by_category(
    State(state): State<MockState>,
    Path(category): Path<String>,
) -> Response {
    let (_, body) = state.behavior.lock().unwrap().sites.clone();
    let matching: Vec<Value> = parse_sites(&body)
        .into_iter()
        .filter(|site| site["category"].as_str() == Some(category.as_str()))
        .collect();
    Json(matching).into_response()
}

async fn generate_route(
    State(state): State<MockState>,
    Json(request): Json<RouteRequest>,
) -> Response {
    state.route_requests.lock().unwrap().push(request);
    let (status, body) = state.behavior.lock().unwrap().route.clone();
    json_response(status, body)
}
