//! Feasibility lookup server.
//!
//! Serves the master-data pick lists used by the intake form as read-only
//! JSON endpoints under `/api/feasibilities`.

use axum::{
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Parser;
use feasibility_core::db::{Database, DbError, MasterDataSeed};
use feasibility_core::models::{ClientRecord, LookupCategory};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Feasibility Server - lookup API for the feasibility intake form
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 5077)]
    port: u16,

    /// JSON master-data file to load at startup
    #[arg(long)]
    seed: Option<String>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
}

/// HTTP error wrapper that implements `IntoResponse`.
///
/// Lookup failures are reported as a plain-text message.
struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<DbError> for HttpError {
    fn from(err: DbError) -> Self {
        error!(error = %err, "Lookup failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

/// Handler for GET `/clients`.
async fn handle_list_clients(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<Vec<ClientRecord>>, HttpError> {
    info!("Handling list_clients request");

    let db = app_state.db.lock().await;
    let clients: Vec<ClientRecord> = db.list_clients()?;
    Ok(Json(clients))
}

/// Handler shared by every string pick list.
async fn handle_list_lookup(
    AxumState(app_state): AxumState<AppState>,
    category: LookupCategory,
) -> Result<Json<Vec<String>>, HttpError> {
    info!(category = category.slug(), "Handling list_lookup request");

    let db = app_state.db.lock().await;
    let values: Vec<String> = db.list_lookup(category)?;
    Ok(Json(values))
}

/// One GET route per lookup category, plus `/clients`.
fn lookup_routes() -> Router<AppState> {
    LookupCategory::ALL.into_iter().fold(
        Router::new().route("/clients", get(handle_list_clients)),
        |router, category| {
            router.route(
                &format!("/{}", category.slug()),
                get(move |state: AxumState<AppState>| handle_list_lookup(state, category)),
            )
        },
    )
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .nest("/api/feasibilities", lookup_routes())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Feasibility Server");

    let mut db: Database = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Database::open(db_path)?
    } else {
        info!("Using in-memory database");
        Database::open_in_memory()?
    };

    if let Some(seed_path) = &args.seed {
        info!("Loading master data from: {}", seed_path);
        let seed = MasterDataSeed::from_json_file(seed_path)?;
        db.seed_master_data(&seed)?;
    }

    let app_state: AppState = AppState {
        db: Arc::new(Mutex::new(db)),
    };
    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use tower::ServiceExt;

    const SEED: &str = r#"{
        "clients": [
            {"clientCode": "C001", "clientName": "Acme", "unit": "Plant 1", "contactPersonName": "Bob"},
            {"clientCode": "C002", "clientName": "Acme", "unit": "Plant 2"}
        ],
        "values": {
            "sample-types": ["Water", "Food", "Water"],
            "regulations": ["FSSAI", " ", "-"],
            "labs": ["Chemistry"],
            "columns": ["C18 250mm"]
        }
    }"#;

    fn create_test_app_state() -> AppState {
        let mut db = Database::open_in_memory().expect("Failed to create in-memory database");
        let seed = MasterDataSeed::from_json(SEED).expect("Invalid seed");
        db.seed_master_data(&seed).expect("Failed to seed");
        AppState {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn fetch(app: &Router, uri: &str) -> (HttpStatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body_bytes.to_vec())
    }

    #[tokio::test]
    async fn test_list_clients() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = fetch(&app, "/api/feasibilities/clients").await;
        assert_eq!(status, HttpStatusCode::OK);

        let clients: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0]["clientName"], "Acme");
        assert_eq!(clients[0]["contactPersonName"], "Bob");
    }

    #[tokio::test]
    async fn test_lookups_are_distinct_and_filtered() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = fetch(&app, "/api/feasibilities/sample-types").await;
        assert_eq!(status, HttpStatusCode::OK);
        let values: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(values, vec!["Food", "Water"]);

        let (_, body) = fetch(&app, "/api/feasibilities/regulations").await;
        let values: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(values, vec!["FSSAI"]);
    }

    #[tokio::test]
    async fn test_every_category_routed() {
        let app: Router = build_router(create_test_app_state());

        for category in LookupCategory::ALL {
            let uri = format!("/api/feasibilities/{}", category.slug());
            let (status, body) = fetch(&app, &uri).await;
            assert_eq!(status, HttpStatusCode::OK, "{}", uri);
            let _: Vec<String> = serde_json::from_slice(&body).unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_table_returns_empty_array() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = fetch(&app, "/api/feasibilities/standards").await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_failed_lookup_is_plain_text_500() {
        let app_state: AppState = create_test_app_state();
        app_state
            .db
            .lock()
            .await
            .conn()
            .execute_batch("DROP TABLE regulations")
            .unwrap();
        let app: Router = build_router(app_state);

        let (status, body) = fetch(&app, "/api/feasibilities/regulations").await;
        assert_eq!(status, HttpStatusCode::INTERNAL_SERVER_ERROR);
        let message = String::from_utf8(body).unwrap();
        assert!(message.contains("no such table"), "{}", message);

        // Other lookups are unaffected
        let (status, _) = fetch(&app, "/api/feasibilities/labs").await;
        assert_eq!(status, HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app: Router = build_router(create_test_app_state());
        let (status, _) = fetch(&app, "/api/feasibilities/reagents").await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);
    }
}
