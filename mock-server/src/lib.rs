//! Fixture HTTP server for exercising the test client over real sockets.
//!
//! Routes cover everything the client's dispatch engine has to handle:
//! request echoing, arbitrary status codes, redirect chains and loops,
//! urlencoded forms, a slow endpoint for deadline tests, and a keyed store
//! with a lookup-echo handler standing in for a production handler.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Form, Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Redirect,
    routing::{any, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Snapshot of an incoming request, echoed back as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Payload accepted by the lookup-echo handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
}

/// Reply produced by the lookup-echo handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValueReply {
    pub value: String,
}

pub type Store = Arc<RwLock<HashMap<String, String>>>;

pub fn app() -> Router {
    let store: Store = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/", any(echo))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/status/{code}", get(status))
        .route("/hop/{n}", get(hop))
        .route("/landing", get(landing))
        .route("/loop", get(bounce))
        .route("/form", post(form_echo))
        .route("/store/{key}", put(store_put))
        .route("/any/{key}", post(lookup_echo))
        .route("/slow", get(slow))
        .with_state(store)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve `app()` on a random local port from a background thread and
/// return the bound address. The thread runs for the rest of the process.
pub fn spawn() -> std::net::SocketAddr {
    let std_listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("bind to a random local port");
    let addr = std_listener.local_addr().expect("listener has a local address");
    std_listener
        .set_nonblocking(true)
        .expect("listener switches to non-blocking");

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime builds");
        rt.block_on(async {
            let listener = TcpListener::from_std(std_listener).expect("listener converts");
            run(listener).await
        })
        .expect("mock server runs");
    });

    addr
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body,
    })
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Chain of `n` redirects bottoming out at `/landing`.
async fn hop(Path(n): Path<u32>) -> Redirect {
    if n > 1 {
        Redirect::to(&format!("/hop/{}", n - 1))
    } else {
        Redirect::to("/landing")
    }
}

async fn landing() -> &'static str {
    "landed"
}

/// Redirects to itself forever.
async fn bounce() -> Redirect {
    Redirect::to("/loop")
}

async fn form_echo(Form(fields): Form<Vec<(String, String)>>) -> Json<Vec<(String, String)>> {
    Json(fields)
}

async fn store_put(
    State(store): State<Store>,
    Path(key): Path<String>,
    value: String,
) -> StatusCode {
    store.write().await.insert(key, value);
    StatusCode::NO_CONTENT
}

/// Looks the last path segment up in the store (absent keys are a 400),
/// then echoes `"<stored> <name> <custom>"`.
async fn lookup_echo(
    State(store): State<Store>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(customer): Json<Customer>,
) -> Result<Json<ValueReply>, StatusCode> {
    let store = store.read().await;
    let Some(stored) = store.get(&key) else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let custom = headers
        .get("custom")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Ok(Json(ValueReply {
        value: format!("{stored} {} {custom}", customer.name),
    }))
}

async fn slow() -> &'static str {
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    "slow"
}
