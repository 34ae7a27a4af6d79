//! Dev server with live reload.
//!
//! Serves the output directory over HTTP and exposes a `/__reload`
//! WebSocket endpoint. Pages get a small reconnecting client script
//! injected before `</body>`; when the watch loop finishes a rebuild it
//! broadcasts on the reload channel and every connected page reloads
//! itself. Reload signals with no server or no clients are no-ops.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::sync::broadcast;

/// Error starting or running the dev server
#[derive(Debug, Error)]
pub enum ServeError {
    /// Invalid bind address
    #[error("Invalid bind address {0}")]
    Address(String),
    /// Failed to bind or serve
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client script injected into served HTML pages.
///
/// Connects to the reload endpoint and reloads the page on a "reload"
/// message; reconnects with a short delay if the server restarts.
const RELOAD_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var u=(location.protocol==='https:'?'wss://':'ws://')+location.host+'/__reload';",
    "function connect(){try{var w=new WebSocket(u);",
    "w.onmessage=function(ev){if(ev&&ev.data==='reload')location.reload();};",
    "w.onclose=function(){setTimeout(connect,500);};",
    "w.onerror=function(){try{w.close();}catch(_e){}};",
    "}catch(_e){}}",
    "connect();})();</script>"
);

/// Shared server state
#[derive(Clone)]
struct ServerState {
    /// Directory being served
    root: PathBuf,
    /// Reload broadcast channel
    reload: broadcast::Sender<()>,
}

/// Create the reload channel.
///
/// The sender is handed to the watch loop; the server subscribes one
/// receiver per connected client.
pub fn reload_channel() -> broadcast::Sender<()> {
    broadcast::channel(16).0
}

/// Signal every connected client to reload.
///
/// Returns the number of clients notified; zero when the server is not
/// running or nobody is connected.
pub fn notify_reload(sender: &broadcast::Sender<()>) -> usize {
    sender.send(()).unwrap_or(0)
}

/// Serve `root` at `host:port` until the process exits.
pub async fn serve(
    root: PathBuf,
    host: &str,
    port: u16,
    reload: broadcast::Sender<()>,
) -> Result<(), ServeError> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|_| ServeError::Address(format!("{}:{}", host, port)))?;

    let state = ServerState { root, reload };
    let app = Router::new()
        .route("/__reload", get(reload_ws))
        .fallback(serve_asset)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the dev server on a background thread with its own runtime.
///
/// The rest of the tool is synchronous; only the server needs tokio.
pub fn start_background(
    root: PathBuf,
    host: String,
    port: u16,
    reload: broadcast::Sender<()>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("Dev server runtime error: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(serve(root, &host, port, reload)) {
            eprintln!("Dev server error: {}", e);
        }
    })
}

/// WebSocket handler for the reload endpoint.
async fn reload_ws(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    let receiver = state.reload.subscribe();
    ws.on_upgrade(move |socket| reload_session(socket, receiver))
}

/// Forward reload broadcasts to one connected client.
async fn reload_session(mut socket: WebSocket, mut receiver: broadcast::Receiver<()>) {
    loop {
        match receiver.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                if socket.send(Message::Text("reload".into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Static file handler rooted at the output directory.
async fn serve_asset(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(path) = resolve_request_path(&state.root, uri.path()) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = content_type_for(&path);
            if content_type == mime::TEXT_HTML_UTF_8 {
                let html = String::from_utf8_lossy(&bytes);
                let injected = inject_reload_script(&html);
                ([(header::CONTENT_TYPE, content_type.to_string())], injected).into_response()
            } else {
                ([(header::CONTENT_TYPE, content_type.to_string())], bytes).into_response()
            }
        }
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Resolve a request path inside the served root.
///
/// Rejects traversal components; directory requests resolve to their
/// `index.html`.
fn resolve_request_path(root: &Path, request: &str) -> Option<PathBuf> {
    let trimmed = request.trim_start_matches('/');
    let relative = Path::new(trimmed);

    // Only plain file names and directories below the root are allowed
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => return None,
        }
    }

    let mut path = root.join(relative);
    if path.is_dir() {
        path = path.join("index.html");
    }
    Some(path)
}

/// MIME type for a served file, by extension.
fn content_type_for(path: &Path) -> mime::Mime {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS,
        Some("js") => mime::TEXT_JAVASCRIPT,
        Some("json") => mime::APPLICATION_JSON,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Insert the reload client before `</body>`, or append when the page
/// has no closing body tag.
fn inject_reload_script(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if let Some(pos) = lower.rfind("</body>") {
        let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
        out.push_str(&html[..pos]);
        out.push_str(RELOAD_SCRIPT);
        out.push_str(&html[pos..]);
        out
    } else {
        let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
        out.push_str(html);
        out.push_str(RELOAD_SCRIPT);
        out
    }
}
