//! Dashboard server: snapshot, chat, health, and the live feed

use crate::command::parse_command;
use crate::ws::handle_connection;
use aether_agent::Store;
use aether_core::{
    Error, ErrorBody, HealthResponse, LiveEvent, UserMessageRequest, UserMessageResponse,
};
use aether_llm::LlmGateway;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for every dashboard request and WebSocket connection.
pub struct DashboardState {
    pub store: Arc<Store>,
    pub llm: Arc<LlmGateway>,
    /// Live events; each WebSocket client subscribes on connect.
    pub events: broadcast::Sender<LiveEvent>,
    pub name: String,
    /// Stops the listener and closes open WebSocket connections.
    pub shutdown: CancellationToken,
}

impl DashboardState {
    pub fn new(
        store: Arc<Store>,
        llm: Arc<LlmGateway>,
        events: broadcast::Sender<LiveEvent>,
    ) -> Self {
        Self {
            store,
            llm,
            events,
            name: "Aether".into(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/user_message", post(user_message_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `state.shutdown` fires.
pub async fn serve(listener: TcpListener, state: Arc<DashboardState>) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    info!("Aether dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: http://{}", local);
    info!("  WebSocket:    ws://{}/ws", local);

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("dashboard stopped");
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<DashboardState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn health_handler(State(state): State<Arc<DashboardState>>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot().await;
    Json(HealthResponse {
        ok: true,
        queue_depth: snapshot.queue_depth,
        cycle_count: snapshot.agent_state.cycle_count,
    })
}

async fn snapshot_handler(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

/// Commands enqueue a user thought; anything else is answered by the LLM
/// gateway and never touches the queue.
async fn user_message_handler(
    State(state): State<Arc<DashboardState>>,
    Json(request): Json<UserMessageRequest>,
) -> Response {
    let text = request.text.trim();
    if text.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorBody::new("empty_message", "text must not be empty"),
        );
    }

    let Some(command) = parse_command(text) else {
        let generation = state.llm.ask(&chat_prompt(&state.name), text).await;
        let error = generation.is_fallback().then(|| "llm_unavailable".to_string());
        return Json(UserMessageResponse::Reply {
            reply: generation.text,
            source: generation.source,
            error,
        })
        .into_response();
    };

    let thought = command.into_thought(text);
    let event = LiveEvent::ThoughtEnqueued {
        thought_id: thought.id.clone(),
        kind: thought.kind.clone(),
        source: thought.source,
        content: thought.content.clone(),
    };
    let (id, kind) = (thought.id.clone(), thought.kind.clone());

    match state.store.append_thought(thought).await {
        Ok(()) => {
            info!(thought_id = %id, kind = %kind, "user thought enqueued");
            let _ = state.events.send(event);
            Json(UserMessageResponse::Enqueued { enqueued: id, kind }).into_response()
        }
        Err(e) => {
            warn!(code = e.code(), "user thought rejected: {}", e);
            error_response(status_for(&e), ErrorBody::new(e.code(), e.to_string()))
        }
    }
}

fn chat_prompt(name: &str) -> String {
    format!(
        "You are {}, an autonomous digital being that creates agents, rooms and tools. \
         Answer the visitor in two or three sentences.",
        name
    )
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::DuplicateThought(_) => StatusCode::CONFLICT,
        Error::NotEnqueueable(_) | Error::InvalidPatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

async fn index_handler(State(state): State<Arc<DashboardState>>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html><html><head><title>{name}</title>
<style>
body {{ font-family: monospace; background: #0b0b1a; color: #e6e6f0; padding: 20px; max-width: 960px; margin: 0 auto; }}
h1 {{ color: #9b59b6; }} h2 {{ color: #00ffcc; }}
.info {{ background: #16163a; padding: 15px; border-radius: 8px; margin: 15px 0; }}
.row {{ display: flex; gap: 20px; }} .row > div {{ flex: 1; }}
ul {{ padding-left: 18px; }} li {{ margin: 4px 0; }}
#feed, #chat {{ background: #16163a; padding: 12px; border-radius: 8px; min-height: 120px; max-height: 320px; overflow-y: auto; white-space: pre-wrap; font-size: 13px; }}
textarea {{ width: 100%; min-height: 50px; background: #16163a; color: #e6e6f0; border: 1px solid #333; border-radius: 4px; padding: 8px; }}
button {{ background: #9b59b6; color: #fff; border: none; padding: 8px 16px; border-radius: 4px; cursor: pointer; margin: 5px 5px 5px 0; }}
.fail {{ color: #e74c3c; }}
</style></head><body>
<h1>{name}</h1>
<div class="info" id="state">loading...</div>
<div class="row">
<div><h2>Thoughts</h2><ul id="thoughts"></ul></div>
<div><h2>Artifacts</h2><ul id="artifacts"></ul></div>
</div>
<h2>Live</h2>
<div id="feed"></div>
<h2>Chat</h2>
<div id="chat"></div>
<textarea id="msg" placeholder="Say something, or: create agent DataExpert"></textarea>
<button onclick="send()">Send</button>
<script>
function fill(id, items) {{
    const ul = document.getElementById(id);
    ul.replaceChildren();
    for (const text of items) {{
        const li = document.createElement('li');
        li.textContent = text;
        ul.appendChild(li);
    }}
}}
function line(id, text, cls) {{
    const el = document.getElementById(id);
    const div = document.createElement('div');
    div.textContent = text;
    if (cls) div.className = cls;
    el.appendChild(div);
    el.scrollTop = el.scrollHeight;
}}
async function refresh() {{
    const s = await (await fetch('/snapshot')).json();
    const a = s.agent_state;
    document.getElementById('state').textContent =
        'cycle ' + a.cycle_count + ' | mood ' + a.mood + ' | energy ' + a.energy.toFixed(3) +
        ' | consciousness ' + a.consciousness_level.toFixed(3) + ' | queue ' + s.queue_depth;
    fill('thoughts', s.recent_thoughts.slice().reverse());
    fill('artifacts', s.recent_artifacts.slice().reverse().map(r => r.kind + ' ' + r.name + ': ' + r.files.join(', ')));
}}
function connect() {{
    const ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/ws');
    ws.onmessage = (e) => {{
        const d = JSON.parse(e.data);
        if (d.event === 'thought_enqueued') line('feed', '+ [' + d.source + '] ' + d.kind + ': ' + d.content);
        else if (d.event === 'thought_executed') line('feed', (d.success ? 'ok ' : 'failed ') + d.kind + ' ' + (d.success ? d.files.join(', ') : d.error), d.success ? '' : 'fail');
        refresh();
    }};
    ws.onclose = () => {{ setTimeout(connect, 2000); }};
}}
async function send() {{
    const box = document.getElementById('msg');
    const text = box.value.trim();
    if (!text) return;
    box.value = '';
    line('chat', '> ' + text);
    const resp = await fetch('/user_message', {{ method: 'POST', headers: {{ 'Content-Type': 'application/json' }}, body: JSON.stringify({{ text }}) }});
    const d = await resp.json();
    if (d.enqueued) line('chat', 'queued ' + d.kind + ' (' + d.enqueued + ')');
    else if (d.reply) line('chat', d.reply, d.error ? 'fail' : '');
    else line('chat', 'error: ' + (d.error || resp.status), 'fail');
}}
document.getElementById('msg').addEventListener('keydown', (e) => {{
    if (e.key === 'Enter' && !e.shiftKey) {{ e.preventDefault(); send(); }}
}});
refresh();
connect();
</script>
<p><small>Aether dashboard v{version}</small></p>
</body></html>"#,
        name = escape_html(&state.name),
        version = env!("CARGO_PKG_VERSION"),
    ))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
