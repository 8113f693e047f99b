//! # Handlers HTTP — Os Endpoints da Aplicação
//!
//! Cada função pública neste módulo é um handler Axum, mapeado a uma
//! rota em [`super::create_router()`].
//!
//! ## Padrão de Resposta
//!
//! | Handler | Método | Retorno | Uso |
//! |---------|--------|---------|-----|
//! | `index` | GET | HTML completo | Deck de observação (Maud) |
//! | `forward` | POST | HTMX fragment | Veredito + transcript |
//! | `backward` | POST | HTMX fragment | Veredito + transcript |
//! | `history` | GET | HTMX fragment | Histórico da sessão |
//! | `reset_session` | POST | HTMX fragment | Histórico limpo |
//! | `sse_events` | GET | SSE stream | Trace ao vivo |
//! | `api_knowledge` | GET | JSON | Fatos, regras numeradas, metas |
//! | `api_forward` | POST | JSON | [`RunRecord`] do forward chaining |
//! | `api_backward` | POST | JSON | [`RunRecord`] do backward chaining |
//!
//! ## Motores Fora do Runtime Async
//!
//! Toda execução roda em `tokio::task::spawn_blocking`: o motor emite as
//! linhas de trace de forma síncrona, e o [`BroadcastSink`] as publica no
//! canal SSE enquanto o handler aguarda o `RunRecord` final.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use super::events::{BroadcastSink, InferenceEvent};
use super::state::AppState;
use super::templates::{self, OBSERVATION_FIELD_PREFIX};
use crate::core::rule::numbered;
use crate::error::InferenceError;
use crate::inference::TraceSink;
use crate::orchestrator::{observe_labels, resolve_goal, Orchestrator, RunKind, RunRecord};

/// Converte Maud Markup em resposta Html<String> do Axum.
fn markup_to_html(m: maud::Markup) -> Html<String> {
    Html(m.into_string())
}

/// Por que uma execução não produziu `RunRecord`.
#[derive(Debug)]
pub enum RunFailure {
    /// Entrada rejeitada na borda.
    Rejected(InferenceError),
    /// Registro cheio e todas as sessões ocupadas.
    SessionsFull,
    /// A task bloqueante entrou em pânico ou foi cancelada.
    Crashed(String),
}

impl RunFailure {
    fn message(&self) -> String {
        match self {
            RunFailure::Rejected(e) => e.to_string(),
            RunFailure::SessionsFull => "too many active sessions, try again shortly".to_string(),
            RunFailure::Crashed(e) => format!("inference task failed: {e}"),
        }
    }
}

impl IntoResponse for RunFailure {
    fn into_response(self) -> Response {
        let status = match self {
            RunFailure::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RunFailure::SessionsFull => StatusCode::SERVICE_UNAVAILABLE,
            RunFailure::Crashed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Roda `run` na sessão `session`, fora do runtime async.
///
/// ## Fluxo
///
/// ```text
/// 1. `check` falhou → publica Rejected (nenhuma sessão é criada)
/// 2. Busca/cria a sessão no registro (cheio → SessionsFull)
/// 3. Publica Started
/// 4. spawn_blocking: trava a sessão, roda o motor com BroadcastSink
/// 5. Publica Finished ou Rejected
/// ```
async fn run_in_session<F>(
    state: &AppState,
    session: Uuid,
    kind: RunKind,
    check: Result<(), InferenceError>,
    run: F,
) -> Result<RunRecord, RunFailure>
where
    F: FnOnce(&mut Orchestrator, &mut dyn TraceSink) -> Result<RunRecord, InferenceError>
        + Send
        + 'static,
{
    let tx = state.events_tx.clone();
    if let Err(e) = check {
        tracing::warn!(error = %e, session = %session, "Execução rejeitada na borda");
        let _ = tx.send(InferenceEvent::Rejected {
            session: session.to_string(),
            message: e.to_string(),
        });
        return Err(RunFailure::Rejected(e));
    }
    let shared = state
        .sessions
        .get_or_create(session)
        .ok_or(RunFailure::SessionsFull)?;
    let _ = tx.send(InferenceEvent::Started {
        session: session.to_string(),
        kind: kind.label().to_string(),
        title: kind.title().to_string(),
    });

    let joined = tokio::task::spawn_blocking(move || {
        let mut sink = BroadcastSink::new(tx.clone(), session);
        let mut orchestrator = shared.lock();
        let result = run(&mut *orchestrator, &mut sink);
        drop(orchestrator);

        let event = match &result {
            Ok(record) => InferenceEvent::Finished {
                session: session.to_string(),
                run_id: record.id.to_string(),
                verdict: record.verdict.clone(),
                success: record.success,
                elapsed_ms: record.elapsed_ms,
            },
            Err(e) => InferenceEvent::Rejected {
                session: session.to_string(),
                message: e.to_string(),
            },
        };
        let _ = tx.send(event);
        result
    })
    .await;

    match joined {
        Ok(Ok(record)) => Ok(record),
        Ok(Err(e)) => Err(RunFailure::Rejected(e)),
        Err(e) => {
            tracing::error!(error = %e, session = %session, "Task de inferência falhou");
            Err(RunFailure::Crashed(e.to_string()))
        }
    }
}

/// Campos extraídos do formulário do deck de observação.
///
/// Checkboxes usam nomes `obs:<rótulo>` (o formulário não repete chaves),
/// mais `session` e, no backward chaining, `goal`.
struct RunForm {
    session: Uuid,
    goal: Option<String>,
    observations: Vec<String>,
}

impl RunForm {
    fn parse(mut fields: HashMap<String, String>) -> Self {
        let session = session_or_new(fields.remove("session").as_deref());
        let goal = fields.remove("goal");
        let observations = fields
            .into_keys()
            .filter_map(|k| k.strip_prefix(OBSERVATION_FIELD_PREFIX).map(str::to_string))
            .collect();
        Self {
            session,
            goal,
            observations,
        }
    }
}

/// UUID de sessão enviado pelo cliente, ou um novo se ausente/inválido.
fn session_or_new(raw: Option<&str>) -> Uuid {
    raw.and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn run_response(result: Result<RunRecord, RunFailure>) -> Html<String> {
    markup_to_html(match result {
        Ok(record) => templates::run_fragment(&record),
        Err(failure) => templates::error_fragment(&failure.message()),
    })
}

/// GET `/` — Página principal com um UUID de sessão novo.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    markup_to_html(templates::full_page(&state.kb, Uuid::new_v4()))
}

/// POST `/forward` — Forward chaining sobre as observações marcadas.
pub async fn forward(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let form = RunForm::parse(fields);
    let labels = form.observations;
    let check = observe_labels(&state.kb, &labels).map(drop);
    let result = run_in_session(&state, form.session, RunKind::Forward, check, move |o, sink| {
        o.run_forward(&labels, Some(sink))
    })
    .await;
    run_response(result)
}

/// POST `/backward` — Backward chaining para a meta selecionada.
pub async fn backward(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let form = RunForm::parse(fields);
    let Some(goal) = form.goal else {
        return markup_to_html(templates::error_fragment("no goal selected"));
    };
    let labels = form.observations;
    let check = backward_check(&state, &goal, &labels);
    let result = run_in_session(&state, form.session, RunKind::Backward, check, move |o, sink| {
        o.run_backward(&goal, &labels, Some(sink))
    })
    .await;
    run_response(result)
}

/// Mesma ordem de validação de `Orchestrator::run_backward`: meta, depois observações.
fn backward_check(state: &AppState, goal: &str, labels: &[String]) -> Result<(), InferenceError> {
    resolve_goal(&state.kb, goal)?;
    observe_labels(&state.kb, labels).map(drop)
}

/// Query `?session=<uuid>` usada por `/history`.
#[derive(Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

/// Query obrigatória de `/events`: sem sessão válida o Axum responde 400.
#[derive(Deserialize)]
pub struct EventsQuery {
    pub session: Uuid,
}

/// GET `/history` — Execuções anteriores da sessão.
///
/// Sessão inexistente (ainda sem execuções) renderiza a lista vazia.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Html<String> {
    let id = session_or_new(query.session.as_deref());
    let markup = match state.sessions.get(id) {
        Some(shared) => {
            let session = shared.lock();
            templates::history_fragment(session.history())
        }
        None => templates::history_fragment(std::iter::empty()),
    };
    markup_to_html(markup)
}

/// POST `/session/reset` — Limpa o histórico da sessão.
pub async fn reset_session(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let id = session_or_new(fields.get("session").map(String::as_str));
    if let Some(shared) = state.sessions.get(id) {
        shared.lock().reset();
        tracing::info!(session = %id, "Histórico resetado pelo usuário");
    }
    markup_to_html(templates::history_fragment(std::iter::empty()))
}

/// GET `/events` — Stream SSE de eventos de inferência.
///
/// `?session=<uuid>` é obrigatório: só os eventos daquela sessão são
/// repassados. Assinantes lentos perdem mensagens atrasadas (filter_map
/// retorna None).
pub async fn sse_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>> {
    let only = query.session.to_string();
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let only = only.clone();
        async move {
            let event = result.ok()?;
            if event.session() != only {
                return None;
            }
            let data = serde_json::to_string(&event).ok()?;
            Some(Ok(SseEvent::default().data(data)))
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// GET `/api/knowledge` — Vocabulário, regras numeradas e metas.
pub async fn api_knowledge(State(state): State<AppState>) -> Json<serde_json::Value> {
    let kb = &state.kb;
    Json(json!({
        "facts": kb.all_facts(),
        "rules": numbered(kb.all_rules()).collect::<Vec<_>>(),
        "goals": kb.all_goals(),
    }))
}

/// Corpo de `POST /api/forward`.
#[derive(Deserialize)]
pub struct ForwardRequest {
    pub session: Option<Uuid>,
    #[serde(default)]
    pub observations: Vec<String>,
}

/// Corpo de `POST /api/backward`.
#[derive(Deserialize)]
pub struct BackwardRequest {
    pub session: Option<Uuid>,
    pub goal: String,
    #[serde(default)]
    pub observations: Vec<String>,
}

/// Resposta das rotas de execução JSON.
#[derive(Serialize)]
pub struct RunResponse {
    pub session: Uuid,
    pub run: RunRecord,
}

/// POST `/api/forward` — Forward chaining via JSON.
pub async fn api_forward(
    State(state): State<AppState>,
    Json(req): Json<ForwardRequest>,
) -> Result<Json<RunResponse>, RunFailure> {
    let session = req.session.unwrap_or_else(Uuid::new_v4);
    let labels = req.observations;
    let check = observe_labels(&state.kb, &labels).map(drop);
    let run = run_in_session(&state, session, RunKind::Forward, check, move |o, sink| {
        o.run_forward(&labels, Some(sink))
    })
    .await?;
    Ok(Json(RunResponse { session, run }))
}

/// POST `/api/backward` — Backward chaining via JSON.
pub async fn api_backward(
    State(state): State<AppState>,
    Json(req): Json<BackwardRequest>,
) -> Result<Json<RunResponse>, RunFailure> {
    let session = req.session.unwrap_or_else(Uuid::new_v4);
    let BackwardRequest {
        goal, observations, ..
    } = req;
    let check = backward_check(&state, &goal, &observations);
    let run = run_in_session(&state, session, RunKind::Backward, check, move |o, sink| {
        o.run_backward(&goal, &observations, Some(sink))
    })
    .await?;
    Ok(Json(RunResponse { session, run }))
}
