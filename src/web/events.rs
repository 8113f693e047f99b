//! # Eventos SSE de Inferência
//!
//! Define o enum [`InferenceEvent`] — cada linha de trace emitida por um
//! motor é publicada em tempo real no canal broadcast e chega ao navegador
//! via Server-Sent Events.
//!
//! ## Ciclo de Vida dos Eventos
//!
//! ```text
//! Started → Line* → Finished
//!                 ou → Rejected
//! ```
//!
//! ## Serialização
//!
//! Usa `#[serde(tag = "type")]` para produzir JSON com discriminador:
//!
//! ```json
//! { "type": "Line", "session": "uuid", "seq": 3, "text": "[FC/BFS] Rule 2 Matched: ..." }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::inference::TraceSink;

/// Evento emitido durante uma execução, enviado via SSE ao frontend.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum InferenceEvent {
    /// Execução aceita e prestes a rodar.
    Started {
        /// UUID da sessão dona da execução.
        session: String,
        /// "Forward Chaining" ou "Backward Chaining".
        kind: String,
        /// Título completo (ex: "FORWARD CHAINING (BFS Rule Traversal)").
        title: String,
    },

    /// Uma linha do transcript, na ordem exata de emissão.
    Line {
        session: String,
        /// Posição da linha no transcript (0-indexed).
        seq: usize,
        text: String,
    },

    /// Execução concluída, com o veredito final.
    Finished {
        session: String,
        /// UUID do [`RunRecord`](crate::orchestrator::RunRecord) gravado no histórico.
        run_id: String,
        verdict: String,
        success: bool,
        elapsed_ms: u64,
    },

    /// Entrada rejeitada na borda (rótulo ou meta desconhecidos).
    Rejected { session: String, message: String },
}

impl InferenceEvent {
    /// Sessão à qual o evento pertence (filtro do `/events`).
    pub fn session(&self) -> &str {
        match self {
            InferenceEvent::Started { session, .. }
            | InferenceEvent::Line { session, .. }
            | InferenceEvent::Finished { session, .. }
            | InferenceEvent::Rejected { session, .. } => session,
        }
    }
}

/// [`TraceSink`] que publica cada linha no canal broadcast.
///
/// Envio sem assinantes falha silenciosamente; o transcript completo
/// continua no `RunRecord` devolvido ao handler.
pub struct BroadcastSink {
    tx: Arc<broadcast::Sender<InferenceEvent>>,
    session: String,
    seq: usize,
}

impl BroadcastSink {
    pub fn new(tx: Arc<broadcast::Sender<InferenceEvent>>, session: Uuid) -> Self {
        Self {
            tx,
            session: session.to_string(),
            seq: 0,
        }
    }
}

impl TraceSink for BroadcastSink {
    fn emit(&mut self, line: &str) {
        let _ = self.tx.send(InferenceEvent::Line {
            session: self.session.clone(),
            seq: self.seq,
            text: line.to_string(),
        });
        self.seq += 1;
    }
}
