//! # Estado da Aplicação Web
//!
//! Define as structs de estado compartilhado entre todos os handlers Axum.
//!
//! ## Uma Sessão por Usuário
//!
//! ```text
//! AppState
//!  ├── kb: Arc<KnowledgeBase>            (imutável, sem lock)
//!  ├── sessions: SessionRegistry
//!  │    └── Uuid → Arc<Mutex<Orchestrator>>   (criada na 1ª execução)
//!  └── events_tx: broadcast::Sender<InferenceEvent>  (SSE)
//! ```
//!
//! O registro é limitado: ao criar uma sessão além de `max_sessions`, a
//! sessão ociosa há mais tempo é descartada. Se todas estiverem no meio de
//! uma execução, a criação é recusada e o registro nunca passa do limite.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::KnowledgeBase;
use crate::orchestrator::Orchestrator;
use crate::web::events::InferenceEvent;

/// Sessão compartilhada entre o handler e a task bloqueante que roda o motor.
pub type SharedSession = Arc<Mutex<Orchestrator>>;

/// Registro de sessões ativas, indexado pelo UUID da sessão.
pub struct SessionRegistry {
    kb: Arc<KnowledgeBase>,
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    history_limit: usize,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(kb: Arc<KnowledgeBase>, history_limit: usize, max_sessions: usize) -> Self {
        Self {
            kb,
            sessions: RwLock::new(HashMap::new()),
            history_limit,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Sessão existente, se houver.
    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().get(&id).cloned()
    }

    /// Sessão existente ou uma nova com este UUID.
    ///
    /// `None` quando o registro está cheio e nenhuma sessão pode ser
    /// descartada (todas com execução em andamento).
    pub fn get_or_create(&self, id: Uuid) -> Option<SharedSession> {
        if let Some(session) = self.get(id) {
            return Some(session);
        }

        let mut sessions = self.sessions.write();
        // outra request pode ter criado entre o read e o write
        if let Some(session) = sessions.get(&id) {
            return Some(session.clone());
        }
        if sessions.len() >= self.max_sessions && !evict_idlest(&mut sessions) {
            tracing::warn!(session = %id, total = sessions.len(), "Registro cheio, sessão recusada");
            return None;
        }
        let session = Arc::new(Mutex::new(Orchestrator::with_id(
            id,
            self.kb.clone(),
            self.history_limit,
        )));
        sessions.insert(id, session.clone());
        tracing::debug!(session = %id, total = sessions.len(), "Sessão criada");
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Remove a sessão com `last_active` mais antigo.
///
/// Sessões com execução em andamento (mutex ocupado) não são candidatas.
/// Retorna `false` se nenhuma sessão pôde sair.
fn evict_idlest(sessions: &mut HashMap<Uuid, SharedSession>) -> bool {
    let idlest = sessions
        .iter()
        .filter_map(|(id, s)| s.try_lock().map(|o| (*id, o.last_active())))
        .min_by_key(|(_, last_active)| *last_active)
        .map(|(id, _)| id);
    match idlest {
        Some(id) => {
            sessions.remove(&id);
            tracing::info!(session = %id, "Sessão ociosa descartada");
            true
        }
        None => false,
    }
}

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    /// Base de conhecimento, construída uma vez no início do processo.
    pub kb: Arc<KnowledgeBase>,
    /// Sessões de inferência por usuário.
    pub sessions: Arc<SessionRegistry>,
    /// Canal broadcast para eventos SSE de trace.
    pub events_tx: Arc<broadcast::Sender<InferenceEvent>>,
}

impl AppState {
    pub fn new(kb: Arc<KnowledgeBase>, config: &AppConfig) -> Self {
        // Consumidores lentos perdem as mensagens mais antigas.
        let (events_tx, _) = broadcast::channel(config.events_capacity);
        Self {
            sessions: Arc::new(SessionRegistry::new(
                kb.clone(),
                config.history_limit,
                config.max_sessions,
            )),
            kb,
            events_tx: Arc::new(events_tx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(max_sessions: usize) -> SessionRegistry {
        SessionRegistry::new(Arc::new(KnowledgeBase::marine()), 5, max_sessions)
    }

    #[test]
    fn same_id_returns_same_session() {
        let reg = registry(4);
        let id = Uuid::new_v4();
        let a = reg.get_or_create(id).unwrap();
        let b = reg.get_or_create(id).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.lock().id(), id);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn registry_evicts_the_idlest_session() {
        let reg = registry(2);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        reg.get_or_create(first);
        reg.get_or_create(second);
        // a segunda sessão fica mais recente
        reg.get_or_create(second)
            .unwrap()
            .lock()
            .run_forward(&[], None)
            .unwrap();

        assert!(reg.get_or_create(Uuid::new_v4()).is_some());
        assert_eq!(reg.len(), 2);
        assert!(reg.get(first).is_none());
        assert!(reg.get(second).is_some());
    }

    #[test]
    fn full_registry_of_busy_sessions_refuses_new_ones() {
        let reg = registry(1);
        let busy = Uuid::new_v4();
        let shared = reg.get_or_create(busy).unwrap();
        let running = shared.lock();

        assert!(reg.get_or_create(Uuid::new_v4()).is_none());
        assert_eq!(reg.len(), 1);
        assert!(reg.get(busy).is_some());
        // a sessão já existente continua acessível
        assert!(reg.get_or_create(busy).is_some());

        drop(running);
        assert!(reg.get_or_create(Uuid::new_v4()).is_some());
        assert_eq!(reg.len(), 1);
    }
}
