//! # Orquestrador — A Sessão de Identificação Marinha
//!
//! O [`Orchestrator`] é a **fronteira** entre a apresentação e os motores.
//! Cada sessão de usuário tem a sua instância — não existe janela ou
//! estado global compartilhado entre sessões.
//!
//! ## O Ciclo de uma Execução
//!
//! ```text
//! Rótulos marcados pelo usuário
//!   │
//!   ├── 1. 🧭 VALIDAÇÃO (observe)
//!   │   └── rótulo fora do vocabulário → InferenceError (nenhum motor roda)
//!   │
//!   ├── 2. 📜 ABERTURA do transcript
//!   │   └── "--- Starting ... ---" + "Initial Observations: ..."
//!   │
//!   ├── 3. ⚙️ MOTOR (forward_chain / backward_chain)
//!   │   └── cada decisão vira uma linha, repassada ao sink em tempo real
//!   │
//!   ├── 4. 🏁 FECHAMENTO do transcript
//!   │   └── "--- ... FINISHED ---"
//!   │
//!   └── 5. 🗂️ HISTÓRICO
//!       └── RunRecord guardado (limite configurável, mais antigo sai primeiro)
//! ```
//!
//! ## Concorrência
//!
//! Os motores são puros; o orquestrador só guarda o histórico da sessão.
//! A camada web o mantém atrás de um `parking_lot::Mutex`, o que também
//! serializa as execuções de uma mesma sessão.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::{Fact, FactSet, KnowledgeBase, Rule};
use crate::error::InferenceError;
use crate::inference::{backward_chain, forward_chain, TraceSink};

/// Tipo de execução de inferência.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunKind {
    Forward,
    Backward,
}

impl RunKind {
    /// Título usado nas linhas de abertura e fechamento do transcript.
    pub fn title(&self) -> &'static str {
        match self {
            RunKind::Forward => "FORWARD CHAINING (BFS Rule Traversal)",
            RunKind::Backward => "BACKWARD CHAINING (DFS Rule Traversal)",
        }
    }

    /// Label curto para a interface.
    pub fn label(&self) -> &'static str {
        match self {
            RunKind::Forward => "Forward Chaining",
            RunKind::Backward => "Backward Chaining",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            RunKind::Forward => "forward",
            RunKind::Backward => "backward",
        }
    }
}

/// Registro completo de uma execução, pronto para exibição ou JSON.
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Observações validadas, na ordem do vocabulário.
    pub observations: Vec<Fact>,
    /// Meta do backward chaining (`None` no forward).
    pub goal: Option<Fact>,
    /// Texto do veredito (ex: `"Species: Flounder"`, `"Goal 'X' is PROVEN."`).
    pub verdict: String,
    /// `true` se classificou (forward) ou provou a meta (backward).
    pub success: bool,
    /// Abertura + trace do motor + fechamento, na ordem emitida.
    pub transcript: Vec<String>,
}

/// Veredito bruto devolvido por um motor: (texto, sucesso, trace).
type EngineVerdict = (String, bool, Vec<String>);

/// Sink interno: guarda o transcript e repassa cada linha ao sink do chamador.
struct Transcript<'s> {
    lines: Vec<String>,
    sink: Option<&'s mut dyn TraceSink>,
}

impl TraceSink for Transcript<'_> {
    fn emit(&mut self, line: &str) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.emit(line);
        }
        self.lines.push(line.to_string());
    }
}

/// Valida rótulos observados contra o vocabulário de `kb`.
///
/// Não depende de sessão: a camada web valida antes de criar uma.
/// Ver [`Orchestrator::observe`].
pub fn observe_labels(kb: &KnowledgeBase, labels: &[String]) -> Result<Vec<Fact>, InferenceError> {
    let mut observed = BTreeSet::new();
    for label in labels {
        let fact = kb
            .resolve_fact(label)
            .filter(|f| kb.all_facts().contains(f))
            .ok_or_else(|| InferenceError::UnknownFact(label.clone()))?;
        observed.insert(fact);
    }
    Ok(kb
        .all_facts()
        .iter()
        .filter(|f| observed.contains(f))
        .cloned()
        .collect())
}

/// Meta canônica de backward chaining, ou [`InferenceError::UnknownGoal`].
pub fn resolve_goal(kb: &KnowledgeBase, goal: &str) -> Result<Fact, InferenceError> {
    kb.resolve_fact(goal)
        .filter(|f| kb.is_goal(f))
        .cloned()
        .ok_or_else(|| InferenceError::UnknownGoal(goal.to_string()))
}

/// Sessão de inferência de um usuário.
pub struct Orchestrator {
    id: Uuid,
    /// Base de conhecimento compartilhada (imutável, sem lock).
    kb: Arc<KnowledgeBase>,
    /// Execuções passadas, mais antiga primeiro.
    history: VecDeque<RunRecord>,
    history_limit: usize,
    last_active: DateTime<Utc>,
}

impl Orchestrator {
    /// Cria uma sessão nova, com histórico vazio.
    pub fn new(kb: Arc<KnowledgeBase>, history_limit: usize) -> Self {
        Self::with_id(Uuid::new_v4(), kb, history_limit)
    }

    /// Cria uma sessão com identificador escolhido pelo chamador.
    ///
    /// A camada web gera o UUID ao renderizar a página e só materializa
    /// a sessão na primeira execução.
    pub fn with_id(id: Uuid, kb: Arc<KnowledgeBase>, history_limit: usize) -> Self {
        Self {
            id,
            kb,
            history: VecDeque::new(),
            history_limit: history_limit.max(1),
            last_active: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Momento da última execução (ou da criação). Usado para despejo de sessões.
    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Valida rótulos observados contra o vocabulário.
    ///
    /// Rótulos repetidos colapsam; o retorno segue a ordem do vocabulário,
    /// não a ordem de envio (formulários HTML não garantem ordem).
    ///
    /// # Erros
    ///
    /// [`InferenceError::UnknownFact`] no primeiro rótulo desconhecido.
    pub fn observe(&self, labels: &[String]) -> Result<Vec<Fact>, InferenceError> {
        observe_labels(&self.kb, labels)
    }

    /// Executa forward chaining sobre as observações marcadas.
    ///
    /// O sink recebe, em ordem: abertura, cada disparo, fechamento.
    pub fn run_forward(
        &mut self,
        labels: &[String],
        sink: Option<&mut dyn TraceSink>,
    ) -> Result<RunRecord, InferenceError> {
        let observations = self.observe(labels).inspect_err(|e| {
            tracing::warn!(error = %e, "Forward chaining rejeitado na borda");
        })?;

        Ok(self.execute(
            RunKind::Forward,
            observations,
            None,
            sink,
            |rules, facts, sink| {
                let outcome = forward_chain(rules, facts, sink);
                (
                    outcome.result.label().to_string(),
                    outcome.result.is_classified(),
                    outcome.trace,
                )
            },
        ))
    }

    /// Executa backward chaining para `goal` sobre as observações marcadas.
    ///
    /// # Erros
    ///
    /// - [`InferenceError::UnknownGoal`] se `goal` não está em `all_goals()`
    /// - [`InferenceError::UnknownFact`] se alguma observação é desconhecida
    pub fn run_backward(
        &mut self,
        goal: &str,
        labels: &[String],
        sink: Option<&mut dyn TraceSink>,
    ) -> Result<RunRecord, InferenceError> {
        let (target, observations) =
            self.validate_backward(goal, labels).inspect_err(|e| {
                tracing::warn!(error = %e, "Backward chaining rejeitado na borda");
            })?;

        let engine_goal = target.clone();
        Ok(self.execute(
            RunKind::Backward,
            observations,
            Some(target),
            sink,
            move |rules, facts, sink| {
                let outcome = backward_chain(rules, &engine_goal, facts, sink);
                let verdict = format!(
                    "Goal '{}' is {}.",
                    engine_goal,
                    if outcome.proven { "PROVEN" } else { "NOT PROVEN" }
                );
                (verdict, outcome.proven, outcome.trace)
            },
        ))
    }

    /// Execuções da sessão, mais antiga primeiro.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &RunRecord> + '_ {
        self.history.iter()
    }

    /// Limpa o histórico da sessão.
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_active = Utc::now();
    }

    fn validate_backward(
        &self,
        goal: &str,
        labels: &[String],
    ) -> Result<(Fact, Vec<Fact>), InferenceError> {
        Ok((resolve_goal(&self.kb, goal)?, self.observe(labels)?))
    }

    /// Enquadra uma execução de motor: abertura, motor, fechamento, histórico.
    fn execute<F>(
        &mut self,
        kind: RunKind,
        observations: Vec<Fact>,
        goal: Option<Fact>,
        sink: Option<&mut dyn TraceSink>,
        engine: F,
    ) -> RunRecord
    where
        F: FnOnce(&[Rule], &FactSet, Option<&mut dyn TraceSink>) -> EngineVerdict,
    {
        let started_at = Utc::now();
        let t0 = Instant::now();
        let mut transcript = Transcript {
            lines: Vec::new(),
            sink,
        };

        let listed = if observations.is_empty() {
            "None".to_string()
        } else {
            observations
                .iter()
                .map(Fact::label)
                .collect::<Vec<_>>()
                .join(", ")
        };
        transcript.emit(&format!("--- Starting {} ---", kind.title()));
        transcript.emit(&format!("Initial Observations: {listed}"));
        transcript.emit("");

        let facts: FactSet = observations.iter().cloned().collect();
        let (verdict, success, trace) =
            engine(self.kb.all_rules(), &facts, Some(&mut transcript));
        let engine_lines = trace.len();

        transcript.emit("");
        transcript.emit(&format!("--- {} FINISHED ---", kind.title()));

        let record = RunRecord {
            id: Uuid::new_v4(),
            kind,
            started_at,
            elapsed_ms: t0.elapsed().as_millis() as u64,
            observations,
            goal,
            verdict,
            success,
            transcript: transcript.lines,
        };
        tracing::info!(
            session = %self.id,
            run = %record.id,
            kind = ?kind,
            success,
            lines = engine_lines,
            verdict = %record.verdict,
            "Execução concluída"
        );

        self.last_active = Utc::now();
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(record.clone());
        record
    }
}
