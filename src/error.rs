//! # Erros de Borda
//!
//! Os motores nunca falham: "não classificado" e "não provado" são
//! resultados de domínio. O que pode falhar é a **entrada** vinda da
//! apresentação — rótulos fora do vocabulário fechado. Essa rejeição
//! acontece no [`Orchestrator`](crate::orchestrator::Orchestrator), antes
//! de qualquer motor rodar.

use thiserror::Error;

/// Rejeições de entrada na fronteira entre apresentação e motores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// Observação que não pertence ao vocabulário.
    #[error("unknown fact: {0:?}")]
    UnknownFact(String),

    /// Meta que não é conclusão de nenhuma regra.
    #[error("unknown goal: {0:?}")]
    UnknownGoal(String),
}
