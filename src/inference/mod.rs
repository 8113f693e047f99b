//! # Módulo Inference — Motores de Encadeamento
//!
//! Dois motores **sem estado** operam sobre a mesma base de regras
//! imutável. Ambos são funções puras de (fatos, regras) que, além do
//! veredito, narram cada decisão em um trace ordenado.
//!
//! ## Motores
//!
//! | Motor | Direção | Busca | Resultado |
//! |-------|---------|-------|-----------|
//! | [`forward_chain`] | Dados → conclusão | Passadas em largura até ponto fixo | [`ForwardResult`] |
//! | [`backward_chain`] | Meta → dados | Profundidade, primeira regra apenas | `bool` |
//!
//! ## Exemplo
//!
//! ```text
//! Observações: Body Shape: Flattened, Habitat: Sandy Bottom
//! Forward:  [FC/BFS] Rule 2 Matched: IF (...) THEN Species: Flounder
//! Backward: Species: Flounder → PROVEN by Rule 2
//! ```

/// Sub-módulo com o motor de backward chaining.
pub mod backward;

/// Sub-módulo com o motor de forward chaining.
pub mod forward;

/// Sub-módulo com o [`TraceSink`] e o coletor de trace.
pub mod trace;

pub use backward::{backward_chain, BackwardOutcome};
pub use forward::{forward_chain, ForwardOutcome, ForwardResult, UNDETERMINED_LABEL};
pub use trace::TraceSink;
