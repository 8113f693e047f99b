//! # Módulo Core — Tipos Fundamentais do Domínio
//!
//! Este módulo agrupa os **tipos fundamentais** sobre os quais os dois
//! motores de inferência operam:
//!
//! - [`Fact`] — Rótulo atômico do vocabulário fechado (ex: "Color: Blue")
//! - [`FactSet`] — Memória de trabalho (conjunto ordenado de fatos)
//! - [`Rule`] — Implicação de pré-requisitos ordenados para uma conclusão
//! - [`KnowledgeBase`] — Vocabulário, regras e metas, imutáveis após construção
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use crate::core::{fact_set, KnowledgeBase};
//!
//! let kb = KnowledgeBase::marine();
//! let observed = fact_set(["Color: Blue", "Body Shape: Oval"]);
//! let rule = &kb.all_rules()[0];
//! assert!(!rule.is_satisfied_by(&observed));
//! ```

/// Sub-módulo com [`Fact`], [`FactSet`] e os prefixos terminais.
pub mod fact;

/// Sub-módulo com [`Rule`] e a numeração 1-based.
pub mod rule;

/// Sub-módulo com a [`KnowledgeBase`] marinha.
pub mod knowledge_base;

// Re-exports: permite usar `crate::core::Fact` diretamente.
pub use fact::{fact_set, Fact, FactSet};
pub use knowledge_base::KnowledgeBase;
pub use rule::Rule;
