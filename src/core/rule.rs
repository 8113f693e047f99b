//! # Rule — Implicação de Pré-requisitos para uma Conclusão
//!
//! Uma [`Rule`] liga uma sequência **ordenada** de fatos requeridos a um
//! único fato concluído:
//!
//! ```text
//! Regra 2: IF (Body Shape: Flattened AND Habitat: Sandy Bottom) THEN Species: Flounder
//! ```
//!
//! A numeração das regras é a posição 1-based na base de regras. Ela só
//! aparece nos traces e desempata por ordem de declaração — não carrega
//! nenhuma outra semântica.

use serde::{Deserialize, Serialize};

use super::fact::{Fact, FactSet};

/// Regra de produção: `requires` (em ordem) ⇒ `conclusion`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Fato concluído quando todos os pré-requisitos valem.
    pub conclusion: Fact,
    /// Pré-requisitos na ordem declarada (a ordem dirige o backward chaining).
    pub requires: Vec<Fact>,
}

impl Rule {
    pub fn new<I, S>(conclusion: impl Into<String>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            conclusion: Fact::new(conclusion),
            requires: requires.into_iter().map(Fact::new).collect(),
        }
    }

    /// `true` se todos os pré-requisitos estão em `known`.
    pub fn is_satisfied_by(&self, known: &FactSet) -> bool {
        self.requires.iter().all(|fact| known.contains(fact))
    }

    /// Pré-requisitos unidos por `" AND "`, como aparecem nos traces.
    pub fn premises(&self) -> String {
        self.requires
            .iter()
            .map(Fact::label)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Descrição legível `IF (A AND B) THEN C`.
    pub fn describe(&self) -> String {
        format!("IF ({}) THEN {}", self.premises(), self.conclusion)
    }
}

/// Visão numerada de uma regra, usada na API JSON e nos templates.
#[derive(Clone, Debug, Serialize)]
pub struct NumberedRule<'a> {
    /// Posição 1-based na base de regras.
    pub number: usize,
    #[serde(flatten)]
    pub rule: &'a Rule,
}

/// Enumera regras com seus números 1-based.
pub fn numbered(rules: &[Rule]) -> impl Iterator<Item = NumberedRule<'_>> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| NumberedRule { number: i + 1, rule })
}
