//! # KnowledgeBase — Vocabulário e Regras do Sistema Especialista Marinho
//!
//! A [`KnowledgeBase`] é o **dado estático** compartilhado pelos dois motores
//! de inferência. Ela é construída uma única vez no início do processo e
//! depois só é lida — nenhum método recebe `&mut self`.
//!
//! ## Conteúdo
//!
//! | Campo | Tipo | Descrição |
//! |-------|------|-----------|
//! | `facts` | `Vec<Fact>` | Vocabulário fechado de observações, na ordem declarada |
//! | `rules` | `Vec<Rule>` | Regras numeradas (posição 1-based) |
//! | `goals` | `Vec<Fact>` | Conclusões distintas, ordenadas lexicograficamente |
//!
//! ## Compartilhamento
//!
//! No servidor ela vive em um `Arc<KnowledgeBase>` sem lock algum: como
//! nunca é mutada após a construção, leituras concorrentes são seguras.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! let kb = KnowledgeBase::marine();
//! assert_eq!(kb.all_goals()[0].label(), "Condition: Bleaching");
//! let fact = kb.resolve_fact("  color: blue ");
//! assert_eq!(fact.map(|f| f.label()), Some("Color: Blue"));
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use super::fact::Fact;
use super::rule::Rule;

/// Vocabulário observável, na ordem em que aparece no deck de observação.
const MARINE_FACTS: [&str; 14] = [
    "Color: Blue",
    "Color: Yellow",
    "Color: Red/White",
    "Body Shape: Flattened",
    "Body Shape: Oval",
    "Body Shape: Tube-like",
    "Fins: Spiky",
    "Fins: Large Fan",
    "Fins: Caudal Forked",
    "Habitat: Coral Reef",
    "Habitat: Sandy Bottom",
    "Habitat: Open Ocean",
    "Color: White/Pale",
    "Temp: High",
];

/// Regras de identificação: `(conclusão, pré-requisitos)`.
const MARINE_RULES: [(&str, &[&str]); 5] = [
    (
        "Species: Blue Tang",
        &["Color: Blue", "Body Shape: Oval", "Habitat: Coral Reef"],
    ),
    (
        "Species: Flounder",
        &["Body Shape: Flattened", "Habitat: Sandy Bottom"],
    ),
    (
        "Species: Lionfish",
        &["Color: Red/White", "Fins: Spiky", "Habitat: Coral Reef"],
    ),
    (
        "Species: Seahorse",
        &["Body Shape: Tube-like", "Fins: Large Fan", "Habitat: Coral Reef"],
    ),
    (
        "Condition: Bleaching",
        &["Color: White/Pale", "Habitat: Coral Reef", "Temp: High"],
    ),
];

/// Base de conhecimento imutável: fatos, regras e metas derivadas.
#[derive(Clone, Debug, Serialize)]
pub struct KnowledgeBase {
    facts: Vec<Fact>,
    rules: Vec<Rule>,
    /// Conclusões distintas, ordenadas. Derivado de `rules` na construção.
    goals: Vec<Fact>,
}

impl KnowledgeBase {
    /// Constrói uma KB a partir de vocabulário e regras arbitrários.
    ///
    /// O conjunto de metas é derivado aqui: conclusões distintas em ordem
    /// lexicográfica. Usado diretamente pelos testes para montar bases
    /// pequenas (ex: regras cíclicas).
    pub fn new(facts: Vec<Fact>, rules: Vec<Rule>) -> Self {
        let goals: BTreeSet<Fact> = rules.iter().map(|r| r.conclusion.clone()).collect();
        Self {
            facts,
            rules,
            goals: goals.into_iter().collect(),
        }
    }

    /// A base marinha de demonstração: 14 observações e 5 regras.
    pub fn marine() -> Self {
        let facts = MARINE_FACTS.iter().copied().map(Fact::from).collect();
        let rules = MARINE_RULES
            .iter()
            .map(|(conclusion, requires)| Rule::new(*conclusion, requires.iter().copied()))
            .collect();
        let kb = Self::new(facts, rules);
        tracing::debug!(
            facts = kb.facts.len(),
            rules = kb.rules.len(),
            goals = kb.goals.len(),
            "KB marinha construída"
        );
        kb
    }

    /// Vocabulário observável, na ordem declarada.
    pub fn all_facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Regras na ordem declarada (regra N = índice N-1).
    pub fn all_rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Conclusões distintas, ordenadas: as metas possíveis do backward chaining.
    pub fn all_goals(&self) -> &[Fact] {
        &self.goals
    }

    /// `true` se o fato é conclusão de alguma regra.
    pub fn is_goal(&self, fact: &Fact) -> bool {
        self.goals.binary_search(fact).is_ok()
    }

    /// Resolve um rótulo vindo da borda (formulário, JSON) para o fato canônico.
    ///
    /// Um rótulo idêntico a uma entrada sempre resolve para ela. Só sem
    /// correspondência exata entram `trim`, normalização Unicode NFC e
    /// comparação case-insensitive, e apenas quando apontam para uma única
    /// entrada: rótulos que diferem só por caixa exigem o texto exato.
    ///
    /// # Retorno
    ///
    /// - `Some(&Fact)` — entrada canônica do vocabulário ou das metas
    /// - `None` — rótulo desconhecido ou ambíguo; o chamador deve rejeitar
    pub fn resolve_fact(&self, label: &str) -> Option<&Fact> {
        let mut entries = self.facts.iter().chain(self.goals.iter());
        if let Some(exact) = entries.clone().find(|f| f.label() == label) {
            return Some(exact);
        }

        let wanted = normalize_label(label);
        let first = entries.find(|f| normalize_label(f.label()) == wanted)?;
        let ambiguous = entries.any(|f| f != first && normalize_label(f.label()) == wanted);
        (!ambiguous).then_some(first)
    }

    /// Fatos agrupados por categoria, preservando a ordem de primeira aparição.
    ///
    /// Usado pelo template do deck de observação para montar os grupos
    /// de checkboxes (`Color`, `Body Shape`, ...).
    pub fn facts_by_category(&self) -> Vec<(&str, Vec<&Fact>)> {
        let mut groups: Vec<(&str, Vec<&Fact>)> = Vec::new();
        for fact in &self.facts {
            let category = fact.category().unwrap_or("Other");
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, members)) => members.push(fact),
                None => groups.push((category, vec![fact])),
            }
        }
        groups
    }
}

/// Forma canônica de comparação: NFC, sem espaços nas bordas, minúsculas.
fn normalize_label(label: &str) -> String {
    label.trim().nfc().collect::<String>().to_lowercase()
}
