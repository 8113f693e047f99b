//! # Forward Chaining — Inferência Dirigida por Dados
//!
//! Dispara regras a partir das observações até chegar a uma classificação
//! terminal ou a um ponto fixo.
//!
//! ## Algoritmo (passadas completas em ordem de declaração)
//!
//! ```text
//! known := observações iniciais
//! repita:
//!   disparou := false
//!   para cada regra (conclusão, requisitos), na ordem:
//!     se conclusão ∈ known: pula           (disparo idempotente)
//!     se requisitos ⊆ known:
//!       trace "Rule N Matched"; known += conclusão; disparou := true
//!       se conclusão é terminal: RETORNA conclusão   (curto-circuito)
//!   se !disparou: RETORNA Undetermined             (ponto fixo)
//! ```
//!
//! ## Terminação
//!
//! Cada passada sem terminal ou adiciona ao menos um fato novo ou encerra.
//! Como uma regra nunca dispara duas vezes, há no máximo `len(rules)`
//! passadas com disparo, mais a passada final vazia.

use std::fmt;

use serde::Serialize;

use super::trace::{TraceSink, Tracer};
use crate::core::{Fact, FactSet, Rule};

/// Rótulo exibido quando nenhuma classificação terminal é alcançada.
pub const UNDETERMINED_LABEL: &str = "Species: Unknown / Condition: Undetermined";

/// Veredito do forward chaining.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "label")]
pub enum ForwardResult {
    /// Primeira conclusão terminal alcançada na ordem de varredura.
    Classified(Fact),
    /// Ponto fixo sem classificação terminal.
    Undetermined,
}

impl ForwardResult {
    pub fn is_classified(&self) -> bool {
        matches!(self, ForwardResult::Classified(_))
    }

    pub fn label(&self) -> &str {
        match self {
            ForwardResult::Classified(fact) => fact.label(),
            ForwardResult::Undetermined => UNDETERMINED_LABEL,
        }
    }
}

impl fmt::Display for ForwardResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resultado completo de uma execução de forward chaining.
#[derive(Clone, Debug)]
pub struct ForwardOutcome {
    pub result: ForwardResult,
    /// Uma linha por disparo, na ordem de disparo.
    pub trace: Vec<String>,
    /// Número de regras disparadas.
    pub fired: usize,
    /// Passadas iniciadas sobre a base de regras (inclui a passada final vazia).
    pub passes: usize,
    /// Memória de trabalho final: observações + conclusões derivadas.
    pub known: FactSet,
}

/// Executa o forward chaining sobre `rules` a partir de `initial`.
///
/// `initial` nunca é modificado; o motor trabalha sobre uma cópia.
/// Cada disparo chama `sink` de forma síncrona com exatamente uma linha.
pub fn forward_chain(
    rules: &[Rule],
    initial: &FactSet,
    sink: Option<&mut dyn TraceSink>,
) -> ForwardOutcome {
    let mut known = initial.clone();
    let mut tracer = Tracer::new(sink);
    let mut fired = 0;
    let mut passes = 0;

    loop {
        passes += 1;
        let mut fired_this_pass = false;

        for (i, rule) in rules.iter().enumerate() {
            if known.contains(&rule.conclusion) || !rule.is_satisfied_by(&known) {
                continue;
            }

            tracer.emit(format!(
                "[FC/BFS] Rule {} Matched: IF ({}) THEN {}",
                i + 1,
                rule.premises(),
                rule.conclusion
            ));
            known.insert(rule.conclusion.clone());
            fired += 1;
            fired_this_pass = true;

            if rule.conclusion.is_terminal() {
                tracing::debug!(fired, passes, conclusion = %rule.conclusion, "FC: classificação terminal");
                return ForwardOutcome {
                    result: ForwardResult::Classified(rule.conclusion.clone()),
                    trace: tracer.into_lines(),
                    fired,
                    passes,
                    known,
                };
            }
        }

        if !fired_this_pass {
            break;
        }
    }

    tracing::debug!(fired, passes, "FC: ponto fixo sem classificação");
    ForwardOutcome {
        result: ForwardResult::Undetermined,
        trace: tracer.into_lines(),
        fired,
        passes,
        known,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{fact_set, KnowledgeBase};

    fn marine_rules() -> Vec<Rule> {
        KnowledgeBase::marine().all_rules().to_vec()
    }

    #[test]
    fn blue_tang_after_exactly_one_firing() {
        let rules = marine_rules();
        let facts = fact_set(["Color: Blue", "Body Shape: Oval", "Habitat: Coral Reef"]);
        let out = forward_chain(&rules, &facts, None);
        assert_eq!(out.result, ForwardResult::Classified(Fact::from("Species: Blue Tang")));
        assert_eq!(out.fired, 1);
        assert_eq!(
            out.trace,
            vec![
                "[FC/BFS] Rule 1 Matched: IF (Color: Blue AND Body Shape: Oval AND Habitat: Coral Reef) THEN Species: Blue Tang"
            ]
        );
    }

    #[test]
    fn empty_observations_are_undetermined_with_zero_firings() {
        let out = forward_chain(&marine_rules(), &FactSet::new(), None);
        assert_eq!(out.result, ForwardResult::Undetermined);
        assert_eq!(out.result.to_string(), UNDETERMINED_LABEL);
        assert_eq!(out.fired, 0);
        assert!(out.trace.is_empty());
        assert_eq!(out.passes, 1);
    }

    #[test]
    fn flounder_from_flattened_sandy_bottom() {
        let facts = fact_set(["Body Shape: Flattened", "Habitat: Sandy Bottom"]);
        let out = forward_chain(&marine_rules(), &facts, None);
        assert_eq!(out.result.label(), "Species: Flounder");
        assert!(out.trace[0].starts_with("[FC/BFS] Rule 2 Matched"));
    }

    #[test]
    fn earlier_terminal_rule_wins_the_pass() {
        // Blue Tang (regra 1) e Lionfish (regra 3) são ambos satisfeitos
        let facts = fact_set([
            "Color: Blue",
            "Body Shape: Oval",
            "Habitat: Coral Reef",
            "Color: Red/White",
            "Fins: Spiky",
        ]);
        let out = forward_chain(&marine_rules(), &facts, None);
        assert_eq!(out.result.label(), "Species: Blue Tang");
        assert_eq!(out.fired, 1);
        assert!(!out.known.contains(&Fact::from("Species: Lionfish")));
    }

    #[test]
    fn intermediate_facts_enable_later_rules() {
        let rules = vec![
            Rule::new("Species: Shark", ["Trait: Predator", "Habitat: Open Ocean"]),
            Rule::new("Trait: Predator", ["Teeth: Serrated"]),
        ];
        let facts = fact_set(["Teeth: Serrated", "Habitat: Open Ocean"]);
        let out = forward_chain(&rules, &facts, None);
        assert_eq!(out.result.label(), "Species: Shark");
        assert_eq!(out.fired, 2);
        // a regra 1 só fica satisfeita na segunda passada
        assert_eq!(out.passes, 2);
        assert!(out.trace[0].contains("Rule 2"));
        assert!(out.trace[1].contains("Rule 1"));
    }

    #[test]
    fn working_set_only_grows() {
        let rules = vec![
            Rule::new("Trait: A", ["x"]),
            Rule::new("Trait: B", ["Trait: A"]),
        ];
        let initial = fact_set(["x"]);
        let out = forward_chain(&rules, &initial, None);
        assert_eq!(out.result, ForwardResult::Undetermined);
        assert!(initial.is_subset(&out.known));
        assert_eq!(out.known, fact_set(["x", "Trait: A", "Trait: B"]));
        // as duas disparam na 1ª passada; a 2ª confirma o ponto fixo
        assert_eq!(out.passes, 2);
        // a entrada do chamador não é tocada
        assert_eq!(initial, fact_set(["x"]));
    }

    #[test]
    fn known_conclusion_never_fires_again() {
        let rules = vec![Rule::new("Trait: A", ["x"]), Rule::new("Trait: B", ["y"])];
        let out = forward_chain(&rules, &fact_set(["x", "Trait: A"]), None);
        assert_eq!(out.fired, 0);
        assert_eq!(out.result, ForwardResult::Undetermined);
    }

    #[test]
    fn passes_are_bounded_by_rule_count() {
        // cadeia em ordem reversa: uma regra nova por passada
        let rules = vec![
            Rule::new("Species: End", ["t3"]),
            Rule::new("t3", ["t2"]),
            Rule::new("t2", ["t1"]),
            Rule::new("t1", ["start"]),
        ];
        let out = forward_chain(&rules, &fact_set(["start"]), None);
        assert_eq!(out.result.label(), "Species: End");
        assert!(out.passes <= rules.len());
    }

    #[test]
    fn fixpoint_without_terminal_takes_one_pass_per_rule_plus_an_empty_one() {
        let rules = vec![
            Rule::new("t3", ["t2"]),
            Rule::new("t2", ["t1"]),
            Rule::new("t1", ["start"]),
        ];
        let out = forward_chain(&rules, &fact_set(["start"]), None);
        assert_eq!(out.result, ForwardResult::Undetermined);
        assert_eq!(out.fired, rules.len());
        assert_eq!(out.passes, rules.len() + 1);
        assert_eq!(out.known, fact_set(["start", "t1", "t2", "t3"]));
    }

    #[test]
    fn sink_sees_each_firing_in_order() {
        let mut streamed = Vec::new();
        let mut sink = |line: &str| streamed.push(line.to_string());
        let facts = fact_set(["Body Shape: Flattened", "Habitat: Sandy Bottom"]);
        let out = forward_chain(&marine_rules(), &facts, Some(&mut sink));
        assert_eq!(streamed, out.trace);
    }
}
