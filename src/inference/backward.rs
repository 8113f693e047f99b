//! # Backward Chaining — Prova Dirigida por Metas
//!
//! Prova uma meta recursivamente, em profundidade, sem memoização: se o
//! mesmo sub-objetivo aparece duas vezes, a prova é refeita e narrada de novo.
//!
//! ## Algoritmo
//!
//! ```text
//! prove(meta, fatos, profundidade):
//!   trace "Checking if meta is provable..."
//!   se meta ∈ fatos: trace "already a known fact"; true
//!   regra := PRIMEIRA regra cuja conclusão == meta
//!   se existe:
//!     trace "Trying Rule N"
//!     para cada requisito, em ordem:
//!       se !prove(requisito, fatos, profundidade+1): abandona a regra (AND curto-circuito)
//!     se todos provados: trace "PROVEN by Rule N"; true
//!   trace "cannot be proven"; false
//! ```
//!
//! ## Apenas a Primeira Regra
//!
//! Quando várias regras concluem a mesma meta, só a primeira é tentada.
//! Se ela falha, **não há retrocesso** para as seguintes: a meta é
//! reportada como não provada mesmo que outra regra a provasse.
//!
//! ## Guarda de Ciclo
//!
//! Uma meta que já está sendo provada no caminho atual falha aquele ramo
//! em vez de recursar para sempre. Para bases acíclicas (como a marinha)
//! o trace e o resultado são idênticos ao algoritmo sem guarda.

use super::trace::{TraceSink, Tracer};
use crate::core::{Fact, FactSet, Rule};

/// Prefixo de indentação por nível de profundidade no trace.
const INDENT: &str = "│  ";

/// Resultado de uma execução de backward chaining.
#[derive(Clone, Debug)]
pub struct BackwardOutcome {
    pub proven: bool,
    /// Narração completa da busca, com indentação por profundidade.
    pub trace: Vec<String>,
}

/// Tenta provar `goal` a partir de `facts` usando `rules`.
///
/// `facts` é a memória fixa de observações: nada derivado durante a
/// prova é adicionado a ela.
pub fn backward_chain(
    rules: &[Rule],
    goal: &Fact,
    facts: &FactSet,
    sink: Option<&mut dyn TraceSink>,
) -> BackwardOutcome {
    let mut tracer = Tracer::new(sink);
    let mut path = Vec::new();
    let proven = prove(rules, goal, facts, &mut tracer, &mut path, 0);
    tracing::debug!(goal = %goal, proven, lines = tracer.lines().len(), "BC: busca concluída");
    BackwardOutcome {
        proven,
        trace: tracer.into_lines(),
    }
}

/// Passo recursivo da prova.
///
/// `depth` só controla a indentação do trace. `path` guarda as metas em
/// prova no ramo atual.
pub fn prove<'r>(
    rules: &'r [Rule],
    goal: &'r Fact,
    facts: &FactSet,
    tracer: &mut Tracer<'_>,
    path: &mut Vec<&'r Fact>,
    depth: usize,
) -> bool {
    let indent = INDENT.repeat(depth);
    tracer.emit(format!("{indent}🔎 Checking if {goal} is provable..."));

    if facts.contains(goal) {
        tracer.emit(format!("{indent}✅ Goal {goal} is already a known fact."));
        return true;
    }

    if path.contains(&goal) {
        tracer.emit(format!(
            "{indent}⚠️ Goal {goal} is already being proven on this path (cycle)."
        ));
        return false;
    }

    if let Some((i, rule)) = rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.conclusion == *goal)
    {
        let number = i + 1;
        tracer.emit(format!(
            "{indent}├── Trying Rule {number}: IF ({}) THEN {goal}",
            rule.premises()
        ));

        path.push(goal);
        let all_proven = rule
            .requires
            .iter()
            .all(|premise| prove(rules, premise, facts, tracer, path, depth + 1));
        path.pop();

        if all_proven {
            tracer.emit(format!("{indent}└── Goal {goal} PROVEN by Rule {number}."));
            return true;
        }
    }

    tracer.emit(format!(
        "{indent}❌ Goal {goal} cannot be proven by the current facts/rules."
    ));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{fact_set, KnowledgeBase};

    fn marine_rules() -> Vec<Rule> {
        KnowledgeBase::marine().all_rules().to_vec()
    }

    #[test]
    fn lionfish_proven_from_three_known_facts() {
        let facts = fact_set(["Color: Red/White", "Fins: Spiky", "Habitat: Coral Reef"]);
        let out = backward_chain(&marine_rules(), &Fact::from("Species: Lionfish"), &facts, None);
        assert!(out.proven);
        assert_eq!(
            out.trace,
            vec![
                "🔎 Checking if Species: Lionfish is provable...",
                "├── Trying Rule 3: IF (Color: Red/White AND Fins: Spiky AND Habitat: Coral Reef) THEN Species: Lionfish",
                "│  🔎 Checking if Color: Red/White is provable...",
                "│  ✅ Goal Color: Red/White is already a known fact.",
                "│  🔎 Checking if Fins: Spiky is provable...",
                "│  ✅ Goal Fins: Spiky is already a known fact.",
                "│  🔎 Checking if Habitat: Coral Reef is provable...",
                "│  ✅ Goal Habitat: Coral Reef is already a known fact.",
                "└── Goal Species: Lionfish PROVEN by Rule 3.",
            ]
        );
    }

    #[test]
    fn bleaching_fails_without_high_temperature() {
        let facts = fact_set(["Color: White/Pale", "Habitat: Coral Reef"]);
        let out = backward_chain(&marine_rules(), &Fact::from("Condition: Bleaching"), &facts, None);
        assert!(!out.proven);
        assert!(out
            .trace
            .contains(&"│  ❌ Goal Temp: High cannot be proven by the current facts/rules.".to_string()));
        assert_eq!(
            out.trace.last().map(String::as_str),
            Some("❌ Goal Condition: Bleaching cannot be proven by the current facts/rules.")
        );
    }

    #[test]
    fn failing_premise_short_circuits_the_rest() {
        // Color: Blue falta, então Body Shape e Habitat nunca são checados
        let facts = fact_set(["Body Shape: Oval", "Habitat: Coral Reef"]);
        let out = backward_chain(&marine_rules(), &Fact::from("Species: Blue Tang"), &facts, None);
        assert!(!out.proven);
        assert!(!out
            .trace
            .iter()
            .any(|l| l.contains("Checking if Body Shape: Oval")));
    }

    #[test]
    fn goal_already_observed_needs_no_rule() {
        let facts = fact_set(["Species: Seahorse"]);
        let out = backward_chain(&marine_rules(), &Fact::from("Species: Seahorse"), &facts, None);
        assert!(out.proven);
        assert_eq!(out.trace.len(), 2);
    }

    #[test]
    fn only_the_first_matching_rule_is_tried() {
        let rules = vec![
            Rule::new("Species: Eel", ["Body Shape: Serpentine"]),
            Rule::new("Species: Eel", ["Habitat: Coral Reef"]),
        ];
        let facts = fact_set(["Habitat: Coral Reef"]);
        let out = backward_chain(&rules, &Fact::from("Species: Eel"), &facts, None);
        assert!(!out.proven);
        assert!(!out.trace.iter().any(|l| l.contains("Rule 2")));
    }

    #[test]
    fn derived_subgoals_are_proven_recursively() {
        let rules = vec![
            Rule::new("Species: Shark", ["Trait: Predator", "Habitat: Open Ocean"]),
            Rule::new("Trait: Predator", ["Teeth: Serrated"]),
        ];
        let facts = fact_set(["Teeth: Serrated", "Habitat: Open Ocean"]);
        let out = backward_chain(&rules, &Fact::from("Species: Shark"), &facts, None);
        assert!(out.proven);
        assert!(out
            .trace
            .contains(&"│  └── Goal Trait: Predator PROVEN by Rule 2.".to_string()));
        assert!(out
            .trace
            .contains(&"│  │  ✅ Goal Teeth: Serrated is already a known fact.".to_string()));
    }

    #[test]
    fn repeated_subgoals_are_recomputed() {
        let rules = vec![
            Rule::new("Goal", ["Shared", "Other"]),
            Rule::new("Other", ["Shared"]),
            Rule::new("Shared", ["leaf"]),
        ];
        let out = backward_chain(&rules, &Fact::from("Goal"), &fact_set(["leaf"]), None);
        assert!(out.proven);
        let shared_proofs = out
            .trace
            .iter()
            .filter(|l| l.contains("Goal Shared PROVEN"))
            .count();
        assert_eq!(shared_proofs, 2);
    }

    #[test]
    fn cyclic_rules_terminate_with_false() {
        let rules = vec![Rule::new("A", ["B"]), Rule::new("B", ["A"])];
        let out = backward_chain(&rules, &Fact::from("A"), &FactSet::new(), None);
        assert!(!out.proven);
        assert!(out.trace.iter().any(|l| l.contains("(cycle)")));
    }

    #[test]
    fn unknown_goal_without_rules_fails_immediately() {
        let out = backward_chain(&marine_rules(), &Fact::from("Species: Kraken"), &FactSet::new(), None);
        assert!(!out.proven);
        assert_eq!(out.trace.len(), 2);
    }

    #[test]
    fn sink_receives_the_same_lines() {
        let mut streamed = Vec::new();
        let mut sink = |line: &str| streamed.push(line.to_string());
        let facts = fact_set(["Color: White/Pale", "Habitat: Coral Reef", "Temp: High"]);
        let out = backward_chain(
            &marine_rules(),
            &Fact::from("Condition: Bleaching"),
            &facts,
            Some(&mut sink),
        );
        assert!(out.proven);
        assert_eq!(streamed, out.trace);
    }
}
