//! # Fact — Observação Atômica do Vocabulário Marinho
//!
//! Um [`Fact`] é um rótulo opaco como `"Color: Blue"` ou `"Species: Lionfish"`.
//! Fatos são comparados **apenas por identidade textual exata** — não existe
//! hierarquia, negação ou grau de certeza.
//!
//! ## Anatomia de um Rótulo
//!
//! ```text
//! "Habitat: Coral Reef"
//!  ───┬───  ─────┬────
//!  categoria    valor
//! ```
//!
//! A categoria serve apenas para apresentação (agrupar checkboxes) e para
//! detectar **classificações terminais** (`Species:` / `Condition:`), que
//! encerram o encadeamento para frente imediatamente.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefixos que marcam uma conclusão como classificação terminal.
pub const TERMINAL_PREFIXES: [&str; 2] = ["Species:", "Condition:"];

/// Conjunto de fatos (memória de trabalho).
///
/// `BTreeSet` mantém iteração determinística, o que deixa traces e
/// respostas JSON estáveis entre execuções.
pub type FactSet = BTreeSet<Fact>;

/// Rótulo atômico de uma observação ou conclusão.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact(String);

impl Fact {
    /// Cria um fato a partir de qualquer rótulo textual.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Rótulo completo, exatamente como declarado.
    pub fn label(&self) -> &str {
        &self.0
    }

    /// `true` se o rótulo é uma classificação final (espécie ou condição).
    ///
    /// Fatos intermediários derivados não são terminais e apenas
    /// acumulam na memória de trabalho.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_PREFIXES.iter().any(|p| self.0.starts_with(p))
    }

    /// Categoria antes do primeiro `:` (ex: `"Color"`), se houver.
    pub fn category(&self) -> Option<&str> {
        self.0.split_once(':').map(|(category, _)| category.trim())
    }

    /// Valor após o primeiro `:` (ex: `"Blue"`), ou o rótulo inteiro.
    pub fn value(&self) -> &str {
        self.0
            .split_once(':')
            .map(|(_, value)| value.trim())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fact {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Monta um [`FactSet`] a partir de rótulos.
pub fn fact_set<I, S>(labels: I) -> FactSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    labels.into_iter().map(Fact::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_and_condition_are_terminal() {
        assert!(Fact::from("Species: Blue Tang").is_terminal());
        assert!(Fact::from("Condition: Bleaching").is_terminal());
        assert!(!Fact::from("Color: Blue").is_terminal());
        // O prefixo precisa estar no início do rótulo
        assert!(!Fact::from("Not Species: X").is_terminal());
    }

    #[test]
    fn category_and_value_split_on_first_colon() {
        let fact = Fact::from("Habitat: Coral Reef");
        assert_eq!(fact.category(), Some("Habitat"));
        assert_eq!(fact.value(), "Coral Reef");

        let bare = Fact::from("Unlabeled");
        assert_eq!(bare.category(), None);
        assert_eq!(bare.value(), "Unlabeled");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Fact::from("Temp: High")).unwrap();
        assert_eq!(json, "\"Temp: High\"");
    }

    #[test]
    fn fact_set_deduplicates() {
        let set = fact_set(["Color: Blue", "Color: Blue", "Temp: High"]);
        assert_eq!(set.len(), 2);
    }
}
