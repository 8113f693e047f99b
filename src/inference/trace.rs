//! # Trace — Canal Lateral das Decisões de Inferência
//!
//! Cada motor narra suas decisões como linhas de texto legíveis. As linhas
//! são **append-only** e estritamente ordenadas; elas não fazem parte da
//! corretude do resultado.
//!
//! ## Dois Destinos
//!
//! ```text
//! motor ──emit──► Tracer ──► Vec<String>        (sempre: vai no retorno)
//!                   └──────► dyn TraceSink      (opcional: streaming)
//! ```
//!
//! O [`TraceSink`] é chamado de forma **síncrona**, na ordem exata das
//! decisões. A camada web implementa um sink que publica cada linha em um
//! canal broadcast (SSE); testes usam closures.

/// Destino de linhas de trace fornecido pelo chamador.
pub trait TraceSink {
    /// Recebe uma linha, na ordem em que a decisão foi tomada.
    fn emit(&mut self, line: &str);
}

/// Qualquer closure `FnMut(&str)` serve como sink.
impl<F> TraceSink for F
where
    F: FnMut(&str),
{
    fn emit(&mut self, line: &str) {
        self(line)
    }
}

/// Coletor de trace de uma única execução.
///
/// Guarda todas as linhas para o retorno e repassa cada uma ao sink
/// opcional antes de armazená-la.
pub struct Tracer<'s> {
    lines: Vec<String>,
    sink: Option<&'s mut dyn TraceSink>,
}

impl<'s> Tracer<'s> {
    pub fn new(sink: Option<&'s mut dyn TraceSink>) -> Self {
        Self {
            lines: Vec::new(),
            sink,
        }
    }

    /// Registra uma linha e a repassa ao sink, se houver.
    pub fn emit(&mut self, line: String) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.emit(&line);
        }
        self.lines.push(line);
    }

    /// Linhas emitidas até agora.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracer_collects_and_forwards_in_order() {
        let mut seen = Vec::new();
        let mut sink = |line: &str| seen.push(line.to_uppercase());
        let mut tracer = Tracer::new(Some(&mut sink));
        tracer.emit("a".to_string());
        tracer.emit("b".to_string());
        let lines = tracer.into_lines();
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(seen, vec!["A", "B"]);
    }

    #[test]
    fn tracer_without_sink_still_collects() {
        let mut tracer = Tracer::new(None);
        tracer.emit("só no retorno".to_string());
        assert_eq!(tracer.lines().len(), 1);
    }
}
