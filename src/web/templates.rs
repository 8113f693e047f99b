//! # Templates Maud — HTML Server-Side Rendering
//!
//! Templates HTML renderizados com o macro [`maud`](https://maud.lambda.xyz/).
//! Seguem o padrão **Hypermedia-Driven**: o servidor devolve fragmentos
//! HTML e o HTMX os injeta no DOM.
//!
//! ## Templates Disponíveis
//!
//! | Função | Tipo | Descrição |
//! |--------|------|-----------|
//! | [`full_page()`] | Página completa | Deck de observação + painel de controle + trace |
//! | [`run_fragment()`] | Fragment HTMX | Veredito + transcript de uma execução |
//! | [`history_fragment()`] | Fragment HTMX | Execuções anteriores da sessão |
//! | [`error_fragment()`] | Fragment HTMX | Entrada rejeitada ou falha interna |
//!
//! ## Layout Principal (`full_page`)
//!
//! ```text
//! ┌──────────────────── banner de boas-vindas ─────────────────────┐
//! ├───────────────────────────────┬────────────────────────────────┤
//! │ 1. Marine Observation Deck 🌊 │ Resultado + transcript         │
//! │   [ ] Color: Blue ...         │ ┌────────────────────────────┐ │
//! │ 2. Inference Control Panel    │ │ Live trace (SSE)           │ │
//! │   [RUN FORWARD CHAINING]      │ └────────────────────────────┘ │
//! │ 3. Confirmation Goal [▼]      │ Histórico da sessão            │
//! │   [RUN BACKWARD CHAINING]     │                                │
//! └───────────────────────────────┴────────────────────────────────┘
//! ```

use maud::{html, Markup, PreEscaped, DOCTYPE};
use uuid::Uuid;

use crate::core::rule::numbered;
use crate::core::KnowledgeBase;
use crate::orchestrator::RunRecord;

/// Prefixo dos campos de checkbox do deck de observação (`obs:<rótulo>`).
pub const OBSERVATION_FIELD_PREFIX: &str = "obs:";

/// Página principal — deck de observação, painel de controle e trace ao vivo.
///
/// `session` é embutido em um campo oculto; a sessão só passa a existir
/// no servidor na primeira execução.
pub fn full_page(kb: &KnowledgeBase, session: Uuid) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "🐟 Marine Life Identifier — AI Expert System" }
                link rel="stylesheet" href="/assets/style.css";
                script src="https://unpkg.com/htmx.org@2.0.4" {}
            }
            body data-session=(session.to_string()) {
                div class="welcome-banner" {
                    h1 { "WELCOME TO THE MARINE AI EXPERT SYSTEM" }
                    p {
                        "Identify marine life or diagnose ecosystem health using "
                        strong { "Forward Chaining" } " (Prediction) and "
                        strong { "Backward Chaining" } " (Confirmation)."
                    }
                }

                div class="app-container" {
                    form id="run-form" class="control-column" {
                        input type="hidden" name="session" value=(session.to_string());

                        fieldset class="panel" {
                            legend { "1. Marine Observation Deck 🌊" }
                            p class="hint" { "Select all observed characteristics:" }
                            @for (category, facts) in kb.facts_by_category() {
                                div class="fact-group" {
                                    div class="fact-group-title" { (category) }
                                    @for fact in facts {
                                        label class="fact-option" {
                                            input type="checkbox"
                                                name=(format!("{OBSERVATION_FIELD_PREFIX}{fact}"))
                                                value="on";
                                            " " (fact.value())
                                        }
                                    }
                                }
                            }
                        }

                        fieldset class="panel" {
                            legend { "2. Inference Control Panel" }
                            button type="button" class="run-btn accent"
                                hx-post="/forward"
                                hx-target="#run-output"
                                hx-swap="innerHTML"
                                hx-indicator="#run-indicator"
                                hx-disabled-elt=".run-btn" {
                                "RUN FORWARD CHAINING (PREDICT SPECIES)"
                            }

                            label class="goal-label" for="goal" {
                                "3. Confirmation Goal (Backward Chaining):"
                            }
                            select id="goal" name="goal" {
                                @for goal in kb.all_goals() {
                                    option value=(goal.label()) { (goal.label()) }
                                }
                            }
                            button type="button" class="run-btn"
                                hx-post="/backward"
                                hx-target="#run-output"
                                hx-swap="innerHTML"
                                hx-indicator="#run-indicator"
                                hx-disabled-elt=".run-btn" {
                                "RUN BACKWARD CHAINING (CONFIRM GOAL)"
                            }
                        }

                        details class="panel rules" {
                            summary { "Knowledge Base Rules" }
                            ol {
                                @for numbered_rule in numbered(kb.all_rules()) {
                                    li value=(numbered_rule.number) {
                                        code { (numbered_rule.rule.describe()) }
                                    }
                                }
                            }
                        }
                    }

                    div class="output-column" {
                        // visível só enquanto a request está em andamento
                        div id="run-indicator" class="panel htmx-indicator" {
                            div class="result-label idle" { "Result: Calculating..." }
                            progress class="run-progress" {}
                        }
                        div id="run-output" class="panel" {
                            div class="result-label idle" { "Result: waiting for a run..." }
                        }

                        div class="panel" {
                            div class="panel-title" { "Live Trace" }
                            pre id="live-trace" class="trace live" {}
                        }

                        div class="panel" {
                            div class="panel-title" {
                                "Session History"
                                button type="button" class="link-btn"
                                    hx-post="/session/reset"
                                    hx-include="#run-form"
                                    hx-target="#history"
                                    hx-swap="innerHTML" {
                                    "clear"
                                }
                            }
                            div id="history"
                                hx-get=(format!("/history?session={session}"))
                                hx-trigger="load, runFinished from:body"
                                hx-swap="innerHTML" {
                                div class="hint" { "No runs yet." }
                            }
                        }
                    }
                }

                (PreEscaped(r#"<script>
// SSE: linhas de trace chegam em tempo real enquanto o motor roda
(function() {
  var session = document.body.dataset.session;
  var live = document.getElementById('live-trace');
  var es = new EventSource('/events?session=' + encodeURIComponent(session));
  es.onmessage = function(e) {
    try {
      var ev = JSON.parse(e.data);
      if (ev.type === 'Started') {
        live.textContent = '';
      } else if (ev.type === 'Line') {
        live.textContent += ev.text + '\n';
        live.scrollTop = live.scrollHeight;
      } else if (ev.type === 'Finished') {
        document.body.dispatchEvent(new Event('runFinished'));
      } else if (ev.type === 'Rejected') {
        live.textContent = '⚠️ ' + ev.message + '\n';
      }
    } catch (err) {
      console.error(err);
    }
  };
})();
</script>"#))
            }
        }
    }
}

/// Veredito e transcript completo de uma execução.
pub fn run_fragment(record: &RunRecord) -> Markup {
    let outcome = if record.success { "success" } else { "failure" };
    html! {
        div class=(format!("run-result {}", record.kind.css_class())) {
            div class=(format!("result-label {outcome}")) {
                "Result: " (record.verdict)
            }
            div class="run-meta" {
                (record.kind.label()) " · " (record.elapsed_ms) " ms · "
                (record.started_at.format("%H:%M:%S UTC").to_string())
            }
            pre class="trace" {
                @for line in &record.transcript {
                    (line) "\n"
                }
            }
        }
    }
}

/// Histórico da sessão, execução mais recente primeiro.
pub fn history_fragment<'a>(records: impl DoubleEndedIterator<Item = &'a RunRecord>) -> Markup {
    let records: Vec<&RunRecord> = records.rev().collect();
    html! {
        @if records.is_empty() {
            div class="hint" { "No runs yet." }
        } @else {
            ul class="history-list" {
                @for record in records {
                    li class=(if record.success { "success" } else { "failure" }) {
                        span class="history-time" {
                            (record.started_at.format("%H:%M:%S").to_string())
                        }
                        span class="history-kind" { (record.kind.label()) }
                        span class="history-verdict" { (record.verdict) }
                    }
                }
            }
        }
    }
}

/// Mensagem de erro exibida no painel de resultado.
pub fn error_fragment(message: &str) -> Markup {
    html! {
        div class="result-label failure" {
            "Error: " (message)
        }
    }
}
