//! # Marine Expert — Identificador de Vida Marinha
//!
//! **Ponto de entrada principal** do sistema especialista marinho.
//!
//! Este arquivo inicializa os componentes do sistema e inicia o servidor web.
//! Diferente de um sistema com modelo de ML, não há fase de carregamento em
//! background: a base de conhecimento é estática e fica pronta na hora.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging
//!   ├── Lê AppConfig das variáveis de ambiente
//!   ├── Constrói a KnowledgeBase marinha (14 fatos, 5 regras)
//!   ├── Monta AppState (registro de sessões + canal SSE) e Router
//!   └── Inicia servidor TCP
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Executar com logs padrão (info)
//! cargo run
//!
//! # Trace de cada regra disparada nos logs
//! RUST_LOG=marine_expert=debug cargo run
//!
//! # Outra porta
//! MARINE_BIND_ADDR=127.0.0.1:8080 cargo run
//! ```
//!
//! ## Caso de Uso
//!
//! O usuário marca as características observadas de um animal ou do
//! ambiente e:
//! - **Forward chaining** prevê a espécie/condição a partir das observações
//! - **Backward chaining** confirma (ou não) uma meta escolhida
//! - O trace de cada decisão aparece ao vivo via SSE

/// Módulo `config` — configuração via variáveis de ambiente.
mod config;

/// Módulo `core` — tipos fundamentais: Fact, Rule, KnowledgeBase.
mod core;

/// Módulo `error` — erros de validação na borda.
mod error;

/// Módulo `inference` — motores de forward e backward chaining.
mod inference;

/// Módulo `orchestrator` — sessão: validação, transcript e histórico.
mod orchestrator;

/// Módulo `web` — servidor web axum, handlers HTTP, templates e SSE.
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core::KnowledgeBase;
use crate::web::state::AppState;

/// Função principal assíncrona do Marine Expert.
///
/// # Erros
///
/// Retorna erro se:
/// - Alguma variável `MARINE_*` tiver valor inválido
/// - Não conseguir fazer bind no endereço configurado
/// - O servidor axum falhar durante execução
#[tokio::main]
async fn main() -> Result<()> {
    // Aceita a variável de ambiente RUST_LOG para configurar o nível.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🐟 Marine Expert — Starting...");

    let config = AppConfig::from_env().context("Configuração inválida")?;

    let kb = Arc::new(KnowledgeBase::marine());
    tracing::info!(
        facts = kb.all_facts().len(),
        rules = kb.all_rules().len(),
        goals = kb.all_goals().len(),
        "KB marinha carregada"
    );

    let state = AppState::new(kb, &config);
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Falha ao fazer bind em {}", config.bind_addr))?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
