//! # Configuração via Ambiente
//!
//! | Variável | Padrão | Uso |
//! |----------|--------|-----|
//! | `MARINE_BIND_ADDR` | `0.0.0.0:3000` | Endereço TCP do servidor |
//! | `MARINE_HISTORY_LIMIT` | `20` | Execuções guardadas por sessão |
//! | `MARINE_MAX_SESSIONS` | `256` | Sessões simultâneas antes de despejar a mais antiga |
//! | `MARINE_EVENTS_CAPACITY` | `256` | Capacidade do canal broadcast de SSE |
//!
//! O nível de log continua vindo de `RUST_LOG` (ver `main`).

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Configuração do servidor, carregada uma vez no início do processo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub history_limit: usize,
    pub max_sessions: usize,
    pub events_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            history_limit: 20,
            max_sessions: 256,
            events_capacity: 256,
        }
    }
}

impl AppConfig {
    /// Lê a configuração das variáveis de ambiente do processo.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual a [`from_env`](Self::from_env), mas com uma fonte arbitrária
    /// de variáveis, sem mexer no ambiente global.
    ///
    /// # Erros
    ///
    /// Valor presente mas inválido (endereço malformado, número não
    /// positivo). Variáveis ausentes usam o padrão.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: parse_var(&lookup, "MARINE_BIND_ADDR", defaults.bind_addr)?,
            history_limit: parse_count(&lookup, "MARINE_HISTORY_LIMIT", defaults.history_limit)?,
            max_sessions: parse_count(&lookup, "MARINE_MAX_SESSIONS", defaults.max_sessions)?,
            events_capacity: parse_count(
                &lookup,
                "MARINE_EVENTS_CAPACITY",
                defaults.events_capacity,
            )?,
        })
    }
}

// broadcast::channel entra em pânico com capacidade zero
fn parse_count(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize> {
    let value = parse_var(lookup, key, default)?;
    if value == 0 {
        bail!("{key} precisa ser maior que zero");
    }
    Ok(value)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido em {key}: {raw:?}")),
        None => Ok(default),
    }
}
