//! Tabela compartilhada de respostas.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};

use super::freshness::Freshness;
use crate::protocol::Message;

/// Chave do cache: payload da requisição + se o rastro foi pedido.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub data: Vec<u8>,
    pub show_steps: bool,
}

impl CacheKey {
    pub fn for_request(request: &Message) -> Self {
        Self {
            data: request.data.clone(),
            show_steps: request.show_steps,
        }
    }

    /// Identificador curto para logs (prefixo do SHA-256 da chave).
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        hasher.update([u8::from(self.show_steps)]);
        let digest = hex::encode(hasher.finalize());
        digest[..12].to_string()
    }
}

/// Resultado de uma consulta ao cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// `cache_control == 0` na requisição: a consulta nem acontece.
    Bypass,
    Absent,
    /// Há entrada, mas um dos lados a considera velha.
    Stale(Freshness),
    Fresh {
        response: Message,
        freshness: Freshness,
    },
}

/// Estatísticas do cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Número atual de entradas (inclui as velhas).
    pub entries: usize,

    /// Consultas respondidas pelo cache.
    pub hits: u64,

    /// Consultas que exigiram ida à origem.
    pub misses: u64,

    /// Respostas gravadas.
    pub stores: u64,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache de respostas sem limite de tamanho.
///
/// Um único mutex guarda o mapa inteiro; respostas são clonadas para fora
/// sob o lock, então nenhum leitor vê uma entrada escrita pela metade.
/// Entradas velhas não são removidas, apenas tratadas como ausentes até
/// serem sobrescritas.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, Message>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consulta o cache para `request` no instante `now`.
    pub fn lookup(&self, request: &Message, now: i64) -> Lookup {
        if request.cache_control == 0 {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Lookup::Bypass;
        }

        let stored = self.entries().get(&CacheKey::for_request(request)).cloned();

        let Some(response) = stored else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Lookup::Absent;
        };

        let freshness = Freshness::assess(request, &response, now);
        if freshness.is_fresh() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Lookup::Fresh {
                response,
                freshness,
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            Lookup::Stale(freshness)
        }
    }

    /// Grava `response` se os dois lados aceitarem e ela ainda estiver fresca.
    ///
    /// Retorna se gravou, junto com a avaliação de frescor usada.
    pub fn store_if_agreed(&self, request: &Message, response: &Message, now: i64) -> (bool, Freshness) {
        let freshness = Freshness::assess(request, response, now);
        let agreed = request.cache_result && response.cache_result && freshness.is_fresh();
        if agreed {
            self.insert(CacheKey::for_request(request), response.clone());
        }
        (agreed, freshness)
    }

    /// Grava ou sobrescreve uma entrada incondicionalmente.
    pub fn insert(&self, key: CacheKey, response: Message) {
        self.entries().insert(key, response);
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Cópia da entrada guardada, fresca ou não.
    pub fn get(&self, key: &CacheKey) -> Option<Message> {
        self.entries().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retorna estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Message>> {
        // Um pânico com o lock não deixa entrada parcial: inserções são atômicas no mapa
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
