//! Aritmética de frescor, nos dois lados da troca.
//!
//! A janela do servidor vem do `cache_control` da resposta guardada; a do
//! cliente vem do `cache_control` da requisição atual. Ambas descontam a
//! idade da resposta, medida a partir do seu `unix_time_stamp`.

use std::fmt;

use crate::protocol::{Message, MAX_CACHE_CONTROL};

/// Segundos restantes antes de uma resposta ficar velha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// `cache_control` sentinela: nunca expira.
    Indefinite,
    Seconds(i64),
}

impl Remaining {
    /// Janela declarada por `cache_control` para uma resposta de idade `age`.
    pub fn from_cache_control(cache_control: u32, age: i64) -> Self {
        if cache_control == MAX_CACHE_CONTROL {
            Remaining::Indefinite
        } else {
            Remaining::Seconds(i64::from(cache_control).saturating_sub(age))
        }
    }

    /// Estritamente positiva.
    pub fn is_positive(self) -> bool {
        match self {
            Remaining::Indefinite => true,
            Remaining::Seconds(s) => s > 0,
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Indefinite => f.write_str("indefinite"),
            Remaining::Seconds(s) => write!(f, "{s}s"),
        }
    }
}

/// Avaliação de frescor de uma resposta para uma requisição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub age: i64,
    pub server_remaining: Remaining,
    pub client_remaining: Remaining,
}

impl Freshness {
    /// Calcula as duas janelas no instante `now` (segundos Unix).
    pub fn assess(request: &Message, response: &Message, now: i64) -> Self {
        let age = now.saturating_sub(response.unix_time_stamp);
        Self {
            age,
            server_remaining: Remaining::from_cache_control(response.cache_control, age),
            client_remaining: Remaining::from_cache_control(request.cache_control, age),
        }
    }

    /// Os dois lados ainda consideram a resposta fresca.
    pub fn is_fresh(&self) -> bool {
        self.server_remaining.is_positive() && self.client_remaining.is_positive()
    }
}
