use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as Slot;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::debug;

use burnnote_common::StoreError;

use crate::entry::Entry;
use crate::sweeper::{self, Deadline};
use crate::token::Token;

/// Handle para o store de mensagens de leitura única.
///
/// Clonar é barato: todos os clones compartilham o mesmo mapa token → mensagem.
/// Toda remoção passa por `remove`/`remove_if` do DashMap, que são atômicos
/// por chave, então leitura e expiração concorrentes nunca devolvem o mesmo
/// conteúdo duas vezes.
#[derive(Clone)]
pub struct MessageStore {
    data: Arc<DashMap<String, Entry>>,
    schedule: mpsc::UnboundedSender<Deadline>,
}

impl MessageStore {
    /// Cria um store vazio. Precisa de um runtime tokio ativo (spawna o sweeper).
    pub fn new() -> Self {
        let data = Arc::new(DashMap::new());
        let (schedule, rx) = mpsc::unbounded_channel();

        tokio::spawn(sweeper::run(data.clone(), rx));

        MessageStore { data, schedule }
    }

    /// Guarda `content` e devolve o token que permite lê-lo uma única vez.
    pub fn create(&self, content: String, ttl: Option<Duration>) -> Result<Token, StoreError> {
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }

        let expires_at = match ttl {
            Some(ttl) if ttl.is_zero() => return Err(StoreError::InvalidTtl),
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or(StoreError::InvalidTtl)?,
            ),
            None => None,
        };

        let token = loop {
            let token = Token::generate();
            match self.data.entry(token.as_str().to_owned()) {
                // Colisão com token vivo: gera outro
                Slot::Occupied(_) => continue,
                Slot::Vacant(slot) => {
                    slot.insert(Entry::new(content, expires_at));
                    break token;
                }
            }
        };

        match (expires_at, ttl) {
            (Some(at), Some(ttl)) => {
                // Se o sweeper já parou, a expiração preguiçosa em consume cobre
                let _ = self.schedule.send(Deadline(at, token.as_str().to_owned()));
                debug!("mensagem {token} armazenada com TTL {:.3}s", ttl.as_secs_f64());
            }
            _ => debug!("mensagem {token} armazenada sem prazo (leitura única)"),
        }

        Ok(token)
    }

    /// Lê e destrói a mensagem. `None` para token desconhecido, já lido ou
    /// expirado, sem distinção.
    pub fn consume(&self, token: &str) -> Option<String> {
        match self.data.remove(token) {
            None => {
                debug!("leitura de mensagem inexistente: {token}");
                None
            }
            Some((_, entry)) if entry.is_expired() => {
                debug!("leitura de mensagem expirada: {token}");
                None
            }
            Some((_, entry)) => {
                debug!("mensagem {token} lida e removida");
                Some(entry.content)
            }
        }
    }

    /// Número de mensagens ainda legíveis.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Varre o mapa inteiro removendo mensagens vencidas. Retorna quantas saíram.
    /// Exposto ao operador pelo comando `PURGE`.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        self.data.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
