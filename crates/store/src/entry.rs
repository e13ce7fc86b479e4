use tokio::time::Instant;

/// Mensagem armazenada: conteúdo imutável + prazo opcional.
#[derive(Debug)]
pub struct Entry {
    pub content: String,
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(content: String, expires_at: Option<Instant>) -> Self {
        Self {
            content,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Sem prazo nunca expira; com prazo, expira a partir do próprio instante.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}
