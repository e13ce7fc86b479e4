use std::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;

use burnnote_common::{READ_PATH, TOKEN_LEN};

/// Identificador opaco de uma mensagem; quem tem o token pode lê-la uma vez.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Gera um token alfanumérico com o CSPRNG thread-local (~154 bits).
    pub fn generate() -> Self {
        let token: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Token(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Referência devolvida ao cliente: `/read/{token}`.
    pub fn link(&self) -> String {
        format!("{READ_PATH}{}", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
