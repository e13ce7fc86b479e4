#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_PORT: u16 = 7878;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const MAX_CONNECTIONS: usize = 1024;
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// Níveis de array aceitos dentro de um frame; comandos só usam um.
pub const MAX_ARRAY_DEPTH: usize = 32;

/// Quantidade de caracteres alfanuméricos em um token.
pub const TOKEN_LEN: usize = 26;

/// Prefixo do link devolvido ao criar uma mensagem.
pub const READ_PATH: &str = "/read/";

/// Resposta única para token desconhecido, já lido ou expirado.
pub const NOT_FOUND_MESSAGE: &str = "This message has self-destructed or never existed.";
