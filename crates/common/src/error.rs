/// Erros de parsing do protocolo RESP.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame incompleto")]
    Incomplete,
    #[error("byte de tipo inválido: {0:#x}")]
    InvalidFrameType(u8),
    #[error("inteiro inválido: {0}")]
    InvalidInteger(String),
    #[error("comprimento de bulk inválido: {0}")]
    InvalidBulkLength(i64),
    #[error("frame excede tamanho máximo ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
    #[error("arrays aninhados além de {0} níveis")]
    NestingTooDeep(usize),
}

/// Erros do store de mensagens.
///
/// "Não encontrado" não é erro: `consume` devolve `None` e não distingue
/// token inexistente, já lido ou expirado.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("conteúdo da mensagem vazio")]
    EmptyContent,
    #[error("TTL deve ser positivo")]
    InvalidTtl,
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocolo: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Erros de parsing/validação de comandos.
///
/// `EmptyMessage` e `InvalidDuration` são o sinal de entrada inválida
/// devolvido ao cliente, por isso as mensagens ficam em inglês.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
    #[error("Message content is required.")]
    EmptyMessage,
    #[error("Invalid duration provided.")]
    InvalidDuration,
}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmptyContent => CommandError::EmptyMessage,
            StoreError::InvalidTtl => CommandError::InvalidDuration,
        }
    }
}

/// Erro top-level do BurnNote.
#[derive(Debug, thiserror::Error)]
pub enum BurnError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type alias.
pub type BurnResult<T> = Result<T, BurnError>;

// io::Error → BurnError passando por ConnectionError
impl From<std::io::Error> for BurnError {
    fn from(e: std::io::Error) -> Self {
        BurnError::Connection(ConnectionError::Io(e))
    }
}
