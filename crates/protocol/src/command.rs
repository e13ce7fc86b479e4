use std::time::Duration;

use bytes::Bytes;
use burnnote_common::{CommandError, READ_PATH};

use crate::{Frame, Parse};

/// Enum com todos os comandos suportados.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping(Option<Bytes>),
    /// Guarda uma mensagem; `ttl == None` significa sem prazo (só leitura única).
    Create {
        message: String,
        ttl: Option<Duration>,
    },
    /// Lê e destrói. Guarda só o token, já extraído de um link se preciso.
    Read(String),
    Count,
    /// Remove na hora tudo que já venceu.
    Purge,
    Unknown(String),
}

impl Command {
    /// Faz o parse de um Frame em um Command.
    ///
    /// A validação de entrada acontece aqui, antes do store: mensagem vazia
    /// ou TTL que não seja número positivo são rejeitados.
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let mut parse = Parse::new(frame)?;
        let cmd_name = parse.next_string()?.to_uppercase();

        let cmd = match cmd_name.as_str() {
            "PING" => {
                let msg = if parse.has_remaining() {
                    Some(parse.next_bytes()?)
                } else {
                    None
                };
                parse.finish()?;
                Command::Ping(msg)
            }
            "CREATE" => parse_create(&mut parse)?,
            "READ" => {
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("READ".into()));
                }
                let reference = parse.next_string()?;
                parse.finish()?;
                Command::Read(token_from_reference(&reference).to_string())
            }
            "COUNT" => {
                parse.finish()?;
                Command::Count
            }
            "PURGE" => {
                parse.finish()?;
                Command::Purge
            }
            _ => Command::Unknown(cmd_name),
        };

        Ok(cmd)
    }

    /// Encoda o comando como Frame para envio via RESP.
    pub fn to_frame(&self) -> Frame {
        match self {
            Command::Ping(None) => Frame::Array(vec![Frame::bulk("PING")]),
            Command::Ping(Some(msg)) => {
                Frame::Array(vec![Frame::bulk("PING"), Frame::Bulk(msg.clone())])
            }
            Command::Create { message, ttl } => {
                let mut parts = vec![Frame::bulk("CREATE"), Frame::bulk(message)];
                if let Some(ttl) = ttl {
                    parts.push(Frame::bulk("TTL"));
                    parts.push(Frame::bulk(&ttl.as_secs_f64().to_string()));
                }
                Frame::Array(parts)
            }
            Command::Read(token) => Frame::Array(vec![Frame::bulk("READ"), Frame::bulk(token)]),
            Command::Count => Frame::Array(vec![Frame::bulk("COUNT")]),
            Command::Purge => Frame::Array(vec![Frame::bulk("PURGE")]),
            Command::Unknown(name) => Frame::Array(vec![Frame::bulk(name)]),
        }
    }
}

/// `CREATE <message> [TTL <segundos>|TTL NONE]`
fn parse_create(parse: &mut Parse) -> Result<Command, CommandError> {
    if !parse.has_remaining() {
        return Err(CommandError::WrongArity("CREATE".into()));
    }
    let message = parse.next_string()?;
    if message.is_empty() {
        return Err(CommandError::EmptyMessage);
    }

    let mut ttl = None;

    while parse.has_remaining() {
        let opt = parse.next_string()?.to_uppercase();
        match opt.as_str() {
            "TTL" => {
                if !parse.has_remaining() {
                    return Err(CommandError::InvalidDuration);
                }
                ttl = parse_ttl(parse)?;
            }
            other => {
                return Err(CommandError::InvalidArgument(format!(
                    "opção inválida para CREATE: {other}"
                )));
            }
        }
    }

    Ok(Command::Create { message, ttl })
}

/// TTL em segundos: `NONE`/`NULL` ou número finito > 0. Qualquer outra coisa
/// vira `InvalidDuration`.
fn parse_ttl(parse: &mut Parse) -> Result<Option<Duration>, CommandError> {
    let raw = parse
        .next_string()
        .map_err(|_| CommandError::InvalidDuration)?;
    if raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }

    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidDuration)?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(CommandError::InvalidDuration);
    }

    match Duration::try_from_secs_f64(secs) {
        Ok(ttl) if !ttl.is_zero() => Ok(Some(ttl)),
        _ => Err(CommandError::InvalidDuration),
    }
}

/// Extrai o token de um link (`/read/abc`, `https://host/read/abc`) ou
/// devolve a entrada como está.
pub fn token_from_reference(reference: &str) -> &str {
    let reference = reference.trim().trim_end_matches('/');
    match reference.rfind(READ_PATH) {
        Some(idx) => &reference[idx + READ_PATH.len()..],
        None => reference,
    }
}
