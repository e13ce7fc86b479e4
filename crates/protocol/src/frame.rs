use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use burnnote_common::{MAX_ARRAY_DEPTH, MAX_FRAME_SIZE, NOT_FOUND_MESSAGE, ProtocolError};

/// Representação de um frame RESP2.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Verifica se um frame completo está disponível no buffer sem alocar.
    /// Retorna Ok(()) se completo, Err(Incomplete) se precisa mais dados.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        check_at(src, 0)
    }

    /// Faz o parse de um frame completo a partir do cursor.
    /// Deve ser chamado apenas após `check()` retornar Ok.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
        parse_at(src, 0)
    }

    /// Tenta decodificar um frame do início de `buf`.
    /// Retorna `Ok(None)` se ainda faltam bytes, ou o frame e quantos bytes consumiu.
    pub fn decode(buf: &[u8]) -> Result<Option<(Frame, usize)>, ProtocolError> {
        let mut cursor = Cursor::new(buf);
        match Frame::check(&mut cursor) {
            Ok(()) => {
                let len = cursor.position() as usize;
                cursor.set_position(0);
                let frame = Frame::parse(&mut cursor)?;
                Ok(Some((frame, len)))
            }
            Err(ProtocolError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Encoda o frame no buffer de saída em formato RESP2.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => put_line(dst, b'+', s.as_bytes()),
            Frame::Error(s) => put_line(dst, b'-', s.as_bytes()),
            Frame::Integer(n) => put_line(dst, b':', n.to_string().as_bytes()),
            Frame::Bulk(data) => {
                put_line(dst, b'$', data.len().to_string().as_bytes());
                dst.put(data.as_ref());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Null => dst.put(&b"$-1\r\n"[..]),
            Frame::Array(frames) => {
                put_line(dst, b'*', frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.encode(dst);
                }
            }
        }
    }

    /// Helper: cria um Frame::Bulk a partir de &str.
    pub fn bulk(s: &str) -> Frame {
        Frame::Bulk(Bytes::from(s.to_string()))
    }

    /// Resposta de erro para token desconhecido, já lido ou expirado.
    pub fn not_found() -> Frame {
        Frame::Error(format!("NOTFOUND {NOT_FOUND_MESSAGE}"))
    }

    /// Helper: encoda em um buffer novo.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Helper: cria um Array de Bulk strings a partir de &[&str].
    pub fn array_from_strs(strs: &[&str]) -> Frame {
        Frame::Array(strs.iter().map(|s| Frame::bulk(s)).collect())
    }
}

fn check_at(src: &mut Cursor<&[u8]>, depth: usize) -> Result<(), ProtocolError> {
    match get_u8(src)? {
        b'+' | b'-' | b':' => {
            get_line(src)?;
            Ok(())
        }
        b'$' => {
            let len = get_decimal(src)?;
            if len == -1 {
                return Ok(());
            }
            let len = bulk_len(len)?;
            skip(src, len + 2)?; // data + \r\n
            Ok(())
        }
        b'*' => {
            let count = array_len(get_decimal(src)?, depth)?;
            for _ in 0..count {
                check_at(src, depth + 1)?;
            }
            Ok(())
        }
        byte => Err(ProtocolError::InvalidFrameType(byte)),
    }
}

fn parse_at(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Frame, ProtocolError> {
    match get_u8(src)? {
        b'+' => Ok(Frame::Simple(get_utf8_line(src)?)),
        b'-' => Ok(Frame::Error(get_utf8_line(src)?)),
        b':' => Ok(Frame::Integer(get_decimal(src)?)),
        b'$' => {
            let len = get_decimal(src)?;
            if len == -1 {
                return Ok(Frame::Null);
            }
            let len = bulk_len(len)?;
            if src.remaining() < len + 2 {
                return Err(ProtocolError::Incomplete);
            }
            let start = src.position() as usize;
            let data = Bytes::copy_from_slice(&src.get_ref()[start..start + len]);
            src.set_position((start + len + 2) as u64);
            Ok(Frame::Bulk(data))
        }
        b'*' => {
            let count = array_len(get_decimal(src)?, depth)?;
            // Cada elemento ocupa ao menos uma linha no buffer
            let mut frames = Vec::with_capacity(count.min(src.remaining()));
            for _ in 0..count {
                frames.push(parse_at(src, depth + 1)?);
            }
            Ok(Frame::Array(frames))
        }
        byte => Err(ProtocolError::InvalidFrameType(byte)),
    }
}

fn bulk_len(len: i64) -> Result<usize, ProtocolError> {
    let len = usize::try_from(len).map_err(|_| ProtocolError::InvalidBulkLength(len))?;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    Ok(len)
}

// Array nulo (`*-1`) não aparece em nenhum comando nem resposta
fn array_len(count: i64, depth: usize) -> Result<usize, ProtocolError> {
    if depth >= MAX_ARRAY_DEPTH {
        return Err(ProtocolError::NestingTooDeep(MAX_ARRAY_DEPTH));
    }
    usize::try_from(count).map_err(|_| ProtocolError::InvalidBulkLength(count))
}

fn get_utf8_line(src: &mut Cursor<&[u8]>) -> Result<String, ProtocolError> {
    let line = get_line(src)?;
    String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

fn put_line(dst: &mut BytesMut, prefix: u8, line: &[u8]) {
    dst.reserve(line.len() + 3);
    dst.put_u8(prefix);
    dst.put(line);
    dst.put(&b"\r\n"[..]);
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::Incomplete);
    }
    Ok(src.get_u8())
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    for i in start..end.saturating_sub(1) {
        if src.get_ref()[i] == b'\r' && src.get_ref()[i + 1] == b'\n' {
            src.set_position((i + 2) as u64);
            return Ok(&src.get_ref()[start..i]);
        }
    }

    Err(ProtocolError::Incomplete)
}

fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, ProtocolError> {
    let line = get_line(src)?;
    let s = std::str::from_utf8(line).map_err(|e| ProtocolError::InvalidInteger(e.to_string()))?;
    s.parse::<i64>()
        .map_err(|e| ProtocolError::InvalidInteger(e.to_string()))
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), ProtocolError> {
    if src.remaining() < n {
        return Err(ProtocolError::Incomplete);
    }
    src.set_position(src.position() + n as u64);
    Ok(())
}
