use bytes::Bytes;
use burnnote_common::CommandError;

use crate::Frame;

/// Cursor sobre os argumentos de um comando (array de bulk strings).
pub struct Parse {
    parts: std::vec::IntoIter<Frame>,
}

impl Parse {
    /// Cria um Parse a partir de um Frame. O frame deve ser Array.
    pub fn new(frame: Frame) -> Result<Parse, CommandError> {
        match frame {
            Frame::Array(parts) => Ok(Parse {
                parts: parts.into_iter(),
            }),
            _ => Err(CommandError::InvalidArgument("esperado array".into())),
        }
    }

    /// Próximo argumento como texto UTF-8.
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        let data = self.next_bytes()?;
        String::from_utf8(data.to_vec())
            .map_err(|_| CommandError::InvalidArgument("string UTF-8 inválida".into()))
    }

    /// Próximo argumento cru, sem copiar o payload.
    pub fn next_bytes(&mut self) -> Result<Bytes, CommandError> {
        match self.parts.next() {
            Some(Frame::Bulk(data)) => Ok(data),
            Some(_) => Err(CommandError::InvalidArgument("esperado bulk".into())),
            None => Err(CommandError::InvalidArgument(
                "argumentos insuficientes".into(),
            )),
        }
    }

    /// Falha se sobrou argumento.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.has_remaining() {
            Err(CommandError::InvalidArgument(
                "argumentos extras não esperados".into(),
            ))
        } else {
            Ok(())
        }
    }

    pub fn has_remaining(&self) -> bool {
        self.parts.len() > 0
    }
}
