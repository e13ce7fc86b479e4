use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use burnnote_common::{CommandError, ConnectionError};
use burnnote_protocol::{Command, Frame};
use burnnote_store::MessageStore;

use crate::Connection;

/// Loop principal de tratamento de uma conexão.
pub async fn handle_connection(
    mut conn: Connection,
    store: MessageStore,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let read = tokio::select! {
            result = conn.read_frame() => result,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let frame = match read {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(()), // EOF
            // Frame malformado: avisa o cliente e encerra só esta conexão
            Err(ConnectionError::Protocol(e)) => {
                warn!("frame inválido, fechando conexão: {e}");
                conn.write_frame(&Frame::Error(format!("ERR Protocol error: {e}")))
                    .await?;
                return Err(e.into());
            }
            Err(e) => return Err(e),
        };

        let response = match Command::from_frame(frame) {
            Ok(cmd) => {
                debug!("comando recebido: {}", command_name(&cmd));
                execute_command(cmd, &store)
            }
            Err(e) => Frame::Error(format!("ERR {e}")),
        };

        conn.write_frame(&response).await?;
    }
}

/// Executa um comando e retorna o Frame de resposta.
///
/// Cada `READ` chama `consume` exatamente uma vez: um retry do cliente sobre
/// o mesmo token recebe NOTFOUND.
pub fn execute_command(cmd: Command, store: &MessageStore) -> Frame {
    match cmd {
        Command::Ping(msg) => match msg {
            Some(m) => Frame::Bulk(m),
            None => Frame::Simple("PONG".into()),
        },
        Command::Create { message, ttl } => match store.create(message, ttl) {
            Ok(token) => Frame::bulk(&token.link()),
            Err(e) => Frame::Error(format!("ERR {}", CommandError::from(e))),
        },
        Command::Read(token) => match store.consume(&token) {
            Some(content) => Frame::bulk(&content),
            None => Frame::not_found(),
        },
        Command::Count => Frame::Integer(store.len() as i64),
        Command::Purge => {
            let purged = store.purge_expired();
            info!("PURGE removeu {purged} mensagens vencidas");
            Frame::Integer(purged as i64)
        }
        Command::Unknown(name) => Frame::Error(format!("ERR unknown command '{name}'")),
    }
}

// Nunca loga conteúdo de mensagem
fn command_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::Ping(_) => "PING",
        Command::Create { .. } => "CREATE",
        Command::Read(_) => "READ",
        Command::Count => "COUNT",
        Command::Purge => "PURGE",
        Command::Unknown(_) => "UNKNOWN",
    }
}
