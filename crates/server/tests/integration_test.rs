use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;

use burnnote_protocol::Frame;
use burnnote_store::MessageStore;

/// Helper: envia um comando e lê o frame de resposta.
async fn send_command(stream: &mut TcpStream, args: &[&str]) -> Frame {
    let frame = Frame::array_from_strs(args);
    stream.write_all(&frame.to_bytes()).await.unwrap();
    stream.flush().await.unwrap();

    let mut response_buf = BytesMut::with_capacity(4096);
    loop {
        let n = stream.read_buf(&mut response_buf).await.unwrap();
        assert!(n > 0, "server closed connection unexpectedly");

        if let Some((frame, _)) = Frame::decode(&response_buf).unwrap() {
            return frame;
        }
    }
}

/// Sobe um servidor numa porta efêmera com store isolado.
async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = MessageStore::new();

    tokio::spawn(burnnote_server::run(
        listener,
        store,
        16,
        std::future::pending(),
    ));

    addr
}

async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.unwrap()
}

/// Extrai o token de um link `/read/{token}`.
fn token_of(frame: &Frame) -> String {
    match frame {
        Frame::Bulk(data) => {
            let link = std::str::from_utf8(data).unwrap();
            assert!(link.starts_with("/read/"), "link inesperado: {link}");
            link["/read/".len()..].to_string()
        }
        other => panic!("expected link bulk, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ping_pong() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let response = send_command(&mut stream, &["PING"]).await;
    assert_eq!(response, Frame::Simple("PONG".into()));

    let response = send_command(&mut stream, &["PING", "hello"]).await;
    assert_eq!(response, Frame::Bulk(Bytes::from("hello")));
}

#[tokio::test]
async fn test_create_read_once() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let link = send_command(&mut stream, &["CREATE", "hello"]).await;
    let token = token_of(&link);

    let response = send_command(&mut stream, &["READ", &token]).await;
    assert_eq!(response, Frame::bulk("hello"));

    let response = send_command(&mut stream, &["READ", &token]).await;
    assert_eq!(response, Frame::not_found());
}

#[tokio::test]
async fn test_read_by_link() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let link = send_command(&mut stream, &["CREATE", "via link", "TTL", "600"]).await;
    let link = match link {
        Frame::Bulk(data) => String::from_utf8(data.to_vec()).unwrap(),
        other => panic!("expected link bulk, got {other:?}"),
    };

    let response = send_command(&mut stream, &["READ", &link]).await;
    assert_eq!(response, Frame::bulk("via link"));
}

#[tokio::test]
async fn test_second_client_sees_not_found() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    let token = token_of(&send_command(&mut alice, &["CREATE", "só uma vez"]).await);

    let response = send_command(&mut bob, &["READ", &token]).await;
    assert_eq!(response, Frame::bulk("só uma vez"));

    let response = send_command(&mut alice, &["READ", &token]).await;
    assert_eq!(response, Frame::not_found());
}

#[tokio::test]
async fn test_concurrent_reads_single_winner() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;
    let token = token_of(&send_command(&mut stream, &["CREATE", "disputada"]).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let mut stream = connect(addr).await;
            send_command(&mut stream, &["READ", &token]).await
        }));
    }

    let mut winners = 0;
    for h in handles {
        match h.await.unwrap() {
            Frame::Bulk(data) => {
                assert_eq!(data, Bytes::from("disputada"));
                winners += 1;
            }
            other => assert_eq!(other, Frame::not_found()),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_expired_message_not_found() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let token = token_of(&send_command(&mut stream, &["CREATE", "secret", "TTL", "0.1"]).await);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let response = send_command(&mut stream, &["READ", &token]).await;
    assert_eq!(response, Frame::not_found());
}

#[tokio::test]
async fn test_unknown_token_not_found() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let response = send_command(&mut stream, &["READ", "nonexistent-token"]).await;
    assert_eq!(response, Frame::not_found());
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let response = send_command(&mut stream, &["CREATE", ""]).await;
    assert_eq!(
        response,
        Frame::Error("ERR Message content is required.".into())
    );

    for bad in ["0", "-1", "soon"] {
        let response = send_command(&mut stream, &["CREATE", "x", "TTL", bad]).await;
        assert_eq!(
            response,
            Frame::Error("ERR Invalid duration provided.".into())
        );
    }

    let response = send_command(&mut stream, &["COUNT"]).await;
    assert_eq!(response, Frame::Integer(0));
}

#[tokio::test]
async fn test_count() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    send_command(&mut stream, &["CREATE", "a"]).await;
    let token = token_of(&send_command(&mut stream, &["CREATE", "b", "TTL", "60"]).await);

    let response = send_command(&mut stream, &["COUNT"]).await;
    assert_eq!(response, Frame::Integer(2));

    send_command(&mut stream, &["READ", &token]).await;
    let response = send_command(&mut stream, &["COUNT"]).await;
    assert_eq!(response, Frame::Integer(1));
}

#[tokio::test]
async fn test_unknown_command() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    let response = send_command(&mut stream, &["FOOBAR"]).await;
    match response {
        Frame::Error(msg) => assert!(msg.contains("unknown command")),
        _ => panic!("expected error frame"),
    }
}

#[tokio::test]
async fn test_nested_frame_closes_only_that_connection() {
    let addr = start_server().await;
    let mut keeper = connect(addr).await;
    let token = token_of(&send_command(&mut keeper, &["CREATE", "sobrevive"]).await);

    let mut attacker = connect(addr).await;
    // Pequeno o bastante para o servidor ler tudo antes de fechar
    attacker.write_all(&b"*1\r\n".repeat(64)).await.unwrap();

    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), attacker.read_to_end(&mut reply))
        .await
        .unwrap()
        .unwrap_or_default();
    let reply = String::from_utf8_lossy(&reply);
    assert!(reply.starts_with("-ERR Protocol error"), "reply: {reply}");

    // O processo segue de pé e a mensagem continua lá
    let response = send_command(&mut keeper, &["READ", &token]).await;
    assert_eq!(response, Frame::bulk("sobrevive"));
}

#[tokio::test]
async fn test_purge() {
    let addr = start_server().await;
    let mut stream = connect(addr).await;

    send_command(&mut stream, &["CREATE", "fica"]).await;
    let response = send_command(&mut stream, &["PURGE"]).await;
    assert_eq!(response, Frame::Integer(0));

    let response = send_command(&mut stream, &["COUNT"]).await;
    assert_eq!(response, Frame::Integer(1));
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(burnnote_server::run(
        listener,
        MessageStore::new(),
        16,
        async {
            let _ = rx.await;
        },
    ));

    let mut stream = connect(addr).await;
    assert_eq!(
        send_command(&mut stream, &["PING"]).await,
        Frame::Simple("PONG".into())
    );

    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), server)
        .await
        .unwrap()
        .unwrap();

    // A conexão aberta recebe EOF
    let mut buf = [0u8; 16];
    let n = tokio::time::timeout(Duration::from_secs(1), stream.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}
