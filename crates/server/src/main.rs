use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use burnnote_common::{DEFAULT_HOST, DEFAULT_PORT, MAX_CONNECTIONS};
use burnnote_store::MessageStore;

#[derive(Parser, Debug)]
#[command(
    name = "burnnote-server",
    about = "BurnNote — mensagens de leitura única com autodestruição"
)]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burnnote_server=info,burnnote_store=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    // Um único store por processo, compartilhado por todas as conexões
    let store = MessageStore::new();

    let listener = TcpListener::bind(&addr).await?;
    info!("BurnNote escutando em {addr}");

    burnnote_server::run(listener, store, args.max_connections, async {
        let _ = signal::ctrl_c().await;
    })
    .await;

    Ok(())
}
