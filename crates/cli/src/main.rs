use std::io::{self, Write};

use bytes::{Buf, BytesMut};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use burnnote_common::{DEFAULT_HOST, DEFAULT_PORT, INITIAL_BUFFER_CAPACITY};
use burnnote_protocol::{Command, Frame};

#[derive(Parser, Debug)]
#[command(name = "burnnote-cli", about = "BurnNote CLI client")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST, global = true)]
    host: String,
    #[arg(long, short, default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    /// Sem subcomando abre o modo interativo
    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Guarda uma mensagem e imprime o link de leitura única
    Send {
        message: String,
        /// Prazo de validade; sem ele a mensagem só some quando for lida
        #[arg(long)]
        ttl: Option<u64>,
        #[arg(long, value_enum, default_value_t = TtlUnit::Seconds)]
        unit: TtlUnit,
    },
    /// Lê (e destrói) uma mensagem a partir do token ou do link
    Read { reference: String },
    /// Prompt interativo com comandos RESP crus
    Repl,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum TtlUnit {
    Seconds,
    Minutes,
    Hours,
}

impl TtlUnit {
    fn to_seconds(self, amount: u64) -> Option<u64> {
        match self {
            TtlUnit::Seconds => Some(amount),
            TtlUnit::Minutes => amount.checked_mul(60),
            TtlUnit::Hours => amount.checked_mul(60 * 60),
        }
    }
}

/// Conexão com o servidor; guarda o que sobrar no buffer entre respostas.
struct Client {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Client {
    async fn connect(addr: &str) -> anyhow::Result<Self> {
        debug!("conectando a {addr}");
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        })
    }

    async fn request(&mut self, frame: &Frame) -> anyhow::Result<Frame> {
        self.stream.write_all(&frame.to_bytes()).await?;
        self.stream.flush().await?;

        loop {
            if let Some((response, len)) =
                Frame::decode(&self.buffer).map_err(|e| anyhow::anyhow!("parse error: {e}"))?
            {
                self.buffer.advance(len);
                return Ok(response);
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("servidor fechou a conexão"));
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burnnote_cli=warn".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    match args.command {
        Some(Action::Send { message, ttl, unit }) => {
            let cmd = build_create(&message, ttl, unit)?;
            let mut client = Client::connect(&addr).await?;
            let link = expect_bulk(client.request(&cmd.to_frame()).await?)?;
            println!("{link}");
            match ttl {
                Some(_) => println!("O link se autodestrói após uma leitura ou ao expirar."),
                None => println!("O link se autodestrói após uma leitura."),
            }
        }
        Some(Action::Read { reference }) => {
            let mut client = Client::connect(&addr).await?;
            let cmd = Command::Read(reference.trim().to_string());
            let message = expect_bulk(client.request(&cmd.to_frame()).await?)?;
            println!("{message}");
        }
        Some(Action::Repl) | None => repl(&addr).await?,
    }

    Ok(())
}

/// Monta o CREATE como o formulário web: mensagem aparada, prazo inteiro positivo.
fn build_create(message: &str, ttl: Option<u64>, unit: TtlUnit) -> anyhow::Result<Command> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("digite uma mensagem");
    }

    let ttl = match ttl {
        Some(0) => anyhow::bail!("a duração deve ser um número positivo"),
        Some(amount) => {
            let secs = unit
                .to_seconds(amount)
                .ok_or_else(|| anyhow::anyhow!("duração grande demais"))?;
            Some(std::time::Duration::from_secs(secs))
        }
        None => None,
    };

    Ok(Command::Create {
        message: message.to_string(),
        ttl,
    })
}

fn expect_bulk(frame: Frame) -> anyhow::Result<String> {
    match frame {
        Frame::Bulk(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
        Frame::Error(msg) => Err(anyhow::anyhow!(msg)),
        other => Err(anyhow::anyhow!(
            "resposta inesperada: {}",
            format_frame(&other, 0)
        )),
    }
}

async fn repl(addr: &str) -> anyhow::Result<()> {
    let mut client = Client::connect(addr).await?;
    println!("Conectado a {addr}");

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("burnnote> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        let frame = Frame::array_from_strs(&tokens.iter().map(|s| s.as_str()).collect::<Vec<_>>());
        match client.request(&frame).await {
            Ok(response) => println!("{}", format_frame(&response, 0)),
            Err(e) => {
                println!("(error) {e}");
                break;
            }
        }
    }

    Ok(())
}

/// Tokeniza a linha de input com suporte a strings quoted.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    // Distingue `""` (argumento vazio) de nenhum argumento
    let mut quoted = false;
    let mut quote_char = '"';
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote_char {
                in_quote = false;
            } else if c == '\\' {
                match chars.peek() {
                    Some(&'n') => current.push('\n'),
                    Some(&'t') => current.push('\t'),
                    Some(&esc) if matches!(esc, '\\' | '"' | '\'') => current.push(esc),
                    _ => {
                        current.push(c);
                        continue;
                    }
                }
                chars.next();
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = true;
            quoted = true;
            quote_char = c;
        } else if c.is_whitespace() {
            if !current.is_empty() || quoted {
                tokens.push(std::mem::take(&mut current));
                quoted = false;
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    tokens
}

/// Formata um frame para exibição humana.
fn format_frame(frame: &Frame, indent: usize) -> String {
    let pad = " ".repeat(indent);
    match frame {
        Frame::Simple(s) => format!("{pad}\"{s}\""),
        Frame::Error(s) => format!("{pad}(error) {s}"),
        Frame::Integer(n) => format!("{pad}(integer) {n}"),
        Frame::Bulk(data) => match std::str::from_utf8(data) {
            Ok(s) => format!("{pad}\"{s}\""),
            Err(_) => format!("{pad}(binary) {} bytes", data.len()),
        },
        Frame::Null => format!("{pad}(nil)"),
        Frame::Array(frames) => {
            if frames.is_empty() {
                return format!("{pad}(empty array)");
            }
            let mut lines = Vec::new();
            for (i, f) in frames.iter().enumerate() {
                lines.push(format!("{pad}{}) {}", i + 1, format_frame(f, 0)));
            }
            lines.join("\n")
        }
    }
}
