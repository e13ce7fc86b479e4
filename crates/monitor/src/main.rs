use std::collections::VecDeque;
use std::{io, time::Duration};

use anyhow::Result;
use bytes::{Buf, BytesMut};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::interval;

use burnnote_common::{DEFAULT_HOST, DEFAULT_PORT};
use burnnote_protocol::{Command, Frame as RespFrame};

#[derive(Parser, Debug)]
#[command(name = "burnnote-monitor", about = "Monitor TUI for BurnNote")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Intervalo entre amostras, em milissegundos
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

/// Janela deslizante de amostras (tick, mensagens vivas).
struct App {
    data: VecDeque<(f64, f64)>,
    window_size: usize,
    x_offset: f64,
    last: Option<i64>,
}

impl App {
    fn new() -> Self {
        Self {
            data: VecDeque::with_capacity(100),
            window_size: 100,
            x_offset: 0.0,
            last: None,
        }
    }

    fn add_point(&mut self, live: i64) {
        self.x_offset += 1.0;
        if self.data.len() >= self.window_size {
            self.data.pop_front();
        }
        self.data.push_back((self.x_offset, live as f64));
        self.last = Some(live);
    }

    fn to_dataset(&self) -> Vec<(f64, f64)> {
        self.data.iter().cloned().collect()
    }

    fn max_y(&self) -> f64 {
        self.data.iter().map(|(_, y)| *y).fold(0.0, f64::max) + 10.0
    }
}

/// Envia COUNT e espera o inteiro de resposta.
async fn poll_count(stream: &mut TcpStream, buffer: &mut BytesMut) -> Result<i64> {
    stream
        .write_all(&Command::Count.to_frame().to_bytes())
        .await?;

    loop {
        if let Some((frame, len)) = RespFrame::decode(buffer)? {
            buffer.advance(len);
            return match frame {
                RespFrame::Integer(n) => Ok(n),
                RespFrame::Error(msg) => Err(anyhow::anyhow!(msg)),
                other => Err(anyhow::anyhow!("resposta inesperada a COUNT: {other:?}")),
            };
        }

        if stream.read_buf(buffer).await? == 0 {
            return Err(anyhow::anyhow!("servidor fechou a conexão"));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    // Conecta antes de tomar o terminal para o erro aparecer normalmente
    let mut stream = TcpStream::connect(&addr).await?;
    let mut buffer = BytesMut::with_capacity(128);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut ticker = interval(Duration::from_millis(args.interval_ms.max(50)));

    let outcome: Result<()> = async {
        loop {
            terminal.draw(|f| ui(f, &app, &addr))?;

            if event::poll(Duration::from_millis(0))?
                && let Event::Key(key) = event::read()?
                && key.code == KeyCode::Char('q')
            {
                return Ok::<(), anyhow::Error>(());
            }

            ticker.tick().await;
            let live = poll_count(&mut stream, &mut buffer).await?;
            app.add_point(live);
        }
    }
    .await;

    // Restaura o terminal mesmo quando a conexão cai
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn ui(f: &mut Frame, app: &App, addr: &str) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(10), Constraint::Percentage(90)])
        .split(size);

    // Header
    let status = match app.last {
        Some(live) => format!("BurnNote Monitor - {addr} - {live} mensagens vivas"),
        None => format!("BurnNote Monitor - {addr} - aguardando primeira amostra"),
    };
    let title = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(title, chunks[0]);

    // Chart
    let data_points = app.to_dataset();
    let dataset = vec![
        Dataset::default()
            .name("Mensagens")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Yellow))
            .graph_type(GraphType::Line)
            .data(&data_points),
    ];

    let x_labels = vec![
        Span::styled(
            format!("{:.0}", app.x_offset - app.window_size as f64),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:.0}", app.x_offset),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];

    let max_y = app.max_y();

    let chart = Chart::new(dataset)
        .block(
            Block::default()
                .title("Mensagens não lidas ao longo do tempo")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Amostra")
                .style(Style::default().fg(Color::Gray))
                .bounds([app.x_offset - app.window_size as f64, app.x_offset])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Vivas")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_y])
                .labels(vec![
                    Span::raw("0"),
                    Span::styled(
                        format!("{:.0}", max_y),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
        );

    f.render_widget(chart, chunks[1]);
}
