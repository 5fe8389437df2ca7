use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{
    error::Error,
    io,
    net::UdpSocket,
    time::{Duration, Instant},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Chart, Dataset, GraphType},
    Frame, Terminal,
};

use pointillism::receiver::{decode_points, PointTable};

/// Largest datagram we expect; a point message is well under this.
const MAX_DATAGRAM: usize = 1536;

const AXIS_BOUND: f64 = 1.2;

struct App {
    socket: UdpSocket,
    table: PointTable,
    received: usize,
    upper: Vec<(f64, f64)>,
    lower: Vec<(f64, f64)>,
}

impl App {
    fn new(socket: UdpSocket, table: PointTable) -> App {
        App {
            socket,
            table,
            received: 0,
            upper: vec![],
            lower: vec![],
        }
    }

    /// Drains every datagram waiting on the socket into the table.
    fn poll_socket(&mut self) -> io::Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, _)) => {
                    for point in decode_points(&buf[..len]) {
                        if self.table.apply(&point) {
                            self.received += 1;
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    fn on_tick(&mut self, dt: f32) {
        self.table.tick(dt);

        self.upper.clear();
        self.lower.clear();
        for (_, slot) in self.table.visible() {
            let [x, y, z] = slot.position;
            let xy = (x as f64, y as f64);
            if z >= 0.0 {
                self.upper.push(xy);
            } else {
                self.lower.push(xy);
            }
        }
    }
}

pub fn engage_gui(socket: UdpSocket, table: PointTable) -> Result<(), Box<dyn Error>> {
    socket.set_nonblocking(true)?;

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let tick_rate = Duration::from_millis(33);
    let app = App::new(socket, table);
    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let KeyCode::Char('q') = key.code {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.poll_socket()?;
            app.on_tick(last_tick.elapsed().as_secs_f32());
            last_tick = Instant::now();
        }
    }
}

fn axis_labels() -> Vec<Span<'static>> {
    [-AXIS_BOUND, 0.0, AXIS_BOUND]
        .iter()
        .map(|v| Span::from(format!("{:.1}", v)))
        .collect()
}

// Top-down view: front is +x, left is +y
fn ui(f: &mut Frame, app: &App) {
    let chart = Chart::new(vec![
        Dataset::default()
            .name("Above")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&app.upper),
        Dataset::default()
            .name("Below")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&app.lower),
    ])
    .block(Block::default().title(format!(
        "Points ({} visible, {} received, q to quit)",
        app.upper.len() + app.lower.len(),
        app.received
    )))
    .x_axis(
        Axis::default()
            .title(Span::styled("X (front)", Style::default().fg(Color::Red)))
            .style(Style::default().fg(Color::White))
            .bounds([-AXIS_BOUND, AXIS_BOUND])
            .labels(axis_labels()),
    )
    .y_axis(
        Axis::default()
            .title(Span::styled("Y (left)", Style::default().fg(Color::Red)))
            .style(Style::default().fg(Color::White))
            .bounds([-AXIS_BOUND, AXIS_BOUND])
            .labels(axis_labels()),
    );

    f.render_widget(chart, f.size());
}
