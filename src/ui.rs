use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
};
use std::{
    io::{self, Stdout},
    time::Duration,
};

use rezvibe::{Actuator, Session};

/// Host-side actions requested from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    Play,
    Stop,
    ToggleSurface,
}

/// What the surface shows, copied out of the session once per frame.
pub struct App {
    pub should_quit: bool,
    pub speed: u8,
    pub has_actuator: bool,
    pub actuator_name: String,
    pub playing: bool,
    pub surface_active: bool,
    pub volume: i32,
    pub renders: u64,
    pub energies: Vec<f32>,
    pub beat_band: Option<usize>,
    pub sample_rate: u32,
    pub device_name: String,
}

impl App {
    pub fn new(sample_rate: u32, device_name: String) -> App {
        App {
            should_quit: false,
            speed: 0,
            has_actuator: false,
            actuator_name: String::new(),
            playing: false,
            surface_active: false,
            volume: 0,
            renders: 0,
            energies: Vec::new(),
            beat_band: None,
            sample_rate,
            device_name,
        }
    }

    pub fn sync<A: Actuator>(&mut self, session: &Session<A>) {
        self.speed = session.speed();
        self.has_actuator = session.actuator_present();
        self.actuator_name = session.actuator_name();
        self.playing = session.playing();
        self.surface_active = session.surface_active();
        self.volume = session.volume();
        self.renders = session.render_count();
        self.energies.clear();
        self.energies.extend_from_slice(session.detector().energies());
        self.beat_band = session.last_beat().map(|b| b.band);
    }
}

pub type TerminalType = Terminal<CrosstermBackend<Stdout>>;

pub fn init_terminal() -> Result<TerminalType, anyhow::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal() -> Result<(), anyhow::Error> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

pub fn handle_events() -> Result<Option<Command>, anyhow::Error> {
    if event::poll(Duration::from_millis(0))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(Command::Quit)
                    }
                    KeyCode::Char(' ') => Some(Command::TogglePause),
                    KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::Play),
                    KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::Stop),
                    KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::ToggleSurface),
                    _ => None,
                });
            }
        }
    }
    Ok(None)
}

/// Flood colour for the intensity panel: grey with an actuator, red without.
pub fn motor_colour(speed: u8, has_actuator: bool) -> Color {
    if has_actuator {
        Color::Rgb(speed, speed, speed)
    } else {
        Color::Rgb(speed, 0, 0)
    }
}

pub fn draw_ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if size.width < 30 || size.height < 17 {
        let error_msg = Paragraph::new("Terminal too small!\nMinimum: 30x17")
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(error_msg, size);
        return;
    }

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(4), // Motor speed
            Constraint::Min(8),    // Bands
            Constraint::Length(4), // Status bar
        ])
        .split(size);

    draw_title(f, main_layout[0]);
    if app.surface_active {
        draw_motor(f, main_layout[1], app);
        draw_bands(f, main_layout[2], app);
    } else {
        let hidden = Paragraph::new("Surface hidden (H to show)")
            .style(Style::default().fg(Color::Rgb(128, 128, 128)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        let area = Rect {
            height: main_layout[1].height + main_layout[2].height,
            ..main_layout[1]
        };
        f.render_widget(hidden, area);
    }
    draw_status_bar(f, main_layout[3], app);
}

fn draw_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new("rezvibe")
        .style(
            Style::default()
                .fg(Color::Rgb(128, 224, 208))
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Rgb(96, 160, 192))),
        );
    f.render_widget(title, area);
}

fn draw_motor(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Motor ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(96, 160, 192)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let text = Paragraph::new(format!("Speed: {:3} / 255", app.speed))
        .style(Style::default().fg(Color::Rgb(200, 200, 200)))
        .alignment(Alignment::Center);
    f.render_widget(text, layout[0]);

    let gauge = Gauge::default()
        .block(Block::default())
        .gauge_style(Style::default().fg(motor_colour(app.speed, app.has_actuator)))
        .ratio(app.speed as f64 / 255.0)
        .label("");
    f.render_widget(gauge, layout[1]);
}

fn draw_bands(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Band energy ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(96, 160, 192)));

    if app.energies.is_empty() {
        let waiting = Paragraph::new("Waiting for audio data...")
            .style(Style::default().fg(Color::Rgb(128, 128, 128)))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(waiting, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let bars: Vec<Bar> = app
        .energies
        .iter()
        .enumerate()
        .map(|(band, &energy)| {
            let colour = if app.beat_band == Some(band) {
                Color::Rgb(255, 255, 0)
            } else {
                Color::Rgb(64, 224, 208)
            };
            Bar::default()
                .value(energy.round() as u64)
                .label(Line::from(format!("{}", band)))
                .text_value(String::new())
                .style(Style::default().fg(colour))
        })
        .collect();

    let bar_width = (inner.width / app.energies.len().max(1) as u16)
        .saturating_sub(1)
        .max(1);
    let barchart = BarChart::default()
        .block(Block::default())
        .data(BarGroup::default().bars(&bars))
        .max(255)
        .bar_width(bar_width)
        .bar_gap(1);

    f.render_widget(barchart, inner);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(96, 160, 192)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let label = Style::default().fg(Color::Rgb(128, 160, 192));
    let value = Style::default().fg(Color::White);
    let key = Style::default()
        .fg(Color::Rgb(255, 255, 0))
        .add_modifier(Modifier::BOLD);

    let state = if app.playing { "playing" } else { "stopped" };
    let actuator = if app.has_actuator {
        app.actuator_name.clone()
    } else {
        "none".to_string()
    };

    let status_text = vec![
        Line::from(vec![
            Span::styled("Device: ", label),
            Span::styled(app.device_name.clone(), value),
            Span::styled(" | ", label),
            Span::styled(format!("{} Hz", app.sample_rate), value),
            Span::styled(" | Actuator: ", label),
            Span::styled(actuator, value),
            Span::styled(" | ", label),
            Span::styled(format!("{} (vol {})", state, app.volume), value),
            Span::styled(format!(" | #{}", app.renders), label),
        ]),
        Line::from(vec![
            Span::styled("Space", key),
            Span::styled(" pause  ", value),
            Span::styled("P", key),
            Span::styled(" play  ", value),
            Span::styled("S", key),
            Span::styled(" stop  ", value),
            Span::styled("H", key),
            Span::styled(" surface  ", value),
            Span::styled("Q", key),
            Span::styled("/", label),
            Span::styled("ESC", key),
            Span::styled(" quit", value),
        ]),
    ];

    let status = Paragraph::new(status_text).alignment(Alignment::Center);
    f.render_widget(status, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_tracks_actuator_presence() {
        assert_eq!(motor_colour(200, true), Color::Rgb(200, 200, 200));
        assert_eq!(motor_colour(200, false), Color::Rgb(200, 0, 0));
    }
}
