use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money_whole;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const FOCUS_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

/// Colors assigned to chart series in order.
pub const SERIES_COLORS: &[Color] = &[
    Color::Rgb(99, 110, 250),
    Color::Rgb(239, 85, 59),
    Color::Rgb(0, 204, 150),
    Color::Rgb(171, 99, 250),
    Color::Rgb(255, 161, 90),
    Color::Rgb(25, 211, 243),
    Color::Rgb(255, 102, 146),
    Color::Rgb(182, 232, 128),
    Color::Rgb(255, 151, 255),
    Color::Rgb(254, 203, 82),
];

pub fn series_color(i: usize) -> Color {
    SERIES_COLORS[i % SERIES_COLORS.len()]
}

/// Diverging blue-white-red scale for values in [-1, 1]. NaN is gray.
pub fn coolwarm(value: f64) -> Color {
    if value.is_nan() {
        return Color::DarkGray;
    }
    let v = value.clamp(-1.0, 1.0);
    let (cold, mid, warm) = ((59.0, 76.0, 192.0), (221.0, 221.0, 221.0), (180.0, 4.0, 38.0));
    let (from, to, t) = if v < 0.0 {
        (cold, mid, v + 1.0)
    } else {
        (mid, warm, v)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    Color::Rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Format a whole-dollar amount as a colored Span (green when positive, red when negative).
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money_whole(amount), style)
}

/// Number of lines `text` occupies when word-wrapped to `width` columns.
pub fn wrapped_line_count(text: &str, width: usize) -> u16 {
    if width == 0 {
        return 1;
    }
    textwrap::wrap(text, width).len().max(1) as u16
}

// ---------------------------------------------------------------------------
// Screen infrastructure
// ---------------------------------------------------------------------------

pub enum ScreenAction {
    Continue,
    Close,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> ScreenAction;
}

/// Run an interactive ratatui screen. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_screen(screen: &mut dyn Screen) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| screen.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match screen.handle_key(key.code, key.modifiers) {
                    ScreenAction::Close => break Ok(()),
                    ScreenAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
