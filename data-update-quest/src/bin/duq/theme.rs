//! Colors and glyphs of `duq` console output.

use clap::builder::styling::AnsiColor;
use colored::Color;
use comfy_table::Color as CellColor;

use data_update_quest::differ::ChangeKind;

/// Role of a piece of console text. Each role has one color across
/// messages, tables and `--help`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Headings, help usage line, example group titles
    Title,
    /// Help section headers, table headers, progress
    Section,
    /// Example commands and help literals
    Command,
    /// Keys of key/value lines
    Label,
    Plain,
    Faint,
    Done,
    Caution,
    Note,
    Failure,
}

impl Tone {
    fn ansi(self) -> AnsiColor {
        match self {
            Tone::Title => AnsiColor::BrightBlue,
            Tone::Section => AnsiColor::Cyan,
            Tone::Command => AnsiColor::Magenta,
            Tone::Label => AnsiColor::BrightCyan,
            Tone::Plain => AnsiColor::White,
            Tone::Faint => AnsiColor::BrightBlack,
            Tone::Done => AnsiColor::Green,
            Tone::Caution => AnsiColor::Yellow,
            Tone::Note => AnsiColor::Blue,
            Tone::Failure => AnsiColor::Red,
        }
    }

    /// For `colored` strings
    pub fn color(self) -> Color {
        match self.ansi() {
            AnsiColor::BrightBlue => Color::BrightBlue,
            AnsiColor::Cyan => Color::Cyan,
            AnsiColor::Magenta => Color::Magenta,
            AnsiColor::BrightCyan => Color::BrightCyan,
            AnsiColor::BrightBlack => Color::BrightBlack,
            AnsiColor::Green => Color::Green,
            AnsiColor::Yellow => Color::Yellow,
            AnsiColor::Blue => Color::Blue,
            AnsiColor::Red => Color::Red,
            _ => Color::White,
        }
    }

    /// For `comfy-table` cells
    pub fn cell_color(self) -> CellColor {
        match self.ansi() {
            AnsiColor::BrightBlue => CellColor::Blue,
            AnsiColor::Cyan | AnsiColor::BrightCyan => CellColor::Cyan,
            AnsiColor::Magenta => CellColor::Magenta,
            AnsiColor::BrightBlack => CellColor::DarkGrey,
            AnsiColor::Green => CellColor::Green,
            AnsiColor::Yellow => CellColor::Yellow,
            AnsiColor::Blue => CellColor::DarkBlue,
            AnsiColor::Red => CellColor::Red,
            _ => CellColor::White,
        }
    }

    /// For clap help styles
    pub fn style(self) -> clap::builder::styling::Style {
        clap::builder::styling::Style::new().fg_color(Some(self.ansi().into()))
    }
}

/// Marker color of a change row in `duq diff`
pub fn change_tone(kind: ChangeKind) -> Tone {
    match kind {
        ChangeKind::Added => Tone::Done,
        ChangeKind::Removed => Tone::Failure,
        ChangeKind::TypeChanged => Tone::Caution,
        ChangeKind::Renamed => Tone::Section,
    }
}

/// Leading symbol of a console line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Done,
    Caution,
    Note,
    Step,
    Bullet,
    Busy,
    /// One dumped index directory
    Index,
    /// One written file
    File,
}

impl Glyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Done => "✓",
            Glyph::Caution => "⚠",
            Glyph::Note => "ℹ",
            Glyph::Step => "→",
            Glyph::Bullet => "•",
            Glyph::Busy => "⟳",
            Glyph::Index => "📁",
            Glyph::File => "📄",
        }
    }
}
