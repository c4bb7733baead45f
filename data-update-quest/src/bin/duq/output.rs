use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Table, presets};
use serde::Serialize;

use crate::theme::{Glyph, Tone};

/// What the command result is printed as
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Table,
    /// Pretty JSON on stdout, messages moved off stdout
    Json,
    /// One line: the script for `generate`, change markers for `diff`
    Compact,
}

#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Command results printable as a table or a single line
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Table with `headers` in bold, styled for the color setting
pub fn table_with_header(options: &GlobalOptions, headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(if options.no_color {
        presets::ASCII_FULL
    } else {
        presets::UTF8_FULL_CONDENSED
    });
    table.set_header(headers.iter().map(|header| {
        let cell = Cell::new(header).add_attribute(Attribute::Bold);
        if options.no_color { cell } else { cell.fg(Tone::Section.cell_color()) }
    }));
    table
}

/// Where console lines go
#[derive(Clone, Copy)]
enum Channel {
    Out,
    Err,
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Status lines stay off stdout when it carries JSON.
    fn chatty(&self) -> bool {
        !self.options.quiet && self.options.output_format != OutputFormat::Json
    }

    fn paint(&self, text: &str, tone: Tone, bold: bool) -> String {
        match (self.options.no_color, bold) {
            (true, _) => text.to_string(),
            (false, true) => text.color(tone.color()).bold().to_string(),
            (false, false) => text.color(tone.color()).to_string(),
        }
    }

    fn emit(&self, channel: Channel, glyph: Glyph, tone: Tone, message: &str) {
        let line = format!("{} {}", self.paint(glyph.symbol(), tone, false), self.paint(message, tone, false));
        match channel {
            Channel::Out => println!("{line}"),
            Channel::Err => eprintln!("{line}"),
        }
    }

    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Table => println!("{}", data.to_table(&self.options)),
            OutputFormat::Compact => println!("{}", data.to_compact()),
        }
        Ok(())
    }

    pub fn success(&self, message: &str) {
        if self.chatty() {
            self.emit(Channel::Out, Glyph::Done, Tone::Done, message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.chatty() {
            self.emit(Channel::Out, Glyph::Note, Tone::Note, message);
        }
    }

    /// Warnings and `--verbose` notes go to stderr, so they also show with `--output json`.
    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            self.emit(Channel::Err, Glyph::Caution, Tone::Caution, message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            self.emit(Channel::Err, Glyph::Step, Tone::Faint, message);
        }
    }

    pub fn heading(&self, text: &str) {
        if !self.chatty() {
            return;
        }
        if self.options.no_color {
            println!("\n{text}\n{}", "=".repeat(text.chars().count()));
        } else {
            println!("\n{}", self.paint(text, Tone::Title, true));
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.chatty() {
            println!("{}: {}", self.paint(key, Tone::Label, true), self.paint(value, Tone::Plain, false));
        }
    }

    /// Indented list entry under the previous line
    pub fn item(&self, glyph: Glyph, text: &str) {
        if self.chatty() {
            println!("  {} {text}", self.paint(glyph.symbol(), Tone::Faint, false));
        }
    }

    /// `⟳ message...` without a newline; [`OutputManager::end_progress`] erases it.
    pub fn progress(&self, message: &str) {
        if self.chatty() {
            print!(
                "\r{} {}...",
                self.paint(Glyph::Busy.symbol(), Tone::Section, true),
                self.paint(message, Tone::Section, false)
            );
            std::io::stdout().flush().ok();
        }
    }

    pub fn end_progress(&self) {
        if self.chatty() {
            print!("\r{:80}\r", "");
            std::io::stdout().flush().ok();
        }
    }
}
