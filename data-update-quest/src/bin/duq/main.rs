mod commands;
mod context;
mod examples;
mod output;
mod theme;

use std::path::PathBuf;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand, builder::Styles, error::ErrorKind,
};

use colored::{Colorize, control::ShouldColorize};
use std::fmt::Write;
use std::io::{self, Write as _};

use commands::{
    diff::{DiffArgs, handle_diff},
    generate::{GenerateArgs, handle_generate},
    redis::{RedisCommands, handle_redis_commands},
};
use context::CliContext;
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{Glyph, Tone};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL for the redis commands"),
    ("REDIS_HOST", "Redis host, used when no URL is given"),
    ("REDIS_PORT", "Redis port (default 6379)"),
    ("REDIS_SECRET", "Redis password"),
    ("RUST_LOG", "Log filter, e.g. data_update_quest=debug"),
];

#[derive(Parser)]
#[command(name = "duq")]
#[command(author = "Data Update Quest Team")]
#[command(version)]
#[command(
    about = "Schema-diff migration templates for Redis JSON documents",
    long_about = r#"Data migration helper for documents stored in Redis (RediSearch + RedisJSON):

• Diff one model across two OpenAPI / Swagger documents
• Generate a jq transformation script and a README describing the changes
• Dump indexed documents to disk and upload them back

Commands:
  generate  Write transform.jq and README.md for a schema change
  diff      Show the field changes between two schema versions
  redis     List indexes, dump and upload documents
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: duq.toml in the current directory or an ancestor)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse arguments with themed help; help, version and usage errors exit here
    fn parse_with_styles() -> Self {
        let use_color = ShouldColorize::from_env().should_colorize();
        let err = match build_cli_command(use_color).try_get_matches() {
            Ok(matches) => match Cli::from_arg_matches(&matches) {
                Ok(cli) => return cli,
                Err(err) => err,
            },
            Err(err) => err,
        };

        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print_framed(Stream::Stdout, || err.print());
                std::process::exit(0);
            }
            ErrorKind::MissingSubcommand => {
                let mut command = build_cli_command(use_color);
                let name = command.get_name().to_string();
                print_framed(Stream::Stderr, || {
                    let mut stderr = io::stderr();
                    writeln!(stderr, "error: '{name}' requires a subcommand but one was not provided\n")?;
                    command.write_long_help(&mut stderr)
                });
                std::process::exit(err.exit_code());
            }
            _ => {
                print_framed(Stream::Stderr, || err.print());
                std::process::exit(err.exit_code());
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn blank_line(stream: Stream) {
    let _ = match stream {
        Stream::Stdout => writeln!(io::stdout()),
        Stream::Stderr => writeln!(io::stderr()),
    };
}

fn print_framed(stream: Stream, print: impl FnOnce() -> io::Result<()>) {
    blank_line(stream);
    if let Err(err) = print()
        && err.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("Failed to write help: {err}");
    }
    blank_line(stream);
}

fn build_cli_command(use_color: bool) -> Command {
    let painter = Painter { use_color };
    let mut command = Cli::command()
        .styles(help_styles())
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never })
        .after_long_help(painter.top_level_appendix());

    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            *subcommand = subcommand.clone().after_long_help(painter.examples(example.groups));
        }
    }
    command
}

/// Applies theme colors to help text when the terminal supports them
struct Painter {
    use_color: bool,
}

impl Painter {
    fn paint(&self, text: &str, tone: Tone, bold: bool) -> String {
        match (self.use_color, bold) {
            (false, _) => text.to_string(),
            (true, true) => text.color(tone.color()).bold().to_string(),
            (true, false) => text.color(tone.color()).to_string(),
        }
    }

    fn examples(&self, groups: &[ExampleGroup]) -> String {
        let mut buffer = String::new();
        let _ = writeln!(buffer, "{}", self.paint("Examples:", Tone::Section, true));

        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                buffer.push('\n');
            }
            let _ = writeln!(buffer, "  {}", self.paint(group.title, Tone::Title, true));
            for command in group.commands {
                let _ = writeln!(
                    buffer,
                    "    {} {}",
                    self.paint(Glyph::Step.symbol(), Tone::Command, false),
                    self.paint(command, Tone::Command, false)
                );
            }
        }

        buffer
    }

    fn top_level_appendix(&self) -> String {
        let mut buffer = String::new();
        let width = ENVIRONMENT_VARIABLES.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        let _ = writeln!(buffer, "{}", self.paint("Environment Variables:", Tone::Section, true));
        for (key, description) in ENVIRONMENT_VARIABLES {
            let _ = writeln!(
                buffer,
                "  {}  {}",
                self.paint(&format!("{key:<width$}"), Tone::Label, true),
                self.paint(description, Tone::Plain, false)
            );
        }

        let _ = writeln!(buffer);
        let _ = writeln!(
            buffer,
            "{} {}",
            self.paint("Tip:", Tone::Section, true),
            self.paint("Use 'duq <command> --help' to view examples for each command.", Tone::Command, false)
        );
        buffer
    }
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(Tone::Title.style().bold())
        .header(Tone::Section.style().bold())
        .literal(Tone::Command.style())
        .placeholder(Tone::Faint.style())
        .valid(Tone::Done.style())
        .invalid(Tone::Caution.style())
        .error(Tone::Failure.style().bold())
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a jq migration script and README from two schema versions
    Generate(GenerateArgs),

    /// Show field changes between two schema versions
    Diff(DiffArgs),

    /// Dump, upload, and inspect documents in Redis
    #[command(subcommand)]
    Redis(RedisCommands),
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();

    blank_line(Stream::Stdout);

    match execute(cli).await {
        Ok(()) => blank_line(Stream::Stdout),
        Err(err) => {
            eprintln!("Error: {err:#}");
            blank_line(Stream::Stdout);
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    if global_options.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(global_options);
    let ctx = CliContext::load(cli.config.as_deref())?;
    if let Some(path) = &ctx.config_path {
        output.verbose(&format!("Using config {}", path.display()));
    }

    match cli.command {
        Commands::Generate(args) => handle_generate(args, &ctx, &output)?,
        Commands::Diff(args) => handle_diff(args, &ctx, &output)?,
        Commands::Redis(redis_cmd) => handle_redis_commands(redis_cmd, &ctx, &output).await?,
    }

    Ok(())
}
