use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ebook_export::{Book, Config, ExportFormat, Result, outline};

#[derive(Parser)]
#[command(name = "ebook-export")]
#[command(about = "Export Markdown books to PDF and DOCX")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a book file (JSON or TOML) to PDF or DOCX
    Export {
        /// Book file
        book: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,

        /// Output file (defaults to the sanitized book title)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Styling config (TOML)
        #[arg(short, long, default_value = "ebook-export.toml")]
        config: PathBuf,
    },

    /// Print the block sequence of a Markdown file (or a `.json` token stream) as JSON
    Blocks {
        /// Input Markdown file, or a JSON token array
        input: PathBuf,

        /// Styling config (TOML)
        #[arg(short, long, default_value = "ebook-export.toml")]
        config: PathBuf,
    },

    /// Print the token stream of a Markdown file as JSON
    Tokens {
        /// Input Markdown file
        input: PathBuf,
    },

    /// Turn a generated outline reply into a book skeleton (JSON)
    Outline {
        /// File holding the raw reply text
        reply: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Export {
            book,
            format,
            output,
            config,
        } => {
            let config = Config::load(&config)?;
            let book = Book::load(&book)?;
            let artifact = ebook_export::export_book(&book, format, &config)?;

            let output = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            fs::write(&output, &artifact.bytes)?;
            println!("Created {}", output.display());
        }
        Command::Blocks { input, config } => {
            let config = Config::load(&config)?;
            let text = read_input(&input)?;
            let tokens = if input.extension().is_some_and(|ext| ext == "json") {
                ebook_export::tokens_from_json(&text)?
            } else {
                ebook_export::tokenize(&text)
            };
            let conversion = ebook_export::convert(&tokens, &config.body_style());
            for skipped in &conversion.skipped {
                eprintln!("skipped token {}: {}", skipped.index, skipped.reason);
            }
            println!("{}", serde_json::to_string_pretty(&conversion.blocks)?);
        }
        Command::Tokens { input } => {
            let markdown = read_input(&input)?;
            let tokens = ebook_export::tokenize(&markdown);
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Command::Outline {
            reply,
            title,
            author,
        } => {
            let reply = read_input(&reply)?;
            let chapters = outline::parse_outline(&reply)?;
            let book = outline::book_from_outline(&title, &author, chapters);
            book.validate()?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "cannot read input");
        e.into()
    })
}
