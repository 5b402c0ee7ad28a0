//! folio - markdown ebook exporter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use folio::ai::{CommandGenerator, OutlineRequest, generate_outline};
use folio::export::{ExportFormat, export_book};
use folio::{BookStore, Config, Error, MemoryStore, Result};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Markdown ebook exporter", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio export book.json -f pdf            Render book.json to <Title>.pdf
    folio export books.json --id b1 -f doc   Render one book from a collection
    folio outline \"Beekeeping\" -n 8           Draft an outline with the configured generator")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a book to PDF or DOCX
    Export {
        /// JSON file holding one book or an array of books
        #[arg(value_name = "BOOKS")]
        books: PathBuf,

        /// Book id, required when the file holds more than one book
        #[arg(long)]
        id: Option<String>,

        /// Output format: pdf, doc or docx
        #[arg(short, long, default_value = "pdf")]
        format: String,

        /// Output file (defaults to the sanitized title)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory cover image paths are resolved against
        #[arg(long, value_name = "DIR")]
        upload_root: Option<PathBuf>,
    },

    /// Generate a chapter outline with the configured text generator
    Outline {
        topic: String,

        #[arg(short, long)]
        style: Option<String>,

        /// Number of chapters
        #[arg(short = 'n', long)]
        chapters: Option<u32>,

        #[arg(short, long)]
        description: Option<String>,

        /// Generator command, overriding the configuration
        #[arg(long, value_name = "PROGRAM")]
        command: Option<String>,
    },

    /// Serve the export and AI endpoints over HTTP
    #[cfg(feature = "web")]
    Serve {
        /// JSON file with the books to serve
        #[arg(value_name = "BOOKS")]
        books: PathBuf,

        /// Listen address, overriding the configuration
        #[arg(short, long)]
        listen: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Export {
            books,
            id,
            format,
            output,
            upload_root,
        } => export(&config, &books, id, &format, output, upload_root),
        Command::Outline {
            topic,
            style,
            chapters,
            description,
            command,
        } => {
            let mut request = OutlineRequest::new(topic);
            if let Some(style) = style {
                request = request.with_style(style);
            }
            if let Some(n) = chapters {
                request = request.with_chapters(n);
            }
            if let Some(description) = description {
                request = request.with_description(description);
            }
            outline(&config, &request, command)
        }
        #[cfg(feature = "web")]
        Command::Serve { books, listen } => serve(config, &books, listen),
    }
}

fn export(
    config: &Config,
    books: &Path,
    id: Option<String>,
    format: &str,
    output: Option<PathBuf>,
    upload_root: Option<PathBuf>,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let store = MemoryStore::from_json_file(books)?;

    let id = match id {
        Some(id) => id,
        None => {
            let ids = store.book_ids();
            match ids.as_slice() {
                [only] => only.clone(),
                [] => return Err(Error::Validation(format!("{} holds no books", books.display()))),
                _ => {
                    return Err(Error::Validation(format!(
                        "{} holds {} books, pick one with --id ({})",
                        books.display(),
                        ids.len(),
                        ids.join(", ")
                    )));
                }
            }
        }
    };
    let book = store
        .find_book_by_id(&id)?
        .ok_or_else(|| Error::NotFound(id.clone()))?;
    book.validate()?;

    let mut export_config = config.export_config();
    if let Some(root) = upload_root {
        export_config.upload_root = root;
    }

    let artifact = export_book(&book, format, &export_config)?;
    let path = output.unwrap_or_else(|| PathBuf::from(&artifact.filename));
    std::fs::write(&path, &artifact.bytes)?;
    log::info!("wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(())
}

fn outline(config: &Config, request: &OutlineRequest, command: Option<String>) -> Result<()> {
    let generator = match command {
        Some(program) => CommandGenerator::new(program),
        None => config
            .generator()
            .ok_or_else(|| Error::Config("no [ai] command configured; pass --command".to_string()))?,
    };

    let outline = generate_outline(&generator, request)?;
    println!("{}", serde_json::to_string_pretty(&outline)?);
    Ok(())
}

#[cfg(feature = "web")]
fn serve(config: Config, books: &Path, listen: Option<String>) -> Result<()> {
    use std::sync::Arc;

    use folio::ExportService;
    use folio::web::{self, AppState};

    let addr = listen.unwrap_or_else(|| config.listen.clone());
    let addr = addr
        .parse()
        .map_err(|e| Error::Config(format!("invalid listen address {addr:?}: {e}")))?;

    let store = MemoryStore::from_json_file(books)?;
    log::info!("serving {} book(s)", store.len());

    let mut state = AppState::new(ExportService::new(store, config.export_config()));
    if let Some(generator) = config.generator() {
        state = state.with_generator(Arc::new(generator));
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(addr, Arc::new(state)))
}
