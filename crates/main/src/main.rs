use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ebook_delivery::content::{ContentSource, FileContentSource};
use ebook_delivery::delivery::DeliveryAgent;
use ebook_delivery::model::Language;
use ebook_delivery::pipeline::{CanvasBackend, GenpdfBackend, TranscriptBackend};
use ebook_delivery::{DeliveryConfig, DocumentPipeline, RenderRequest};
use log::info;

mod serve;

/// Renders eBooks from markup and runs the delivery workflow locally.
///
/// The PDF backend needs the Sarabun family under `assets/fonts` or in the
/// directory named by `EBOOK_FONTS_DIR`; a system sans-serif family is used
/// when it is missing.
#[derive(Parser)]
#[command(author, version, about = "Command line front end for ebook_delivery")]
struct Cli {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a single eBook.
    Render {
        /// Title printed on the cover.
        #[arg(long)]
        title: String,

        /// Delivery language (TH or EN).
        #[arg(long, default_value = "TH")]
        language: Language,

        /// Destination file; a timestamped name is used when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Markup file to render instead of the configured content file.
        #[arg(long)]
        content: Option<PathBuf>,

        /// Write a plain-text page transcript instead of a PDF.
        #[arg(long)]
        transcript: bool,
    },

    /// Process a delivery webhook payload and print the response envelope.
    Deliver {
        /// Payload file, or `-` to read standard input.
        payload: PathBuf,

        /// Directory receiving spooled delivery mails.
        #[arg(long, default_value = "outbox")]
        outbox: PathBuf,
    },

    /// Print the liveness envelope.
    Health,

    /// Serve `POST /webhook/deliver-ebook` and `GET /health` over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "0.0.0.0:5000")]
        addr: SocketAddr,

        /// Directory receiving spooled delivery mails.
        #[arg(long, default_value = "outbox")]
        outbox: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => DeliveryConfig::from_file(path)?,
        None => DeliveryConfig::default(),
    };

    match cli.command {
        Commands::Render {
            title,
            language,
            output,
            content,
            transcript,
        } => {
            let source = FileContentSource::from_option(content.or(config.content_file_path.clone()));
            let request = RenderRequest::new(title)
                .with_language(language)
                .with_output_path(output);
            let path = if transcript {
                render_with(&config, source, TranscriptBackend, &request)?
            } else {
                render_with(&config, source, GenpdfBackend, &request)?
            };
            println!("{}", path.display());
        }
        Commands::Deliver { payload, outbox } => {
            let body = read_payload(&payload)?;
            let agent = DeliveryAgent::from_config(config, outbox);
            let response = agent.handle(&body);
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if !response.is_success() {
                return Err(format!("delivery failed with status {}", response.status).into());
            }
        }
        Commands::Health => {
            let agent = DeliveryAgent::from_config(config, "outbox");
            println!("{}", agent.health().body);
        }
        Commands::Serve { addr, outbox } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve::serve(addr, serve::AppState::new(config, outbox)))?;
        }
    }

    Ok(())
}

fn render_with<S, B>(
    config: &DeliveryConfig,
    source: S,
    backend: B,
    request: &RenderRequest,
) -> Result<PathBuf, Box<dyn Error>>
where
    S: ContentSource,
    B: CanvasBackend,
{
    let document = DocumentPipeline::new(config.render.clone(), source, backend).render(request)?;
    info!(
        "rendered {} page(s) to {}",
        document.page_count(),
        document.path.display()
    );
    Ok(document.path)
}

fn read_payload(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        fs::read_to_string(path)
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
