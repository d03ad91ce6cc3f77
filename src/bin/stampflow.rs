//! Stampflow CLI tool
//!
//! A command-line tool for stamping a reference code onto page 1 of a PDF.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stampflow::pdf::{
    extract_page_text, first_page, inspect, load_document, stamp_pdf, stamped_file_name,
    PageRasterizer, PdfiumRenderer,
};
use stampflow::suggest::{GeminiClient, GeminiConfig};
use stampflow::{StampConfig, StampSpec, TextSuggestionAdapter};

/// Stampflow - Stamp reference codes onto PDFs
#[derive(Parser)]
#[command(name = "stampflow")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Stamp a code in the default top right position
    stampflow stamp invoice.pdf --text \"PB 966753\"

    # Stamp in blue near the bottom left, 24pt
    stampflow stamp invoice.pdf --text \"REF-42\" --x 5 --y 92 --font-size 24 --color \"#0000FF\"

    # Let the model pick the code from the page text
    GEMINI_API_KEY=... stampflow stamp invoice.pdf --suggest

    # Render the page 1 preview to check the placement
    stampflow preview stamped_invoice.pdf -o preview.png")]
struct Cli {
    /// Log progress (set RUST_LOG for finer control)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp text onto page 1 of a PDF
    Stamp {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path (default: stamped_<input name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stamp text
        #[arg(long)]
        text: Option<String>,

        /// Horizontal position in percent of page width (0 = left edge)
        #[arg(long)]
        x: Option<f64>,

        /// Vertical position in percent of page height (0 = top edge)
        #[arg(long)]
        y: Option<f64>,

        /// Font size in points (8-72)
        #[arg(long)]
        font_size: Option<f64>,

        /// Text color as #RRGGBB
        #[arg(long)]
        color: Option<String>,

        /// Ask Gemini for the stamp text when --text is not given
        #[arg(long)]
        suggest: bool,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Render page 1 to a PNG preview
    Preview {
        /// Input PDF file
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Pixels per PDF point
        #[arg(long, default_value_t = 1.5)]
        scale: f64,

        /// Directory (or file) of the PDFium library
        #[arg(long, env = "PDFIUM_LIB_PATH")]
        pdfium: Option<PathBuf>,
    },

    /// Print the suggested stamp text for a PDF
    Suggest {
        /// Input PDF file
        input: PathBuf,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Stamp { input, output, text, x, y, font_size, color, suggest, api_key } => {
            let edits = StampEdits { text, x, y, font_size, color };
            cmd_stamp(input, output, edits, suggest, api_key).await
        }
        Commands::Preview { input, output, scale, pdfium } => {
            cmd_preview(input, output, scale, pdfium)
        }
        Commands::Suggest { input, api_key } => {
            cmd_suggest(input, api_key).await
        }
        Commands::Info { input } => {
            cmd_info(input)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Stamp values given on the command line
struct StampEdits {
    text: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    font_size: Option<f64>,
    color: Option<String>,
}

impl StampEdits {
    /// Apply the given values on top of the default stamp
    fn apply(self, config: &StampConfig) -> StampSpec {
        let mut spec = StampSpec::initial(config);
        if let Some(text) = self.text {
            spec = spec.with_text(text);
        }
        if self.x.is_some() || self.y.is_some() {
            spec = spec.with_position(
                self.x.unwrap_or(spec.x_percent()),
                self.y.unwrap_or(spec.y_percent()),
            );
        }
        if let Some(size) = self.font_size {
            spec = spec.with_font_size(size);
        }
        if let Some(color) = self.color {
            spec = spec.with_color(color);
        }
        spec
    }
}

fn read_pdf(input: &Path) -> anyhow::Result<Vec<u8>> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn suggestion_adapter(api_key: Option<String>, config: &StampConfig) -> anyhow::Result<TextSuggestionAdapter> {
    let gemini = match api_key {
        Some(key) if !key.trim().is_empty() => GeminiConfig::new(key),
        _ => GeminiConfig::from_env()?,
    };
    let client = GeminiClient::new(gemini)?;
    Ok(TextSuggestionAdapter::new(Arc::new(client), config))
}

/// Page 1 text, as sent to the suggestion client
fn first_page_text(pdf_bytes: &[u8]) -> anyhow::Result<String> {
    let doc = load_document(pdf_bytes)?;
    let page_id = first_page(&doc).context("PDF has no pages")?;
    Ok(extract_page_text(&doc, page_id)?)
}

/// Stamp page 1 and write the result
async fn cmd_stamp(
    input: PathBuf,
    output: Option<PathBuf>,
    edits: StampEdits,
    suggest: bool,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let original = read_pdf(&input)?;
    let config = StampConfig::default();
    let mut spec = edits.apply(&config);

    if !spec.is_stampable() && suggest {
        let adapter = suggestion_adapter(api_key, &config)?;
        let suggestion = adapter.suggest(&first_page_text(&original)?).await;
        if !suggestion.is_empty() {
            eprintln!("Suggested text: {}", suggestion);
            spec = spec.with_text(suggestion);
        }
    }

    if !spec.is_stampable() {
        bail!("Nothing to stamp: give --text (or --suggest with a key)");
    }

    let output = output.unwrap_or_else(|| input.with_file_name(stamped_file_name(&input)));

    eprintln!("Stamping {:?} onto {}...", spec.text(), input.display());
    let stamped = stamp_pdf(&original, &spec)?;
    std::fs::write(&output, stamped)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!("Output: {}", output.display());
    Ok(())
}

/// Render the page 1 preview
fn cmd_preview(input: PathBuf, output: PathBuf, scale: f64, pdfium: Option<PathBuf>) -> anyhow::Result<()> {
    let config = StampConfig::builder().render_scale(scale).build()?;
    let renderer = match pdfium {
        Some(path) => PdfiumRenderer::with_library_path(path),
        None => PdfiumRenderer::system(),
    };

    let original = read_pdf(&input)?;
    let rasterizer = PageRasterizer::new(Arc::new(renderer), config.render_scale);
    let raster = rasterizer.rasterize(&original)?;

    std::fs::write(&output, raster.to_png()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Preview: {} ({} x {} px)", output.display(), raster.width_px, raster.height_px);
    println!(
        "Page size: {:.1} x {:.1} pt",
        raster.page_size.width_pt, raster.page_size.height_pt
    );
    if !raster.extracted_text.is_empty() {
        println!("Text: {}", raster.extracted_text);
    }

    Ok(())
}

/// Print the suggested stamp text
async fn cmd_suggest(input: PathBuf, api_key: Option<String>) -> anyhow::Result<()> {
    let original = read_pdf(&input)?;
    let config = StampConfig::default();
    let adapter = suggestion_adapter(api_key, &config)?;

    let suggestion = adapter.suggest(&first_page_text(&original)?).await;
    if suggestion.is_empty() {
        eprintln!("No suggestion found");
    } else {
        println!("{}", suggestion);
    }

    Ok(())
}

/// Show information about a PDF file
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let original = read_pdf(&input)?;
    let info = inspect(&original)?;

    println!("File: {}", input.display());
    println!("Pages: {}", info.page_count);
    println!(
        "Page 1 size: {:.1} x {:.1} pt",
        info.first_page_size.width_pt, info.first_page_size.height_pt
    );

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }

    Ok(())
}
