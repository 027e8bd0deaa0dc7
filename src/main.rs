use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tilemark::logging::{init_subscriber, LogFormat};
use tilemark::watermark::{apply_watermark, build_preview, Color, WatermarkParams};

/// Tilemark - tiled text and image watermarks for PDF documents
#[derive(Parser, Debug)]
#[command(name = "tilemark")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a JPEG preview of the first page with the watermark applied
    Preview {
        /// Input PDF
        input: PathBuf,

        /// Where to write the JPEG preview
        #[arg(short, long, default_value = "preview.jpg")]
        out: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },

    /// Watermark every page of a PDF
    Apply {
        /// Input PDF
        input: PathBuf,

        /// Output PDF
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },
}

/// Watermark parameters. Flags override values loaded with `--params`.
#[derive(Args, Debug)]
struct WatermarkArgs {
    /// YAML parameter file
    #[arg(long)]
    params: Option<PathBuf>,

    /// Watermark text (at most 30 characters)
    #[arg(short, long)]
    text: Option<String>,

    /// Render the text in upper case
    #[arg(long)]
    uppercase: bool,

    /// Font size for text, or size percentage for images
    #[arg(long)]
    font_size: Option<u32>,

    /// Text alpha 0-255, or alpha percentage for images
    #[arg(long)]
    opacity: Option<u8>,

    /// Text color as #RRGGBB or #RGB
    #[arg(long)]
    color: Option<Color>,

    /// Convert the document to grayscale first
    #[arg(long)]
    grayscale: bool,

    /// Image to tile instead of text
    #[arg(long)]
    image: Option<PathBuf>,

    /// Font file for the text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Horizontal gap between tiles
    #[arg(long)]
    h_spacing: Option<u32>,

    /// Vertical gap between tiles
    #[arg(long)]
    v_spacing: Option<u32>,
}

impl WatermarkArgs {
    fn into_params(self) -> anyhow::Result<WatermarkParams> {
        let mut params = match &self.params {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
                WatermarkParams::from_yaml(&yaml)?
            }
            None => WatermarkParams::default(),
        };

        if let Some(text) = self.text {
            params.text = text;
        }
        if self.uppercase {
            params.uppercase = true;
        }
        if let Some(font_size) = self.font_size {
            params.font_size = font_size;
        }
        if let Some(opacity) = self.opacity {
            params.opacity = opacity;
        }
        if let Some(color) = self.color {
            params.color = color;
        }
        if self.grayscale {
            params.grayscale = true;
        }
        if self.image.is_some() {
            params.image_path = self.image;
        }
        if self.font.is_some() {
            params.font_path = self.font;
        }
        if let Some(spacing) = self.h_spacing {
            params.horizontal_spacing = spacing;
        }
        if let Some(spacing) = self.v_spacing {
            params.vertical_spacing = spacing;
        }

        Ok(params)
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Preview {
            input,
            out,
            watermark,
        } => {
            let spec = watermark.into_params()?.into_spec()?;
            let preview = build_preview(&spec, &input)?;
            std::fs::write(&out, &preview.data)
                .with_context(|| format!("Failed to write preview {}", out.display()))?;

            tracing::info!(
                out = %out.display(),
                width = preview.width,
                height = preview.height,
                "Preview written"
            );
        }
        Command::Apply {
            input,
            output,
            watermark,
        } => {
            let spec = watermark.into_params()?.into_spec()?;
            let summary = apply_watermark(&spec, &input, &output)?;

            println!(
                "Watermark added to {} ({} pages, {} tiles)",
                output.display(),
                summary.pages,
                summary.tiles_placed
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_subscriber(&cli.log_level, cli.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
