use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cmyk_export::models::{AppConfig, ExportForm};
use cmyk_export::server;
use cmyk_export::services::{ProfileRegistry, Upload, KNOWN_PROFILES};

#[derive(Parser)]
#[command(name = "cmyk-export")]
#[command(about = "Print-ready CMYK PDF and TIFF export server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Convert a single file without starting the server
    Convert {
        /// Input file (raster image, SVG or PDF)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: "pdf" or "tiff"
        #[arg(short, long, default_value = "pdf")]
        format: String,

        /// Resolution in dots per inch
        #[arg(long)]
        dpi: Option<f64>,

        /// PDF version, e.g. "1.4"
        #[arg(long)]
        pdf_version: Option<String>,

        /// PDF/X standard, e.g. "PDF/X-4:2008"
        #[arg(long)]
        standard: Option<String>,

        /// PDF image compression: "none", "lzw" or "runlength"
        #[arg(long)]
        compression: Option<String>,

        /// ICC profile id (see `profiles`)
        #[arg(long)]
        profile: Option<String>,

        /// TIFF compression: "none", "lzw", "deflate" or "packbits"
        #[arg(long)]
        tiff_compression: Option<String>,

        /// TIFF antialiasing mode
        #[arg(long)]
        antialias: Option<String>,

        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,
    },
    /// List the ICC profiles and whether they are available
    Profiles {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Convert {
            input,
            output,
            format,
            dpi,
            pdf_version,
            standard,
            compression,
            profile,
            tiff_compression,
            antialias,
            width,
            height,
        }) => {
            let form = ExportForm {
                format: Some(format),
                name: input
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned()),
                dpi: dpi.map(|d| d.to_string()),
                pdf_version,
                pdf_standard: standard,
                pdf_compression: compression,
                pdf_color_profile: profile,
                tiff_compression,
                tiff_antialias: antialias,
                tiff_dpi: None,
                width_px: width.map(|w| w.to_string()),
                height_px: height.map(|h| h.to_string()),
            };
            run_convert_command(&input, &output, form).await
        }
        Some(Commands::Profiles { json }) => run_profiles_command(json),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cmyk_export=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Convert one file on disk (no server needed)
async fn run_convert_command(input: &Path, output: &Path, form: ExportForm) -> anyhow::Result<()> {
    init_cli_logging();

    let config = AppConfig::from_env();
    let request = form.into_request(&config)?;
    let state = server::create_app_state(config);

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let upload = Upload {
        bytes,
        content_type: None,
        file_name: input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    };

    let exported = state.export_service.export(upload, &request).await?;
    for warning in &exported.warnings {
        eprintln!("warning: {warning}");
    }

    tokio::fs::write(output, &exported.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} ({} bytes, {})",
        output.display(),
        exported.bytes.len(),
        exported.content_type
    );
    Ok(())
}

fn run_profiles_command(json: bool) -> anyhow::Result<()> {
    init_cli_logging();

    let config = AppConfig::from_env();
    let registry = ProfileRegistry::load(&config.profiles_dir);

    let rows: Vec<_> = KNOWN_PROFILES
        .iter()
        .map(|descriptor| {
            let loaded = registry
                .profiles()
                .iter()
                .any(|p| p.profile.id() == descriptor.id);
            (descriptor, loaded)
        })
        .collect();

    if json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(descriptor, loaded)| {
                serde_json::json!({
                    "id": descriptor.id,
                    "name": descriptor.name,
                    "file": config.profiles_dir.join(descriptor.file_name),
                    "outputConditionIdentifier": descriptor.output_condition_identifier,
                    "available": loaded,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Profiles in {}:", config.profiles_dir.display());
    for (descriptor, loaded) in rows {
        let status = if loaded { "ok" } else { "missing" };
        println!(
            "  {:<20} {:<8} {} ({})",
            descriptor.id, status, descriptor.name, descriptor.file_name
        );
    }
    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let profiles_dir = std::env::var("PROFILES_DIR").ok();
    let gs_bin = std::env::var("GS_BIN").ok();
    let rsvg_bin = std::env::var("RSVG_CONVERT_BIN").ok();

    println!("cmyk-export v{VERSION}");
    println!("Print-ready CMYK PDF and TIFF export server\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR        = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3001 (default)")
    );
    println!(
        "  CONFIG_FILE      = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  PROFILES_DIR     = {}",
        profiles_dir.as_deref().unwrap_or("profiles (default)")
    );
    println!(
        "  GS_BIN           = {}",
        gs_bin.as_deref().unwrap_or("gs (default)")
    );
    println!(
        "  RSVG_CONVERT_BIN = {}",
        rsvg_bin.as_deref().unwrap_or("rsvg-convert (default)")
    );

    let dir = PathBuf::from(profiles_dir.as_deref().unwrap_or("profiles"));
    let available = KNOWN_PROFILES
        .iter()
        .filter(|descriptor| dir.join(descriptor.file_name).is_file())
        .count();
    println!("\nICC Profiles:");
    println!(
        "  {available} of {} found in {}",
        KNOWN_PROFILES.len(),
        dir.display()
    );

    println!("\nCommands:");
    println!("  cmyk-export serve      Start the HTTP server");
    println!("  cmyk-export convert    Convert a single file");
    println!("  cmyk-export profiles   List ICC profiles");
    println!("  cmyk-export --help     Show all options");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cmyk_export=debug,cmyk_pdf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    tracing::info!(
        profiles_dir = %config.profiles_dir.display(),
        ghostscript = %config.tools.ghostscript.display(),
        rsvg_convert = %config.tools.rsvg_convert.display(),
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    let state = server::create_app_state(config);
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "CMYK export server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
