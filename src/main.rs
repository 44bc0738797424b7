mod app;
mod geo;
mod server;
mod util;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use crate::geo::{Brand, MarkersSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the marker map viewer.
    View(ViewArgs),
    /// Serve marker records over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Parser)]
struct ViewArgs {
    /// Brand whose markers to display; unknown names fall back to the
    /// default brand.
    #[arg(long, default_value = "bosman")]
    brand: String,

    /// Base URL of the marker endpoint.
    #[arg(long, default_value = "http://127.0.0.1:8571")]
    api_base: String,

    /// Load markers from a local JSON file instead of the endpoint.
    #[arg(long)]
    markers_file: Option<PathBuf>,

    /// Nominatim-compatible geocoder for place search.
    #[arg(long, default_value = "https://nominatim.openstreetmap.org/search")]
    geocoder_url: String,
}

#[derive(Debug, Parser)]
struct ServeArgs {
    /// JSON file with marker records to serve.
    #[arg(long, default_value = "markers.json")]
    markers_file: PathBuf,

    #[arg(long, default_value_t = 8571)]
    port: u16,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::View(view) => run_viewer(view),
        Command::Serve(serve) => {
            let config = server::ServerConfig {
                markers_file: serve.markers_file,
                port: serve.port,
            };
            tokio::runtime::Runtime::new()?.block_on(server::run(config))
        }
    }
}

fn run_viewer(args: ViewArgs) -> Result<()> {
    let brand = Brand::from_name(&args.brand);
    let source = match args.markers_file {
        Some(path) => MarkersSource::File(path),
        None => MarkersSource::Endpoint {
            api_base: args.api_base,
            brand,
        },
    };

    let config = app::ViewerConfig {
        brand,
        source,
        geocoder_url: args.geocoder_url,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "mapa marek",
        options,
        Box::new(move |cc| Ok(Box::new(app::MapApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}
