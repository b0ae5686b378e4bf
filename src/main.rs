use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tomatoscan::analysis::{AnalysisKind, AnalysisRecord, HttpAnalyzer, Session, Summary, DEFAULT_BASE_URL};
use tomatoscan::capture::{CaptureSource, CapturedImage, Facing, FileUpload};
use tomatoscan::overlay::{Overlay, SvgDocument, SvgOverlay};
use tomatoscan::relay::{self, RelayConfig, DEFAULT_BACKEND_URL, DEFAULT_BIND, DEFAULT_BODY_LIMIT};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an image (file or camera still) to the backend and show the result
    Analyze(AnalyzeArgs),

    /// Draw a saved result over its original image
    Render(RenderArgs),

    /// Run the HTTP relay in front of the inference backend
    Relay(RelayArgs),

    /// Take a camera still and save it as JPEG
    Snap(SnapArgs),
}

#[derive(ClapArgs, Debug)]
struct CameraArgs {
    /// Camera to use
    #[arg(long, value_enum, default_value_t = Facing::Back)]
    facing: Facing,

    /// Device index of the back camera
    #[arg(long, default_value_t = 0)]
    back_device: u32,

    /// Device index of the front camera
    #[arg(long, default_value_t = 1)]
    front_device: u32,

    /// Frames to discard before the still while exposure settles
    #[arg(long, default_value_t = 5)]
    warmup: usize,
}

#[derive(ClapArgs, Debug)]
struct AnalyzeArgs {
    /// Image file to analyze
    #[arg(required_unless_present = "camera")]
    image: Option<PathBuf>,

    /// Take the image from the camera instead of a file
    #[arg(long, conflicts_with = "image")]
    camera: bool,

    #[command(flatten)]
    camera_args: CameraArgs,

    /// Model to run on the backend
    #[arg(short, long, value_enum, default_value_t = AnalysisKind::Segmentation)]
    kind: AnalysisKind,

    /// Base URL of the backend (or of a relay in front of it)
    #[arg(long, env = "TOMATOSCAN_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Write the original image with the overlay on top as an SVG document
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Save the backend result as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct RenderArgs {
    /// Result JSON saved by `analyze --json`
    result: PathBuf,

    /// Original image the result belongs to
    image: PathBuf,

    /// Output SVG path
    #[arg(short, long, default_value = "overlay.svg")]
    out: PathBuf,

    /// Only write the overlay layer, without the embedded image
    #[arg(long)]
    overlay_only: bool,
}

#[derive(ClapArgs, Debug)]
struct RelayArgs {
    /// Address to listen on
    #[arg(long, env = "TOMATOSCAN_BIND", default_value = DEFAULT_BIND)]
    bind: String,

    /// Inference backend to forward to
    #[arg(long, env = "TOMATOSCAN_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Largest request body accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,
}

#[derive(ClapArgs, Debug)]
struct SnapArgs {
    #[command(flatten)]
    camera_args: CameraArgs,

    /// Where to write the JPEG (defaults to captura_<millis>.jpg)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match args.command {
        Command::Analyze(args) => analyze(args),
        Command::Render(args) => render(args),
        Command::Relay(args) => run_relay(args),
        Command::Snap(args) => snap(args),
    }
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let image = if args.camera {
        capture_from_camera(&args.camera_args)?
    } else {
        let path = args.image.context("No image given")?;
        FileUpload::new(&path)
            .capture()
            .with_context(|| format!("Failed to load {}", path.display()))?
    };

    let analyzer = HttpAnalyzer::new(&args.base_url);
    let mut session = Session::new(args.kind);
    session.load_image(image);
    session.submit(&analyzer).context("Analysis failed")?;

    let (Some(image), Some(record)) = (session.image(), session.result()) else {
        bail!("Analysis finished without a result");
    };

    print!("{}", Summary(record));

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(record).context("Failed to serialize result")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Result saved to {}", path.display());
    }

    if let Some(path) = &args.svg {
        write_svg(path, record, image, false)?;
    }

    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let text = fs::read_to_string(&args.result)
        .with_context(|| format!("Failed to read {}", args.result.display()))?;
    let record: AnalysisRecord = serde_json::from_str(&text)
        .with_context(|| format!("{} is not an analysis result", args.result.display()))?;

    let image = FileUpload::new(&args.image)
        .capture()
        .with_context(|| format!("Failed to load {}", args.image.display()))?;

    print!("{}", Summary(&record));
    write_svg(&args.out, &record, &image, args.overlay_only)
}

fn write_svg(path: &Path, record: &AnalysisRecord, image: &CapturedImage, overlay_only: bool) -> Result<()> {
    let overlay = Overlay::build(&record.result, image.dimensions());
    let svg = if overlay_only {
        SvgOverlay(&overlay).to_string()
    } else {
        SvgDocument {
            overlay: &overlay,
            image,
        }
        .to_string()
    };

    fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Overlay written to {}", path.display());
    Ok(())
}

fn run_relay(args: RelayArgs) -> Result<()> {
    let config = RelayConfig {
        bind: args.bind,
        backend_url: args.backend_url,
        body_limit: args.body_limit,
    };

    actix_web::rt::System::new().block_on(relay::serve(config))
}

fn snap(args: SnapArgs) -> Result<()> {
    let image = capture_from_camera(&args.camera_args)?;
    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(image.file_name()));

    fs::write(&path, image.bytes()).with_context(|| format!("Failed to write {}", path.display()))?;
    let (width, height) = image.dimensions();
    tracing::info!("Saved {}x{} still to {}", width, height, path.display());
    Ok(())
}

#[cfg(feature = "camera")]
fn capture_from_camera(args: &CameraArgs) -> Result<CapturedImage> {
    use tomatoscan::capture::{CameraSession, WebcamDevice};

    let device = WebcamDevice::new(args.back_device, args.front_device);
    let mut camera = CameraSession::new(device, args.facing).with_warmup(args.warmup);
    camera.capture().context("Failed to capture from camera")
}

#[cfg(not(feature = "camera"))]
fn capture_from_camera(_args: &CameraArgs) -> Result<CapturedImage> {
    bail!("Built without camera support; rebuild with `--features camera`")
}
