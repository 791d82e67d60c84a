use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use simplecam::platform::{MockPlatform, MockSurface};
use simplecam::{
    AuthorizationStatus, CaptureHandlers, DeviceOrientation, ExposureMode, FocusMode,
    SimpleCamera, SimpleCameraConfig, Size,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// Portrait bounds of the demo preview surface
const SURFACE_SIZE: Size = Size {
    width: 390.0,
    height: 844.0,
};

#[derive(Parser, Debug)]
#[command(name = "simplecam")]
#[command(about = "Drive a camera capture session against the built-in mock platform")]
#[command(version)]
#[command(long_about = "Runs the full capture-session lifecycle against an in-process mock \
camera: permission check, session configuration, start, optional tap-to-focus, photo captures, \
an optional device rotation and stop. Captured photos can be written to a directory.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, help = "Path to TOML configuration file (default: simplecam.toml)")]
    config: Option<String>,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print the effective configuration and exit
    #[arg(long, help = "Print the effective configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Camera permission the mock platform reports
    #[arg(long, value_enum, default_value_t = Authorization::Authorized)]
    authorization: Authorization,

    /// Number of photos to capture
    #[arg(long, default_value_t = 1)]
    captures: u32,

    /// Directory captured photos are written to
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Tap the preview at X,Y (layer coordinates) to focus and expose
    #[arg(long, value_name = "X,Y", value_parser = parse_layer_point)]
    tap: Option<(f64, f64)>,

    /// Rotate the device after capturing
    #[arg(long, value_enum)]
    rotate: Option<Rotation>,

    /// Print session statistics as JSON before exiting
    #[arg(long)]
    summary_json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Authorization {
    Authorized,
    Denied,
    Restricted,
    /// Undetermined; the user grants access when asked
    Grant,
    /// Undetermined; the user denies access when asked
    Deny,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Rotation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

impl Rotation {
    fn device_orientation(self) -> DeviceOrientation {
        match self {
            Rotation::Portrait => DeviceOrientation::Portrait,
            Rotation::PortraitUpsideDown => DeviceOrientation::PortraitUpsideDown,
            Rotation::LandscapeLeft => DeviceOrientation::LandscapeLeft,
            Rotation::LandscapeRight => DeviceOrientation::LandscapeRight,
            Rotation::FaceUp => DeviceOrientation::FaceUp,
            Rotation::FaceDown => DeviceOrientation::FaceDown,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = init_logging(&args)?;

    info!("Starting SimpleCamera demo v{}", env!("CARGO_PKG_VERSION"));
    let loaded = match &args.config {
        Some(path) => {
            info!("Configuration file: {}", path);
            SimpleCameraConfig::load_from_file(path)
        }
        None => SimpleCameraConfig::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.print_config {
        println!("# SimpleCamera Configuration File");
        println!();
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let platform = Arc::new(create_platform(args.authorization));
    let camera = SimpleCamera::builder()
        .platform(platform.clone())
        .config(config)
        .build()?;

    let surface = MockSurface::new(SURFACE_SIZE);
    camera.initialize(&surface)?;

    let result = camera.start().await?;
    println!("{}", result.user_message());

    if let Err(e) = result.into_result() {
        warn!("Capture session unavailable: {}", e);
    } else {
        if let Some((x, y)) = args.tap {
            tap_to_focus(&camera, x, y);
        }

        if let Some(dir) = &args.output {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
        }
        for _ in 0..args.captures {
            capture_one(&camera, args.output.as_deref()).await?;
        }

        if let Some(rotation) = args.rotate {
            rotate(&camera, &platform, rotation);
        }
    }

    camera.stop_session();
    camera.wait_until_idle().await?;

    let stats = camera.stats();
    info!(
        "Session finished: {} captures requested, {} succeeded, {} failed",
        stats.captures_requested, stats.captures_succeeded, stats.captures_failed
    );
    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}

fn create_platform(authorization: Authorization) -> MockPlatform {
    let platform = MockPlatform::new();
    match authorization {
        Authorization::Authorized => platform.with_authorization(AuthorizationStatus::Authorized),
        Authorization::Denied => platform.with_authorization(AuthorizationStatus::Denied),
        Authorization::Restricted => platform.with_authorization(AuthorizationStatus::Restricted),
        Authorization::Grant => platform
            .with_authorization(AuthorizationStatus::NotDetermined)
            .with_access_answer(true),
        Authorization::Deny => platform
            .with_authorization(AuthorizationStatus::NotDetermined)
            .with_access_answer(false),
    }
}

fn tap_to_focus(camera: &SimpleCamera, x: f64, y: f64) {
    let Some(preview) = camera.preview_layer() else {
        return;
    };
    let point = preview.device_point_from_layer_point(x, y);
    println!("Focusing at ({:.3}, {:.3})", point.x, point.y);
    camera.focus(FocusMode::AutoFocus, ExposureMode::AutoExpose, point, true);
}

async fn capture_one(camera: &SimpleCamera, output: Option<&Path>) -> Result<()> {
    let (tx, rx) = oneshot::channel();
    let handlers = CaptureHandlers::new(move |outcome| {
        let _ = tx.send(outcome);
    })
    .on_will_capture(|| println!("*click*"))
    .on_processing(|active| {
        if active {
            println!("Processing photo...");
        }
    });

    let requested_at = Utc::now();
    camera.capture_photo(None, handlers);

    let outcome = rx.await.context("capture completion was dropped")?;
    match outcome {
        Ok(photo) => {
            println!("Captured {} bytes", photo.len());
            if let Some(dir) = output {
                let path = dir.join(format!(
                    "photo-{}-{}.jpg",
                    requested_at.format("%Y%m%d-%H%M%S%.3f"),
                    camera.stats().captures_requested
                ));
                std::fs::write(&path, &photo)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Saved photo to {}", path.display());
            }
        }
        Err(e) => {
            error!("Capture failed: {}", e);
            println!("Capture failed: {}", e);
        }
    }
    Ok(())
}

fn rotate(camera: &SimpleCamera, platform: &MockPlatform, rotation: Rotation) {
    let orientation = rotation.device_orientation();
    platform.set_orientation(orientation);

    let size = if orientation.is_landscape() {
        Size::new(SURFACE_SIZE.height, SURFACE_SIZE.width)
    } else {
        SURFACE_SIZE
    };
    camera.view_will_transition(size);

    if let Some(preview) = camera.preview_layer() {
        println!(
            "Preview orientation {:?}, frame {}x{}",
            preview.video_orientation(),
            preview.frame().width,
            preview.frame().height
        );
    }
}

fn parse_layer_point(value: &str) -> std::result::Result<(f64, f64), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", value))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("simplecam={}", log_level)));

    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = args.log_file.is_none();

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_point() {
        assert_eq!(parse_layer_point("10,20.5").unwrap(), (10.0, 20.5));
        assert_eq!(parse_layer_point(" 1 , 2 ").unwrap(), (1.0, 2.0));
        assert!(parse_layer_point("10").is_err());
        assert!(parse_layer_point("a,b").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "simplecam",
            "--authorization",
            "grant",
            "--captures",
            "3",
            "--rotate",
            "landscape-left",
            "--tap",
            "100,200",
        ])
        .unwrap();
        assert!(matches!(args.authorization, Authorization::Grant));
        assert_eq!(args.captures, 3);
        assert!(matches!(args.rotate, Some(Rotation::LandscapeLeft)));
        assert_eq!(args.tap, Some((100.0, 200.0)));
    }

    #[tokio::test]
    async fn test_demo_writes_photos() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(create_platform(Authorization::Grant));
        let camera = SimpleCamera::new(platform, SimpleCameraConfig::default());
        camera.initialize(&MockSurface::new(SURFACE_SIZE)).unwrap();
        assert!(camera.start().await.unwrap().is_success());

        capture_one(&camera, Some(dir.path())).await.unwrap();
        capture_one(&camera, Some(dir.path())).await.unwrap();

        let written = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(written, 2);
    }
}
