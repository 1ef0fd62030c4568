use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stealth_overlay_core::{
    capture::ScreenCapturer,
    config::{Config, ConfigBuilder},
    hotkey::DEFAULT_BINDINGS,
    init, ocr,
    ocr::TextExtractor,
    platform::{OverlayView, WindowService},
    providers::{self, Provider},
    selection::Dimension,
    App,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[cfg(not(windows))]
mod keys;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pixels moved per movement hotkey
    #[arg(long)]
    step: Option<i32>,

    /// Overlay opacity, 0-255
    #[arg(long)]
    opacity: Option<u8>,

    /// Initial provider (gemini, chatgpt)
    #[arg(long)]
    provider: Option<String>,

    /// Initial solution language
    #[arg(long)]
    language: Option<String>,

    /// Initial problem type (dsa, aptitude)
    #[arg(long)]
    problem_type: Option<String>,

    /// Directory holding eng.traineddata
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// Print the hotkey table and exit
    #[arg(long)]
    list_hotkeys: bool,

    /// List available monitors and exit
    #[arg(long)]
    list_monitors: bool,
}

fn main() -> Result<()> {
    init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_hotkeys {
        for binding in DEFAULT_BINDINGS {
            println!("{:<18} {:?}", binding.chord().to_string(), binding.command);
        }
        return Ok(());
    }

    if args.list_monitors {
        let capturer = ScreenCapturer::new().context("Failed to initialize screen capturer")?;
        println!("Available monitors:");
        for info in capturer.list_screens() {
            println!("{}", info);
        }
        return Ok(());
    }

    let mut builder =
        ConfigBuilder::from_config(Config::load().context("Failed to load configuration")?);
    if let Some(step) = args.step {
        builder = builder.with_move_step(step);
    }
    if let Some(opacity) = args.opacity {
        builder = builder.with_alpha(opacity);
    }
    if let Some(dir) = &args.tessdata {
        builder = builder.with_tessdata_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let providers = providers::from_config(&config).context("Failed to set up providers")?;
    let extractor = ocr::extractor_for(config.tessdata_dir.as_deref());

    run(&args, &config, &runtime, providers, extractor)
}

/// Applies the selection flags before the first paint.
fn apply_selection<W: WindowService, V: OverlayView>(app: &mut App<W, V>, args: &Args) {
    let requested = [
        (Dimension::Language, &args.language),
        (Dimension::ProblemType, &args.problem_type),
        (Dimension::Provider, &args.provider),
    ];
    for (dimension, value) in requested {
        if let Some(value) = value {
            if !app.select(dimension, value) {
                log::warn!("{} is not a known {}", value, dimension.label());
            }
        }
    }
}

#[cfg(windows)]
fn run(
    args: &Args,
    config: &Config,
    runtime: &Runtime,
    providers: Vec<Arc<dyn Provider>>,
    extractor: Box<dyn TextExtractor>,
) -> Result<()> {
    use stealth_overlay_core::platform::win32::{run_message_loop, Win32Window};
    use stealth_overlay_core::RequestOrchestrator;

    let (service, view, registry) =
        Win32Window::create(&config.overlay).context("Failed to create overlay window")?;
    let orchestrator =
        RequestOrchestrator::new(runtime.handle().clone(), providers, service.notifier());
    let mut app = App::new(service, view, config, registry, extractor, orchestrator);
    apply_selection(&mut app, args);
    app.start();

    run_message_loop(&mut app);
    Ok(())
}

#[cfg(not(windows))]
fn run(
    args: &Args,
    config: &Config,
    runtime: &Runtime,
    providers: Vec<Arc<dyn Provider>>,
    extractor: Box<dyn TextExtractor>,
) -> Result<()> {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc;
    use stealth_overlay_core::hit_test::overlay_registry;
    use stealth_overlay_core::platform::headless::{HeadlessWindow, TerminalView};
    use stealth_overlay_core::RequestOrchestrator;

    let (tx, rx) = mpsc::channel();
    let service = HeadlessWindow::new(tx.clone()).context("Failed to initialize screen capture")?;
    let registry = Rc::new(RefCell::new(overlay_registry(config.overlay.size)));
    let orchestrator =
        RequestOrchestrator::new(runtime.handle().clone(), providers, service.notifier());
    let mut app = App::new(service, TerminalView, config, registry, extractor, orchestrator);
    apply_selection(&mut app, args);
    app.start();

    log::info!("Listening for hotkeys; Ctrl+Shift+Q quits");
    keys::spawn_listener(tx);
    app.run_queue(rx);
    Ok(())
}
