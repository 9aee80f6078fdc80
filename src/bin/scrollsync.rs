use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "scrollsync", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and mount a page, reporting every construction error.
    Validate(ValidateArgs),
    /// Scroll through a page and print one report per frame.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input page JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input page JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First scroll offset.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Last scroll offset (defaults to the page's scroll height).
    #[arg(long)]
    to: Option<f64>,

    /// Scroll distance between frames.
    #[arg(long, default_value_t = 100.0)]
    step: f64,

    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f64,

    /// Extra frames after the last offset, for smoothing and clocks to settle.
    #[arg(long, default_value_t = 0)]
    settle_frames: u32,

    /// Print frame reports as JSON lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print the final element snapshot as JSON.
    #[arg(long, default_value_t = false)]
    snapshot: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn load(
    path: &std::path::Path,
) -> anyhow::Result<(scrollsync::Page, scrollsync::MemorySurface, scrollsync::ScrollEngine)> {
    let page = scrollsync::Page::from_path(path)
        .with_context(|| format!("load page '{}'", path.display()))?;
    let surface = page.build_surface()?;
    let engine = scrollsync::ScrollEngine::new(page.viewport()?);
    Ok((page, surface, engine))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let (page, surface, mut engine) = load(&args.in_path)?;
    let report = page.mount(&mut engine, &surface);
    let errors = report.errors();
    for e in &errors {
        eprintln!("error: {e}");
    }
    if !errors.is_empty() {
        anyhow::bail!("{} construction error(s) in '{}'", errors.len(), args.in_path.display());
    }
    let timelines: usize = report.sections.iter().map(|s| s.timelines.len()).sum();
    eprintln!(
        "ok: {} section(s), {timelines} timeline(s)",
        report.sections.len()
    );
    Ok(())
}

/// Upper bound on the scroll offsets one sweep may visit.
const MAX_SWEEP_FRAMES: u64 = 1_000_000;

/// Offsets `from, from + step, ...` up to `to`, ending exactly on `to`.
fn sweep(from: f64, to: f64, step: f64) -> anyhow::Result<impl Iterator<Item = f64>> {
    if !(from.is_finite() && to.is_finite()) {
        anyhow::bail!("scroll range must be finite (got {from}..{to})");
    }
    let steps = ((to - from).max(0.0) / step).floor();
    if steps >= MAX_SWEEP_FRAMES as f64 {
        anyhow::bail!(
            "--step {step} over {from}..{to} needs more than {MAX_SWEEP_FRAMES} frames"
        );
    }
    let steps = steps as u64;
    let count = if from <= to { steps + 1 } else { 0 };
    let last = from + steps as f64 * step;
    let tail = (count > 0 && last < to).then_some(to);
    Ok((0..count).map(move |i| from + i as f64 * step).chain(tail))
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if !(args.step.is_finite() && args.step > 0.0) {
        anyhow::bail!("--step must be > 0 (got {})", args.step);
    }
    let (page, mut surface, mut engine) = load(&args.in_path)?;
    let report = page.mount(&mut engine, &surface);
    for e in report.errors() {
        tracing::warn!("{e}");
    }

    let to = args.to.unwrap_or_else(|| page.scroll_height());
    let offsets = sweep(args.from, to, args.step)?;

    let mut stdout = std::io::stdout().lock();
    let mut emit = |frame: &scrollsync::FrameReport| -> anyhow::Result<()> {
        use std::io::Write as _;
        if args.json {
            serde_json::to_writer(&mut stdout, frame).context("write frame report")?;
            writeln!(stdout)?;
        } else {
            let events: Vec<String> = frame
                .events
                .iter()
                .map(|e| format!("{}/{}:{:?}", e.context, e.linkage, e.event))
                .collect();
            writeln!(
                stdout,
                "frame {:>4}  scroll {:>8.1}  writes {:>3}  {}",
                frame.frame,
                frame.scroll,
                frame.writes,
                events.join(" ")
            )?;
        }
        Ok(())
    };

    for offset in offsets {
        engine.on_scroll(offset);
        let frame = engine.frame(args.frame_dt, &mut surface);
        emit(&frame)?;
    }
    for _ in 0..args.settle_frames {
        let frame = engine.frame(args.frame_dt, &mut surface);
        emit(&frame)?;
    }

    if args.snapshot {
        let snapshot = serde_json::to_string_pretty(&surface.snapshot())
            .context("serialize element snapshot")?;
        println!("{snapshot}");
    }
    Ok(())
}
