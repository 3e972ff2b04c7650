//! Headless driver for the particle-field engine.
//!
//! Examples:
//!   field-cli
//!   field-cli --width 1920 --height 1080 --frames 600 --dark
//!   field-cli --config field.json --seed 7 --json
//!   field-cli --resize-to 700 --resize-at 120
//!
//! Runs the engine at a fixed frame interval against an in-memory surface
//! and prints per-run totals, or the final field as JSON with `--json`.
//! Set `RUST_LOG=debug` to see regeneration events.

use std::process;

use particle_field::prelude::*;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    width: f64,
    height: f64,
    dpr: f64,
    frames: u32,
    fps: u32,
    seed: Option<u64>,
    dark: bool,
    dense: bool,
    json: bool,
    config: Option<String>,
    resize_to: Option<f64>,
    resize_at: u32,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            dpr: 1.0,
            frames: 300,
            fps: 60,
            seed: None,
            dark: false,
            dense: false,
            json: false,
            config: None,
            resize_to: None,
            resize_at: 0,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    frames: u32,
    drawn_frames: u32,
    points: usize,
    generation: u64,
    regenerations: u64,
    total_lines: usize,
    max_visible_points: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a RunSummary,
    field: &'a Field,
}

fn usage() -> ! {
    eprintln!("field-cli: run the particle-field engine headless\n");
    eprintln!("Usage: field-cli [options]\n");
    eprintln!("Options:");
    eprintln!("  --width <px>          Viewport width (default 1280)");
    eprintln!("  --height <px>         Viewport height (default 720)");
    eprintln!("  --dpr <ratio>         Device pixel ratio (default 1)");
    eprintln!("  --frames <n>          Frames to simulate (default 300)");
    eprintln!("  --fps <n>             Frame rate for the simulated clock (default 60)");
    eprintln!("  --seed <u64>          Fixed seed");
    eprintln!("  --dark                Dark theme");
    eprintln!("  --dense               Use the dense spacing policy");
    eprintln!("  --config <file>       Load FieldConfig from JSON");
    eprintln!("  --resize-to <px>      Resize to this width during the run");
    eprintln!("  --resize-at <frame>   Frame at which to resize (default frames/2)");
    eprintln!("  --json                Print summary and final field as JSON");
    process::exit(1);
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    match value.as_deref().map(str::parse) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("{flag}: missing or invalid value");
            usage();
        }
    }
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut resize_at = None;
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        match flag.as_str() {
            "--width" => args.width = parse_value(&flag, it.next()),
            "--height" => args.height = parse_value(&flag, it.next()),
            "--dpr" => args.dpr = parse_value(&flag, it.next()),
            "--frames" => args.frames = parse_value(&flag, it.next()),
            "--fps" => args.fps = parse_value::<u32>(&flag, it.next()).max(1),
            "--seed" => args.seed = Some(parse_value(&flag, it.next())),
            "--dark" => args.dark = true,
            "--dense" => args.dense = true,
            "--json" => args.json = true,
            "--config" => args.config = Some(parse_value(&flag, it.next())),
            "--resize-to" => args.resize_to = Some(parse_value(&flag, it.next())),
            "--resize-at" => resize_at = Some(parse_value(&flag, it.next())),
            "-h" | "--help" | "help" => usage(),
            other => {
                eprintln!("Unknown option: {other}");
                usage();
            }
        }
    }
    args.resize_at = resize_at.unwrap_or(args.frames / 2);
    args
}

fn load_config(args: &Args) -> Result<FieldConfig, FieldError> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<FieldConfig>(&text)?
        }
        None => FieldConfig::default(),
    };
    if args.dense {
        cfg = cfg.with_spacing(SpacingPolicy::dense());
    }
    if let Some(seed) = args.seed {
        cfg = cfg.with_seed(seed);
    }
    Ok(cfg)
}

fn run(args: &Args) -> Result<(), FieldError> {
    let cfg = load_config(args)?;
    let env = Environment::new(args.width, args.height)
        .with_dpr(args.dpr)
        .with_theme(Theme::from_dark_flag(args.dark));

    let mut bg = Background::new(cfg, env)?;
    let mut surface = RecordingSurface::new();
    let frame_ms = 1000.0 / args.fps as f64;

    info!(
        points = bg.field().len(),
        width = args.width,
        height = args.height,
        "starting headless run"
    );
    bg.start(&mut surface, 0.0);

    let mut summary = RunSummary::default();
    for frame in 0..args.frames {
        let now = frame as f64 * frame_ms;
        if let Some(width) = args.resize_to {
            if frame == args.resize_at {
                let outcome = bg.resize(&mut surface, width, args.height, args.dpr, now);
                info!(?outcome, width, frame, "resize");
            }
        }

        if let Some(stats) = bg.tick(&mut surface, now) {
            summary.drawn_frames += 1;
            summary.total_lines += stats.lines;
            summary.max_visible_points = summary.max_visible_points.max(stats.visible_points);
        }
        // Only totals are reported; keep memory flat on long runs.
        surface.commands.clear();
        summary.frames += 1;
    }
    bg.teardown();

    summary.points = bg.field().len();
    summary.generation = bg.field().generation;
    summary.regenerations = bg.regenerations();

    if args.json {
        let report = JsonReport {
            summary: &summary,
            field: bg.field(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("frames:             {}", summary.frames);
        println!("drawn frames:       {}", summary.drawn_frames);
        println!("points:             {}", summary.points);
        println!("generation:         {}", summary.generation);
        println!("regenerations:      {}", summary.regenerations);
        println!("lines drawn:        {}", summary.total_lines);
        println!("max visible points: {}", summary.max_visible_points);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(2);
    }
}
