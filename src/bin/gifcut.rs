use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use env_logger::Env;
use gifcut::{
    BuildOptions, CropRect, DecodeStrategy, Dimensions, ExportPreset, ExportRequest, FfmpegLogLevel,
    FrameSource, GifAssembler, GifWriter, MediaProbe, MediaSource, OutputSpec, ProgressInfo,
    ResolutionPreset, ThumbnailGenerator, ThumbnailOptions, TimeRange, TrimSelection,
    VideoMetadata, format_timecode, output_frame_count, validate_request,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  gifcut info input.mp4 --json\n  gifcut plan input.mp4 --start 0:05 --end 0:15 --exclude 8-9.5\n  gifcut export input.mp4 --out clip.gif --fps 15 --resolution 480p --progress\n  gifcut thumbnails input.mp4 --out strip.png --count 12\n  gifcut completions zsh > _gifcut";

const DEFAULT_FPS: u32 = 15;

#[derive(Debug, Parser)]
#[command(
    name = "gifcut",
    version,
    about = "Cut video segments into animated GIFs",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Decode from the start instead of seeking (for inputs with broken indexes).
    #[arg(long, global = true)]
    sequential_decode: bool,
}

#[derive(Debug, Args, Clone, Default)]
struct EditArgs {
    /// Trim start (seconds, MM:SS or HH:MM:SS). Defaults to the beginning.
    #[arg(long)]
    start: Option<String>,

    /// Trim end. Defaults to the end of the video.
    #[arg(long)]
    end: Option<String>,

    /// Cut a range out of the trim, as START-END. Repeatable.
    #[arg(long, value_name = "START-END")]
    exclude: Vec<String>,

    /// Start from a built-in preset (high-quality, balanced, compressed).
    #[arg(long)]
    preset: Option<String>,

    /// Output frames per second [default: 15].
    #[arg(long)]
    fps: Option<u32>,

    /// Output size: original, 720p, 480p, 360p, 240p, or WIDTHxHEIGHT.
    #[arg(long)]
    resolution: Option<String>,

    /// Output width; height follows the aspect ratio unless given.
    #[arg(long)]
    width: Option<u32>,

    /// Output height; width follows the aspect ratio unless given.
    #[arg(long)]
    height: Option<u32>,

    /// Use 16:9 for height presets instead of the source aspect ratio.
    #[arg(long)]
    stretch: bool,

    /// Quality from 0.0 (smallest) to 1.0 (best) [default: 0.9].
    #[arg(long)]
    quality: Option<f32>,

    /// Playback speed multiplier [default: 1.0].
    #[arg(long)]
    speed: Option<f64>,

    /// Crop region in source pixels, as X,Y,WIDTH,HEIGHT.
    #[arg(long, value_name = "X,Y,W,H")]
    crop: Option<String>,

    /// Play once instead of looping forever.
    #[arg(long)]
    no_loop: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video metadata.
    #[command(
        about = "Print video metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  gifcut info input.mp4\n  gifcut info a.mp4 b.gif --json"
    )]
    Info {
        /// Input video paths.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the segments and frame counts an export would produce.
    #[command(
        about = "Plan an export without decoding",
        after_help = "Examples:\n  gifcut plan input.mp4 --start 10 --end 20 --exclude 12-14 --fps 10\n  gifcut plan input.mp4 --preset compressed --speed 2"
    )]
    Plan {
        /// Input video path.
        input: PathBuf,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Export an animated GIF.
    #[command(
        about = "Export an animated GIF",
        after_help = "Examples:\n  gifcut export input.mp4 --out clip.gif --start 0:05 --end 0:12\n  gifcut export input.mp4 --out clip.gif --exclude 3-4 --crop 0,0,640,360 --width 320 --progress"
    )]
    Export {
        /// Input video path.
        input: PathBuf,

        /// Output GIF path.
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Write a strip of timeline thumbnails.
    #[command(
        about = "Generate a thumbnail strip",
        after_help = "Examples:\n  gifcut thumbnails input.mp4 --out strip.png\n  gifcut thumbnails input.mp4 --out strip.jpg --count 20 --height 90"
    )]
    Thumbnails {
        /// Input video path.
        input: PathBuf,

        /// Output image path.
        #[arg(long)]
        out: PathBuf,

        /// Number of thumbnails.
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Thumbnail height in pixels.
        #[arg(long, default_value_t = 60)]
        height: u32,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds.max(0.0));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    Ok(total_seconds.max(0.0))
}

fn parse_exclusion(value: &str) -> Result<TimeRange, Box<dyn std::error::Error>> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("invalid --exclude (expected START-END): {value}"))?;
    Ok(TimeRange::new(parse_timecode(start)?, parse_timecode(end)?)?)
}

fn parse_crop(value: &str) -> Result<CropRect, Box<dyn std::error::Error>> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid --crop (expected X,Y,WIDTH,HEIGHT): {value}"))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(CropRect::new(*x, *y, *width, *height)),
        _ => Err(format!("invalid --crop (expected X,Y,WIDTH,HEIGHT): {value}").into()),
    }
}

/// `side * numerator / denominator`, at least 1.
fn scale_side(side: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return side;
    }
    (u64::from(side) * u64::from(numerator) / u64::from(denominator)).max(1) as u32
}

fn build_output_spec(
    edit: &EditArgs,
    metadata: &VideoMetadata,
) -> Result<OutputSpec, Box<dyn std::error::Error>> {
    let crop = edit.crop.as_deref().map(parse_crop).transpose()?;
    let base = crop
        .and_then(|rect| rect.clamp_to(metadata.width, metadata.height))
        .map(|rect| rect.dimensions())
        .unwrap_or_else(|| Dimensions::new(metadata.width, metadata.height));
    let maintain_aspect = !edit.stretch;

    let mut spec = match &edit.preset {
        Some(name) => ExportPreset::find(name)
            .ok_or_else(|| {
                format!("unknown --preset: {name} (high-quality, balanced, compressed)")
            })?
            .to_output_spec(base, maintain_aspect),
        None => OutputSpec::new(DEFAULT_FPS, base),
    };

    if let Some(resolution) = &edit.resolution {
        let preset: ResolutionPreset = resolution.parse()?;
        spec.dimensions = preset.resolve(base, maintain_aspect);
    }

    match (edit.width, edit.height) {
        (Some(width), Some(height)) => spec.dimensions = Dimensions::new(width, height),
        (Some(width), None) => {
            spec.dimensions = Dimensions::new(width, scale_side(width, base.height, base.width));
        }
        (None, Some(height)) => {
            spec.dimensions = Dimensions::new(scale_side(height, base.width, base.height), height);
        }
        (None, None) => {}
    }

    if let Some(fps) = edit.fps {
        spec.fps = fps;
    }
    if let Some(quality) = edit.quality {
        spec = spec.with_quality(quality);
    }
    if let Some(speed) = edit.speed {
        spec = spec.with_speed_factor(speed);
    }
    if let Some(rect) = crop {
        spec = spec.with_crop(rect);
    }
    if edit.no_loop {
        spec = spec.with_loop(false);
    }

    Ok(spec)
}

fn build_request(
    edit: &EditArgs,
    metadata: &VideoMetadata,
) -> Result<ExportRequest, Box<dyn std::error::Error>> {
    let start = edit.start.as_deref().map(parse_timecode).transpose()?;
    let end = edit.end.as_deref().map(parse_timecode).transpose()?;
    let primary = TimeRange::new(
        start.unwrap_or(0.0),
        end.unwrap_or_else(|| metadata.duration_seconds()),
    )?;

    let mut selection = TrimSelection::new(primary);
    for value in &edit.exclude {
        selection.exclude(parse_exclusion(value)?);
    }
    Ok(selection.snapshot(build_output_spec(edit, metadata)?))
}

fn open_source(
    input: &Path,
    global: &GlobalOptions,
) -> Result<MediaSource, Box<dyn std::error::Error>> {
    if !gifcut::is_supported_path(input) {
        warn(&format!(
            "{} does not have a recognised video extension",
            input.display()
        ));
    }
    let strategy = global.sequential_decode.then_some(DecodeStrategy::Sequential);
    Ok(MediaSource::open_with_strategy(input, strategy)?)
}

fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            warn(&format!("overwriting {}", path.display()));
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        gifcut::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn progress_bar(enabled: bool) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}% {msg}")?;
    pb.set_style(style.progress_chars("##-"));
    Ok(Some(pb))
}

fn metadata_json(input: &Path, metadata: &VideoMetadata) -> serde_json::Value {
    json!({
        "path": input.display().to_string(),
        "format": metadata.format,
        "codec": metadata.codec,
        "width": metadata.width,
        "height": metadata.height,
        "aspect_ratio": metadata.aspect_ratio(),
        "fps": metadata.frames_per_second,
        "frame_count": metadata.frame_count,
        "duration_seconds": metadata.duration_seconds(),
    })
}

fn print_metadata(input: &Path, metadata: &VideoMetadata, with_heading: bool) {
    if with_heading {
        println!("{}", input.display().to_string().bold());
    }
    println!("Format: {}", metadata.format);
    println!(
        "Duration: {} ({} frames)",
        format_timecode(metadata.duration_seconds()),
        metadata.frame_count,
    );
    println!(
        "Video: {}x{} ({:.2}:1) @ {:.2} fps [{}]",
        metadata.width,
        metadata.height,
        metadata.aspect_ratio(),
        metadata.frames_per_second,
        metadata.codec,
    );
}

fn print_plan(metadata: &VideoMetadata, request: &ExportRequest) {
    println!(
        "Trim: {} ({} excluded range(s))",
        request.primary,
        request.excluded.len()
    );
    for (index, segment) in request.effective_segments().iter().enumerate() {
        let frames = output_frame_count(
            segment.duration(),
            f64::from(request.output.fps),
            request.output.speed_factor,
        );
        println!("  segment {index}: {segment} -> {frames} frame(s)");
    }
    println!(
        "Output: {} @ {} fps, speed {:.2}x, quality {:.2}, {}",
        request.output.dimensions,
        request.output.fps,
        request.output.speed_factor,
        request.output.quality,
        if request.output.loop_forever { "looping" } else { "plays once" },
    );
    println!(
        "Encoder rate: {:.2} fps, {} frame(s), ~{:.1} MB",
        request.encoder_frame_rate(),
        request.planned_frame_count(),
        request.estimated_size_bytes() as f64 / (1024.0 * 1024.0),
    );
    print!("{}", validate_request(metadata, request));
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Info { inputs, json } => {
            let results = MediaProbe::probe_many(inputs.as_slice());
            let mut failures = 0;
            let mut payloads = Vec::new();
            for (input, result) in inputs.iter().zip(results) {
                let metadata = match result {
                    Ok(metadata) => metadata,
                    Err(error) => {
                        eprintln!("{} {error}", "error:".red().bold());
                        failures += 1;
                        continue;
                    }
                };
                if json {
                    payloads.push(metadata_json(input, &metadata));
                } else {
                    print_metadata(input, &metadata, inputs.len() > 1);
                }
            }
            if json && !payloads.is_empty() {
                let payload = if inputs.len() == 1 {
                    payloads.remove(0)
                } else {
                    serde_json::Value::Array(payloads)
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            if failures > 0 {
                return Err(format!("{failures} input(s) could not be probed").into());
            }
        }
        Commands::Plan { input, edit } => {
            let metadata = MediaProbe::probe(&input)?;
            let request = build_request(&edit, &metadata)?;
            print_plan(&metadata, &request);
        }
        Commands::Export { input, out, edit } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let mut source = open_source(&input, &cli.global)?;
            let metadata = source.metadata().clone();
            let request = build_request(&edit, &metadata)?;

            let report = validate_request(&metadata, &request);
            if !report.is_valid() {
                eprint!("{report}");
                return Err("export request is invalid".into());
            }
            for message in &report.warnings {
                warn(message);
            }

            let mut options = BuildOptions::new();
            let bar = progress_bar(cli.global.progress)?;
            if let Some(pb) = bar.clone() {
                options = options.with_progress(Arc::new(move |info: &ProgressInfo| {
                    pb.set_position(u64::from(info.percentage));
                    pb.set_message(format!("{:?}", info.operation));
                }));
            }

            let summary =
                GifAssembler::export(&mut source, &request, &out, &GifWriter::new(), &options)?;
            if let Some(pb) = bar {
                pb.finish_and_clear();
            }

            println!("{} {}", "saved".green().bold(), summary.path.display());
            println!(
                "{} frame(s), {} @ {:.2} fps, {:.2}s playback, {} segment(s)",
                summary.frame_count,
                summary.dimensions,
                summary.frame_rate,
                summary.playback.as_secs_f64(),
                summary.segments,
            );
            if summary.skipped_frames > 0 {
                warn(&format!(
                    "{} frame(s) could not be decoded and were skipped",
                    summary.skipped_frames
                ));
            }
        }
        Commands::Thumbnails {
            input,
            out,
            count,
            height,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let mut source = open_source(&input, &cli.global)?;
            let options = ThumbnailOptions::new().with_count(count).with_height(height);
            let thumbnails = ThumbnailGenerator::thumbnails(&mut source, &options);
            let strip = ThumbnailGenerator::strip(&thumbnails)
                .ok_or("no thumbnails could be decoded")?;
            strip.save(&out)?;
            println!(
                "{} {} ({} thumbnail(s))",
                "saved".green().bold(),
                out.display(),
                thumbnails.len()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "gifcut", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;

    use super::{
        Cli, Commands, EditArgs, build_output_spec, build_request, metadata_json, parse_crop,
        parse_exclusion, parse_timecode, scale_side,
    };
    use gifcut::{CropRect, Dimensions, VideoMetadata};

    fn metadata() -> VideoMetadata {
        VideoMetadata::new(1920, 1080, 30.0, 300)
    }

    #[test]
    fn info_accepts_several_inputs() {
        let cli = Cli::try_parse_from(["gifcut", "info", "a.mp4", "b.gif", "--json"]).unwrap();
        match cli.command {
            Commands::Info { inputs, json } => {
                assert_eq!(inputs, [PathBuf::from("a.mp4"), PathBuf::from("b.gif")]);
                assert!(json);
            }
            _ => panic!("expected the info command"),
        }
        assert!(Cli::try_parse_from(["gifcut", "info"]).is_err());
    }

    #[test]
    fn metadata_json_includes_aspect_ratio() {
        let payload = metadata_json(Path::new("clip.mp4"), &metadata());
        assert_eq!(payload["path"], "clip.mp4");
        assert_eq!(payload["frame_count"], 300);
        let ratio = payload["aspect_ratio"].as_f64().unwrap();
        assert!((ratio - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("75").unwrap(), 75.0);
        assert_eq!(parse_timecode("01:15").unwrap(), 75.0);
        assert_eq!(parse_timecode("00:01:15.5").unwrap(), 75.5);
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
    }

    #[test]
    fn parse_exclusion_ranges() {
        let range = parse_exclusion("2-4.5").unwrap();
        assert_eq!((range.start(), range.end()), (2.0, 4.5));

        let range = parse_exclusion("0:10-0:12").unwrap();
        assert_eq!((range.start(), range.end()), (10.0, 12.0));

        assert!(parse_exclusion("4-2").is_err());
        assert!(parse_exclusion("4").is_err());
    }

    #[test]
    fn parse_crop_values() {
        assert_eq!(parse_crop("10, 20, 300, 200").unwrap(), CropRect::new(10, 20, 300, 200));
        assert!(parse_crop("10,20,300").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn scale_side_keeps_aspect() {
        assert_eq!(scale_side(640, 1080, 1920), 360);
        assert_eq!(scale_side(1, 1, 1000), 1);
        assert_eq!(scale_side(50, 1, 0), 50);
    }

    #[test]
    fn output_spec_defaults_to_source_size() {
        let spec = build_output_spec(&EditArgs::default(), &metadata()).unwrap();
        assert_eq!(spec.fps, 15);
        assert_eq!(spec.dimensions, Dimensions::new(1920, 1080));
        assert!(spec.loop_forever);
    }

    #[test]
    fn output_spec_width_follows_crop_aspect() {
        let edit = EditArgs {
            crop: Some("0,0,800,800".to_string()),
            width: Some(200),
            no_loop: true,
            ..EditArgs::default()
        };
        let spec = build_output_spec(&edit, &metadata()).unwrap();
        assert_eq!(spec.dimensions, Dimensions::new(200, 200));
        assert_eq!(spec.crop, Some(CropRect::new(0, 0, 800, 800)));
        assert!(!spec.loop_forever);
    }

    #[test]
    fn output_spec_preset_then_overrides() {
        let edit = EditArgs {
            preset: Some("balanced".to_string()),
            fps: Some(12),
            ..EditArgs::default()
        };
        let spec = build_output_spec(&edit, &metadata()).unwrap();
        assert_eq!(spec.fps, 12);
        assert_eq!(spec.dimensions, Dimensions::new(1280, 720));
        assert!((spec.quality - 0.85).abs() < 1e-6);

        let unknown = EditArgs {
            preset: Some("tiny".to_string()),
            ..EditArgs::default()
        };
        assert!(build_output_spec(&unknown, &metadata()).is_err());
    }

    #[test]
    fn request_defaults_to_full_range() {
        let edit = EditArgs {
            exclude: vec!["2-4".to_string(), "3-5".to_string()],
            ..EditArgs::default()
        };
        let request = build_request(&edit, &metadata()).unwrap();
        assert_eq!(request.primary.end(), 10.0);
        assert_eq!(request.excluded.len(), 1);
        assert_eq!(request.effective_segments().len(), 2);
    }
}
