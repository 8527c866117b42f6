use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;

use canvas_compositor::{
    default_output_path, is_supported_image, BarPosition, BrandOverlaySettings, ComposeOptions,
    Compositor, FontFace, ImageHandle, Operation, OverlaySettings, ProcessOptions, ProcessResult,
    SpeechBubbleSettings,
};

#[derive(Parser)]
#[command(
    name = "canvas-edit",
    about = "Mask, pixelate and annotate images from the command line",
    version,
    after_help = "Outputs default to <name>_<operation>.png next to the input\n\
                  (.jpg for JPEG results under --keep-format).\n\
                  Settings files use the same camelCase JSON the editors save."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TrueType/OpenType font used for text overlays
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Keep JPEG inputs as JPEG for overlay operations
    #[arg(long, global = true)]
    keep_format: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Args)]
struct Target {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory (default: {name}_{operation}.png; .jpg for JPEG results)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Make the input transparent where the mask is white
    EraseMask {
        #[command(flatten)]
        target: Target,
        /// White-on-black mask image
        #[arg(short, long)]
        mask: PathBuf,
    },
    /// Pixelate the blocks selected by a white-on-black mask
    Mosaic {
        #[command(flatten)]
        target: Target,
        /// White-on-black selection mask
        #[arg(short, long)]
        mask: PathBuf,
    },
    /// Draw a border frame and a text block
    FrameText {
        #[command(flatten)]
        target: Target,
        /// JSON settings file
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Text to draw (overrides the settings file)
        #[arg(long)]
        text: Option<String>,
        /// Frame thickness; enables the frame
        #[arg(long)]
        frame: Option<f32>,
    },
    /// Draw a speech bubble
    Bubble {
        #[command(flatten)]
        target: Target,
        /// JSON settings file
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Bubble text (overrides the settings file)
        #[arg(long)]
        text: Option<String>,
        /// Grid cell as ROW,COL (0-2 each)
        #[arg(long, value_parser = parse_cell)]
        position: Option<[u8; 2]>,
    },
    /// Draw a brand bar with logo and name
    Brand {
        #[command(flatten)]
        target: Target,
        /// JSON settings file
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Brand name
        #[arg(long)]
        name: Option<String>,
        /// Logo image file
        #[arg(long)]
        logo: Option<PathBuf>,
        /// Put the bar along the top edge
        #[arg(long)]
        top: bool,
    },
    /// Report whether images have an empty (transparent or flat) background
    DetectBg {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn parse_cell(s: &str) -> Result<[u8; 2], String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| "expected ROW,COL".to_string())?;
    let parse = |v: &str| -> Result<u8, String> {
        match v.trim().parse::<u8>() {
            Ok(n) if n <= 2 => Ok(n),
            _ => Err(format!("grid index must be 0, 1 or 2, got {v:?}")),
        }
    };
    Ok([parse(row)?, parse(col)?])
}

fn load_settings<T: DeserializeOwned + Default>(path: Option<&Path>) -> T {
    let Some(path) = path else {
        return T::default();
    };
    let parsed = std::fs::read_to_string(path)
        .map_err(canvas_compositor::Error::from)
        .and_then(|json| serde_json::from_str(&json).map_err(canvas_compositor::Error::from));
    match parsed {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let opts = ProcessOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let mut engine = match &cli.font {
        Some(path) => match FontFace::from_file(path) {
            Ok(face) => Compositor::with_typeface(face),
            Err(e) => {
                eprintln!("Fatal: Failed to load font {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => Compositor::new(),
    };
    engine = engine.with_options(ComposeOptions {
        keep_source_format: cli.keep_format,
        ..ComposeOptions::default()
    });

    let (target, op) = match cli.command {
        Command::DetectBg { inputs } => {
            detect_backgrounds(&engine, &inputs, &opts);
            return;
        }
        Command::EraseMask { target, mask } => (target, Operation::EraseMask { mask }),
        Command::Mosaic { target, mask } => (target, Operation::Mosaic { mask }),
        Command::FrameText {
            target,
            settings,
            text,
            frame,
        } => {
            let mut s: OverlaySettings = load_settings(settings.as_deref());
            if let Some(text) = text {
                s.text = text;
            }
            if let Some(thickness) = frame {
                s.frame.enabled = true;
                s.frame.thickness = thickness;
            }
            (target, Operation::FrameText(s))
        }
        Command::Bubble {
            target,
            settings,
            text,
            position,
        } => {
            let mut s: SpeechBubbleSettings = load_settings(settings.as_deref());
            if let Some(text) = text {
                s.text = text;
            }
            if let Some(cell) = position {
                s.position = cell;
            }
            (target, Operation::Bubble(s))
        }
        Command::Brand {
            target,
            settings,
            name,
            logo,
            top,
        } => {
            let mut s: BrandOverlaySettings = load_settings(settings.as_deref());
            if settings.is_none() {
                s.enabled = true;
            }
            if let Some(name) = name {
                s.name = name;
            }
            if let Some(path) = logo {
                match ImageHandle::from_path(&path) {
                    Ok(h) => s.logo = Some(h),
                    Err(e) => {
                        eprintln!("Error: Failed to load logo {}: {e}", path.display());
                        process::exit(1);
                    }
                }
            }
            if top {
                s.position = BarPosition::Top;
            }
            (target, Operation::Brand(s))
        }
    };

    let input_path = target.input.as_path();
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", input_path.display());
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &target.output {
            o.clone()
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: canvas-edit <command> <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &op)
    } else {
        let output_path = target
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(input_path, op.suffix()));
        vec![engine.process_file(input_path, &output_path, &op)]
    };

    if summarize(&results, &opts) > 0 {
        process::exit(1);
    }
}

fn detect_backgrounds(engine: &Compositor, inputs: &[PathBuf], opts: &ProcessOptions) {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            match std::fs::read_dir(input) {
                Ok(rd) => files.extend(
                    rd.filter_map(Result::ok)
                        .map(|e| e.path())
                        .filter(|p| p.is_file() && is_supported_image(p)),
                ),
                Err(e) => eprintln!("[FAIL] {}: {e}", input.display()),
            }
        } else {
            files.push(input.clone());
        }
    }

    let results: Vec<ProcessResult> = files
        .iter()
        .map(|path| match ImageHandle::from_path(path) {
            Ok(handle) => {
                let empty = engine.detect_empty_background(&handle);
                println!("{}\t{}", path.display(), if empty { "empty" } else { "background" });
                ProcessResult {
                    path: path.clone(),
                    success: true,
                    skipped: false,
                    message: if empty {
                        "Background is transparent or uniform".to_string()
                    } else {
                        "Background has content".to_string()
                    },
                }
            }
            Err(e) => ProcessResult {
                path: path.clone(),
                success: false,
                skipped: false,
                message: format!("Failed to load: {e}"),
            },
        })
        .collect();

    if summarize(&results, opts) > 0 {
        process::exit(1);
    }
}

/// Print every result and the batch summary; returns the failure count.
fn summarize(results: &[ProcessResult], opts: &ProcessOptions) -> u32 {
    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in results {
        print_result(r, opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    fail_count
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            eprintln!("[OK] {filename}");
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
