use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vidshot::{
    Converter, ConverterConfig, FfmpegLogLevel, JobRequest, OperationType, ProgressCallback,
    ProgressInfo, Upload, VideoInfo, VidshotError,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidshot convert lecture.mp4 --interval 30\n  vidshot convert https://example.com/talk.mp4 --out-dir pdfs --progress\n  vidshot probe lecture.mp4 --json\n  vidshot completions zsh > _vidshot";

#[derive(Debug, Parser)]
#[command(
    name = "vidshot",
    version,
    about = "Sample frames from a video and bind them into a PDF",
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
    /// Print a line for every sampled frame.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show progress bars.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a video file or URL into a PDF of screenshots.
    #[command(
        about = "Convert a video into a PDF of screenshots",
        after_help = "Examples:\n  vidshot convert lecture.mp4 --interval 30\n  vidshot convert https://example.com/talk.mp4 --out-dir pdfs --json"
    )]
    Convert {
        /// Input video path or http(s) URL.
        input: String,
        /// Seconds between screenshots. Non-integer values fall back to 10; negative
        /// values sample every frame.
        #[arg(long, default_value = "10")]
        interval: String,
        /// Directory the PDF is written to.
        #[arg(long, default_value = "screenshots")]
        out_dir: PathBuf,
        /// Scratch directory for sampled frames.
        #[arg(long, default_value = "temp_frames")]
        frame_dir: PathBuf,
        /// Directory uploads are staged and downloads are written to.
        #[arg(long, default_value = "uploads")]
        upload_dir: PathBuf,
        /// JPEG quality of sampled frames (1-100).
        #[arg(long, default_value_t = 95)]
        quality: u8,
        /// Abort downloads larger than this many bytes.
        #[arg(long)]
        max_download_size: Option<u64>,
        /// Overall download timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print basic properties of a video.
    #[command(about = "Print video properties", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn is_url(input: &str) -> bool {
    input.contains("://")
}

/// Check the file name against the allowed extensions, then open it.
fn open_upload(path: &Path, config: &ConverterConfig) -> Result<Upload, VidshotError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    vidshot::validate_filename(&filename, config)?;
    Upload::from_path(path)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = FfmpegLogLevel::from_name(level)
            .ok_or(format!("unsupported --log-level: {level}"))?;
        vidshot::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// One progress bar per job phase, created on first report.
struct TerminalProgress {
    show_bars: bool,
    verbose: bool,
    bars: Mutex<Vec<(OperationType, ProgressBar)>>,
}

impl TerminalProgress {
    fn new(show_bars: bool, verbose: bool) -> Self {
        Self {
            show_bars,
            verbose,
            bars: Mutex::new(Vec::new()),
        }
    }

    fn finish(&self) {
        if let Ok(bars) = self.bars.lock() {
            for (_, bar) in bars.iter() {
                bar.finish_and_clear();
            }
        }
    }
}

fn progress_bar(operation: OperationType, total: Option<u64>) -> ProgressBar {
    let (template, message) = match operation {
        OperationType::Download => (
            "{spinner:.green} {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}",
            "downloading",
        ),
        OperationType::FrameSampling => (
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
            "sampling frames",
        ),
        _ => (
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
            "writing pages",
        ),
    };

    let bar = match total {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_message(message);
    bar
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if self.verbose && info.operation == OperationType::FrameSampling {
            if let Some(frame) = info.current_frame {
                eprintln!("sampled frame {frame} ({} so far)", info.current);
            }
        }

        if !self.show_bars {
            return;
        }

        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let index = match bars.iter().position(|(operation, _)| *operation == info.operation) {
            Some(index) => index,
            None => {
                bars.push((info.operation, progress_bar(info.operation, info.total)));
                bars.len() - 1
            }
        };

        let bar = &bars[index].1;
        if let Some(total) = info.total {
            bar.set_length(total.max(info.current));
        }
        bar.set_position(info.current);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            interval,
            out_dir,
            frame_dir,
            upload_dir,
            quality,
            max_download_size,
            timeout,
            json,
        } => {
            let interval_seconds = vidshot::parse_interval(&interval);
            let progress = Arc::new(TerminalProgress::new(cli.global.progress, cli.global.verbose));

            let mut config = ConverterConfig::new()
                .with_output_dir(out_dir)
                .with_frame_dir(frame_dir)
                .with_upload_dir(upload_dir)
                .with_jpeg_quality(quality)
                .with_max_download_size(max_download_size)
                .with_progress(progress.clone());
            if let Some(seconds) = timeout {
                config = config.with_download_timeout(Duration::from_secs(seconds));
            }

            let request = if is_url(&input) {
                JobRequest::from_url(input.clone(), interval_seconds)
            } else {
                JobRequest::from_upload(open_upload(Path::new(&input), &config)?, interval_seconds)
            };

            let result = Converter::new(config).convert(request);
            progress.finish();
            let conversion = result?;

            if json {
                let payload = json!({
                    "file_name": conversion.file_name(),
                    "path": conversion.document.path,
                    "pages": conversion.document.page_count,
                    "page_width_mm": conversion.document.page_size.width_mm,
                    "page_height_mm": conversion.document.page_size.height_mm,
                    "sampled_frames": conversion.sampled_frames,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "{} page(s) written to {}",
                        conversion.document.page_count,
                        conversion.document.path.display()
                    )
                    .green()
                );
            }
        }
        Commands::Probe { input, json } => {
            let info = VideoInfo::probe(&input)?;
            if json {
                let payload = json!({
                    "format": info.format,
                    "codec": info.codec,
                    "width": info.width,
                    "height": info.height,
                    "fps": info.frames_per_second,
                    "frame_count": info.frame_count,
                    "duration_seconds": info.duration.as_secs_f64(),
                    "page_width_mm": vidshot::pixels_to_mm(info.width),
                    "page_height_mm": vidshot::pixels_to_mm(info.height),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", info.format);
                println!("Duration: {:?}", info.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}], ~{} frames",
                    info.width, info.height, info.frames_per_second, info.codec, info.frame_count,
                );
                println!(
                    "Page size: {:.2} x {:.2} mm",
                    vidshot::pixels_to_mm(info.width),
                    vidshot::pixels_to_mm(info.height),
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidshot", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
