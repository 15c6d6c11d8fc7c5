//! dupagent - find duplicate files and move them into a recoverable trash.
//!
//! Usage:
//!   dupagent scan [DIRS]...     Find duplicates (optionally trash them)
//!   dupagent trash <PATHS>...   Move files to the trash
//!   dupagent watch [DIRS]...    Rescan on changes or with --every
//!   dupagent open <PATH>        Open with the default application
//!   dupagent --help             Show help

mod logging;
mod settings;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{info, warn};

use dupagent_core::{DuplicateGroup, FileCategory, ScanOptions};
use dupagent_ops::{
    TrashEvent, TrashInfo, TrashMover, TrashSummary, open_parent, open_path, start_trash,
};
use dupagent_scan::{
    RescanWatcher, ScanController, ScanEvent, ScanOutcome, ScanReport, ScanSchedule, start_scan,
    status,
};

use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "dupagent",
    version,
    about = "Find duplicate files and move them into a recoverable trash",
    long_about = "dupagent finds files with identical contents across directories.\n\n\
                  Duplicates are never deleted: they are moved into the freedesktop \
                  trash of their volume, where file managers can restore them."
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan directories for duplicate files
    Scan(ScanArgs),

    /// Move files to the trash
    Trash {
        /// Files to trash
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Scan, then rescan whenever files change or on a timer (Ctrl-C to stop)
    Watch {
        /// Directories to watch (defaults to the saved directories)
        dirs: Vec<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Seconds of quiet before a rescan starts
        #[arg(long, default_value = "2")]
        debounce: u64,

        /// Also rescan every N seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
    },

    /// Open a file with the default application
    Open {
        path: PathBuf,

        /// Open the containing folder instead
        #[arg(long)]
        folder: bool,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Directories to scan (defaults to the saved directories)
    dirs: Vec<PathBuf>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Move every duplicate except the first of each group to the trash
    #[arg(long)]
    trash: bool,

    /// Do not ask before trashing
    #[arg(short, long, requires = "trash")]
    yes: bool,

    /// Store the directories and filters as defaults
    #[arg(long)]
    save_defaults: bool,
}

#[derive(Args)]
struct FilterArgs {
    /// Also require identical file names
    #[arg(long)]
    by_name: bool,

    /// Also require identical extensions
    #[arg(long)]
    by_extension: bool,

    /// Match on size only, without reading contents
    #[arg(long)]
    no_content: bool,

    /// Include zero-byte files
    #[arg(long)]
    include_empty: bool,

    /// Include files whose name starts with a dot
    #[arg(long)]
    include_hidden: bool,

    /// Restrict to a file category (all, audio, video, image, text, office, pdf, archive, custom)
    #[arg(short, long)]
    category: Option<FileCategory>,

    /// Comma separated extensions, implies --category custom
    #[arg(short, long)]
    ext: Option<String>,
}

impl FilterArgs {
    /// Layer the flags over the saved options.
    fn apply(&self, base: &ScanOptions) -> Result<ScanOptions> {
        let category = match (self.category, &self.ext) {
            (Some(category), _) => category,
            (None, Some(_)) => FileCategory::Custom,
            (None, None) => base.category,
        };

        let mut builder = ScanOptions::builder();
        builder
            .match_content(base.match_content && !self.no_content)
            .match_size(base.match_size)
            .match_name(base.match_name || self.by_name)
            .match_extension(base.match_extension || self.by_extension)
            .skip_zero_byte(base.skip_zero_byte && !self.include_empty)
            .skip_hidden(base.skip_hidden && !self.include_hidden)
            .category(category)
            .custom_extensions(base.custom_extensions.clone());
        if let Some(raw) = &self.ext {
            builder.custom_extension_list(raw);
        }
        builder.build().context("Invalid scan options")
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let verbosity = if cli.quiet { -1 } else { cli.verbose.min(3) as i8 };
    logging::init_logging(verbosity);

    let settings = Settings::load();

    match cli.command {
        Command::Scan(args) => run_scan(args, settings).await?,
        Command::Trash { paths } => run_trash(paths).await?,
        Command::Watch {
            dirs,
            filters,
            debounce,
            every,
        } => {
            let every = every.map(Duration::from_secs);
            run_watch(dirs, filters, Duration::from_secs(debounce), every, settings).await?
        }
        Command::Open { path, folder } => {
            let opened = if folder {
                open_parent(&path)
            } else {
                open_path(&path)
            };
            if !opened {
                bail!("Could not open {}", path.display());
            }
        }
    }

    Ok(())
}

/// Scan once, print the groups and optionally trash the duplicates.
async fn run_scan(args: ScanArgs, settings: Settings) -> Result<()> {
    let options = args.filters.apply(&settings.scan)?;
    let roots = resolve_roots(&args.dirs, &settings.directories)?;

    if args.save_defaults {
        let saved = Settings {
            directories: roots.clone(),
            scan: options.clone(),
        };
        let path = saved.save().context("Failed to save settings")?;
        eprintln!("Saved defaults to {}", path.display());
    }

    let Some(report) = scan_with_progress(roots, options).await? else {
        return Ok(());
    };

    match args.format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if args.trash {
        let paths: Vec<PathBuf> = report
            .groups
            .iter()
            .flat_map(|g| g.deletable().iter().cloned())
            .collect();
        if paths.is_empty() {
            return Ok(());
        }
        let prompt = format!(
            "Move {} files ({}) to the trash?",
            paths.len(),
            format_size(report.reclaimable_bytes())
        );
        if args.yes || confirm(&prompt)? {
            trash_with_progress(paths).await?;
        }
    }

    Ok(())
}

async fn run_trash(paths: Vec<PathBuf>) -> Result<()> {
    let summary = trash_with_progress(paths).await?;
    if !summary.is_success() {
        bail!("{summary}");
    }
    Ok(())
}

/// Scan, then restart the scan after every debounced batch of changes and,
/// with `every`, on a timer.
async fn run_watch(
    dirs: Vec<PathBuf>,
    filters: FilterArgs,
    debounce: Duration,
    every: Option<Duration>,
    settings: Settings,
) -> Result<()> {
    let options = filters.apply(&settings.scan)?;
    let roots = resolve_roots(&dirs, &settings.directories)?;

    let (tx, mut changes) = mpsc::unbounded_channel();
    let mut watcher =
        RescanWatcher::with_debounce(&options, debounce, tx).context("Failed to start watcher")?;
    for root in &roots {
        watcher
            .watch(root)
            .with_context(|| format!("Failed to watch {}", root.display()))?;
    }

    let mut schedule = every
        .map(|period| ScanSchedule::every(roots.clone(), options.clone(), period))
        .transpose()?;

    let mut controller = ScanController::new();
    let mut events = Some(controller.start(roots.clone(), options.clone()).await?);
    eprintln!("Watching {} directories, press Ctrl-C to stop.", roots.len());

    loop {
        tokio::select! {
            Some(batch) = changes.recv() => {
                info!(changes = batch.len(), "files changed, rescanning");
                eprintln!("{} file(s) changed, rescanning...", batch.len());
                events = Some(controller.start(roots.clone(), options.clone()).await?);
            }
            (roots, options) = next_tick(&mut schedule) => {
                info!("scheduled rescan");
                events = Some(controller.start(roots, options).await?);
            }
            event = next_event(&mut events) => match event {
                Some(ScanEvent::Status(line)) => eprintln!("{line}"),
                Some(ScanEvent::Completed(groups)) => print_groups(&groups),
                Some(ScanEvent::Progress(_)) => {}
                None => events = None,
            },
            _ = tokio::signal::ctrl_c() => {
                if controller.cancel().await?.is_some_and(|o| o.is_cancelled()) {
                    eprintln!("{}", status::CANCELLED);
                }
                break;
            }
        }
    }

    Ok(())
}

async fn next_tick(schedule: &mut Option<ScanSchedule>) -> (Vec<PathBuf>, ScanOptions) {
    match schedule {
        Some(schedule) => schedule.tick().await,
        None => std::future::pending().await,
    }
}

async fn next_event(events: &mut Option<mpsc::UnboundedReceiver<ScanEvent>>) -> Option<ScanEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Run a scan in the background, showing progress on stderr.
///
/// Returns `None` when the user interrupts the scan.
async fn scan_with_progress(roots: Vec<PathBuf>, options: ScanOptions) -> Result<Option<ScanReport>> {
    let mut handle = start_scan(roots, options)?;
    let mut percent = 0u8;

    loop {
        tokio::select! {
            event = handle.recv() => match event {
                Some(ScanEvent::Progress(p)) => percent = p,
                Some(ScanEvent::Status(line)) if percent > 0 => {
                    eprint!("\r\x1b[2K[{percent:>3}%] {line}");
                }
                Some(ScanEvent::Status(line)) => eprintln!("{line}"),
                Some(ScanEvent::Completed(_)) => {
                    if percent > 0 {
                        eprintln!();
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                break;
            }
        }
    }

    match handle.wait().await? {
        ScanOutcome::Completed(report) => Ok(Some(report)),
        ScanOutcome::Cancelled => {
            eprintln!("\n{}", status::CANCELLED);
            Ok(None)
        }
    }
}

/// Trash files in the background, showing progress on stderr.
async fn trash_with_progress(paths: Vec<PathBuf>) -> Result<TrashSummary> {
    let mut rx = start_trash(TrashMover::from_env(), paths);
    let mut summary = TrashSummary::default();

    while let Some(event) = rx.recv().await {
        match event {
            TrashEvent::Progress(progress) => {
                eprint!(
                    "\r\x1b[2KTrashing {}/{} ({:.0}%)",
                    progress.files_completed,
                    progress.files_total,
                    progress.percentage()
                );
            }
            TrashEvent::Complete(done) => {
                eprintln!();
                summary = done;
            }
        }
    }

    println!("{}", summary.message());
    for file in &summary.moved {
        match TrashInfo::read(&file.info) {
            Ok(info) => println!(
                "  {} (restores to {})",
                file.trashed.display(),
                info.original_path().display()
            ),
            Err(err) => warn!(info = %file.info.display(), error = %err, "cannot read trash info"),
        }
    }
    for failure in &summary.failed {
        println!("  {failure}");
    }
    if summary.moved_count() > 0 {
        println!("Freed {}", format_size(summary.bytes_moved()));
    }

    Ok(summary)
}

/// Command line directories, else the saved ones, canonicalized.
fn resolve_roots(dirs: &[PathBuf], saved: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let dirs = if dirs.is_empty() { saved } else { dirs };
    dirs.iter()
        .map(|dir| {
            dir.canonicalize()
                .with_context(|| format!("Invalid path: {}", dir.display()))
        })
        .collect()
}

fn print_report(report: &ScanReport) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" Duplicate File Report");
    println!("{}", "─".repeat(70));
    println!(
        " {} files checked ({} seen), {} candidates, scanned in {:.2}s",
        report.files_checked,
        report.files_walked,
        report.candidates,
        report.elapsed.as_secs_f64()
    );
    println!();

    if report.groups.is_empty() {
        println!(" No duplicate files found.");
    } else {
        println!(
            " Found {} duplicate groups ({} files)",
            report.groups.len(),
            report.duplicate_files()
        );
        println!(
            " Reclaimable space: {}",
            format_size(report.reclaimable_bytes())
        );
        println!();
        print_groups(&report.groups);
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{} warning(s) during scan", report.warnings.len());
    }
}

fn print_groups(groups: &[DuplicateGroup]) {
    for (i, group) in groups.iter().enumerate() {
        println!(
            " Group {} ({} files, {} each)",
            i + 1,
            group.count(),
            group.human_size
        );
        for (j, path) in group.paths.iter().enumerate() {
            let marker = if j == 0 { "keep" } else { "    " };
            println!("   {marker} {}", path.display());
        }
        println!();
    }
}

/// Ask a yes/no question on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(args: &[&str]) -> FilterArgs {
        let mut argv = vec!["dupagent", "scan"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Command::Scan(scan) => scan.filters,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_flags_override_saved_options() {
        let options = filters(&["--by-name", "--include-hidden", "--no-content"])
            .apply(&ScanOptions::default())
            .unwrap();
        assert!(options.match_name);
        assert!(!options.skip_hidden);
        assert!(!options.match_content);
        assert!(options.skip_zero_byte);
    }

    #[test]
    fn test_ext_implies_custom_category() {
        let options = filters(&["--ext", "iso, .IMG"])
            .apply(&ScanOptions::default())
            .unwrap();
        assert_eq!(options.category, FileCategory::Custom);
        assert_eq!(options.custom_extensions, vec![".iso", ".img"]);
    }

    #[test]
    fn test_category_flag() {
        let options = filters(&["--category", "video"])
            .apply(&ScanOptions::default())
            .unwrap();
        assert_eq!(options.category, FileCategory::Video);
    }

    #[test]
    fn test_saved_options_are_kept() {
        let saved = ScanOptions {
            match_extension: true,
            skip_zero_byte: false,
            ..ScanOptions::default()
        };
        let options = filters(&[]).apply(&saved).unwrap();
        assert_eq!(options, saved);
    }

    #[test]
    fn test_yes_requires_trash() {
        assert!(Cli::try_parse_from(["dupagent", "scan", "--yes"]).is_err());
        assert!(Cli::try_parse_from(["dupagent", "scan", "--trash", "--yes", "."]).is_ok());
    }

    #[test]
    fn test_watch_every_flag() {
        let cli = Cli::parse_from(["dupagent", "watch", "--every", "3600", "/data"]);
        match cli.command {
            Command::Watch { every, dirs, .. } => {
                assert_eq!(every, Some(3600));
                assert_eq!(dirs, vec![PathBuf::from("/data")]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_resolve_roots_prefers_command_line() {
        let temp = tempfile::TempDir::new().unwrap();
        let roots = resolve_roots(&[temp.path().to_path_buf()], &[PathBuf::from("/nope")]).unwrap();
        assert_eq!(roots, vec![temp.path().canonicalize().unwrap()]);
        assert!(resolve_roots(&[], &[PathBuf::from("/definitely/not/here")]).is_err());
        assert!(resolve_roots(&[], &[]).unwrap().is_empty());
    }
}
