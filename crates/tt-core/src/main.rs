//! Time-Tag Coincidence Core
//!
//! The main entry point for tt-core, handling:
//! - Loading and calibrating time-tag files
//! - Coincidence counting and α-vs-window scans
//! - Delay-correlation histograms
//! - Counting statistics and random bit extraction

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tt_common::{
    format_error_human, ChannelId, ChannelPair, Error, OutputFormat, StructuredError,
    SCHEMA_VERSION,
};
use tt_config::load::load_from_file;
use tt_config::{load_config, validate_analysis, AnalysisConfig, ConfigSnapshot, ResolvedConfig};
use tt_core::analysis::{
    bin_statistics_per_run, count_coincidences_audited, count_pairs, dead_time_filter, delay_histograms,
    extract_random_bytes, scan_windows, CurveFitter, FitRequest, HistogramParams, MomentFitter,
};
use tt_core::cache::{ScanCache, ScanKey};
use tt_core::calibrate::{calibrate, offsets_from_seconds};
use tt_core::clock::ClockPeriod;
use tt_core::event_log::EventLog;
use tt_core::exit_codes::ExitCode;
use tt_core::ingest::{load_each, load_paths, InputFormat};
use tt_core::join::CoincidenceWindow;
use tt_core::log_event;
use tt_core::logging::{event_names, init_logging, LogConfig, LogContext, LogFormat, Stage};
use tt_core::output::{
    render, BinsReport, CoincidenceReport, HistogramReport, QrngReport, QrngSource, Report,
    ScanReport,
};
use tt_math::CountModel;

/// Time-Tag Coincidence Core - coincidence statistics for time-tagged photon detections
#[derive(Parser)]
#[command(name = "tt-core")]
#[command(
    author,
    version,
    about = "Time-Tag Coincidence Core - coincidence statistics for time-tagged photon detections",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to analysis.json (overrides TT_CONFIG and XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Worker threads for parallel scans (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count pair and triple coincidences for one window
    Coincidences(CoincidenceArgs),

    /// α as a function of coincidence window
    Scan(ScanArgs),

    /// Delay-correlation histograms G(τ) with peak and FWHM
    Histogram(HistogramArgs),

    /// Counting statistics over fixed time bins
    Bins(BinsArgs),

    /// Extract random bytes from arrival intervals
    Qrng(QrngArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct InputArgs {
    /// Time-tag files or directories of them
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Skip per-channel delay calibration
    #[arg(long)]
    raw: bool,
}

#[derive(Args, Debug)]
struct RoleArgs {
    /// Herald channel (default from config)
    #[arg(long)]
    herald: Option<ChannelId>,

    /// First target channel (default from config)
    #[arg(long)]
    target_a: Option<ChannelId>,

    /// Second target channel (default from config)
    #[arg(long)]
    target_b: Option<ChannelId>,
}

#[derive(Args, Debug)]
struct CoincidenceArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    roles: RoleArgs,

    /// Coincidence half-width in nanoseconds
    #[arg(long)]
    window_ns: Option<f64>,

    /// Number of triples to list
    #[arg(long)]
    audit: Option<usize>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    roles: RoleArgs,

    /// Half-widths to scan, in nanoseconds
    #[arg(long, value_delimiter = ',')]
    windows_ns: Vec<f64>,

    /// Directory holding cached scans
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Cache label (default: first input's file stem)
    #[arg(long)]
    label: Option<String>,
}

#[derive(Args, Debug)]
struct HistogramArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Channel pair as REFERENCE,TARGET (repeatable)
    #[arg(long = "pair")]
    pairs: Vec<ChannelPair>,

    /// Largest |delay| histogrammed, in nanoseconds
    #[arg(long)]
    max_delay_ns: Option<f64>,

    /// Bin width in nanoseconds
    #[arg(long)]
    bin_ns: Option<f64>,
}

#[derive(Args, Debug)]
struct BinsArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Channel to bin
    #[arg(long)]
    channel: ChannelId,

    /// Bin width in seconds
    #[arg(long)]
    bin_s: Option<f64>,

    /// Count model for the fit (poisson, thermal)
    #[arg(long)]
    model: Option<CountModel>,

    /// Drop events closer than this many ticks to the previous one
    #[arg(long)]
    dead_time: Option<i64>,

    /// Inputs are single-channel CSV (timestamp in the first column)
    #[arg(long)]
    csv_channel: bool,
}

#[derive(Args, Debug)]
struct QrngArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Channel whose intervals are compared
    #[arg(long)]
    channel: ChannelId,

    /// File receiving the random bytes
    #[arg(long)]
    out: PathBuf,

    /// Discard intervals at or below this many ticks
    #[arg(long)]
    min_interval: Option<i64>,

    /// Inputs are single-channel CSV (timestamp in the first column)
    #[arg(long)]
    csv_channel: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate a configuration file (default: the resolved one)
    Validate {
        /// File to validate
        path: Option<PathBuf>,
    },
    /// Print the JSON schema of analysis.json
    Schema,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogConfig::level_from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    if let Some(n) = cli.global.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
            tracing::warn!(threads = n, error = %e, "could not size worker pool");
        }
    }

    let ctx = LogContext::for_this_run();

    let exit_code = match &cli.command {
        Commands::Coincidences(args) => {
            run_analysis(&cli.global, &ctx, |s| run_coincidences(s, args))
        }
        Commands::Scan(args) => run_analysis(&cli.global, &ctx, |s| run_scan(s, args)),
        Commands::Histogram(args) => {
            run_analysis(&cli.global, &ctx, |s| run_histogram(s, args))
        }
        Commands::Bins(args) => run_analysis(&cli.global, &ctx, |s| run_bins(s, args)),
        Commands::Qrng(args) => run_analysis(&cli.global, &ctx, |s| run_qrng(s, args)),
        Commands::Config(args) => run_config(&cli.global, &ctx, args),
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "tt-core",
                &mut std::io::stdout(),
            );
            ExitCode::Clean
        }
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// State shared by the analysis commands.
struct Session<'a> {
    global: &'a GlobalOpts,
    ctx: &'a LogContext,
    config: ResolvedConfig,
    snapshot: ConfigSnapshot,
    clock: ClockPeriod,
}

impl Session<'_> {
    fn analysis(&self) -> &AnalysisConfig {
        &self.config.analysis
    }

    fn time_tag_format(&self) -> InputFormat {
        let input = &self.analysis().input;
        InputFormat::time_tag(input.header_lines, input.delimiter)
    }

    fn emit<T: Report>(&self, report: &T) -> tt_common::Result<()> {
        let text = render(self.global.format, &self.ctx.run_id, &self.snapshot, report)?;
        println!("{}", text.trim_end());
        Ok(())
    }

    /// Load inputs and, unless `raw`, apply the configured channel delays.
    fn load(&self, input: &InputArgs, format: &InputFormat) -> tt_common::Result<EventLog> {
        let started = Instant::now();
        let log = load_paths(&input.paths, format)?
            .declare_channels(self.analysis().configured_channels());
        log_event!(
            self.ctx,
            INFO,
            event_names::LOAD_FINISHED,
            Stage::Load,
            "Loaded time tags",
            events = log.total_events(),
            channels = log.channels().count(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        if input.raw {
            return Ok(log);
        }

        let offsets = offsets_from_seconds(&self.analysis().channel_delays_s(), self.clock);
        let calibrated = calibrate(&log, &offsets);
        log_event!(
            self.ctx,
            DEBUG,
            event_names::CALIBRATE_APPLIED,
            Stage::Calibrate,
            "Applied channel delays",
            shifted = calibrated.applied_offsets().len()
        );
        Ok(calibrated)
    }

    /// Load every input file as its own acquisition. Files without events on
    /// `channel` are kept; a channel found in no file and absent from the
    /// configuration is [`Error::UnknownChannel`].
    fn load_runs(
        &self,
        input: &InputArgs,
        format: &InputFormat,
        channel: ChannelId,
    ) -> tt_common::Result<Vec<(PathBuf, EventLog)>> {
        let configured = self.analysis().configured_channels();
        let runs: Vec<(PathBuf, EventLog)> = load_each(&input.paths, format)?
            .into_iter()
            .map(|(path, log)| {
                let declared = configured.iter().copied().chain([channel]);
                (path, log.declare_channels(declared))
            })
            .collect();
        let seen = configured.contains(&channel)
            || runs
                .iter()
                .any(|(_, log)| log.get(channel).is_some_and(|s| !s.is_empty()));
        if !seen {
            return Err(Error::UnknownChannel { channel });
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::LOAD_FINISHED,
            Stage::Load,
            "Loaded time tags per file",
            files = runs.len(),
            events = runs.iter().map(|(_, log)| log.total_events()).sum::<usize>()
        );
        Ok(runs)
    }

    fn roles(&self, roles: &RoleArgs) -> (ChannelId, ChannelId, ChannelId) {
        let cfg = &self.analysis().channels;
        (
            roles.herald.unwrap_or_else(|| cfg.herald()),
            roles.target_a.unwrap_or_else(|| cfg.target_a()),
            roles.target_b.unwrap_or_else(|| cfg.target_b()),
        )
    }
}

fn open_session<'a>(
    global: &'a GlobalOpts,
    ctx: &'a LogContext,
) -> tt_common::Result<Session<'a>> {
    let config = load_config(global.config.as_deref()).inspect_err(|e| {
        let error = e.to_string();
        log_event!(
            ctx,
            ERROR,
            event_names::CONFIG_ERROR,
            Stage::Init,
            "Configuration rejected",
            error = error.as_str()
        );
    })?;
    match &config.path {
        Some(path) => {
            let path = path.display().to_string();
            let source = config.source.to_string();
            log_event!(
                ctx,
                DEBUG,
                event_names::CONFIG_LOADED,
                Stage::Init,
                "Loaded configuration",
                path = path.as_str(),
                source = source.as_str()
            )
        }
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "Using built-in configuration"
        ),
    }
    let clock = ClockPeriod::new(config.analysis.clock_period_s)?;
    let snapshot = config.snapshot();
    Ok(Session {
        global,
        ctx,
        config,
        snapshot,
        clock,
    })
}

/// Open a session, run `command`, and map its outcome to an exit code.
fn run_analysis(
    global: &GlobalOpts,
    ctx: &LogContext,
    command: impl FnOnce(&Session) -> tt_common::Result<()>,
) -> ExitCode {
    log_event!(ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "Starting command");
    let outcome = open_session(global, ctx).and_then(|session| command(&session));
    match outcome {
        Ok(()) => {
            log_event!(ctx, DEBUG, event_names::RUN_FINISHED, Stage::Report, "Command finished");
            ExitCode::Clean
        }
        Err(e) => output_error(global, ctx, &e),
    }
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_coincidences(session: &Session, args: &CoincidenceArgs) -> tt_common::Result<()> {
    let cfg = session.analysis();
    let log = session.load(&args.input, &session.time_tag_format())?;
    let (herald, a, b) = session.roles(&args.roles);
    let window = CoincidenceWindow::from_ns(
        args.window_ns.unwrap_or(cfg.coincidence.window_ns),
        session.clock,
    )?;
    let audit = args.audit.unwrap_or(cfg.coincidence.audit_triples);

    let result = count_coincidences_audited(&log, herald, a, b, window, audit)?;
    let pairs = vec![
        count_pairs(&log, herald, a, window)?,
        count_pairs(&log, herald, b, window)?,
    ];
    log_event!(
        session.ctx,
        INFO,
        event_names::COINCIDENCE_COUNTED,
        Stage::Coincidence,
        "Counted coincidences",
        window_ticks = window.ticks(),
        n_reference = result.n_reference,
        n_triple = result.n_triple
    );

    session.emit(&CoincidenceReport::new(result, pairs, session.clock))
}

fn run_scan(session: &Session, args: &ScanArgs) -> tt_common::Result<()> {
    let cfg = session.analysis();
    let log = session.load(&args.input, &session.time_tag_format())?;
    let (herald, a, b) = session.roles(&args.roles);

    let windows_ns = if args.windows_ns.is_empty() {
        &cfg.coincidence.scan_windows_ns
    } else {
        &args.windows_ns
    };
    if windows_ns.iter().any(|ns| !ns.is_finite()) {
        return Err(Error::Config("scan windows must be finite".to_string()));
    }
    let windows: Vec<i64> = windows_ns
        .iter()
        .map(|ns| session.clock.ticks_from_ns(*ns))
        .collect();

    let label = args
        .label
        .clone()
        .unwrap_or_else(|| default_label(&args.input.paths));
    let started = Instant::now();

    let report = match &args.cache_dir {
        Some(dir) => {
            let key = ScanKey::new(label.as_str(), herald, a, b).with_timing(&log, session.clock);
            let cached = ScanCache::new(dir).scan(&key, &log, &windows)?;
            if cached.cache_hits > 0 {
                log_event!(
                    session.ctx,
                    INFO,
                    event_names::SCAN_CACHE_HIT,
                    Stage::Coincidence,
                    "Reused cached windows",
                    cache_hits = cached.cache_hits,
                    computed = cached.computed
                );
            }
            ScanReport::new(label, &cached.results, session.clock, Some(&cached))
        }
        None => {
            let results = scan_windows(&log, herald, a, b, &windows)?;
            ScanReport::new(label, &results, session.clock, None)
        }
    };

    log_event!(
        session.ctx,
        INFO,
        event_names::SCAN_FINISHED,
        Stage::Coincidence,
        "Window scan complete",
        windows = report.rows.len(),
        duration_ms = started.elapsed().as_millis() as u64
    );
    session.emit(&report)
}

fn default_label(paths: &[PathBuf]) -> String {
    paths
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string())
}

fn run_histogram(session: &Session, args: &HistogramArgs) -> tt_common::Result<()> {
    let cfg = &session.analysis().histogram;
    let log = session.load(&args.input, &session.time_tag_format())?;

    let pairs = if args.pairs.is_empty() {
        cfg.channel_pairs()
    } else {
        args.pairs.clone()
    };
    let max_delay = session
        .clock
        .ticks_from_ns(args.max_delay_ns.unwrap_or(cfg.max_delay_ns));
    let bin = session.clock.ticks_from_ns(args.bin_ns.unwrap_or(cfg.bin_ns));
    let params = HistogramParams::new(max_delay, bin)?.with_min_peak(cfg.fwhm_min_peak);

    let histograms = delay_histograms(&log, &pairs, params)?;
    log_event!(
        session.ctx,
        INFO,
        event_names::HISTOGRAM_BUILT,
        Stage::Histogram,
        "Built delay histograms",
        pairs = histograms.len(),
        bins = histograms.first().map(|h| h.counts.len()).unwrap_or(0)
    );

    session.emit(&HistogramReport::new(&histograms, session.clock))
}

fn run_bins(session: &Session, args: &BinsArgs) -> tt_common::Result<()> {
    let cfg = &session.analysis().binning;
    let format = if args.csv_channel {
        InputFormat::csv(args.channel)
    } else {
        session.time_tag_format()
    };
    let runs = session.load_runs(&args.input, &format, args.channel)?;

    // Dead time and bins both restart with every file
    let dead_time = args.dead_time.or(cfg.dead_time_ticks);
    let mut events_read = 0;
    let mut series = Vec::with_capacity(runs.len());
    for (_, log) in &runs {
        let raw = log.channel(args.channel)?;
        events_read += raw.len();
        series.push(match dead_time {
            Some(ticks) => dead_time_filter(raw, ticks)?,
            None => raw.clone(),
        });
    }

    let bin_s = args.bin_s.unwrap_or(cfg.bin_s);
    let per_run: Vec<_> = series.iter().collect();
    let stats = bin_statistics_per_run(&per_run, session.clock.ticks_from_seconds(bin_s))?;

    let model = match args.model {
        Some(m) => m,
        None => cfg.model.parse::<CountModel>().map_err(Error::Config)?,
    };
    let fit = MomentFitter.fit(&FitRequest::new(model, &stats))?;

    log_event!(
        session.ctx,
        INFO,
        event_names::BINNING_FINISHED,
        Stage::Binning,
        "Binned counts",
        files = runs.len(),
        bins = stats.n_bins(),
        mean = stats.mean,
        fano = stats.fano_factor
    );

    session.emit(&BinsReport::new(&stats, fit, session.clock, events_read, dead_time))
}

fn run_qrng(session: &Session, args: &QrngArgs) -> tt_common::Result<()> {
    let min_interval = args
        .min_interval
        .unwrap_or(session.analysis().qrng.min_interval_ticks);
    let format = if args.csv_channel {
        InputFormat::csv(args.channel)
    } else {
        session.time_tag_format()
    };

    // Each file is its own acquisition; intervals never span two files
    let mut sources = Vec::new();
    let mut bytes = Vec::new();
    for (path, log) in session.load_runs(&args.input, &format, args.channel)? {
        let output = extract_random_bytes(log.channel(args.channel)?, min_interval)?;
        bytes.extend_from_slice(&output.bytes);
        sources.push(QrngSource { path, output });
    }
    write_output_file(&args.out, &bytes)?;

    let report = QrngReport::new(args.out.clone(), sources);
    log_event!(
        session.ctx,
        INFO,
        event_names::QRNG_EXTRACTED,
        Stage::Qrng,
        "Extracted random bytes",
        bytes = report.total_bytes
    );
    session.emit(&report)
}

fn write_output_file(path: &Path, bytes: &[u8]) -> tt_common::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> ExitCode {
    let outcome = match &args.command {
        ConfigCommands::Show => run_config_show(global),
        ConfigCommands::Validate { path } => run_config_validate(global, path.as_deref()),
        ConfigCommands::Schema => {
            serde_json::to_string_pretty(&AnalysisConfig::json_schema())
                .map(|s| println!("{s}"))
                .map_err(Error::from)
        }
    };
    match outcome {
        Ok(()) => ExitCode::Clean,
        Err(e) => output_error(global, ctx, &e),
    }
}

fn run_config_show(global: &GlobalOpts) -> tt_common::Result<()> {
    let config = load_config(global.config.as_deref())?;
    let snapshot = config.snapshot();

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "source": snapshot,
                "config": &config.analysis,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Summary | OutputFormat::Csv => {
            match &snapshot.path {
                Some(path) => println!("config: {path} via {}", snapshot.source),
                None => println!("config: {}", snapshot.source),
            }
            println!("hash: {}", snapshot.short_id());
        }
        OutputFormat::Md => {
            println!("# tt-core config show");
            println!();
            match &config.path {
                Some(path) => println!("Source: {} ({})", path.display(), config.source),
                None => println!("Source: **built-in defaults** (no analysis.json found)"),
            }
            println!("Hash: {}", snapshot.hash);
            println!();
            println!("```json");
            println!("{}", serde_json::to_string_pretty(&config.analysis)?);
            println!("```");
        }
    }
    Ok(())
}

fn run_config_validate(global: &GlobalOpts, path: Option<&Path>) -> tt_common::Result<()> {
    let (analysis, shown) = match path {
        Some(p) => {
            let (analysis, _hash) = load_from_file(p)?;
            (analysis, p.display().to_string())
        }
        None => {
            let config = load_config(global.config.as_deref())?;
            let shown = config
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());
            (config.analysis, shown)
        }
    };
    validate_analysis(&analysis).map_err(|e| Error::Config(e.to_string()))?;

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "valid",
                "path": shown,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        _ => println!("{shown}: valid"),
    }
    Ok(())
}

// ============================================================================
// Shared output helpers
// ============================================================================

/// Report an error on stderr and pick the exit code for it.
fn output_error(global: &GlobalOpts, ctx: &LogContext, error: &Error) -> ExitCode {
    let exit_code = ExitCode::for_error(error);
    log_event!(
        ctx,
        WARN,
        event_names::ANALYSIS_FAILED,
        Stage::Report,
        "Command failed",
        code = error.code(),
        exit_code = exit_code.as_i32()
    );

    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(error);
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": &ctx.run_id,
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": structured,
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_else(|_| structured.to_json())
            );
        }
        _ => {
            use std::io::IsTerminal;
            eprintln!("{}", format_error_human(error, std::io::stderr().is_terminal()));
        }
    }

    exit_code
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "tt_core_version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": tt_config::CONFIG_SCHEMA_VERSION,
    });

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&version_info).unwrap_or_default()
            );
        }
        _ => {
            println!("tt-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}
