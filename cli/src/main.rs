use abccas_core::{
    CassetteEncoder, CassetteError, CassetteName, ContainerKind, EncoderConfig, FileKind, DEFAULT_BAUD,
    DEFAULT_BITS, DEFAULT_SAMPLE_RATE,
};
use clap::Parser;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Longest path accepted for input and output files
const MAX_PATH_LEN: usize = 4096;

#[derive(Parser, Debug)]
#[command(name = "abccas")]
#[command(about = "Encode a file as ABC80/ABC800 cassette audio, loadable with LOAD CAS:")]
struct Cli {
    /// Input file (.bas, .bac or other); reads stdin when absent
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Convert \n to \r (implied for .bas and unknown extensions)
    #[arg(short, long)]
    konvert: bool,

    /// Baud rate, 700 or 2400
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Requested sample rate in Hz (at least 1400), adjusted to fit the baud rate
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
    rate: u32,

    /// Audio format: wav, au or raw; guessed from the output extension when omitted
    #[arg(short, long, value_parser = ContainerKind::from_name)]
    format: Option<ContainerKind>,

    /// Bits per sample: 8, 16, 24 or 32
    #[arg(short = 'w', long, default_value_t = DEFAULT_BITS)]
    bits: u16,

    /// Output audio file; writes stdout when absent
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Cassette name to store instead of the one derived from the input file
    #[arg(short, long, value_name = "NAME[.EXT]")]
    name: Option<String>,

    /// Stream the input even for WAV (header gets an unknown length)
    #[arg(long)]
    stream: bool,

    /// Print the transmission plan as JSON instead of encoding
    #[arg(long)]
    plan: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Encode(#[from] CassetteError),

    #[error("unable to open file {} ({source})", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("unable to create file {} ({source})", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("unable to read input ({0})")]
    Read(io::Error),

    #[error("failed to write plan: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PlanReport {
    name: String,
    format: &'static str,
    baud: u32,
    requested_rate: u32,
    sample_rate: u32,
    half_bit_samples: u32,
    bits_per_sample: u16,
    line_conversion: bool,
    input_bytes: usize,
    data_blocks: usize,
    total_blocks: usize,
    frames: u64,
    data_bytes: u64,
    file_bytes: u64,
    length_declared: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("abccas: {}", e);
            if matches!(&e, CliError::Encode(err) if err.is_config()) {
                eprintln!("Try 'abccas --help' for more information.");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn check_path_len(path: &Path) -> Result<(), CassetteError> {
    if path.as_os_str().len() >= MAX_PATH_LEN {
        return Err(CassetteError::InvalidConfig(format!(
            "filename too long (max={})",
            MAX_PATH_LEN
        )));
    }
    Ok(())
}

/// Pick the container: explicit flag, then output extension, then WAV.
fn resolve_format(format: Option<ContainerKind>, output: Option<&Path>) -> ContainerKind {
    if let Some(format) = format {
        return format;
    }
    let ext = output
        .and_then(|p| p.extension())
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("au") => ContainerKind::Au,
        Some("raw") => ContainerKind::Raw,
        _ => ContainerKind::Wav,
    }
}

fn resolve_name(explicit: Option<&str>, input: Option<&Path>) -> CassetteName {
    match (explicit, input) {
        (Some(name), _) => {
            let (stem, ext) = name.split_once('.').unwrap_or((name, "BAC"));
            CassetteName::new(stem, ext)
        }
        (None, Some(path)) => CassetteName::from_path(path),
        (None, None) => CassetteName::stdin(),
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    // Validate everything before any file is touched
    for path in cli.input.iter().chain(cli.output.iter()) {
        check_path_len(path)?;
    }

    let container = resolve_format(cli.format, cli.output.as_deref());
    let kind = cli.input.as_deref().map(FileKind::from_path);
    let convert = cli.konvert || kind.is_some_and(FileKind::converts_lines);

    let config = EncoderConfig::new(cli.baud, cli.rate, cli.bits, container)?
        .with_line_conversion(convert)
        .with_streaming(cli.stream);
    let encoder = CassetteEncoder::new(config)?;
    let name = resolve_name(cli.name.as_deref(), cli.input.as_deref());

    info!(
        "input={} output={} name={} format={}",
        cli.input.as_deref().map_or("*stdin*".into(), |p| p.display().to_string()),
        cli.output.as_deref().map_or("*stdout*".into(), |p| p.display().to_string()),
        name,
        container.name()
    );

    let input: Box<dyn Read> = match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Open {
                path: path.clone(),
                source,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    if cli.plan {
        return print_plan(&encoder, &name, input);
    }

    let output: Box<dyn Write> = match &cli.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Create {
                path: path.clone(),
                source,
            })?;
            Box::new(file)
        }
        None => Box::new(io::stdout().lock()),
    };

    let summary = encoder.encode(&name, input, BufWriter::new(output))?;
    debug!("{:?}", summary);
    info!(
        "wrote {} bytes ({} data blocks, {} Hz)",
        summary.bytes_written,
        summary.data_blocks,
        encoder.timing().sample_rate()
    );
    Ok(())
}

fn print_plan(encoder: &CassetteEncoder, name: &CassetteName, mut input: Box<dyn Read>) -> Result<(), CliError> {
    let mut data = Vec::new();
    input.read_to_end(&mut data).map_err(CliError::Read)?;

    let config = encoder.config();
    if config.convert_lines {
        data = abccas_core::lines::convert_line_endings(&data);
    }
    let plan = encoder.plan(data.len());
    let timing = encoder.timing();

    let report = PlanReport {
        name: name.to_string(),
        format: config.container.name(),
        baud: timing.baud().bits_per_second(),
        requested_rate: config.sample_rate,
        sample_rate: timing.sample_rate(),
        half_bit_samples: timing.half_bit_samples(),
        bits_per_sample: config.width.bits(),
        line_conversion: config.convert_lines,
        input_bytes: plan.input_bytes,
        data_blocks: plan.data_blocks,
        total_blocks: plan.total_blocks,
        frames: plan.frames,
        data_bytes: plan.data_bytes,
        file_bytes: plan.file_bytes,
        length_declared: config.buffered(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out).map_err(CassetteError::from)?;
    Ok(())
}
