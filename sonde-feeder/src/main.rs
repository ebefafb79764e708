//! sonde-feeder: Command-line driver for sonde-core.
//!
//! Reads demodulated M10 frames as hex lines from a file or stdin, decodes
//! each through the matching family decoder, and prints one line or JSON
//! record per frame, diagnostic dumps, or a per-sonde summary table.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sonde_core::config::{self, Config, OutputFormat};
use sonde_core::{
    DecodeOptions, SensorReadings, SondeDecoder, SondeError, SondeFamily, Telemetry,
};

mod capture;

use capture::FrameReader;

#[derive(Parser)]
#[command(
    name = "sonde-feeder",
    version,
    about = "M10 radiosonde frame decoder"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode hex frames from a file (or `-` for stdin)
    Decode {
        /// Path to file containing hex frames (one per line)
        file: PathBuf,

        /// Sonde family: auto, m10-gtop or m10-trimble
        #[arg(long)]
        family: Option<String>,

        /// Per-frame output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Print the diagnostic dump of every frame
        #[arg(short, long)]
        dump: bool,

        /// Print a per-sonde summary table instead of per-frame lines
        #[arg(short, long)]
        summary: bool,

        /// GPS-UTC leap seconds for GPS-time families
        #[arg(long, env = "SONDE_LEAP_SECONDS")]
        leap_seconds: Option<i64>,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            file,
            family,
            format,
            dump,
            summary,
            leap_seconds,
        } => {
            let mut config = config::load_config();
            apply_overrides(&mut config, family.as_deref(), format, dump, leap_seconds)
                .and_then(|()| cmd_decode(file, &config, summary))
        }
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(
    config: &mut Config,
    family: Option<&str>,
    format: Option<OutputFormat>,
    dump: bool,
    leap_seconds: Option<i64>,
) -> Result<(), SondeError> {
    if let Some(name) = family {
        config.decoder.family = parse_family(name)?;
    }
    if let Some(format) = format {
        config.output.format = format;
    }
    config.output.dump |= dump;
    if let Some(leap) = leap_seconds {
        config.decoder.leap_seconds = leap;
    }
    Ok(())
}

/// `auto` selects per-frame detection.
fn parse_family(name: &str) -> Result<Option<SondeFamily>, SondeError> {
    if name.trim().eq_ignore_ascii_case("auto") {
        Ok(None)
    } else {
        name.parse().map(Some)
    }
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FrameRecord<'a> {
    line: usize,
    family: SondeFamily,
    valid: bool,
    telemetry: &'a Telemetry,
    sensors: Option<SensorReadings>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Counts {
    read: u64,
    decoded: u64,
    valid: u64,
    skipped: u64,
}

fn cmd_decode(file: PathBuf, config: &Config, summary: bool) -> Result<(), SondeError> {
    let reader = FrameReader::open(&file)?;
    let options = DecodeOptions {
        leap_seconds: config.decoder.leap_seconds,
    };
    info!(
        file = %file.display(),
        family = config.decoder.family.map_or("auto", SondeFamily::name),
        leap_seconds = options.leap_seconds,
        "decoding"
    );

    let mut decoders: HashMap<SondeFamily, Box<dyn SondeDecoder + Send>> = HashMap::new();
    let mut sondes: HashMap<String, SondeSummary> = HashMap::new();
    let mut counts = Counts::default();

    for item in reader {
        let frame = match item {
            Ok(f) => f,
            Err(SondeError::Io(e)) => return Err(SondeError::Io(e)),
            Err(e) => {
                warn!("{e}");
                counts.skipped += 1;
                continue;
            }
        };
        counts.read += 1;

        let Some(family) = config
            .decoder
            .family
            .or_else(|| SondeFamily::detect(&frame.bytes))
        else {
            warn!(line = frame.line, "unknown frame type, skipping");
            counts.skipped += 1;
            continue;
        };

        let decoder = decoders
            .entry(family)
            .or_insert_with(|| family.decoder(options));
        let telemetry = match decoder.change_data(&frame.bytes) {
            Ok(t) => t,
            Err(e) => {
                warn!(line = frame.line, "{e}");
                counts.skipped += 1;
                continue;
            }
        };
        counts.decoded += 1;
        if telemetry.is_valid() {
            counts.valid += 1;
        }

        if !summary {
            let sensors = decoder.sensors();
            print_frame(frame.line, family, &telemetry, sensors, config.output.format)?;
        }
        if config.output.dump {
            print!("{}", decoder.dump());
        }

        if telemetry.serial_number().is_empty() {
            debug!(line = frame.line, "frame without serial number");
        } else {
            sondes
                .entry(telemetry.serial_number().to_string())
                .or_insert_with(|| SondeSummary::new(family))
                .update(&telemetry);
        }
    }

    if summary {
        print_summary(&sondes);
    }
    eprintln!(
        "Frames: {} read, {} decoded, {} valid, {} skipped, {} sondes",
        counts.read,
        counts.decoded,
        counts.valid,
        counts.skipped,
        sondes.len()
    );
    Ok(())
}

fn print_frame(
    line: usize,
    family: SondeFamily,
    telemetry: &Telemetry,
    sensors: Option<SensorReadings>,
    format: OutputFormat,
) -> Result<(), SondeError> {
    match format {
        OutputFormat::Text => println!("{}", telemetry.summary_line()),
        OutputFormat::Json => {
            let record = FrameRecord {
                line,
                family,
                valid: telemetry.is_valid(),
                telemetry,
                sensors,
            };
            let json = serde_json::to_string(&record)
                .map_err(|e| SondeError::Io(io::Error::other(e)))?;
            println!("{json}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

/// Per-serial accumulation over a capture. Only valid frames update the
/// last fix and the altitude peak.
struct SondeSummary {
    family: SondeFamily,
    frames: u32,
    valid: u32,
    last: Option<Arc<Telemetry>>,
    max_altitude: Option<f64>,
}

impl SondeSummary {
    fn new(family: SondeFamily) -> Self {
        SondeSummary {
            family,
            frames: 0,
            valid: 0,
            last: None,
            max_altitude: None,
        }
    }

    fn update(&mut self, telemetry: &Arc<Telemetry>) {
        self.frames += 1;
        if !telemetry.is_valid() {
            return;
        }
        self.valid += 1;
        if let Some(alt) = telemetry.altitude {
            self.max_altitude = Some(self.max_altitude.map_or(alt, |m| m.max(alt)));
        }
        self.last = Some(Arc::clone(telemetry));
    }
}

fn print_summary(sondes: &HashMap<String, SondeSummary>) {
    println!();
    if sondes.is_empty() {
        println!("No sondes decoded");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Serial", "Family", "Last fix (UTC)", "Lat", "Lon", "Alt (m)", "Max alt (m)",
        "vV (m/s)", "vH (m/s)", "Dir", "Frames", "Valid",
    ]);

    let mut sorted: Vec<_> = sondes.iter().collect();
    sorted.sort_by(|a, b| b.1.frames.cmp(&a.1.frames).then_with(|| a.0.cmp(b.0)));

    for (serial, s) in sorted {
        let last = s.last.as_deref();
        let fix = last
            .and_then(|t| Some((t.date?, t.time?)))
            .map(|(d, t)| {
                format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    d.year, d.month, d.day, t.hour, t.minute, t.second
                )
            })
            .unwrap_or("-".into());
        let velocity = last.and_then(|t| t.velocity);
        table.add_row(vec![
            Cell::new(serial),
            Cell::new(s.family),
            Cell::new(fix),
            Cell::new(
                last.and_then(|t| t.latitude)
                    .map(|v| format!("{v:.5}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                last.and_then(|t| t.longitude)
                    .map(|v| format!("{v:.5}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                last.and_then(|t| t.altitude)
                    .map(|a| format!("{a:.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                s.max_altitude
                    .map(|a| format!("{a:.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                velocity
                    .map(|v| format!("{:+.1}", v.vertical))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                velocity
                    .map(|v| format!("{:.1}", v.horizontal))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                velocity
                    .map(|v| format!("{:.0}", v.direction))
                    .unwrap_or("-".into()),
            ),
            Cell::new(s.frames),
            Cell::new(s.valid),
        ]);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config(init: bool) -> Result<(), SondeError> {
    if init {
        let path = config::save_config(&Config::default())?;
        eprintln!("Wrote {}", path.display());
    }
    let path = config::config_file();
    let config = config::load_config();
    println!("# {}", path.display());
    print!("{}", config::serialize_config(&config));
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sonde_core::checksum;
    use sonde_core::FRAME_TOTAL_LEN;

    fn sealed_frame(frame_type: u8) -> Vec<u8> {
        let mut frame = vec![0u8; FRAME_TOTAL_LEN];
        frame[0] = 0x64;
        frame[1] = frame_type;
        checksum::seal(&mut frame);
        frame
    }

    #[test]
    fn test_parse_family() {
        assert_eq!(parse_family("auto").unwrap(), None);
        assert_eq!(parse_family("AUTO").unwrap(), None);
        assert_eq!(parse_family("m10-gtop").unwrap(), Some(SondeFamily::M10Gtop));
        assert!(matches!(
            parse_family("dfm"),
            Err(SondeError::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.decoder.family = Some(SondeFamily::M10Gtop);
        apply_overrides(&mut config, None, None, false, None).unwrap();
        assert_eq!(config, {
            let mut c = Config::default();
            c.decoder.family = Some(SondeFamily::M10Gtop);
            c
        });

        apply_overrides(
            &mut config,
            Some("auto"),
            Some(OutputFormat::Json),
            true,
            Some(17),
        )
        .unwrap();
        assert_eq!(config.decoder.family, None);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.dump);
        assert_eq!(config.decoder.leap_seconds, 17);

        assert!(apply_overrides(&mut config, Some("rs92"), None, false, None).is_err());
    }

    #[test]
    fn test_summary_tracks_valid_frames_only() {
        let mut decoder = SondeFamily::M10Gtop.decoder(DecodeOptions::default());
        let mut summary = SondeSummary::new(SondeFamily::M10Gtop);

        // zeroed date: integrity ok, date out of range
        let t = decoder.change_data(&sealed_frame(0xAF)).unwrap();
        assert!(t.checksum_ok());
        summary.update(&t);
        assert_eq!((summary.frames, summary.valid), (1, 0));
        assert!(summary.last.is_none());
        assert!(summary.max_altitude.is_none());
    }

    #[test]
    fn test_json_record_shape() {
        let mut decoder = SondeFamily::M10Trimble.decoder(DecodeOptions::default());
        let t = decoder.change_data(&sealed_frame(0x9F)).unwrap();
        let record = FrameRecord {
            line: 7,
            family: SondeFamily::M10Trimble,
            valid: t.is_valid(),
            telemetry: &t,
            sensors: decoder.sensors(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["line"], 7);
        assert_eq!(value["family"], "m10-trimble");
        assert_eq!(value["valid"], true);
        assert_eq!(value["telemetry"]["altitude"], 0.0);
        assert_eq!(value["telemetry"]["date"]["year"], 1980);
        assert!(value["sensors"]["humidity"].is_null());
    }
}
