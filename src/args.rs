// Commandline argument parser using clap for Pointillism

use crate::config::{AnalysisConfig, ConfigError};
use crate::emitter::{DEFAULT_HOST, DEFAULT_PORT};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Analyze a first-order Ambisonic recording and stream source directions
/// as OSC
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct PointArgs {
    #[command(subcommand)]
    /// Which task to perform
    pub command: CommandTask,
}

/// The tasks the `pointillism` binary can perform.
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Analyze a B-format file and send the loudest directions as OSC
    #[command(about)]
    Stream(StreamCommand),

    /// Write a synthetic B-format test recording
    #[command(about)]
    Synth(SynthCommand),

    /// Print the default analysis configuration as RON
    #[command(about)]
    Config,
}

/// Options of `pointillism stream`.
#[derive(Debug, Args, Clone)]
pub struct StreamCommand {
    /// Path to the ambisonic file (.wav or .amb)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Host to send OSC to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub ip: String,

    /// Port to send OSC to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of points sent per frame [default: 50]
    #[arg(short = 'n', long)]
    pub points: Option<usize>,

    /// RON file with analysis settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pause after each frame, in milliseconds [default: 50]
    #[arg(long = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Analyze frames on a worker thread
    #[arg(long)]
    pub threaded: bool,
}

impl StreamCommand {
    /// Loads the configuration file, if any, applies the command line
    /// overrides on top of it and validates the result.
    pub fn resolve_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_path(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(points) = self.points {
            config.num_points = points;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.frame_delay_ms = delay_ms;
        }
        config.threaded |= self.threaded;

        config.validate()?;
        Ok(config)
    }
}

/// Options of `pointillism synth`.
#[derive(Debug, Args, Clone)]
pub struct SynthCommand {
    /// Filename for the synthetic recording to be written to
    #[arg(short = 'o', long = "out")]
    pub outfile: PathBuf,

    /// Source azimuth in degrees, counter-clockwise from the front
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub azimuth: f64,

    /// Source elevation in degrees, positive is up
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub elevation: f64,

    /// Tone frequency in Hz
    #[arg(short, long, default_value_t = 1000.0)]
    pub freq: f64,

    /// Length of the recording in seconds
    #[arg(short = 't', long, default_value_t = 5.0)]
    pub seconds: f64,

    /// Sample rate in Hz
    #[arg(short, long = "sample-rate", default_value_t = 48000)]
    pub sample_rate: u32,

    /// Peak amplitude of uniform noise added to every channel
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,
}

/// Options of the `monitor` binary.
#[derive(Debug, Parser, Clone)]
#[clap(version, about = "Watch streamed points in the terminal")]
pub struct MonitorArgs {
    /// Port to listen for OSC on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Number of point slots to track
    #[arg(short = 'n', long = "max-points", default_value_t = 50)]
    pub max_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stream(argv: &[&str]) -> StreamCommand {
        let args = PointArgs::try_parse_from(argv).unwrap();
        match args.command {
            CommandTask::Stream(cmd) => cmd,
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn stream_defaults() {
        let cmd = stream(&["pointillism", "stream", "--file", "ambitest.wav"]);

        assert_eq!(cmd.file, PathBuf::from("ambitest.wav"));
        assert_eq!(cmd.ip, "127.0.0.1");
        assert_eq!(cmd.port, 7000);
        assert_eq!(cmd.resolve_config().unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn file_is_required() {
        assert!(PointArgs::try_parse_from(["pointillism", "stream"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(num_points: 5, frame_delay_ms: 10, hop_size: 256)").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cmd = stream(&[
            "pointillism", "stream", "-f", "x.amb", "--ip", "10.0.0.2", "-p", "9000",
            "--points", "12", "--config", path.as_str(), "--threaded",
        ]);
        let config = cmd.resolve_config().unwrap();

        assert_eq!(cmd.ip, "10.0.0.2");
        assert_eq!(cmd.port, 9000);
        assert_eq!(config.num_points, 12);
        assert_eq!(config.frame_delay_ms, 10);
        assert_eq!(config.hop_size, 256);
        assert!(config.threaded);
    }

    #[test]
    fn zero_points_is_rejected() {
        let cmd = stream(&["pointillism", "stream", "-f", "x.wav", "-n", "0"]);
        assert!(cmd.resolve_config().is_err());
    }

    #[test]
    fn synth_accepts_negative_angles() {
        let args = PointArgs::try_parse_from([
            "pointillism", "synth", "-o", "t.wav", "--azimuth", "-90", "--elevation", "-30",
        ])
        .unwrap();
        match args.command {
            CommandTask::Synth(cmd) => {
                assert_eq!(cmd.azimuth, -90.0);
                assert_eq!(cmd.elevation, -30.0);
                assert_eq!(cmd.sample_rate, 48000);
            }
            other => panic!("expected synth, got {:?}", other),
        }
    }

    #[test]
    fn monitor_defaults() {
        let args = MonitorArgs::try_parse_from(["monitor"]).unwrap();
        assert_eq!(args.port, 7000);
        assert_eq!(args.max_points, 50);
    }
}
