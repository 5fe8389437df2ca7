use clap::Parser;
use log::{error, info, warn};
use pointillism::{
    args::{CommandTask, PointArgs, StreamCommand, SynthCommand},
    config::AnalysisConfig,
    emitter::OscTransport,
    error::PointError,
    ingest::load_b_format,
    pacer::CancelToken,
    pipeline::Pipeline,
    synth::{render, write_wav, PlaneWave},
};
use std::{io, process::ExitCode, thread};

// Example:
// cargo run --bin pointillism -- synth -o ambitest.wav --azimuth 45
// cargo run --bin pointillism -- stream -f ambitest.wav --ip 127.0.0.1 -p 7000
// cargo run --bin monitor

fn main() -> ExitCode {
    env_logger::init();
    let args = PointArgs::parse();

    let res = match args.command {
        CommandTask::Stream(cmd) => stream(&cmd),
        CommandTask::Synth(cmd) => synth(&cmd),
        CommandTask::Config => print_default_config(),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn stream(cmd: &StreamCommand) -> Result<(), PointError> {
    let config = cmd.resolve_config()?;
    let transport = OscTransport::connect(&cmd.ip, cmd.port)?;
    info!("sending osc messages to {}", transport.destination());

    let buffer = load_b_format(&cmd.file)?;
    info!(
        "loaded '{}': {:.2}s at {}Hz",
        cmd.file.display(),
        buffer.duration_secs(),
        buffer.sample_rate()
    );

    let cancel = CancelToken::new();
    watch_stdin(cancel.clone());

    let mut pipeline = Pipeline::new(config, transport)?.with_cancel_token(cancel);
    info!(
        "up to {} points per frame, {}ms between frames{}",
        pipeline.config().num_points,
        pipeline.config().frame_delay_ms,
        if pipeline.config().threaded { ", threaded" } else { "" }
    );
    let summary = pipeline.run(buffer);
    if summary.send_failures > 0 {
        warn!("{} points could not be sent", summary.send_failures);
    }
    Ok(())
}

/// Cancels the run when a line starting with `q` arrives on stdin. The
/// thread is detached; it dies with the process.
fn watch_stdin(cancel: CancelToken) {
    thread::spawn(move || {
        let mut line = String::new();
        while io::stdin().read_line(&mut line).is_ok_and(|n| n > 0) {
            if line.trim_start().starts_with('q') {
                info!("stopping at the next frame");
                cancel.cancel();
                return;
            }
            line.clear();
        }
    });
}

fn synth(cmd: &SynthCommand) -> Result<(), PointError> {
    let wave = PlaneWave::from_degrees(cmd.azimuth, cmd.elevation, cmd.freq, 0.5);
    let len = (cmd.seconds.max(0.0) * cmd.sample_rate as f64) as usize;

    let buffer = render(&[wave], cmd.sample_rate, len, cmd.noise)?;
    write_wav(&buffer, &cmd.outfile)?;

    let [x, y, z] = wave.direction();
    info!(
        "wrote {} samples to '{}', source at ({:.2}, {:.2}, {:.2})",
        len,
        cmd.outfile.display(),
        x,
        y,
        z
    );
    Ok(())
}

fn print_default_config() -> Result<(), PointError> {
    println!("{}", AnalysisConfig::default().to_ron_pretty()?);
    Ok(())
}
