mod gui;

use std::net::UdpSocket;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use pointillism::{args::MonitorArgs, receiver::PointTable};

use gui::engage_gui;

// Example:
// cargo run --bin monitor -- --port 7000 --max-points 50

fn main() -> ExitCode {
    env_logger::init();
    let args = MonitorArgs::parse();

    let socket = match UdpSocket::bind(("0.0.0.0", args.port)) {
        Ok(socket) => socket,
        Err(e) => {
            error!("could not listen on port {}: {}", args.port, e);
            return ExitCode::FAILURE;
        }
    };
    info!("listening for osc messages on port {}", args.port);

    if let Err(e) = engage_gui(socket, PointTable::new(args.max_points)) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
