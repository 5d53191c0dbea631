// demos/dump_swaths.rs
//! Print every swath of an 83P log.
//!
//! ```text
//! cargo run --example dump_swaths -- <log dir> [config.json]
//! RUST_LOG=debug cargo run --example dump_swaths -- <log dir>
//! ```
use deltat_rs::*;
use log::info;
use std::env;
use std::process;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let dir = match args.next() {
        Some(dir) => dir,
        None => {
            eprintln!("usage: dump_swaths <log dir> [config.json]");
            process::exit(2);
        }
    };

    if let Err(e) = run(&dir, args.next()) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(dir: &str, config_path: Option<String>) -> Result<()> {
    let config = match config_path {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::default(),
    };

    let group = DirectoryLogGroup::new(dir);
    let mut parser = DeltaTParser::open(&group, NoNavigation, config)?;
    let info = *parser.bathymetry_info();
    info!("Opened {}", parser.source_path().display());

    println!(
        "box ({:.6}, {:.6}) - ({:.6}, {:.6}), depths [{:.2}, {:.2}], {} points",
        info.top_left_latitude,
        info.top_left_longitude,
        info.bottom_right_latitude,
        info.bottom_right_longitude,
        info.min_depth,
        info.max_depth,
        info.total_number_of_points
    );
    println!(
        "pings from {} to {}, intensity: {}",
        parser.first_timestamp(),
        parser.last_timestamp(),
        parser.has_intensity()
    );

    while let Some(swath) = parser.next_swath()? {
        let ping = parser.current_header().map(|h| h.ping_number).unwrap_or_default();
        println!(
            "{} ping {} at ({:.6}, {:.6}){}: {}/{} returns",
            swath.timestamp_ms,
            ping,
            swath.pose.latitude_deg,
            swath.pose.longitude_deg,
            if swath.pose.is_degraded() { " [sonar fix]" } else { "" },
            swath.point_count(),
            swath.num_beams
        );
    }
    Ok(())
}
