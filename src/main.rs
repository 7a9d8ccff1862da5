use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use bsim_pcapng::{Converter, ConverterConfig, InputMode, Linktype};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

/// Convert a Zephyr or BabbleSim log to a PCAPNG capture
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Read from bsim log format (with the 'd_XX: @HH:MM:SS.ssssss  ' prefix)
    #[arg(long)]
    bsim: bool,

    /// Text announcing a frame hex dump in a log message
    #[arg(long, default_value = "!HCI!", value_parser = NonEmptyStringValueParser::new())]
    frame_marker: String,

    /// Link type of the frames found in the log
    #[arg(long, default_value_t = 201, value_parser = clap::value_parser!(u16))]
    frame_linktype: u16,

    /// Input log file
    input: PathBuf,

    /// Output capture file (.pcapng)
    output: PathBuf,
}

impl Args {
    fn config(&self) -> ConverterConfig {
        let mode = if self.bsim {
            InputMode::Bsim
        } else {
            InputMode::Plain
        };
        ConverterConfig {
            frame_marker: self.frame_marker.clone(),
            frame_linktype: Linktype(i32::from(self.frame_linktype)),
            ..ConverterConfig::with_mode(mode)
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let converter = Converter::new(args.config());
    converter.config().validate()?;
    log::debug!("{:?}", converter.config());
    let input = BufReader::new(File::open(&args.input)?);
    let output = BufWriter::new(File::create(&args.output)?);
    let summary = converter.convert(input, output)?;
    log::info!(
        "{}: {} packets on {} interfaces",
        args.output.display(),
        summary.packets,
        summary.interfaces
    );
    if summary.dropped > 0 {
        log::warn!("{} records dropped", summary.dropped);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
