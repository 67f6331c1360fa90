//! # RevPi HAL Binary
//!
//! Command-line access to Revolution Pi I/O through piControl.
//!
//! # Usage
//!
//! ```bash
//! # List enumerated modules
//! revpi_hal devices
//!
//! # Drive an output, then read it back
//! revpi_hal gpio O_1 --set on
//! revpi_hal read O_1
//!
//! # PWM duty cycle and frequency
//! revpi_hal pwm O_3 --duty 0.25 --freq
//!
//! # JSON output with a config file
//! revpi_hal --config /etc/revpi/revpi.toml --json analog InputValue_1
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use revpi_common::capability::{Analog, DigitalInterrupt, Encoder, Gpio, PositionType};
use revpi_common::config::{ComponentConfig, ConfigLoader};
use revpi_hal::Chip;
use serde_json::json;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// RevPi HAL - Revolution Pi process-image access
#[derive(Parser, Debug)]
#[command(name = "revpi_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Read and drive Revolution Pi I/O through piControl")]
#[command(long_about = None)]
struct Args {
    /// Path to a component configuration file (revpi.toml).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Control device, overrides `device_path` from the config.
    #[arg(short, long, value_name = "PATH")]
    device: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs and results in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List enumerated DIO/AIO modules and anomalies
    Devices,
    /// Read any variable fresh
    Read {
        /// Variable name
        name: String,
    },
    /// Read or drive a digital pin
    Gpio {
        /// Variable name
        name: String,
        /// Drive the output
        #[arg(long, value_enum)]
        set: Option<PinLevel>,
    },
    /// Read or set a PWM duty cycle
    Pwm {
        /// Variable name
        name: String,
        /// New duty cycle in [0, 1]
        #[arg(long)]
        duty: Option<f64>,
        /// Also report the PWM frequency
        #[arg(long)]
        freq: bool,
    },
    /// Read an analog input or write an analog output
    Analog {
        /// Variable name
        name: String,
        /// Value to write (mV or uA)
        #[arg(long, allow_hyphen_values = true)]
        write: Option<i32>,
    },
    /// Read a counter
    Counter {
        /// Variable name
        name: String,
    },
    /// Read an encoder position
    Encoder {
        /// Variable name
        name: String,
        /// Zero the encoder before reading
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PinLevel {
    On,
    Off,
}

fn main() {
    if let Err(e) = run() {
        error!("revpi_hal failed: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ComponentConfig::load(path)?,
        None => ComponentConfig::default(),
    };
    if let Some(device) = &args.device {
        config.device_path = device.clone();
    }
    config.validate()?;

    setup_tracing(&args, &config);
    info!("RevPi HAL v{} on {}", env!("CARGO_PKG_VERSION"), config.device_path.display());

    let chip = Chip::open(&config.device_path)?;
    execute(&args, &chip)?;
    chip.close()?;
    Ok(())
}

fn execute(args: &Args, chip: &Chip) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        Command::Devices => {
            let dir = chip.directory();
            let anomalies: Vec<String> = dir.anomalies().iter().map(ToString::to_string).collect();
            if args.json {
                emit_json(json!({
                    "dio": dir.dio_devices(),
                    "aio": dir.aio_devices(),
                    "anomalies": anomalies,
                }));
            } else {
                for dev in dir.dio_devices().iter().chain(dir.aio_devices()) {
                    println!(
                        "slot {:>2}  addr {:>3}  {:<10} in {:>4} (+{})  out {:>4} (+{})  sn {}",
                        dev.slot,
                        dev.module_address,
                        dev.module_name,
                        dev.input_offset,
                        dev.input_length,
                        dev.output_offset,
                        dev.output_length,
                        dev.serial_number
                    );
                }
                for anomaly in &anomalies {
                    println!("warning: {anomaly}");
                }
            }
        }
        Command::Read { name } => {
            let value = chip.read_variable(name)?;
            if args.json {
                emit_json(json!({ name.as_str(): value }));
            } else {
                println!("{name} = {}", serde_json::to_string(&value)?);
            }
        }
        Command::Gpio { name, set } => {
            let pin = chip.gpio_pin(name)?;
            if let Some(level) = set {
                pin.set(matches!(level, PinLevel::On))?;
            }
            let high = pin.get()?;
            if args.json {
                emit_json(json!({ "name": name, "high": high }));
            } else {
                println!("{name} = {}", if high { "on" } else { "off" });
            }
        }
        Command::Pwm { name, duty, freq } => {
            let pin = chip.gpio_pin(name)?;
            if let Some(duty) = duty {
                pin.set_pwm(*duty)?;
            }
            let duty = pin.pwm()?;
            let freq_hz = if *freq { Some(pin.pwm_freq()?) } else { None };
            if args.json {
                emit_json(json!({ "name": name, "duty_cycle": duty, "frequency_hz": freq_hz }));
            } else {
                match freq_hz {
                    Some(hz) => println!("{name} duty {:.2} @ {hz} Hz", duty),
                    None => println!("{name} duty {:.2}", duty),
                }
            }
        }
        Command::Analog { name, write } => {
            let pin = chip.analog_pin(name)?;
            match write {
                Some(value) => {
                    pin.write(*value)?;
                    if args.json {
                        emit_json(json!({ "name": name, "written": value }));
                    } else {
                        println!("{name} <- {value}");
                    }
                }
                None => {
                    let sample = pin.read()?;
                    if args.json {
                        emit_json(json!({ "name": name, "sample": sample }));
                    } else {
                        println!(
                            "{name} = {} (range {} to {}, step {})",
                            sample.value, sample.min, sample.max, sample.step_size
                        );
                    }
                }
            }
        }
        Command::Counter { name } => {
            let pin = chip.digital_interrupt(name)?;
            let value = pin.value()?;
            if args.json {
                emit_json(json!({ "name": name, "value": value }));
            } else {
                println!("{name} = {value}");
            }
        }
        Command::Encoder { name, reset } => {
            let mut encoder = chip.encoder(name)?;
            if *reset {
                encoder.reset_position()?;
            }
            let (position, unit) = encoder.position(PositionType::Unspecified)?;
            if args.json {
                emit_json(json!({ "name": name, "position": position, "unit": unit }));
            } else {
                println!("{name} = {position} {unit:?}");
            }
        }
    }
    Ok(())
}

fn emit_json(value: serde_json::Value) {
    println!("{value}");
}

/// Setup tracing subscriber based on CLI arguments and config.
fn setup_tracing(args: &Args, config: &ComponentConfig) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.shared.log_level.as_tracing()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
