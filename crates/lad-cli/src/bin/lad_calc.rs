//! Landing-site geodesy calculator.
//!
//! Usage:
//!   lad-calc to-decimal 34 36 30
//!   lad-calc to-dms -34.608333
//!   lad-calc runway --threshold1 34:36:30 58:22:54 --threshold2 34:36:42 58:23:10
//!   lad-calc helipad --center 34:36:36 58:23:2 --trajectory1 34:37:0 58:23:2

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;

use lad_cli::report::format_dms;
use lad_cli::{helipad_report, parse_point, runway_report, DeclinationInput};
use lad_core::{codec, DeclinationModel, PointId};

/// Coordinate conversion, runway designators and helipad bearings
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert D M S (south/west) to signed decimal degrees
    ToDecimal {
        degrees: String,
        #[arg(default_value = "")]
        minutes: String,
        #[arg(default_value = "")]
        seconds: String,
    },
    /// Convert decimal degrees to D M S
    ToDms {
        #[arg(allow_negative_numbers = true)]
        decimal: f64,
    },
    /// Center, length and designator of a runway
    Runway {
        /// Threshold 1 as D:M:S latitude and longitude
        #[arg(long, num_args = 2, value_names = ["LAT", "LNG"], required = true)]
        threshold1: Vec<String>,

        /// Threshold 2 as D:M:S latitude and longitude
        #[arg(long, num_args = 2, value_names = ["LAT", "LNG"], required = true)]
        threshold2: Vec<String>,

        /// Declination in degrees (negative = west); estimated when omitted
        #[arg(long, allow_negative_numbers = true)]
        declination: Option<f64>,
    },
    /// Inbound magnetic bearings for a helipad
    Helipad {
        /// Helipad center as D:M:S latitude and longitude
        #[arg(long, num_args = 2, value_names = ["LAT", "LNG"], required = true)]
        center: Vec<String>,

        #[arg(long, num_args = 2, value_names = ["LAT", "LNG"], required = true)]
        trajectory1: Vec<String>,

        #[arg(long, num_args = 2, value_names = ["LAT", "LNG"])]
        trajectory2: Option<Vec<String>>,

        /// Declination in degrees (negative = west); estimated when omitted
        #[arg(long, allow_negative_numbers = true)]
        declination: Option<f64>,
    },
}

fn point(id: PointId, args: &[String]) -> Result<lad_core::GeoPoint> {
    match args {
        [lat, lng] => parse_point(id, lat, lng),
        _ => anyhow::bail!("{} needs a latitude and a longitude", id),
    }
}

fn declination_input(manual: Option<f64>) -> DeclinationInput {
    match manual {
        Some(degrees) => DeclinationInput::Manual(degrees),
        None => DeclinationInput::Estimate {
            model: DeclinationModel::default(),
            as_of: Utc::now(),
        },
    }
}

fn emit<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::ToDecimal {
            degrees,
            minutes,
            seconds,
        } => {
            let decimal = codec::to_decimal(&degrees, &minutes, &seconds);
            if args.json {
                println!("{}", serde_json::json!({ "decimal": decimal }));
            } else {
                println!("{:.6}", decimal);
            }
        }
        Command::ToDms { decimal } => {
            let dms = codec::to_dms(decimal);
            if args.json {
                println!("{}", serde_json::to_string(&dms)?);
            } else {
                println!("{}", format_dms(&dms, ' ').trim_end());
            }
        }
        Command::Runway {
            threshold1,
            threshold2,
            declination,
        } => {
            let report = runway_report(
                point(PointId::Threshold1, &threshold1)?,
                point(PointId::Threshold2, &threshold2)?,
                declination_input(declination),
            )?;
            emit(&report, args.json)?;
        }
        Command::Helipad {
            center,
            trajectory1,
            trajectory2,
            declination,
        } => {
            let trajectory2 = trajectory2
                .map(|coords| point(PointId::Trajectory2, &coords))
                .transpose()?;
            let report = helipad_report(
                point(PointId::Center, &center)?,
                point(PointId::Trajectory1, &trajectory1)?,
                trajectory2,
                declination_input(declination),
            )?;
            emit(&report, args.json)?;
        }
    }

    Ok(())
}
