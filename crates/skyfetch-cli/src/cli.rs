//! Command-line interface parsing for skyfetch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use skyfetch_weather::Mode;

/// Current weather for any city, cached per API key
#[derive(Parser, Debug)]
#[command(name = "skyfetch")]
#[command(about = "Current weather lookups backed by OpenWeatherMap")]
#[command(version)]
pub struct Cli {
    /// Read settings from this file instead of the user config directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API key to use (overrides config and SKYFETCH_API_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the current weather for one or more cities as JSON
    ///
    /// Examples:
    ///   skyfetch weather Moscow
    ///   skyfetch weather Paris Oslo --mode polling
    Weather {
        #[arg(required = true, value_name = "CITY")]
        cities: Vec<String>,

        /// Refresh strategy: on-demand or polling
        #[arg(long, value_name = "MODE")]
        mode: Option<Mode>,
    },

    /// Print the geocoding candidate for a city as JSON
    Geocode {
        #[arg(value_name = "CITY")]
        city: String,
    },
}
