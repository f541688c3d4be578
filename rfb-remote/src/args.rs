//! Command-line argument parsing for front-ends of the client.
//!
//! This module is only available when the `cli` feature is enabled.
//! It provides a structured way to parse command-line arguments and
//! convert them into a `Config` object.
//!
//! # Examples
//!
//! ```no_run
//! use rfb_remote::args::Args;
//! use rfb_remote::Config;
//!
//! let args = Args::parse();
//! let config = Config::from_args(&args)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::Config;
use crate::errors::RfbClientError;
use clap::Parser;

/// Default VNC port used when neither the command line nor the config file names one.
pub const DEFAULT_PORT: u16 = 5900;

/// VNC client command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server IPv4 address (dotted quad, e.g. 192.168.1.100)
    #[arg(value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Server port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Password for VNC authentication
    #[arg(short = 'P', long, value_name = "PASSWORD", env = "VNC_PASSWORD")]
    pub password: Option<String>,

    /// View-only mode (no input events sent)
    #[arg(long)]
    pub view_only: bool,

    /// Configuration file path (TOML format)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Parse command-line arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse arguments from an iterator.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Log filter implied by `-v` flags.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl Config {
    /// Create a configuration from command-line arguments.
    ///
    /// If a config file is specified in the arguments, it will be loaded
    /// first, then overridden by explicit command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The configuration validation fails
    pub fn from_args(args: &Args) -> Result<Self, RfbClientError> {
        let mut config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(address) = &args.address {
            config.connection.host = Some(address.clone());
        }
        if let Some(port) = args.port {
            config.connection.port = Some(port);
        }
        if let Some(password) = &args.password {
            config.connection.password = Some(password.clone());
        }
        if args.view_only {
            config.input.view_only = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Address and port text to hand to `RfbClient::open`.
    ///
    /// # Errors
    ///
    /// [`RfbClientError::Config`] if no address was given anywhere.
    pub fn target_text(&self) -> Result<(String, String), RfbClientError> {
        let host = self.connection.host.clone().ok_or_else(|| {
            RfbClientError::Config("No server address given".to_string())
        })?;
        let port = self.connection.port.unwrap_or(DEFAULT_PORT);
        Ok((host, port.to_string()))
    }
}
