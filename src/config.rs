use std::path::PathBuf;

use clap::Parser;

use crate::credentials::{Credentials, Password, PhoneNumber};

pub const DEFAULT_DOMAIN: &str = "www.lycamobile.fr";

/// Shows the balance, remaining data and expiration dates of a Lycamobile account.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Opts {
    /// Phone number, format 33000000000
    #[arg(short = 'n', long)]
    pub phone: PhoneNumber,
    /// Password
    #[arg(short, long)]
    pub password: Password,
    /// Track internet traffic consumption between checks and show delta
    #[arg(short, long = "trackInternet", visible_alias = "track-internet")]
    pub track_internet: bool,
    /// Domain of the carrier's site
    #[arg(short, long, default_value = DEFAULT_DOMAIN)]
    pub domain: String,
    /// Max number of attempts to retrieve the account page
    #[arg(
        short = 'r',
        long = "maxRetries",
        visible_alias = "max-retries",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub max_retries: u32,
    /// Directory of the tracking data [default: the system temp directory]
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Save the fetched account page to this file
    #[arg(long)]
    pub save_html: Option<PathBuf>,
}

impl Opts {
    pub fn credentials(&self) -> Credentials {
        Credentials::builder()
            .phone(self.phone.clone())
            .password(self.password.clone())
            .build()
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            max_retries: self.max_retries,
            track_internet: self.track_internet,
            save_html: self.save_html.clone(),
        }
    }
}

/// Process exit status for a command line that could not be parsed.
/// Help and version requests exit cleanly; every other error is fatal.
pub fn exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() {
        1
    } else {
        0
    }
}

/// Per-run knobs of the pipeline, independent of where they came from.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub max_retries: u32,
    pub track_internet: bool,
    pub save_html: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            track_internet: false,
            save_html: None,
        }
    }
}
