use std::path::PathBuf;

use clap::{ArgAction, Parser};

pub const GUESSREQ_ABOUT: &str =
    "Guess pinned versions for a Python project's requirements from its git history \
     and PyPI release dates.";

#[derive(Parser, Debug)]
#[command(name = "guessreq", author, version, about = GUESSREQ_ABOUT)]
#[allow(clippy::struct_excessive_bools)]
pub struct GuessCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)"
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    pub trace: bool,
    #[arg(long, help = "Emit a {status,message,details} JSON envelope")]
    pub json: bool,
    #[arg(long, help = "Disable colored human output")]
    pub no_color: bool,
    #[arg(
        short = 'C',
        long = "project",
        value_name = "DIR",
        help = "Project root inside a git checkout (default: current directory)"
    )]
    pub project: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        default_value = "requirements.txt",
        help = "Requirements file to read, relative to the project root"
    )]
    pub requirements: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "requirements.txt",
        help = "Write the guessed requirements (bare flag: requirements.txt)"
    )]
    pub write: Option<PathBuf>,
    #[arg(
        long = "force-guess",
        alias = "force_guess",
        value_name = "NAMES",
        value_delimiter = ',',
        help = "Comma-separated names to guess even though they look like local modules"
    )]
    pub force_guess: Vec<String>,
    #[arg(
        long,
        alias = "keep_unused_packages",
        help = "Guess requirements-file packages that are never imported"
    )]
    pub keep_unused_packages: bool,
    #[arg(long, help = "Consider releases whose version contains letters")]
    pub include_prereleases: bool,
    #[arg(long, help = "Date packages by their most recent addition instead of the first")]
    pub latest_addition: bool,
    #[arg(long, help = "Download the name mapping files again before guessing")]
    pub refresh_mapping: bool,
    #[arg(
        short = 'y',
        long,
        help = "Accept the mapping download and requirements overwrite without asking"
    )]
    pub yes: bool,
}
