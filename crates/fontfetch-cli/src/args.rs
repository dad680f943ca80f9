use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use fontfetch_core::format::FormatLabel;
use fontfetch_core::select::StyleFilter;
use std::path::PathBuf;

/// Font package manager CLI
#[derive(Parser)]
#[command(name = "fontfetch")]
#[command(
    about = "Install, update, and manage fonts from GitHub releases and Google Fonts",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Reduce output to errors only
    #[arg(
        global = true,
        long,
        help = "Silence routine status output",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Show additional status output
    #[arg(
        global = true,
        long,
        help = "Show verbose status messages",
        conflicts_with = "quiet"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Requested font style subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum StyleArg {
    Roman,
    Italic,
    #[default]
    Both,
}

impl From<StyleArg> for StyleFilter {
    fn from(style: StyleArg) -> StyleFilter {
        match style {
            StyleArg::Roman => StyleFilter::Roman,
            StyleArg::Italic => StyleFilter::Italic,
            StyleArg::Both => StyleFilter::Both,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install fonts from GitHub releases or Google Fonts
    #[command(alias = "i")]
    Install {
        /// GitHub repository (owner/repo) or Google Font name
        #[arg(value_name = "REPO|FONT", num_args = 1.., required = true)]
        repos: Vec<String>,

        #[arg(short, long, default_value = "latest", help = "Release tag")]
        release: String,

        /// Comma-separated format preference order; defaults to the config
        #[arg(short, long, help = "Comma-separated list of font formats to prefer in order")]
        format: Option<String>,

        #[arg(
            short,
            long,
            help = "Install fonts into the current directory instead of the font library"
        )]
        local: bool,

        #[arg(long, help = "Force reinstall even if already installed")]
        force: bool,

        /// e.g. 400,700 or Regular,Bold
        #[arg(short, long, help = "Comma-separated list of font weights to install")]
        weights: Option<String>,

        #[arg(long, value_enum, default_value = "both", help = "Font style to install")]
        style: StyleArg,
    },

    /// Uninstall fonts recorded in the manifest
    #[command(alias = "u")]
    Uninstall {
        /// Repo keys to uninstall
        #[arg(value_name = "REPO|FONT", num_args = 1.., required = true)]
        repos: Vec<String>,

        #[arg(short, long, help = "Force deletion even if hashes don't match")]
        force: bool,
    },

    /// Update installed fonts to their latest versions
    Update {
        /// Repos to update; all installed repos when omitted
        #[arg(value_name = "REPO|FONT")]
        repos: Vec<String>,

        #[arg(short, long, help = "Display changelogs of updated releases")]
        changelog: bool,
    },

    /// Export the installed font library to a shareable file
    Export {
        #[arg(
            short,
            long,
            default_value = "fontfetch-fonts.json",
            value_hint = ValueHint::FilePath,
            help = "Output file path"
        )]
        output: PathBuf,

        #[arg(long, help = "Write to stdout instead of a file")]
        stdout: bool,
    },

    /// Import a font library from an exported file
    Import {
        #[arg(
            short,
            long,
            default_value = "fontfetch-fonts.json",
            value_hint = ValueHint::FilePath,
            help = "Path to the exported font library file"
        )]
        input: PathBuf,

        #[arg(long, help = "Force reinstall")]
        force: bool,

        #[arg(
            short,
            long,
            help = "Install fonts into the current directory instead of the font library"
        )]
        local: bool,
    },

    /// Check the manifest against the disk and fix inconsistencies
    Fix {
        #[arg(short, long, help = "Back up the manifest before fixing")]
        backup: bool,

        #[arg(short, long, help = "Confirm each fix individually")]
        granular: bool,

        #[arg(short = 'y', long, help = "Apply all fixes without prompting")]
        yes: bool,
    },

    /// Report whether a font file is variable or static
    IsVariable {
        #[arg(value_hint = ValueHint::FilePath, help = "Path to the font file to check")]
        font_path: PathBuf,
    },

    /// Get or set configuration values
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage the download cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Generate shell completions
    Completions {
        /// Target shell (bash, zsh, fish, powershell, elvish)
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print a configuration value
    Get {
        #[arg(help = "Config key: format, path, cache-size, or github_token")]
        key: String,
    },
    /// Set the default font format priorities
    Format {
        #[arg(help = "Comma-separated format tokens, in preference order")]
        value: String,
    },
    /// Set the font installation directory
    Path {
        #[arg(value_hint = ValueHint::DirPath, help = "Font installation directory")]
        value: String,
    },
    /// Set the download cache size limit in bytes (0 disables caching)
    CacheSize {
        #[arg(help = "Cache size in bytes")]
        value: String,
    },
    /// Store a GitHub API token for authenticated requests
    Token {
        #[arg(help = "GitHub API token")]
        value: String,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Delete every cached archive
    Purge,
}

/// Map clap error kinds to exit codes (0 for help/version, 1 for other errors)
pub fn exit_code_for_clap_error(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Resolve the `--format` override, validating its tokens.
pub fn resolve_priorities(
    format: Option<&str>,
    default: &[FormatLabel],
) -> fontfetch_core::FetchResult<Vec<FormatLabel>> {
    match format {
        Some(value) => fontfetch_core::format::parse_priorities(value),
        None => Ok(default.to_vec()),
    }
}
