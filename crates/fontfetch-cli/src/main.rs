//! fontfetch - install, update, and manage fonts from GitHub releases and
//! Google Fonts.

mod args;
mod ops;

use clap::Parser;

fn main() {
    let cli = match args::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(args::exit_code_for_clap_error(e.kind()));
        }
    };

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = ops::run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
