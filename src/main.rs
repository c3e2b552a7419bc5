//! Entry point: initializes logging, parses arguments, and maps the result
//! of dispatch to an exit code per §6/§7.

use clap::FromArgMatches;

use workstack::cli::{build_command, Cli};

fn main() {
    let matches = build_command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let caller_dir = match &cli.directory {
        Some(dir) => dir.clone(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("❌ could not determine the current directory: {e}");
                std::process::exit(1);
            }
        },
    };

    if let Err(err) = workstack::cli::run(cli, &caller_dir) {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
