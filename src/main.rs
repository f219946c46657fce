use ambilight_stream::cli::{self, Args, Command};
use clap::Parser;

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    let config_path = args.config.as_deref();
    let result = match args.command {
        Command::Run { port } => cli::run(config_path, port),
        Command::ListPorts => cli::list_ports(),
        Command::Config { action } => cli::handle_config_action(action, config_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
