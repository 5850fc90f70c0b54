use clap::Parser;
use log::debug;
use mtpost::{logging, Cli, Config, Session};
use std::io;
use std::process;

/// mtpost - post to Movable Type compatible blogs from the command line
fn main() {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();
    logging::init(verbosity);

    if let Err(err) = run(&cli) {
        if verbosity > 1 {
            eprintln!("Error ({:?}): {:?}", err.kind(), err);
        } else {
            eprintln!("Error: {}", err);
        }
        process::exit(1);
    }
}

fn run(cli: &Cli) -> mtpost::Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    debug!("Loading configuration from {}", path.display());
    let config = Config::load(&path)?;

    let profile = config.profile(cli.alias.as_deref(), cli.command.site())?;
    debug!(
        "Using site \"{}\" (blog alias {:?})",
        profile.site(),
        profile.alias()
    );

    let mut session = Session::connect(&profile, cli.proxy_spec().as_deref())?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    session.run(&cli.command, &mut stdin.lock(), &mut stdout.lock())
}
