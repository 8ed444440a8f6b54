use std::io;

use clap::Parser;
use lyx_cli::args::Arguments;

/// Parse sql statements and print their trees or routing facts.
fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(args.log_level, args.log_format.into(), io::stderr);

    let stdout = io::stdout();
    if let Err(err) = lyx_cli::run(&args, io::stdin().lock(), &mut stdout.lock()) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}
