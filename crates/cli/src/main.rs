//! AccelBench CLI entry point.

use colored::Colorize;

fn main() {
    if let Err(e) = accelbench_cli::run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
