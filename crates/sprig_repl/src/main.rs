use std::{fs, path::PathBuf, process};

use clap::Parser;
use log::info;

use sprig_interpreter::{Environment, EvaluatorConfig};

mod repl;

/// sprig is a small dynamically typed scripting language with closures,
/// arrays and hashes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script to run. Starts the interactive REPL when omitted.
    path: Option<PathBuf>,

    /// Maximum nesting of function calls before evaluation stops with an error.
    #[arg(long, default_value_t = EvaluatorConfig::default().max_call_depth)]
    max_depth: usize,

    /// Print each parsed statement before evaluating it.
    #[arg(long)]
    print_ast: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = EvaluatorConfig {
        max_call_depth: args.max_depth,
    };

    match args.path {
        Some(path) => {
            info!("running {}", path.display());
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("could not read {}: {}", path.display(), err);
                    process::exit(2);
                }
            };

            let env = Environment::new_shared();
            if !repl::run_script(&source, &env, config, args.print_ast) {
                process::exit(1);
            }
        }
        None => {
            if let Err(err) = repl::repl(config, args.print_ast) {
                eprintln!("Error: {:?}", err);
                process::exit(1);
            }
        }
    }
}
