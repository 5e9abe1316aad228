use colored::{Color, ColoredString, Colorize};
use log::Level;
use std::io;
use structopt::StructOpt;

mod gen;
mod kinds;

pub use gen::{EmitFormat, GenOptions, KindWeight};
pub use kinds::KindsOptions;

#[derive(Debug, StructOpt)]
#[structopt(name = "termsynth", about = "Synthesizes random, well-typed terms")]
pub struct Cli {
    #[structopt(
        long, env = "LOG_LEVEL",
        help = "Sets the log level",
        default_value = "info",
        possible_values = &["off", "error", "warn", "info", "debug", "trace"],
        global = true
    )]
    log_level: log::LevelFilter,

    #[structopt(
        long,
        env = "TERMSYNTH_SEED",
        help = "Seed for every random choice",
        long_help = "If not provided, a random seed is drawn and logged so the run can be repeated.",
        global = true
    )]
    seed: Option<u64>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(about = "Generates terms")]
    Gen(GenOptions),
    #[structopt(about = "Lists node kinds and their weights")]
    Kinds(KindsOptions),
}

fn setup_logging(level: log::LevelFilter) {
    let dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = record.level();
            let color = match level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                Level::Info => Color::Blue,
                Level::Debug => Color::Magenta,
                Level::Trace => Color::Green,
            };
            out.finish(format_args!(
                "{} {}",
                ColoredString::from((level.to_string().to_lowercase() + ":").as_str())
                    .color(color)
                    .to_string(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply();

    if let Err(err) = dispatch {
        eprintln!("{} {}", "logging error:".red(), err);
    }
}

pub fn run() {
    // get the subcommand
    let cli: Cli = Cli::from_args();
    setup_logging(cli.log_level);

    let seed = match cli.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            log::info!("using seed {}", seed);
            seed
        }
    };

    match cli.cmd {
        Command::Gen(options) => gen::action(options, seed),
        Command::Kinds(options) => kinds::action(options),
    }
}
