use std::{path::PathBuf, process};

use colored::Colorize;
use structopt::StructOpt;

use crate::synth::Sampler;

#[derive(Debug, StructOpt)]
pub struct KindsOptions {
    #[structopt(long, help = "Shows the weights of a saved profile")]
    pub profile: Option<PathBuf>,

    #[structopt(long, help = "Also lists the kinds that are never synthesized")]
    pub all: bool,
}

fn print_kinds(sampler: &Sampler, all: bool) {
    for (kind, weight) in sampler.weights() {
        if kind.is_supported() {
            println!("{:<24} {}", kind.name(), weight);
        } else if all {
            println!("{:<24} {}", kind.name().dimmed(), "unsupported".dimmed());
        }
    }
}

pub(super) fn action(options: KindsOptions) {
    match super::gen::configure(0, options.profile.as_ref()) {
        Ok((_, sampler)) => print_kinds(&sampler, options.all),
        Err(err) => {
            err.emit_to_stderr();
            log::error!("could not read the node kind weights");
            process::exit(1);
        }
    }
}
