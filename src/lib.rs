#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod macros;

pub mod cli;
pub mod emit;
pub mod errors;
pub mod profile;
pub mod registry;
pub mod stdlib;
pub mod synth;
pub mod term;
pub mod ty;
pub mod utils;
