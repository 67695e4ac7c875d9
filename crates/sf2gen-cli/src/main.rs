//! sf2gen - build a minimal SF2 SoundFont from a single audio sample.
//!
//! The font exposes the sample twice: preset 0 plays it one-shot, preset 1
//! loops it between the selected loop points.

mod cli_args;

use clap::Parser;
use std::process::ExitCode;

use cli_args::Cli;
use sf2gen_cli::commands::generate::{self, GenerateRequest};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let request = GenerateRequest {
        input: cli.input,
        output: cli.output,
        root_key: cli.root_key,
        chorus_percent: cli.chorus,
        reverb_percent: cli.reverb,
        name: cli.name,
        detect_pitch: cli.detect_pitch,
        loop_start: cli.loop_start,
        loop_end: cli.loop_end,
        sample_rate: cli.sample_rate,
        crossfade: cli.crossfade,
        verify: cli.verify,
    };

    match generate::run(&request) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
