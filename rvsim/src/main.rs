//! CLI front end for `rvsim`.

use clap::Parser;
use std::path::PathBuf;
use std::process::exit;

use rv32core::image::{DataImage, TextImage};
use rvsim::{SimConfig, Simulator};

#[derive(Parser)]
#[clap(name = "rvsim", version = "0.1.0", about = "Cycle-accurate five-stage pipelined simulator for rv32core images")]
struct Opts {
    /// Text image produced by `rvasm` (instructions).
    text: PathBuf,

    /// Data image produced by `rvasm` (initial data segment contents).
    data: PathBuf,

    /// Disables pipelining; runs one instruction to completion per step.
    #[clap(long)]
    no_pipelining: bool,

    /// Disables operand forwarding (every in-flight producer stalls).
    #[clap(long)]
    no_forwarding: bool,

    /// Cycle guard cap before a soft termination.
    #[clap(long, default_value_t = rvsim::config::DEFAULT_CYCLE_CAP)]
    cycle_cap: u64,

    /// Prints the register file after every cycle.
    #[clap(long)]
    dump_registers: bool,

    /// Prints the pipeline latches after every cycle.
    #[clap(long)]
    dump_latches: bool,

    /// Prints the branch-target buffer once the run ends.
    #[clap(long)]
    dump_btb: bool,

    /// Restricts the trace facility to a single instruction number.
    #[clap(long)]
    trace: Option<u64>,
}

fn main() {
    let opts = Opts::parse();

    let text = match TextImage::read_file(&opts.text) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("rvsim: failed to read {}: {}", opts.text.display(), err);
            exit(1);
        }
    };
    let data = match DataImage::read_file(&opts.data) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("rvsim: failed to read {}: {}", opts.data.display(), err);
            exit(1);
        }
    };

    let config = SimConfig {
        pipelining: !opts.no_pipelining,
        forwarding: !opts.no_forwarding,
        cycle_cap: opts.cycle_cap,
        dump_registers: opts.dump_registers,
        dump_latches: opts.dump_latches,
        dump_btb: opts.dump_btb,
        trace_instruction: opts.trace,
    };

    let mut sim = Simulator::new(text, data, config);
    sim.run();

    if config.dump_btb {
        sim.dump_btb();
    }

    println!("{}", sim.stats());

    let final_data = sim.into_data_image();
    if let Err(err) = final_data.write_file(&opts.data) {
        eprintln!("rvsim: failed to write {}: {}", opts.data.display(), err);
        exit(1);
    }
}
