//! CLI front end for `rvasm`.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[clap(name = "rvasm", version = "0.1.0", about = "Assembles RV32I+M source into a text/data image pair")]
struct Opts {
    /// Assembly source file.
    input: PathBuf,

    /// Output path stem; produces `<stem>.text.hex` and `<stem>.data.hex`.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let opts = Opts::parse();

    let source = match fs::read_to_string(&opts.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("rvasm: failed to read {}: {}", opts.input.display(), err);
            exit(1);
        }
    };

    let (text_image, data_image) = match rvasm::assemble(&source) {
        Ok(images) => images,
        Err(err) => {
            eprintln!("rvasm: {}", err);
            exit(err.kind.exit_code());
        }
    };

    let stem = opts.output.unwrap_or_else(|| opts.input.with_extension(""));
    let text_path = with_suffix(&stem, "text.hex");
    let data_path = with_suffix(&stem, "data.hex");

    if let Err(err) = text_image.write_file(&text_path) {
        eprintln!("rvasm: failed to write {}: {}", text_path.display(), err);
        exit(1);
    }
    if let Err(err) = data_image.write_file(&data_path) {
        eprintln!("rvasm: failed to write {}: {}", data_path.display(), err);
        exit(1);
    }

    println!("assembled {} -> {}, {}", opts.input.display(), text_path.display(), data_path.display());
}

fn with_suffix(stem: &PathBuf, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
