use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Error};
use clap::Parser;

use lumber::{
    layouts::TextLayout,
    reader::{self, BinaryReader},
};

/// Converts a binary log into text
#[derive(Parser, Debug)]
#[clap(version)]
struct Cli {
    /// Binary log to read, `.zst` archives included [default: stdin]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Text file to write [default: stdout]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn convert(args: &Cli) -> Result<(), Error> {
    let input: Box<dyn Read> = match &args.input {
        Some(path) => reader::open_input(path)
            .with_context(|| format!("Failed to open input '{}'", path.display()))?,
        None => Box::new(io::stdin().lock()),
    };

    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output '{}'", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let layout = TextLayout::default();
    for (index, record) in BinaryReader::new(input).enumerate() {
        let record = record.with_context(|| format!("Failed to read record #{}", index + 1))?;
        output
            .write_all(layout.render(&record).as_bytes())
            .context("Failed to write output")?;
    }
    output.flush().context("Failed to flush output")
}

fn main() -> ExitCode {
    let args = Cli::parse();
    match convert(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("binlog failed: {e:?}");
            ExitCode::from(1)
        }
    }
}
