use std::{
    env,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Error};
use clap::Parser;

use lumber::{
    hashlog::{Hashlog, HASHLOG_FILE_NAME},
    layouts::TextLayout,
    reader::{self, BinaryReader, HashReader},
};

/// Converts a hash log into text, or learns hashes from a binary log
#[derive(Parser, Debug)]
#[clap(version)]
struct Cli {
    /// Hashlog map file [default: closest .hashlog of the input]
    #[arg(short = 'x', long)]
    hashlog: Option<PathBuf>,

    /// Hash log to read, `.zst` archives included [default: stdin]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Text file to write [default: stdout]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Binary log whose logger names and messages are added to the map
    #[arg(short, long, conflicts_with_all = ["input", "output"])]
    update: Option<PathBuf>,
}

fn open(path: Option<&Path>) -> Result<Box<dyn Read>, Error> {
    match path {
        Some(path) => reader::open_input(path)
            .with_context(|| format!("Failed to open input '{}'", path.display())),
        None => Ok(Box::new(io::stdin().lock())),
    }
}

/// Explicit map (a directory is searched for its map), else the closest `.hashlog` around the input, else
/// `.hashlog` in the working directory.
fn hashlog_path(args: &Cli, input: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = &args.hashlog {
        return Ok(Hashlog::locate(path));
    }

    let current = env::current_dir().context("Failed to get the working directory")?;
    let start = input
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| current.clone(), Path::to_path_buf);

    Ok(Hashlog::find(&start)
        .or_else(|| Hashlog::find(&current))
        .unwrap_or_else(|| current.join(HASHLOG_FILE_NAME)))
}

fn update(args: &Cli, source: &Path) -> Result<(), Error> {
    let path = hashlog_path(args, Some(source))?;
    let mut hashlog = Hashlog::load(&path)
        .with_context(|| format!("Failed to load hashlog '{}'", path.display()))?;

    let mut found = false;
    for (index, record) in BinaryReader::new(open(Some(source))?).enumerate() {
        let record = record.with_context(|| format!("Failed to read record #{}", index + 1))?;
        found |= hashlog
            .update_from(&record)
            .context("Failed to update hashlog")?;
    }

    if found {
        hashlog
            .save(&path)
            .with_context(|| format!("Failed to save hashlog '{}'", path.display()))?;
    }
    Ok(())
}

fn convert(args: &Cli) -> Result<(), Error> {
    let path = hashlog_path(args, args.input.as_deref())?;
    let hashlog = Hashlog::load(&path)
        .with_context(|| format!("Failed to load hashlog '{}'", path.display()))?;

    let input = open(args.input.as_deref())?;
    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output '{}'", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let layout = TextLayout::default();
    for (index, record) in HashReader::new(input, &hashlog).enumerate() {
        let record = record.with_context(|| format!("Failed to read record #{}", index + 1))?;
        output
            .write_all(layout.render(&record).as_bytes())
            .context("Failed to write output")?;
    }
    output.flush().context("Failed to flush output")
}

fn main() -> ExitCode {
    let args = Cli::parse();
    let result = match &args.update {
        Some(source) => update(&args, source),
        None => convert(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hashlog failed: {e:?}");
            ExitCode::from(1)
        }
    }
}
