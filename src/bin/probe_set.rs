//! Answers `+ value`, `- value` and `? value` commands with `OK` or `FAIL`.

use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ostat::ProbeHashSet;
use ostat::driver;
use ostat::probe_hash_set::INITIAL_CAPACITY;

/// Hash set command loop: insert (`+`), remove (`-`) and query (`?`) string values.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Read commands from this file instead of standard input.
    #[arg(long, env = "OSTAT_INPUT")]
    input: Option<PathBuf>,
    /// Initial number of table slots, rounded up to a power of two.
    #[arg(long, env = "OSTAT_CAPACITY", default_value_t = INITIAL_CAPACITY)]
    capacity: usize,
}

fn main() -> anyhow::Result<()> {
    driver::init_logger();
    let cli = Cli::parse();
    log::debug!("{cli:?}");

    let input = driver::open_input(cli.input.as_deref())
        .with_context(|| format!("cannot open {}", cli.input.as_deref().unwrap_or("-".as_ref()).display()))?;
    let output = BufWriter::new(io::stdout().lock());

    let mut set = ProbeHashSet::with_capacity(cli.capacity);
    let answered = driver::run_probe_set(input, output, &mut set).context("hash set session failed")?;
    log::info!("answered {answered} commands, final capacity {}", set.capacity());
    Ok(())
}
