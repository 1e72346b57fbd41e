//! Inserts keys reporting their positions, and removes keys by position.

use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ostat::OSAvlTree;
use ostat::driver;

/// Order-statistic AVL command loop: a count `N`, then `N` lines of `1 <key>`
/// (insert, prints the key's position) or `2 <position>` (remove).
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Read commands from this file instead of standard input.
    #[arg(long, env = "OSTAT_INPUT")]
    input: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    driver::init_logger();
    let cli = Cli::parse();
    log::debug!("{cli:?}");

    let input = driver::open_input(cli.input.as_deref())
        .with_context(|| format!("cannot open {}", cli.input.as_deref().unwrap_or("-".as_ref()).display()))?;
    let output = BufWriter::new(io::stdout().lock());

    let mut tree = OSAvlTree::new();
    let commands = driver::run_ranked_avl(input, output, &mut tree).context("ranked tree session failed")?;
    log::info!("ran {commands} commands, final height {}", tree.height());
    Ok(())
}
