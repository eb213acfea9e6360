//! BlockFund Command-Line Interface
//!
//! Entry point for the `blockfund` binary.

fn main() -> anyhow::Result<()> {
    blockfund_cli::run_cli()
}
