//! `emgrid`: grid-based emission mitigation experiments on SUMO.
//!
//! ```text
//! emgrid create-dump base -s scenarios/bologna -a 4
//! emgrid run base -s scenarios/bologna -c limit.json retime.json --csv
//! emgrid run base -s scenarios/bologna --config-dir configs/ --save-logs -j 2
//! ```

mod cli;
mod log;

#[cfg(test)]
mod tests;

fn main() -> anyhow::Result<()> {
    cli::run_cli()
}
