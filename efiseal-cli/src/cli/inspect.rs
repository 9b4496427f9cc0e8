use anyhow::Result;
use clap::{Args, ValueEnum};
use efiseal_core::inspect::{self, InspectOptions, Report};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Output {
    Human,
    Json,
    JsonPretty,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the image to inspect
    #[arg(long)]
    file: PathBuf,
    /// Output format (human by default)
    #[arg(long, value_enum, default_value_t = Output::Human)]
    format: Output,
    /// Show more fields in human output
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl InspectArgs {
    pub fn run(self) -> Result<()> {
        let report = inspect::inspect(InspectOptions { file: self.file })?;
        match self.format {
            Output::Human => print_human(&report, self.verbose)?,
            Output::Json => {
                serde_json::to_writer(io::stdout(), &report)?;
                io::stdout().write_all(b"\n")?;
            }
            Output::JsonPretty => {
                serde_json::to_writer_pretty(io::stdout(), &report)?;
                io::stdout().write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

fn print_human(r: &Report, verbose: bool) -> Result<()> {
    let mut out = io::BufWriter::new(io::stdout());

    writeln!(
        out,
        "{}",
        if r.fat {
            format!("fat container with {} slice(s)", r.slices.len())
        } else {
            "single PE image".to_string()
        }
    )?;

    for slice in &r.slices {
        let sig = if slice.has_signature_dir {
            "signature directory present"
        } else {
            "unsigned"
        };
        writeln!(
            out,
            "{} • {} • {} ({}): {}",
            slice.arch,
            if slice.pe32_plus { "PE32+" } else { "PE32" },
            fmt_bytes(slice.size),
            fmt_offset(slice.offset),
            sig
        )?;
        if verbose {
            writeln!(out, "  sections: {}", slice.sections)?;
            if let Some(cpu) = slice.cpu_type {
                writeln!(out, "  fat cpu type: {cpu:#x}")?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

// tiny helpers (no deps)
fn fmt_bytes(n: usize) -> String {
    // KiB with one decimal place; EFI images are small
    let kib = (n as f64) / 1024.0;
    format!("{kib:.1} KiB")
}
fn fmt_offset(off: usize) -> String {
    format!("offset {off:#x}")
}
