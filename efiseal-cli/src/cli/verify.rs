use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use efiseal_core::verify::{verify, Report};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Output {
    Human,
    Json,
    JsonPretty,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the EFI image (fat container or single PE)
    #[arg(long)]
    file: PathBuf,
    /// Output format (human by default)
    #[arg(long, value_enum, default_value_t = Output::Human)]
    format: Output,
}

impl VerifyArgs {
    pub fn run(self) -> Result<()> {
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("read {}", self.file.display()))?;
        let report = verify(&bytes)
            .with_context(|| format!("verification failed for {}", self.file.display()))?;
        match self.format {
            Output::Human => print_human(&report)?,
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

fn print_human(r: &Report) -> Result<()> {
    let mut out = io::BufWriter::new(io::stdout());
    for image in &r.images {
        writeln!(
            out,
            "{} • {} • {}: signature verified ({})",
            image.arch,
            if image.pe32_plus { "PE32+" } else { "PE32" },
            fmt_offset(image.offset),
            image.key
        )?;
    }
    if r.images.is_empty() {
        writeln!(out, "container is well-formed but holds no x86 images")?;
    }
    out.flush()?;
    Ok(())
}

// tiny helper (no deps)
fn fmt_offset(off: u64) -> String {
    format!("offset {off:#x}")
}
