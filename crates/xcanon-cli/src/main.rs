use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "xcanon",
    version,
    about = "Canonicalize two complaint XML files and verify they are equivalent"
)]
struct Args {
    /// First input file
    #[arg(value_name = "FILE_A")]
    file_a: PathBuf,
    /// Second input file
    #[arg(value_name = "FILE_B")]
    file_b: PathBuf,
    /// Where to write the canonical document when the inputs match
    #[arg(short, long, value_name = "OUTPUT", default_value = "canonical.xml")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Canonicalize {} ...", args.file_a.display());
    let canonical_a = xcanon::canonicalize(&args.file_a)
        .with_context(|| format!("failed to canonicalize {}", args.file_a.display()))?;
    println!("Canonicalize {} ...", args.file_b.display());
    let canonical_b = xcanon::canonicalize(&args.file_b)
        .with_context(|| format!("failed to canonicalize {}", args.file_b.display()))?;

    println!("-------------------------------------------");
    let checksums_equal = xcanon::checksum(&canonical_a) == xcanon::checksum(&canonical_b);
    let bytes_equal = xcanon::compare(&canonical_a, &canonical_b);
    println!("checksum equal: {checksums_equal}");
    println!("binary equal  : {bytes_equal}");

    if !bytes_equal {
        bail!("documents differ after canonicalization");
    }

    std::fs::write(&args.output, &canonical_a)
        .with_context(|| format!("failed to write output file {}", args.output.display()))?;
    Ok(())
}
