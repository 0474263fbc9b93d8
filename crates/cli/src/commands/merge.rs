//! `splice merge`: one merge step, for inspecting overlap detection.

use std::io::Write;
use std::path::Path;

use splice_reassembly::merge_with_report;

use super::read_file;

pub fn run(
    accumulated: &Path,
    fragment: &Path,
    explain: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let accumulated = read_file(accumulated)?;
    let fragment = read_file(fragment)?;

    let report = merge_with_report(&accumulated, &fragment);

    if explain {
        match report.strategy {
            Some(strategy) => eprintln!("strategy: {strategy} (overlap {})", report.overlap),
            None => eprintln!("strategy: none (concatenated)"),
        }
        eprintln!(
            "length:   {} -> {} bytes",
            accumulated.len(),
            report.text.len()
        );
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.text.as_bytes())?;
    if !report.text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
