//! `splice check`: run the completeness heuristic on a finished file.

use std::path::Path;

use splice_reassembly::assess;

use super::{read_file, resolve_class};

pub fn run(
    file: &Path,
    original: &Path,
    class: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let class = resolve_class(class, Some(file))?;
    let merged = read_file(file)?;
    let original = read_file(original)?;

    let assessment = assess(&merged, &original, class);

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    let verdict = if assessment.looks_complete {
        "✅ looks complete"
    } else {
        "⚠️  looks incomplete"
    };

    println!("🔍 {}", file.display());
    println!("─────────────────────────────────────");
    println!("  Class:     {}", assessment.class);
    match assessment.percent {
        Some(pct) => println!(
            "  Length:    {} / {} bytes ({pct}%)",
            assessment.merged_len, assessment.original_len
        ),
        None => println!("  Length:    {} bytes (empty original)", assessment.merged_len),
    }
    println!(
        "  Balanced:  {}",
        if assessment.balanced { "yes" } else { "no" }
    );
    if let Some(tally) = assessment.tally {
        println!(
            "  Open:      {{}} {}  () {}  [] {}{}",
            tally.braces,
            tally.parens,
            tally.brackets,
            if tally.in_string { "  (inside a string)" } else { "" }
        );
    }
    println!("  Verdict:   {verdict}");

    Ok(())
}
