//! The `sheetmark validate` command.

use std::path::PathBuf;

use anyhow::Result;

use sheetmark_core::parser::{parse_pattern_file, validate_pattern};

pub fn execute(pattern_path: PathBuf) -> Result<()> {
    let doc = parse_pattern_file(&pattern_path)?;
    let config = &doc.config;

    println!(
        "Pattern for batch {} ({} questions)",
        config.target_batch_id, config.total_questions
    );
    for rule in &config.choice_rules {
        println!("  choice: {rule}");
    }
    println!("Estimated total: {}", config.estimated_total());

    let warnings = validate_pattern(config);
    for w in &warnings {
        let prefix = w
            .location
            .as_ref()
            .map(|loc| format!("  [{loc}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Pattern valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
