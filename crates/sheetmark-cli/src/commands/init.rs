//! The `sheetmark init` command.

use std::path::Path;

use anyhow::{Context, Result};

use sheetmark_backends::config::load_config;
use sheetmark_backends::json_file::{BatchRecord, CourseRecord, StoreDocument};
use sheetmark_core::model::StudentRecord;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("sheetmark.toml"), SAMPLE_CONFIG)?;

    let config = load_config()?;

    let store_path = config.store_path.clone();
    if store_path.exists() {
        println!("{} already exists, skipping.", store_path.display());
    } else {
        let json = serde_json::to_string_pretty(&sample_store())?;
        std::fs::write(&store_path, json)
            .with_context(|| format!("failed to write {}", store_path.display()))?;
        println!("Created {}", store_path.display());
    }

    std::fs::create_dir_all("patterns")?;
    write_if_missing(
        Path::new("patterns/example.toml"),
        &example_pattern(config.default_questions, &config.default_series),
    )?;

    println!("\nNext steps:");
    println!("  1. Edit patterns/example.toml to match your question paper");
    println!("  2. Run: sheetmark validate --pattern patterns/example.toml");
    println!("  3. Run: sheetmark create-exam --pattern patterns/example.toml");
    println!("  4. Run: sheetmark digitize --exam-id 1 --sheets <scans>");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

fn sample_store() -> StoreDocument {
    let students = [
        ("TKM24MCA001", "Aditya Menon"),
        ("TKM24MCA002", "Fathima Nasrin"),
        ("TKM24MCA003", "Gokul Krishnan"),
        ("TKM24MCA004", "Nandana S"),
        ("TKM24MCA005", "Rohan Thomas"),
    ]
    .into_iter()
    .map(|(ktu_id, name)| StudentRecord {
        ktu_id: ktu_id.into(),
        student_name: name.into(),
        batch_id: "MCA2024".into(),
    })
    .collect();

    StoreDocument {
        batches: vec![BatchRecord {
            batch_id: "MCA2024".into(),
            batch_name: "2024-2026 MCA".into(),
            current_semester: Some(1),
        }],
        courses: vec![CourseRecord {
            course_code: "20MCA101".into(),
            course_name: "Mathematical Foundations for Computing".into(),
            department: Some("MCA".into()),
        }],
        students,
        ..Default::default()
    }
}

/// Five compulsory questions (Q4 split into parts) followed by two
/// "answer any" blocks.
fn example_pattern(total_questions: u32, series: &str) -> String {
    format!(
        r#"# Example exam pattern

[exam]
exam_id = 1
course_code = "20MCA101"
date = "2026-03-14"
series = "{series}"

[pattern]
target_batch_id = "MCA2024"
total_questions = {total_questions}

[[questions]]
q_no = 4
sub_marks = {{ a = 3, b = 2 }}

[[questions]]
q_no = 6
module = 2

[[choice_rules]]
from_q = 6
to_q = 9
solve_count = 2

[[choice_rules]]
from_q = 10
to_q = 15
solve_count = 3
"#
    )
}

const SAMPLE_CONFIG: &str = r#"# sheetmark configuration

store_path = "./sheetmark-store.json"
default_questions = 15
default_series = "Series 1"

# "simulated" fabricates marks; "sidecar" reads <sheet>.json next to each scan.
[recognizer]
type = "simulated"
delay_ms = 1500
seed = 0
"#;
