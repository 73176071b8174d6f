//! The `gatemarks validate-key` command.

use std::path::PathBuf;

use anyhow::Result;

use gatemarks_core::model::{QuestionType, Section};
use gatemarks_core::parser::validate_answer_key;

pub fn execute(answer_key: PathBuf) -> Result<()> {
    let key = super::load_key(&answer_key)?;

    println!(
        "Answer key: {} ({} questions, {} marks)",
        key.name(),
        key.len(),
        key.max_marks().as_f64()
    );
    for section in Section::ALL {
        let count = key.entries().iter().filter(|e| e.section == section).count();
        println!(
            "  {section}: {count} questions, {} marks",
            key.section_max_marks(section).as_f64()
        );
    }
    for qt in [
        QuestionType::SingleCorrect,
        QuestionType::MultiCorrect,
        QuestionType::Numerical,
    ] {
        println!("  {qt}: {}", key.count_by_type(qt));
    }

    let warnings = validate_answer_key(&key);
    for w in &warnings {
        let prefix = w
            .question
            .map(|q| format!("  [Q{q}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Answer key valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
