pub mod init;
pub mod ranks;
pub mod score;
pub mod validate_key;

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

use gatemarks_core::answer_key::AnswerKey;
use gatemarks_core::parser::{parse_answer_key, parse_answer_key_text};

/// Load an answer key; official PDFs are rendered to text with Ghostscript.
pub fn load_key(path: &Path) -> Result<AnswerKey> {
    if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")) {
        return parse_answer_key(path);
    }

    tracing::debug!("rendering {} with ghostscript", path.display());
    let output = Command::new("gs")
        .args([
            "-q",
            "-dNOPAUSE",
            "-dBATCH",
            "-sDEVICE=txtwrite",
            "-sOutputFile=-",
        ])
        .arg(path)
        .output()
        .context("failed to run ghostscript (gs); install it or convert the PDF to text")?;
    anyhow::ensure!(
        output.status.success(),
        "ghostscript failed on {}: {}",
        path.display(),
        String::from_utf8_lossy(&output.stderr).trim()
    );

    parse_answer_key_text(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("failed to parse answer key PDF: {}", path.display()))
}
