//! External headless-converter (LibreOffice `soffice`) invocation.
//!
//! Output lands in a UUID-named scratch directory under a per-call
//! subprocess invocation with a hard timeout, then gets renamed to the
//! expected stem once the conversion succeeds.

use super::TargetFormat;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub fn discover(configured: Option<&Path>, default_paths: &[PathBuf]) -> Option<PathBuf> {
    if let Some(p) = configured {
        if p.is_file() {
            return Some(p.to_path_buf());
        }
    }
    for candidate in default_paths {
        if candidate.is_file() {
            return Some(candidate.clone());
        }
    }
    which::which("soffice").ok()
}

fn filter_name(target: TargetFormat) -> &'static str {
    match target {
        TargetFormat::Docx => "MS Word 2007 XML",
        TargetFormat::Xlsx => "Calc MS Excel 2007 XML",
        TargetFormat::Pptx => "Impress MS PowerPoint 2007 XML",
    }
}

pub async fn convert(
    soffice: &Path,
    input: &Path,
    target: TargetFormat,
    temp_dir: &Path,
    timeout: Duration,
) -> Option<PathBuf> {
    let ext = target.extension();
    let expected_output = temp_dir.join(format!("temp_{}.{}", uuid::Uuid::new_v4().simple(), ext));

    let convert_to_arg = format!("{}:\"{}\"", ext, filter_name(target));
    let mut cmd = Command::new(soffice);
    cmd.args([
        "--headless",
        "--nologo",
        "--nolockcheck",
        "--convert-to",
        &convert_to_arg,
        "--outdir",
    ])
    .arg(temp_dir)
    .arg(input)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to spawn headless converter");
            return None;
        }
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "headless converter process error");
            return None;
        }
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "headless converter timed out");
            return None;
        }
    };

    // LibreOffice ignores --convert-to's target stem and writes the input's
    // own stem instead; detect that and rename into our UUID-named slot.
    let echoed_stem_output = input.file_stem().map(|stem| temp_dir.join(format!("{}.{}", stem.to_string_lossy(), ext)));

    if expected_output.is_file() {
        return Some(expected_output);
    }
    if let Some(echoed) = echoed_stem_output {
        if echoed.is_file() {
            if tokio::fs::rename(&echoed, &expected_output).await.is_ok() {
                return Some(expected_output);
            }
            return Some(echoed);
        }
    }
    if !output.status.success() {
        tracing::warn!(
            stderr = %String::from_utf8_lossy(&output.stderr),
            "headless converter exited non-zero"
        );
    }
    None
}
