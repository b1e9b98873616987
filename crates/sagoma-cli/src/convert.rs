//! External tool invocation: template pre-processing, Inkscape export,
//! pdfunite merging

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use log::debug;
use thiserror::Error;

use crate::cli::OutputFormat;

/// Named pre-processing presets, expanded to shell commands
const PRESETS: &[(&str, &str)] = &[
    // strip carriage returns from templates saved with CRLF endings
    ("crlf", "tr -d '\\r'"),
];

/// An external collaborator failed
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{tool} produced invalid output: {message}")]
    Output {
        tool: &'static str,
        message: String,
    },
}

fn check(tool: &'static str, output: Output) -> Result<Output, ToolError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(ToolError::Failed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run the template text through a pre-processing command or preset.
///
/// The command gets the template on stdin and must write the processed
/// template to stdout.
pub fn preprocess(text: &str, pre: &str) -> Result<String, ToolError> {
    let command = PRESETS
        .iter()
        .find(|(name, _)| *name == pre)
        .map(|(_, cmd)| *cmd)
        .unwrap_or(pre);
    debug!("pre-processing template with: {command}");

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolError::Spawn { tool: "sh", source })?;

    // feed stdin from a separate thread: writing it all up front can
    // deadlock once the child fills its stdout pipe and stops reading
    if let Some(mut stdin) = child.stdin.take() {
        let text = text.to_string();
        std::thread::spawn(move || {
            // a child that exits without draining stdin closes the pipe;
            // its exit status is what gets reported
            let _ = stdin.write_all(text.as_bytes());
        });
    }

    let output = child
        .wait_with_output()
        .map_err(|source| ToolError::Spawn { tool: "sh", source })?;
    let output = check("sh", output)?;

    String::from_utf8(output.stdout).map_err(|err| ToolError::Output {
        tool: "sh",
        message: format!("pre-processor wrote invalid UTF-8: {err}"),
    })
}

/// Convert a filled SVG to the requested format with Inkscape.
pub fn rasterize(
    svg: &Path,
    out: &Path,
    format: OutputFormat,
    dpi: u32,
) -> Result<(), ToolError> {
    debug!("inkscape: {} -> {}", svg.display(), out.display());

    let output = Command::new("inkscape")
        .arg(format!("--export-type={}", format.extension()))
        .arg(format!("--export-dpi={dpi}"))
        .arg("--export-filename")
        .arg(out)
        .arg(svg)
        .output()
        .map_err(|source| ToolError::Spawn {
            tool: "inkscape",
            source,
        })?;

    check("inkscape", output).map(|_| ())
}

/// Merge single-page PDFs into one document, in the given order.
pub fn merge_pdfs(parts: &[PathBuf], out: &Path) -> Result<(), ToolError> {
    debug!("pdfunite: {} parts -> {}", parts.len(), out.display());

    let output = Command::new("pdfunite")
        .args(parts)
        .arg(out)
        .output()
        .map_err(|source| ToolError::Spawn {
            tool: "pdfunite",
            source,
        })?;

    check("pdfunite", output).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preprocess_crlf_preset() {
        let out = preprocess("a\r\nb\r\n", "crlf").unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_preprocess_arbitrary_command() {
        let out = preprocess("hello", "tr a-z A-Z").unwrap();
        assert_eq!(out, "HELLO");
    }

    #[test]
    fn test_preprocess_large_input_streams() {
        // more than a pipe buffer in both directions
        let big = "line with some text\r\n".repeat(50_000);
        let out = preprocess(&big, "crlf").unwrap();
        assert_eq!(out, big.replace('\r', ""));
    }

    #[test]
    fn test_preprocess_failing_command() {
        let err = preprocess("x", "false").unwrap_err();
        assert!(matches!(err, ToolError::Failed { tool: "sh", .. }));
    }
}
