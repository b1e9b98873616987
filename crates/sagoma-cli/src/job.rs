//! Batch driver: one filled document per record, with cleanup of partial
//! outputs when the batch aborts

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use sagoma_core::{RecordSource, TemplateEngine};

use crate::cli::{normalize_separator, Cli, OutputFormat};
use crate::convert;

pub fn run(cli: &Cli) -> Result<()> {
    let separator = normalize_separator(&cli.separator);

    let mut records = RecordSource::open(&cli.table, &separator, cli.headers)
        .with_context(|| format!("failed to load table {}", cli.table.display()))?;

    let mut text = fs::read_to_string(&cli.template)
        .with_context(|| format!("failed to read template {}", cli.template.display()))?;
    if let Some(pre) = &cli.pre {
        text = convert::preprocess(&text, pre).context("template pre-processing failed")?;
    }

    let engine = TemplateEngine::new(text, records.field_names())
        .with_context(|| format!("failed to load template {}", cli.template.display()))?;
    warn_unplaced_fields(&engine, &records);

    // every artifact created so far; removed wholesale if the batch aborts
    let mut outputs = Vec::new();
    let result = run_batch(cli, &engine, &mut records, &mut outputs);
    if result.is_err() {
        cleanup(&outputs);
    }
    result
}

fn run_batch(
    cli: &Cli,
    engine: &TemplateEngine,
    records: &mut RecordSource,
    outputs: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut index = 1;

    while !records.is_empty() {
        let out = output_path(&cli.prefix, index, cli.format.extension());
        info!("record {index} -> {}", out.display());

        match cli.format {
            OutputFormat::Svg => {
                outputs.push(out.clone());
                write_document(engine, records, &out)?;
            }
            OutputFormat::Png | OutputFormat::Pdf => {
                let mut temp = None;
                let svg = if cli.keep_svg {
                    let svg = output_path(&cli.prefix, index, "svg");
                    outputs.push(svg.clone());
                    svg
                } else {
                    let file = tempfile::Builder::new()
                        .prefix("sagoma-")
                        .suffix(".svg")
                        .tempfile()
                        .context("failed to create intermediate SVG")?;
                    let svg = file.path().to_path_buf();
                    temp = Some(file);
                    svg
                };

                write_document(engine, records, &svg)?;
                outputs.push(out.clone());
                convert::rasterize(&svg, &out, cli.format, cli.dpi)?;
                drop(temp);
            }
        }

        index += 1;
    }

    if cli.join {
        join_outputs(cli, outputs)?;
    }

    Ok(())
}

/// Fill the template once and stream the fragments to `path`.
fn write_document(
    engine: &TemplateEngine,
    records: &mut RecordSource,
    path: &std::path::Path,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for fragment in engine.fill(|field| records.pop(field)) {
        writer.write_all(fragment?.as_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

/// Merge all per-record PDFs into a single `<prefix>.pdf` and drop the
/// parts.
fn join_outputs(cli: &Cli, outputs: &mut Vec<PathBuf>) -> Result<()> {
    if cli.format != OutputFormat::Pdf {
        warn!("--join only applies to pdf output; ignoring");
        return Ok(());
    }

    let parts: Vec<PathBuf> = outputs
        .iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "pdf"))
        .cloned()
        .collect();
    if parts.is_empty() {
        return Ok(());
    }

    let merged = PathBuf::from(format!("{}.pdf", cli.prefix));
    outputs.push(merged.clone());

    if let [part] = parts.as_slice() {
        // a one-record batch still gets its <prefix>.pdf
        fs::rename(part, &merged).with_context(|| {
            format!("failed to rename {} to {}", part.display(), merged.display())
        })?;
    } else {
        convert::merge_pdfs(&parts, &merged).context("failed to merge outputs")?;
        for part in &parts {
            if let Err(err) = fs::remove_file(part) {
                warn!("could not remove merged part {}: {err}", part.display());
            }
        }
    }

    info!("joined {} documents -> {}", parts.len(), merged.display());
    outputs.retain(|p| *p == merged);
    Ok(())
}

/// Log fields the table declares but the template never places. Not an
/// error: the values simply go unused.
fn warn_unplaced_fields(engine: &TemplateEngine, records: &RecordSource) {
    let placed: HashSet<&str> = engine
        .occurrences()
        .iter()
        .map(|occ| occ.field.as_str())
        .collect();
    for name in records.field_names() {
        if !placed.contains(name.as_str()) {
            warn!("field '{name}' has no placeholder in the template");
        }
    }
}

fn output_path(prefix: &str, index: usize, extension: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{index:03}.{extension}"))
}

/// Remove every artifact the batch has produced so far.
fn cleanup(outputs: &[PathBuf]) {
    for path in outputs {
        match fs::remove_file(path) {
            Ok(()) => warn!("removed partial output {}", path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("could not remove {}: {err}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_path_zero_pads() {
        assert_eq!(output_path("out", 1, "pdf"), PathBuf::from("out001.pdf"));
        assert_eq!(output_path("out", 42, "svg"), PathBuf::from("out042.svg"));
        assert_eq!(output_path("out", 1234, "png"), PathBuf::from("out1234.png"));
    }

    #[test]
    fn test_output_path_with_directory_prefix() {
        assert_eq!(
            output_path("pages/p", 7, "svg"),
            PathBuf::from("pages/p007.svg")
        );
    }

    #[test]
    fn test_join_single_record_still_produces_the_merged_name() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("out");
        let part = dir.path().join("out001.pdf");
        fs::write(&part, "%PDF-").unwrap();

        let cli = crate::cli::Cli::parse_from([
            "sagoma",
            "table.csv",
            "template.svg",
            "--join",
            "--format",
            "pdf",
            "--prefix",
            prefix.to_str().unwrap(),
        ]);
        let mut outputs = vec![part.clone()];
        join_outputs(&cli, &mut outputs).unwrap();

        let merged = dir.path().join("out.pdf");
        assert!(merged.exists());
        assert!(!part.exists());
        assert_eq!(outputs, [merged]);
    }

    #[test]
    fn test_join_ignores_non_pdf_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let cli = crate::cli::Cli::parse_from([
            "sagoma",
            "table.csv",
            "template.svg",
            "--join",
            "--format",
            "svg",
        ]);
        let mut outputs = vec![dir.path().join("out001.svg")];
        join_outputs(&cli, &mut outputs).unwrap();
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[test]
    fn test_cleanup_removes_files_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("out001.svg");
        fs::write(&present, "x").unwrap();
        let absent = dir.path().join("out002.svg");

        cleanup(&[present.clone(), absent]);
        assert!(!present.exists());
    }
}
