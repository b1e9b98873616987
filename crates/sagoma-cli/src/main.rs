//! sagoma - mail-merge for SVG templates
//!
//! Reads a delimited table, fills an SVG template once per record, and
//! hands the results to Inkscape / pdfunite for conversion and merging.

mod cli;
mod convert;
mod job;

use clap::Parser;

use sagoma_core::SagomaError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Cli::parse();
    if let Err(err) = job::run(&args) {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Map error kinds to distinct exit codes (2 is left to clap for usage
/// errors).
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<SagomaError>() {
        return match err {
            SagomaError::InvalidRecordLength { .. } => 3,
            SagomaError::NoPlaceholdersFound { .. } => 4,
            SagomaError::MissingPlaceholder { .. } => 5,
            SagomaError::Io(_) => 1,
        };
    }
    if err.downcast_ref::<convert::ToolError>().is_some() {
        6
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let err = anyhow::Error::new(SagomaError::NoPlaceholdersFound {
            expected: vec!["a".to_string()],
        });
        assert_eq!(exit_code(&err), 4);

        let err = anyhow::Error::new(SagomaError::MissingPlaceholder {
            field: "a".to_string(),
            remaining: vec!["b".to_string()],
        })
        .context("while filling record 2");
        // context wrapping must not hide the kind
        assert_eq!(exit_code(&err), 5);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&err), 1);
    }
}
