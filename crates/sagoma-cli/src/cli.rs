//! Command line definition

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Fill an SVG template once per record of a delimited table, then
/// optionally rasterize each filled document with Inkscape and merge the
/// results with pdfunite.
#[derive(Debug, Parser)]
#[command(name = "sagoma", version)]
pub struct Cli {
    /// Delimited table with one record per line
    pub table: PathBuf,

    /// SVG template containing {field} placeholders
    pub template: PathBuf,

    /// Field separator; the literal string "\t" means a tab
    #[arg(short, long, default_value = ";")]
    pub separator: String,

    /// Treat the table's first line as field names instead of data
    /// (otherwise fields are named txt1..txtN)
    #[arg(long)]
    pub headers: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pdf)]
    pub format: OutputFormat,

    /// Export resolution passed to Inkscape
    #[arg(short, long, default_value_t = 300)]
    pub dpi: u32,

    /// Output name prefix; documents are written as <PREFIX>NNN.<ext>
    #[arg(short, long, default_value = "out")]
    pub prefix: String,

    /// Merge all output PDFs into a single <PREFIX>.pdf
    #[arg(short, long)]
    pub join: bool,

    /// Pre-process the template: a preset name ("crlf") or a shell
    /// command reading the template on stdin and writing it to stdout
    #[arg(long)]
    pub pre: Option<String>,

    /// Keep the intermediate per-record SVG next to each converted output
    #[arg(long)]
    pub keep_svg: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Turn the escape sequence "\t" into an actual tab. Shells make it hard
/// to pass a literal tab, so accept the two-character spelling too.
pub fn normalize_separator(separator: &str) -> String {
    if separator == "\\t" {
        "\t".to_string()
    } else {
        separator.to_string()
    }
}
