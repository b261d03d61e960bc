use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::CandidateRecord;

pub const CSV_FILENAME: &str = "candidates.csv";
pub const CSV_HEADER: [&str; 4] = ["Name", "ResumeFile", "Experiences", "Screening"];

const FIELD_NEWLINE: &str = " | ";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serializes records with a bare header line and one fully quoted row per record.
///
/// Newlines inside fields become ` | ` so every record stays on one physical line.
pub fn to_csv(records: &[CandidateRecord]) -> Result<String, ExportError> {
    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(CSV_HEADER)?;
    let buffer = header.into_inner().map_err(|err| err.into_error())?;

    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer);
    for record in records {
        rows.write_record([
            flatten(&record.name),
            flatten(&record.resume_filename),
            flatten(&record.experiences),
            flatten(&record.screening),
        ])?;
    }
    let buffer = rows.into_inner().map_err(|err| err.into_error())?;

    let mut text = String::from_utf8(buffer)?;
    if !records.is_empty() && text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Wraps CSV text as a `data:` URL the download relay can save like any other link.
pub fn csv_data_url(csv: &str) -> String {
    format!("data:text/csv;charset=utf-8;base64,{}", STANDARD.encode(csv))
}

fn flatten(value: &str) -> String {
    value.replace('\n', FIELD_NEWLINE)
}
