//! Multi-file batches.
//!
//! Files are parsed one after the other and their records concatenated in
//! file-then-record order. A failed file never contributes partial records.

use crate::error::{Error, Result};
use crate::extract::LineSource;
use crate::types::{OrderScheme, TransactionRecord};
use crate::Format;
use std::path::Path;

/// What to do when a file of the batch is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failed file and return its error.
    #[default]
    AbortOnError,
    /// Log the failure, leave the file out and continue with the next one.
    SkipFailedFiles,
}

/// Output of a batch run.
#[derive(Debug, Default)]
pub struct Batch {
    /// Records of every accepted file.
    pub records: Vec<TransactionRecord>,

    /// Rejected files, each as an [`Error::File`]. Always empty under
    /// [`BatchPolicy::AbortOnError`].
    pub failures: Vec<Error>,
}

/// Extract and parse every file of a batch.
///
/// Formats numbering records with [`OrderScheme::BatchSequence`] continue
/// the sequence from one file to the next.
pub fn parse_files<L, P>(
    source: &L,
    format: Format,
    files: &[P],
    password: Option<&str>,
    policy: BatchPolicy,
) -> Result<Batch>
where
    L: LineSource,
    P: AsRef<Path>,
{
    if files.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut batch = Batch::default();
    let mut next_order = 0;

    for file in files {
        let path = file.as_ref();
        tracing::info!("Processing {}", path.display());

        let parsed = source
            .extract_lines(path, password)
            .and_then(|lines| format.parse_lines(&lines));

        let mut parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                let e = e.in_file(path);
                match policy {
                    BatchPolicy::AbortOnError => return Err(e),
                    BatchPolicy::SkipFailedFiles => {
                        tracing::warn!("Skipping file: {}", e);
                        batch.failures.push(e);
                        continue;
                    }
                }
            }
        };

        if format.order_scheme() == OrderScheme::BatchSequence {
            for record in &mut parsed.records {
                record.order += next_order;
            }
            next_order += parsed.transaction_count;
        }

        tracing::debug!(
            "{}: {} transactions, {} records",
            path.display(),
            parsed.transaction_count,
            parsed.records.len()
        );
        batch.records.extend(parsed.records);
    }

    Ok(batch)
}
