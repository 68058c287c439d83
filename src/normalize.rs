//! JSONL → Parquet normalization.
//!
//! Two streaming passes over the source: the first validates every line and
//! infers the Arrow schema from the union of record shapes, the second decodes
//! fixed-size batches and writes them to a temp file that is promoted onto the
//! target only once the writer has closed cleanly.

use crate::config::AnalyticsOptions;
use crate::error::{AnalyticsError, Result};
use crate::instrument::ScanStats;
use crate::ndjson::{source_len, NdjsonReader};
use crate::progress::ProgressScope;
use crate::schema::reconcile_post_schema;
use crate::util::{create_with_backoff, partial_path_for, promote_file_backoff, remove_with_backoff};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::json::reader::{infer_json_schema_from_iterator, Decoder};
use arrow::json::ReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

/// What a normalization call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NormalizeOutcome {
    /// A new store was written with `rows` rows and `columns` top-level fields.
    Created { rows: u64, columns: usize },
    /// The target already existed; nothing was read or written.
    AlreadyPresent,
}

impl NormalizeOutcome {
    pub fn rows_written(&self) -> u64 {
        match self {
            NormalizeOutcome::Created { rows, .. } => *rows,
            NormalizeOutcome::AlreadyPresent => 0,
        }
    }
}

pub(crate) fn normalize_jsonl(
    source: &Path,
    target: &Path,
    opts: &AnalyticsOptions,
    stats: &mut ScanStats,
) -> Result<NormalizeOutcome> {
    if target.exists() {
        tracing::info!(target = %target.display(), "post store already exists, skipping normalization");
        return Ok(NormalizeOutcome::AlreadyPresent);
    }
    if !source.exists() {
        return Err(AnalyticsError::MissingSource { path: source.to_path_buf() });
    }

    let (schema, inferred_rows) = infer_schema(source, opts)?;
    tracing::info!(
        source = %source.display(),
        rows = inferred_rows,
        columns = schema.fields().len(),
        "inferred post schema"
    );

    let tmp = partial_path_for(target);
    let rows = match write_store(source, &tmp, schema.clone(), opts, stats) {
        Ok(rows) => rows,
        Err(e) => {
            if let Err(cleanup) = remove_with_backoff(&tmp, 4, 50) {
                tracing::warn!("could not remove partial store {}: {:#}", tmp.display(), cleanup);
            }
            return Err(e);
        }
    };
    promote_file_backoff(&tmp, target)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("{e:#}")))?;

    tracing::info!(target = %target.display(), rows, "post store written");
    Ok(NormalizeOutcome::Created { rows, columns: schema.fields().len() })
}

/// Pass 1: parse every record and infer the store schema.
fn infer_schema(source: &Path, opts: &AnalyticsOptions) -> Result<(SchemaRef, u64)> {
    let mut reader = NdjsonReader::open(source, opts.read_buffer_bytes)?;
    let progress = ProgressScope::bytes(opts.progress, &opts.label_for("Normalize: infer schema"), source_len(source));

    let mut failure: Option<AnalyticsError> = None;
    let mut rows = 0u64;
    let mut buf = String::with_capacity(16 * 1024);
    let records = std::iter::from_fn(|| match reader.next_record(&mut buf, |n| progress.inc(n)) {
        Ok(Some(value)) => {
            rows += 1;
            Some(Ok::<Value, ArrowError>(value))
        }
        Ok(None) => None,
        Err(e) => {
            failure = Some(e);
            None
        }
    });
    let inferred = infer_json_schema_from_iterator(records);
    progress.finish("schema inferred");

    if let Some(e) = failure {
        return Err(e);
    }
    let schema = reconcile_post_schema(&inferred?)?;
    Ok((schema, rows))
}

/// Pass 2: decode records in batches and write them to `tmp`.
fn write_store(
    source: &Path,
    tmp: &Path,
    schema: SchemaRef,
    opts: &AnalyticsOptions,
    stats: &mut ScanStats,
) -> Result<u64> {
    let mut reader = NdjsonReader::open(source, opts.read_buffer_bytes)?;
    let progress = ProgressScope::bytes(opts.progress, &opts.label_for("Normalize: write store"), source_len(source));

    let props = WriterProperties::builder().set_compression(Compression::SNAPPY).build();
    let file = create_with_backoff(tmp, 16, 50)?;
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
    let mut decoder = ReaderBuilder::new(schema)
        .with_batch_size(opts.batch_size)
        .with_coerce_primitive(true)
        .build_decoder()?;

    let mut pending: Vec<Value> = Vec::with_capacity(opts.batch_size);
    let rows = reader.for_each_record(
        |n| progress.inc(n),
        |value| {
            pending.push(value);
            if pending.len() >= opts.batch_size {
                stats.resident(pending.len() as u64);
                flush_pending(&mut decoder, &mut writer, &mut pending)?;
            }
            Ok(())
        },
    )?;
    stats.resident(pending.len() as u64);
    flush_pending(&mut decoder, &mut writer, &mut pending)?;
    writer.close()?;
    stats.scanned(rows);
    progress.finish("store written");
    Ok(rows)
}

fn flush_pending(decoder: &mut Decoder, writer: &mut ArrowWriter<File>, pending: &mut Vec<Value>) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    decoder.serialize(pending.as_slice())?;
    pending.clear();
    if let Some(batch) = decoder.flush()? {
        writer.write(&batch)?;
    }
    Ok(())
}
