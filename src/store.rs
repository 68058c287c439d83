//! Read side of the post store: open a Parquet file, read pruned column
//! batches, or walk rows one at a time.

use crate::date::TweetDate;
use crate::error::{AnalyticsError, Result};
use crate::schema::{CONTENT_FIELD, DATE_FIELD, USERNAME_FIELD, USER_FIELD};
use crate::util::open_with_backoff;
use arrow::array::{Array, ArrayRef, AsArray, StringArray, StructArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field as RowField;
use parquet::schema::types::{SchemaDescriptor, Type};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Post attributes a query can ask the store for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostColumn {
    /// Raw `date` timestamp, exposed as `tweet_date`.
    Date,
    /// `user.username`.
    Username,
    /// `content`.
    Content,
}

impl PostColumn {
    fn leaf_path(self) -> &'static [&'static str] {
        match self {
            PostColumn::Date => &[DATE_FIELD],
            PostColumn::Username => &[USER_FIELD, USERNAME_FIELD],
            PostColumn::Content => &[CONTENT_FIELD],
        }
    }

    fn label(self) -> &'static str {
        match self {
            PostColumn::Date => "date",
            PostColumn::Username => "user.username",
            PostColumn::Content => "content",
        }
    }
}

/// Handle to a normalized post store. Cheap to open; every read opens its own
/// file handle, so independent queries never share reader state.
#[derive(Clone, Debug)]
pub struct PostStore {
    path: PathBuf,
    num_rows: u64,
    columns: Vec<String>,
}

impl PostStore {
    /// Open and validate the store footer. Fails with `StoreUnavailable` when the
    /// path is missing or not a readable Parquet file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalyticsError::store_unavailable(path, "no such file"));
        }
        let reader = open_reader(path)?;
        let meta = reader.metadata().file_metadata();
        let num_rows = meta.num_rows().max(0) as u64;
        let columns = meta.schema().get_fields().iter().map(|f| f.name().to_string()).collect();
        tracing::debug!(path = %path.display(), rows = num_rows, "opened post store");
        Ok(Self { path: path.to_path_buf(), num_rows, columns })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    /// Top-level field names, in schema order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Column-pruned batch read: only the leaves backing `columns` are decoded.
    pub fn batches(&self, columns: &[PostColumn], batch_size: usize) -> Result<PostBatches> {
        let file = self.open_file()?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| AnalyticsError::store_unavailable(&self.path, e))?;
        let mut leaves = Vec::with_capacity(columns.len());
        for &col in columns {
            leaves.push(self.leaf_index(builder.parquet_schema(), col)?);
        }
        let mask = ProjectionMask::leaves(builder.parquet_schema(), leaves);
        let inner = builder.with_projection(mask).with_batch_size(batch_size.max(1)).build()?;
        Ok(PostBatches { inner })
    }

    /// Row cursor over `content`: exactly one row is materialized per callback.
    /// Returns the number of rows visited.
    pub fn for_each_content_row(&self, mut on_row: impl FnMut(Option<&str>) -> Result<()>) -> Result<u64> {
        let reader = open_reader(&self.path)?;
        let root = reader.metadata().file_metadata().schema();
        let content = root
            .get_fields()
            .iter()
            .find(|f| f.name() == CONTENT_FIELD)
            .cloned()
            .ok_or_else(|| AnalyticsError::store_unavailable(&self.path, "missing column content"))?;
        let projection = Type::group_type_builder(root.name()).with_fields(vec![content]).build()?;

        let mut visited = 0u64;
        for row in reader.get_row_iter(Some(projection))? {
            let row = row?;
            let text = row.get_column_iter().find_map(|(_, field)| match field {
                RowField::Str(s) => Some(s.as_str()),
                _ => None,
            });
            on_row(text)?;
            visited += 1;
        }
        Ok(visited)
    }

    fn open_file(&self) -> Result<File> {
        open_with_backoff(&self.path, 16, 50).map_err(|e| AnalyticsError::store_unavailable(&self.path, e))
    }

    fn leaf_index(&self, schema: &SchemaDescriptor, col: PostColumn) -> Result<usize> {
        let want = col.leaf_path();
        schema
            .columns()
            .iter()
            .position(|c| c.path().parts() == want)
            .ok_or_else(|| AnalyticsError::store_unavailable(&self.path, format!("missing column {}", col.label())))
    }
}

fn open_reader(path: &Path) -> Result<SerializedFileReader<File>> {
    let file = open_with_backoff(path, 16, 50).map_err(|e| AnalyticsError::store_unavailable(path, e))?;
    SerializedFileReader::new(file).map_err(|e| AnalyticsError::store_unavailable(path, e))
}

/// Iterator of pruned batches, see [`PostStore::batches`].
pub struct PostBatches {
    inner: ParquetRecordBatchReader,
}

impl Iterator for PostBatches {
    type Item = Result<PostBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(batch) => Some(PostBatch::from_record_batch(&batch)),
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// One decoded batch with typed, null-aware accessors for the post attributes.
/// Columns that were not requested read as null.
pub struct PostBatch {
    rows: usize,
    dates: Option<StringArray>,
    users: Option<StructArray>,
    usernames: Option<StringArray>,
    contents: Option<StringArray>,
}

impl PostBatch {
    fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let dates = batch.column_by_name(DATE_FIELD).map(utf8).transpose()?;
        let contents = batch.column_by_name(CONTENT_FIELD).map(utf8).transpose()?;
        let users = batch.column_by_name(USER_FIELD).and_then(|c| c.as_struct_opt()).cloned();
        let usernames = users
            .as_ref()
            .and_then(|u| u.column_by_name(USERNAME_FIELD))
            .map(utf8)
            .transpose()?;
        Ok(Self { rows: batch.num_rows(), dates, users, usernames, contents })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Calendar day of row `i`; `None` when `date` is null or not `YYYY-MM-DD…`.
    pub fn tweet_date(&self, i: usize) -> Option<TweetDate> {
        let dates = self.dates.as_ref()?;
        if dates.is_null(i) {
            return None;
        }
        TweetDate::from_timestamp_prefix(dates.value(i))
    }

    pub fn username(&self, i: usize) -> Option<&str> {
        let users = self.users.as_ref()?;
        let names = self.usernames.as_ref()?;
        if users.is_null(i) || names.is_null(i) {
            return None;
        }
        Some(names.value(i))
    }

    pub fn content(&self, i: usize) -> Option<&str> {
        let contents = self.contents.as_ref()?;
        if contents.is_null(i) {
            return None;
        }
        Some(contents.value(i))
    }

    /// The whole `content` column of this batch, if it was requested.
    pub(crate) fn content_array(&self) -> Option<&StringArray> {
        self.contents.as_ref()
    }
}

/// View any string-like (or all-null) column as `Utf8`.
fn utf8(array: &ArrayRef) -> Result<StringArray> {
    let cast = cast(array.as_ref(), &DataType::Utf8)?;
    cast.as_string_opt::<i32>()
        .cloned()
        .ok_or_else(|| arrow::error::ArrowError::CastError("expected a Utf8 column".into()).into())
}
