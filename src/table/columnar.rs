use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{io::Write, sync::Arc};

use super::Table;

/// Build a single Arrow batch with one nullable Utf8 column per table column.
/// No type inference: every cell stays the text it was in the source CSV.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = (0..table.num_columns())
        .map(|i| {
            let arr: StringArray = table
                .rows()
                .iter()
                .map(|row| row[i].as_deref())
                .collect();
            Arc::new(arr) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(schema, columns).context("building master record batch")
}

/// Write `table` as a Brotli-compressed Parquet file into `sink`, returning the sink.
pub fn write_parquet<W: Write + Send>(table: &Table, sink: W) -> Result<W> {
    let batch = to_record_batch(table)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .set_dictionary_enabled(true)
        .build();

    let mut writer = ArrowWriter::try_new(sink, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(&batch).context("writing batch to parquet")?;
    writer.into_inner().context("closing parquet writer")
}
