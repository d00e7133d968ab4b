//! Tabular codecs
//!
//! Each function moves a `RecordBatch` in or out of an in-memory byte
//! buffer; nothing here touches the filesystem or the network. Feather is
//! the Arrow IPC file format, so its codec is the IPC reader/writer pair.

use crate::codec::{CsvOptions, ExcelOptions};
use crate::error::{EazureError, Result};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::json::ArrayWriter;
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto_from_rs, Data, Reader as CalamineReader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use std::sync::Arc;

/// Gather a reader's batches into a single `RecordBatch`.
fn collect_batches<I>(schema: SchemaRef, batches: I) -> Result<RecordBatch>
where
    I: IntoIterator<Item = std::result::Result<RecordBatch, ArrowError>>,
{
    let batches = batches
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(concat_batches(&schema, &batches)?)
}

pub fn decode_csv(bytes: &[u8], options: &CsvOptions) -> Result<RecordBatch> {
    let format = Format::default()
        .with_header(options.header)
        .with_delimiter(options.delimiter);
    let (schema, _) = format.infer_schema(Cursor::new(bytes), None)?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(Cursor::new(bytes))?;
    collect_batches(schema, reader)
}

pub fn encode_csv(batch: &RecordBatch, options: &CsvOptions) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut writer = WriterBuilder::new()
        .with_header(options.header)
        .with_delimiter(options.delimiter)
        .build(&mut buffer);
    writer.write(batch)?;
    drop(writer);
    Ok(buffer)
}

pub fn decode_parquet(bytes: &[u8]) -> Result<RecordBatch> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::copy_from_slice(bytes))?
        .build()?;
    let schema = arrow::array::RecordBatchReader::schema(&reader);
    collect_batches(schema, reader)
}

pub fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>> {
    let properties = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(properties))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buffer)
}

pub fn decode_feather(bytes: &[u8]) -> Result<RecordBatch> {
    let reader = FileReader::try_new(Cursor::new(bytes), None)?;
    let schema = reader.schema();
    collect_batches(schema, reader)
}

pub fn encode_feather(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut writer = FileWriter::try_new(Vec::new(), &batch.schema())?;
    writer.write(batch)?;
    writer.finish()?;
    Ok(writer.into_inner()?)
}

/// Row-oriented JSON (an array of objects), matching what the table layer
/// round-trips through the service.
pub fn encode_json(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut writer = ArrayWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    Ok(writer.into_inner())
}

pub fn decode_excel(bytes: &[u8], options: &ExcelOptions) -> Result<RecordBatch> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet = match &options.sheet {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| EazureError::serialization("Workbook contains no worksheets"))?,
    };
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => {
            return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
        }
    };
    let body: Vec<&[Data]> = rows.collect();

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        let (data_type, array) = column_from_cells(&body, index);
        fields.push(Field::new(header, data_type, true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Infer one column from the worksheet body: numeric and boolean columns
/// keep their type, everything else decodes as text. Empty cells are null.
fn column_from_cells(body: &[&[Data]], index: usize) -> (DataType, ArrayRef) {
    let cells: Vec<&Data> = body
        .iter()
        .map(|row| row.get(index).unwrap_or(&Data::Empty))
        .collect();

    let non_empty = cells.iter().filter(|c| !matches!(c, Data::Empty));
    let all_numeric = non_empty
        .clone()
        .all(|c| matches!(c, Data::Float(_) | Data::Int(_)));
    let all_boolean = non_empty.clone().all(|c| matches!(c, Data::Bool(_)));
    let any_value = non_empty.count() > 0;

    if any_value && all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Float(v) => Some(*v),
                Data::Int(v) => Some(*v as f64),
                _ => None,
            })
            .collect();
        return (DataType::Float64, Arc::new(Float64Array::from(values)));
    }

    if any_value && all_boolean {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(v) => Some(*v),
                _ => None,
            })
            .collect();
        return (DataType::Boolean, Arc::new(BooleanArray::from(values)));
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| match c {
            Data::Empty => None,
            other => Some(cell_to_string(other)),
        })
        .collect();
    (DataType::Utf8, Arc::new(StringArray::from(values)))
}

pub fn encode_excel(batch: &RecordBatch, options: &ExcelOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = &options.sheet {
        worksheet.set_name(name)?;
    }

    let schema = batch.schema();
    for (col, field) in schema.fields().iter().enumerate() {
        worksheet.write_string(0, col as u16, field.name())?;
    }

    for (col, field) in schema.fields().iter().enumerate() {
        let column = batch.column(col);
        match field.data_type() {
            DataType::Boolean => {
                let values = column.as_boolean();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_boolean(row as u32 + 1, col as u16, values.value(row))?;
                    }
                }
            }
            data_type if data_type.is_numeric() => {
                let values = cast(column, &DataType::Float64)?;
                let values = values.as_primitive::<Float64Type>();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_number(row as u32 + 1, col as u16, values.value(row))?;
                    }
                }
            }
            _ => {
                let values = cast(column, &DataType::Utf8)?;
                let values = values.as_string::<i32>();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_string(row as u32 + 1, col as u16, values.value(row))?;
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
