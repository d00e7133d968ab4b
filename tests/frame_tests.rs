//! End-to-end shape tests on the in-memory half of the blob pipeline:
//! write/read, append, and filter exactly as the spec's worked example,
//! plus key-helper behavior on realistic frames.

use arrow::array::{Array, AsArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use eazure::codec::{decode, encode};
use eazure::frame::{concat_frames, dedup_rows, filter_rows};
use eazure::table::{add_keys, frame_to_entities};
use eazure::{ColumnFilter, FileFormat, FormatOptions, KeySpec, Payload};
use std::sync::Arc;

fn frame(a: Vec<i64>, b: Vec<&str>) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int64, false),
        Field::new("b", DataType::Utf8, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(a)),
            Arc::new(StringArray::from(b)),
        ],
    )
    .unwrap()
}

fn csv_round_trip(batch: &RecordBatch) -> RecordBatch {
    let options = FormatOptions::default();
    let format = FileFormat::from_name("example.csv").unwrap();
    let bytes = encode(format, &Payload::Frame(batch.clone()), &options).unwrap();
    decode(format, &bytes, &options).unwrap().into_frame().unwrap()
}

#[test]
fn write_read_append_filter_shapes_match_the_worked_example() {
    // Write a 5-row, 2-column dataset and read it back
    let initial = frame(vec![1, 2, 3, 4, 5], vec!["v", "w", "x", "y", "z"]);
    let stored = csv_round_trip(&initial);
    assert_eq!(stored.num_rows(), 5);
    assert_eq!(stored.num_columns(), 2);
    assert_eq!(stored.column(1).as_string::<i32>().value(4), "z");

    // Append 3 more rows: existing rows first, 8 rows total
    let extra = frame(vec![9, 2, 9], vec!["p", "q", "r"]);
    let appended = csv_round_trip(&concat_frames(&stored, &extra).unwrap());
    assert_eq!(appended.num_rows(), 8);
    assert_eq!(appended.column(1).as_string::<i32>().value(0), "v");
    assert_eq!(appended.column(1).as_string::<i32>().value(7), "r");

    // Filter on a ∈ {1, 2}: 3 of the 8 rows match, in original order
    let filters = vec![ColumnFilter::new("a", vec![1i64.into(), 2i64.into()])];
    let filtered = filter_rows(&appended, &filters).unwrap();
    assert_eq!(filtered.num_rows(), 3);
    let survivors: Vec<&str> = {
        let labels = filtered.column(1).as_string::<i32>();
        (0..labels.len()).map(|i| labels.value(i)).collect()
    };
    assert_eq!(survivors, vec!["v", "w", "q"]);

    // Re-encoding an empty filter result still produces a writable frame
    let none = filter_rows(&appended, &[ColumnFilter::new("a", vec![77i64.into()])]).unwrap();
    let empty = csv_round_trip(&none);
    assert_eq!(empty.num_rows(), 0);
}

#[test]
fn append_with_id_columns_drops_later_duplicates() {
    let existing = frame(vec![1, 2, 3], vec!["a", "b", "c"]);
    let incoming = frame(vec![2, 4], vec!["dup", "d"]);

    let combined = concat_frames(&existing, &incoming).unwrap();
    let deduped = dedup_rows(&combined, &["a".to_string()]).unwrap();

    assert_eq!(deduped.num_rows(), 4);
    let labels = deduped.column(1).as_string::<i32>();
    let collected: Vec<&str> = (0..labels.len()).map(|i| labels.value(i)).collect();
    assert_eq!(collected, vec!["a", "b", "c", "d"]);
}

#[test]
fn append_to_a_mismatched_schema_fails() {
    let existing = frame(vec![1], vec!["a"]);
    let schema = Arc::new(Schema::new(vec![Field::new("other", DataType::Int64, false)]));
    let incoming =
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![9]))]).unwrap();

    assert!(concat_frames(&existing, &incoming).is_err());
}

#[test]
fn keyed_frames_survive_a_csv_round_trip_and_convert_to_entities() {
    let batch = frame(vec![1, 2, 3, 4, 5], vec!["v", "w", "x", "y", "z"]);
    let keyed = add_keys(&batch, &KeySpec::literal("batch-2024")).unwrap();
    let stored = csv_round_trip(&keyed);

    let entities = frame_to_entities(&stored).unwrap();
    assert_eq!(entities.len(), 5);
    assert_eq!(entities[0].partition_key, "batch-2024");
    assert_eq!(entities[0].row_key, "batch-2024-0");
    assert_eq!(entities[4].row_key, "batch-2024-4");
}

#[test]
fn key_helper_output_feeds_straight_into_entity_conversion() {
    let batch = frame(vec![10, 20], vec!["m", "n"]);
    let keyed = add_keys(&batch, &KeySpec::from_columns("b", "a")).unwrap();

    let entities = frame_to_entities(&keyed).unwrap();
    assert_eq!(entities[0].partition_key, "m");
    assert_eq!(entities[0].row_key, "10");
    assert_eq!(
        entities[1].property("a"),
        Some(&serde_json::json!(20))
    );
}
