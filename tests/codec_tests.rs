//! Dispatch-level codec tests: payloads go through the same
//! `FileFormat` + encode/decode path the blob store uses, minus the
//! network hop.

use arrow::array::{AsArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use eazure::codec::{decode, encode};
use eazure::{EazureError, FileFormat, FormatOptions, Payload};
use serde_json::json;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("eazure=debug")
        .try_init();
}

fn sample_frame() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("count", DataType::Int64, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["alpha", "beta", "gamma", "delta"])),
            Arc::new(Int64Array::from(vec![10, 20, 30, 40])),
        ],
    )
    .unwrap()
}

#[test]
fn tabular_formats_round_trip_through_dispatch() {
    init_tracing();
    let frame = sample_frame();

    for name in ["data.csv", "data.parquet", "data.feather", "data.f"] {
        let format = FileFormat::from_name(name).unwrap();
        let bytes = encode(format, &Payload::Frame(frame.clone()), &FormatOptions::default())
            .unwrap();
        let decoded = decode(format, &bytes, &FormatOptions::default())
            .unwrap()
            .into_frame()
            .unwrap();

        assert_eq!(decoded.num_rows(), 4, "{name}");
        assert_eq!(decoded.num_columns(), 2, "{name}");
        let names = decoded.column(0).as_string::<i32>();
        assert_eq!(names.value(3), "delta", "{name}");
        let counts = decoded.column(1).as_primitive::<Int64Type>();
        assert_eq!(counts.value(0), 10, "{name}");
    }
}

#[test]
fn excel_round_trips_with_float_widening() {
    let frame = sample_frame();
    let format = FileFormat::from_name("report.xlsx").unwrap();
    let bytes = encode(format, &Payload::Frame(frame), &FormatOptions::default()).unwrap();
    let decoded = decode(format, &bytes, &FormatOptions::default())
        .unwrap()
        .into_frame()
        .unwrap();

    assert_eq!(decoded.num_rows(), 4);
    let counts = decoded
        .column(1)
        .as_primitive::<arrow::datatypes::Float64Type>();
    assert_eq!(counts.value(3), 40.0);
}

#[test]
fn json_reads_back_as_a_generic_value() {
    let frame = sample_frame();
    let format = FileFormat::from_name("data.json").unwrap();
    let bytes = encode(format, &Payload::Frame(frame), &FormatOptions::default()).unwrap();

    // Reading .json never yields a frame; callers get the raw value.
    match decode(format, &bytes, &FormatOptions::default()).unwrap() {
        Payload::Value(value) => {
            assert_eq!(value.as_array().unwrap().len(), 4);
            assert_eq!(value[1]["name"], "beta");
        }
        other => panic!("expected a value payload, got {}", other.kind()),
    }
}

#[test]
fn text_and_pickle_round_trip_generic_payloads() {
    let text_format = FileFormat::from_name("notes.txt").unwrap();
    let bytes = encode(
        text_format,
        &Payload::Text("line one".to_string()),
        &FormatOptions::default(),
    )
    .unwrap();
    match decode(text_format, &bytes, &FormatOptions::default()).unwrap() {
        Payload::Text(text) => assert_eq!(text, "line one"),
        other => panic!("expected text, got {}", other.kind()),
    }

    let pickle_format = FileFormat::from_name("state.pkl").unwrap();
    let value = json!({"epoch": 3, "loss": 0.125});
    let bytes = encode(
        pickle_format,
        &Payload::Value(value.clone()),
        &FormatOptions::default(),
    )
    .unwrap();
    match decode(pickle_format, &bytes, &FormatOptions::default()).unwrap() {
        Payload::Value(decoded) => assert_eq!(decoded, value),
        other => panic!("expected a value, got {}", other.kind()),
    }
}

#[test]
fn unsupported_extensions_fail_on_both_paths() {
    for name in ["data.hdf", "data.dta", "data.gbq", "page.html", "plain"] {
        let error = FileFormat::from_name(name).unwrap_err();
        assert!(
            matches!(error, EazureError::UnsupportedFormat { .. }),
            "{name}"
        );
    }
}

#[test]
fn payload_format_mismatches_are_rejected_before_upload() {
    let frame = sample_frame();

    // A frame cannot be pickled
    let error = encode(
        FileFormat::Pickle,
        &Payload::Frame(frame.clone()),
        &FormatOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, EazureError::UnsupportedPayload { .. }));

    // A generic value cannot become a tabular file
    for format in [FileFormat::Csv, FileFormat::Parquet, FileFormat::Feather] {
        let error = encode(
            format,
            &Payload::Value(json!({"a": 1})),
            &FormatOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(error, EazureError::UnsupportedPayload { .. }));
    }

    // And text cannot either
    let error = encode(
        FileFormat::Excel,
        &Payload::Text("hello".to_string()),
        &FormatOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, EazureError::UnsupportedPayload { .. }));
}
