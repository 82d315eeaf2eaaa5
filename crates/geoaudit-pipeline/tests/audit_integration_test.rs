use geo::{polygon, Geometry, LineString, MultiPolygon, Polygon};
use geoaudit_core::config::AuditSettings;
use geoaudit_core::formats::{ShapefileReader, ShapefileWriter};
use geoaudit_core::models::{
    AttributeValue, ErrorTag, Feature, FieldDef, FieldKind, FileStatus, Layer,
};
use geoaudit_core::ports::{Feedback, NoopRegistry, TracingFeedback};
use geoaudit_core::AuditError;
use geoaudit_geo::GeoEngine;
use geoaudit_pipeline::{Auditor, QmlStyleRegistry, ShapefileStore};
use proptest::prelude::*;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingFeedback {
    infos: RefCell<Vec<String>>,
    warnings: RefCell<Vec<String>>,
    progress: RefCell<Vec<(usize, usize)>>,
}

impl Feedback for RecordingFeedback {
    fn info(&self, message: &str) {
        self.infos.borrow_mut().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn progress(&self, done: usize, total: usize) {
        self.progress.borrow_mut().push((done, total));
    }
}

fn auditor() -> Auditor<GeoEngine, ShapefileStore, QmlStyleRegistry> {
    Auditor::new(GeoEngine::new(), ShapefileStore, QmlStyleRegistry, AuditSettings::default())
}

fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
    ]
}

fn write_layer(path: &Path, geometries: Vec<Geometry<f64>>) {
    let mut layer = Layer::new(path.file_stem().unwrap().to_str().unwrap());
    layer.fields.push(FieldDef::text("NAME"));
    for (i, geometry) in geometries.into_iter().enumerate() {
        layer.features.push(Feature::new(
            i as u64,
            Some(geometry),
            vec![AttributeValue::Text(format!("f{}", i))],
        ));
    }
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    ShapefileWriter.write(&layer, path).unwrap();
}

fn write_table(path: &Path, fields: Vec<FieldDef>, rows: Vec<(Polygon<f64>, Vec<AttributeValue>)>) {
    let mut layer = Layer::new(path.file_stem().unwrap().to_str().unwrap());
    layer.fields = fields;
    for (i, (polygon, attributes)) in rows.into_iter().enumerate() {
        layer.features.push(Feature::new(i as u64, Some(Geometry::Polygon(polygon)), attributes));
    }
    ShapefileWriter.write(&layer, path).unwrap();
}

fn schema(layer: &Layer) -> Vec<(String, FieldKind)> {
    layer.fields.iter().map(|f| (f.name.clone(), f.kind)).collect()
}

fn csv_rows(output: &Path) -> Vec<Vec<String>> {
    let text = fs::read_to_string(output.join("errors_summary.csv")).unwrap();
    text.lines()
        .map(|line| line.split(',').map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn test_empty_input_writes_nothing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("audit");

    let err = auditor().run(input.path(), &out, &RecordingFeedback::default()).unwrap_err();
    assert!(matches!(err, AuditError::NoInput { .. }));
    assert!(!out.exists());
}

#[test]
fn test_clean_layer_writes_no_report() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(
        &input.path().join("parcels.shp"),
        vec![
            Geometry::Polygon(square(0.0, 0.0, 1.0)),
            Geometry::Polygon(square(5.0, 0.0, 1.0)),
        ],
    );

    let feedback = RecordingFeedback::default();
    let outcome = auditor().run(input.path(), output.path(), &feedback).unwrap();

    assert!(!outcome.has_errors());
    assert_eq!(outcome.total_features, 2);
    assert!(output.path().join("snapped/parcels_snapped.shp").exists());
    assert!(!output.path().join("errors_summary.csv").exists());
    assert!(!output.path().join("errors").exists());
    assert!(feedback.infos.borrow().iter().any(|m| m == "No errors found"));
}

#[test]
fn test_single_overlap_reported() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(
        &input.path().join("parcels.shp"),
        vec![
            Geometry::Polygon(square(0.0, 0.0, 2.0)),
            Geometry::Polygon(square(1.0, 1.0, 2.0)),
        ],
    );

    let feedback = RecordingFeedback::default();
    let outcome = auditor().run(input.path(), output.path(), &feedback).unwrap();
    let summary = outcome.summary.as_ref().unwrap();
    assert_eq!(summary.counts.len(), 1);
    assert_eq!(summary.counts.get(ErrorTag::Overlap), 1);
    assert!(feedback.infos.borrow().iter().any(|m| m.ends_with("G001 Overlap (1 in run)")));

    let rows = csv_rows(output.path());
    assert_eq!(
        rows[0],
        vec!["code", "total_features", "total_errors", "category_count", "ratio", "start_time", "end_time"]
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][..5], &["G001", "2", "1", "1", "100.0%"]);

    let merged = output.path().join("errors/merged_errors.shp");
    assert_eq!(outcome.merged_paths, vec![merged.clone()]);
    assert!(merged.exists());
    let qml = fs::read_to_string(output.path().join("errors/merged_errors.qml")).unwrap();
    assert!(qml.contains("Overlap"));
}

#[test]
fn test_original_layer_checks() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
    let two_parts = MultiPolygon::new(vec![square(10.0, 0.0, 1.0), square(20.0, 0.0, 1.0)]);
    write_layer(
        &input.path().join("zones.shp"),
        vec![
            Geometry::Polygon(bowtie),
            Geometry::MultiPolygon(two_parts),
            Geometry::Polygon(square(30.0, 0.0, 0.001)),
        ],
    );
    write_layer(
        &input.path().join("roads.shp"),
        vec![
            Geometry::LineString(LineString::from(vec![(0.0, 0.0), (0.005, 0.0)])),
            Geometry::LineString(LineString::from(vec![(0.0, 5.0), (10.0, 5.0)])),
        ],
    );

    let outcome = auditor().run(input.path(), output.path(), &RecordingFeedback::default()).unwrap();
    let summary = outcome.summary.as_ref().unwrap();

    assert_eq!(summary.counts.get(ErrorTag::ShortSegment), 2);
    assert_eq!(summary.counts.get(ErrorTag::SelfIntersection), 1);
    assert_eq!(summary.counts.get(ErrorTag::MultiPart), 1);
    assert_eq!(summary.total_features, 5);

    // roads sorts first, so lines take the plain name
    assert_eq!(
        outcome.merged_paths,
        vec![
            output.path().join("errors/merged_errors.shp"),
            output.path().join("errors/merged_errors_polygon.shp"),
        ]
    );
    assert!(output.path().join("errors/merged_errors_polygon.qml").exists());

    let rows = csv_rows(output.path());
    let codes: Vec<&str> = rows[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(codes, vec!["G002", "G003", "G006"]);
    assert!(rows[1..].iter().all(|r| r[1] == "5" && r[2] == "4"));
}

#[test]
fn test_unreadable_file_is_skipped() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(
        &input.path().join("a_parcels.shp"),
        vec![Geometry::Polygon(square(0.0, 0.0, 2.0)), Geometry::Polygon(square(1.0, 1.0, 2.0))],
    );
    write_layer(&input.path().join("b_broken.shp"), vec![Geometry::Polygon(square(0.0, 0.0, 1.0))]);
    fs::remove_file(input.path().join("b_broken.dbf")).unwrap();

    let feedback = RecordingFeedback::default();
    let outcome = auditor().run(input.path(), output.path(), &feedback).unwrap();

    assert_eq!(outcome.skipped(), 1);
    assert!(matches!(outcome.files[1].status, FileStatus::Skipped { .. }));
    assert_eq!(feedback.warnings.borrow().len(), 1);
    assert_eq!(*feedback.progress.borrow(), vec![(1, 2), (2, 2)]);
    assert_eq!(outcome.total_features, 2);
    assert!(output.path().join("errors_summary.csv").exists());
}

#[test]
fn test_rerun_overwrites_outputs() {
    let input = TempDir::new().unwrap();
    let output = input.path().join("out");
    write_layer(
        &input.path().join("parcels.shp"),
        vec![Geometry::Polygon(square(0.0, 0.0, 2.0)), Geometry::Polygon(square(1.0, 1.0, 2.0))],
    );

    let first = auditor().run(input.path(), &output, &RecordingFeedback::default()).unwrap();
    let second = auditor().run(input.path(), &output, &RecordingFeedback::default()).unwrap();

    // the output folder sits inside the input folder and is not rescanned
    assert_eq!(second.files.len(), 1);
    assert_eq!(first.summary.unwrap().counts, second.summary.unwrap().counts);
    assert_eq!(csv_rows(&output).len(), 2);
}

#[test]
fn test_same_stem_collision_warns() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(&input.path().join("a/parcels.shp"), vec![Geometry::Polygon(square(0.0, 0.0, 1.0))]);
    write_layer(&input.path().join("b/parcels.shp"), vec![Geometry::Polygon(square(0.0, 0.0, 1.0))]);

    let feedback = RecordingFeedback::default();
    auditor().run(input.path(), output.path(), &feedback).unwrap();

    let warnings = feedback.warnings.borrow();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("parcels_snapped.shp"));
}

#[test]
fn test_unstyled_run_writes_no_sidecar() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(
        &input.path().join("parcels.shp"),
        vec![Geometry::Polygon(square(0.0, 0.0, 2.0)), Geometry::Polygon(square(1.0, 1.0, 2.0))],
    );

    let settings = AuditSettings { apply_style: false, ..AuditSettings::default() };
    let auditor = Auditor::new(GeoEngine::new(), ShapefileStore, QmlStyleRegistry, settings);
    auditor.run(input.path(), output.path(), &RecordingFeedback::default()).unwrap();

    assert!(output.path().join("errors/merged_errors.shp").exists());
    assert!(!output.path().join("errors/merged_errors.qml").exists());
}

#[test]
fn test_noop_registry_leaves_no_sidecar() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(
        &input.path().join("parcels.shp"),
        vec![Geometry::Polygon(square(0.0, 0.0, 2.0)), Geometry::Polygon(square(1.0, 1.0, 2.0))],
    );

    let auditor = Auditor::new(GeoEngine::new(), ShapefileStore, NoopRegistry, AuditSettings::default());
    let outcome = auditor.run(input.path(), output.path(), &TracingFeedback).unwrap();

    assert!(outcome.has_errors());
    assert!(output.path().join("errors/merged_errors.shp").exists());
    assert!(!output.path().join("errors/merged_errors.qml").exists());
}

#[test]
fn test_schema_survives_snap_and_merge() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let fields = vec![FieldDef::integer("CODE"), FieldDef::text("ZNAME"), FieldDef::text("ANAME")];
    write_table(
        &input.path().join("zones.shp"),
        fields,
        vec![
            (
                square(0.0, 0.0, 2.0),
                vec![AttributeValue::Null, AttributeValue::Text("north".to_string()), AttributeValue::Null],
            ),
            (
                square(1.0, 1.0, 2.0),
                vec![
                    AttributeValue::Integer(4),
                    AttributeValue::Text("south".to_string()),
                    AttributeValue::Text("x".to_string()),
                ],
            ),
        ],
    );

    auditor().run(input.path(), output.path(), &RecordingFeedback::default()).unwrap();

    let expected = vec![
        ("CODE".to_string(), FieldKind::Integer),
        ("ZNAME".to_string(), FieldKind::Text),
        ("ANAME".to_string(), FieldKind::Text),
    ];
    let snapped = ShapefileReader.read(&output.path().join("snapped/zones_snapped.shp"), "zones").unwrap();
    assert_eq!(schema(&snapped), expected);
    assert_eq!(snapped.features[1].attributes[0], AttributeValue::Integer(4));

    let merged = ShapefileReader
        .read(&output.path().join("errors/merged_errors.shp"), "merged_errors")
        .unwrap();
    assert_eq!(schema(&merged)[..3], expected[..]);
}

#[test]
fn test_zero_feature_file_is_processed() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_layer(&input.path().join("empty.shp"), vec![]);

    let feedback = RecordingFeedback::default();
    let outcome = auditor().run(input.path(), output.path(), &feedback).unwrap();

    assert!(!outcome.has_errors());
    assert_eq!(outcome.total_features, 0);
    assert!(matches!(outcome.files[0].status, FileStatus::Processed { features: 0, flagged: 0, .. }));
    assert!(output.path().join("snapped/empty_snapped.shp").exists());
    assert!(feedback.warnings.borrow().is_empty());
}

#[test]
fn test_error_column_differing_in_case_is_reused() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_table(
        &input.path().join("parcels.shp"),
        vec![FieldDef::text("err_type")],
        vec![
            (square(0.0, 0.0, 2.0), vec![AttributeValue::Text("old".to_string())]),
            (square(1.0, 1.0, 2.0), vec![AttributeValue::Text("old".to_string())]),
        ],
    );

    auditor().run(input.path(), output.path(), &RecordingFeedback::default()).unwrap();

    let merged = ShapefileReader
        .read(&output.path().join("errors/merged_errors.shp"), "merged_errors")
        .unwrap();
    let names: Vec<&str> = merged.fields.iter().map(|f| f.name.as_str()).collect();
    assert!(names.contains(&"ERR_TYPE"));
    assert!(!names.iter().any(|n| *n == "err_type" || n.starts_with("ERR_TYPE_")));
    assert_eq!(
        merged.attribute(&merged.features[0], "ERR_TYPE"),
        Some(&AttributeValue::Text("Overlap".to_string()))
    );

    let qml = fs::read_to_string(output.path().join("errors/merged_errors.qml")).unwrap();
    assert!(qml.contains("attr=\"ERR_TYPE\""));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_csv_counts_sum_to_total(
        squares in proptest::collection::vec((0u8..6, 0u8..6, 1u8..4), 1..6)
    ) {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let geometries = squares
            .into_iter()
            .map(|(x, y, size)| Geometry::Polygon(square(x as f64, y as f64, size as f64)))
            .collect();
        write_layer(&input.path().join("grid.shp"), geometries);

        let outcome = auditor().run(input.path(), output.path(), &RecordingFeedback::default()).unwrap();
        if let Some(summary) = outcome.summary {
            let rows = csv_rows(output.path());
            let sum: usize = rows[1..].iter().map(|r| r[3].parse::<usize>().unwrap()).sum();
            prop_assert_eq!(sum, summary.total_errors());
            prop_assert!(rows[1..].iter().all(|r| r[2].parse::<usize>().unwrap() == sum));
        } else {
            prop_assert!(!output.path().join("errors_summary.csv").exists());
        }
    }
}
