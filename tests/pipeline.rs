mod common;

use common::{TestWorkspace, field_page, numeric_cell, text_cell, uniform_rows};
use factbook_extract::{
    config::PipelineConfig,
    data::Value,
    discovery::{DiscoveryOptions, NameNormalization, discover},
    document::Document,
    error::ExtractError,
    extract::extract,
    pipeline::{PipelineContext, process_category, scrape_catalog},
    catalog::CategoryLink,
    schema::{Schema, ValueKind},
};

fn document(rows: &[(String, Vec<String>)]) -> Document {
    Document::from_markup(&field_page(rows)).expect("parse field page")
}

#[test]
fn sixty_row_page_with_fifty_five_named_cells() {
    let mut rows = uniform_rows(55, 0, &[numeric_cell(Some("Total area"), "1,234 sq km")]);
    rows.extend(uniform_rows(5, 55, &[]));
    let doc = document(&rows);
    assert_eq!(doc.identified_rows().count(), 60);

    let schema = discover(&doc, "Area", &DiscoveryOptions::default()).unwrap();
    assert_eq!(schema, Schema::single("Area", ValueKind::Numeric));

    let dataset = extract(&doc, &schema);
    let values = dataset.field("Area").expect("Area field");
    assert_eq!(values.len(), 55);
    assert!(values.values().all(|v| v.as_number() == Some(1234.0)));
}

#[test]
fn discovery_is_idempotent() {
    let rows = uniform_rows(
        60,
        0,
        &[
            numeric_cell(Some("total"), "10"),
            numeric_cell(Some("land"), "8"),
            numeric_cell(Some("water"), "2"),
        ],
    );
    let doc = document(&rows);
    let options = DiscoveryOptions::default();
    let first = discover(&doc, "Area", &options).unwrap();
    let second = discover(&doc, "Area", &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.field_names(),
        vec!["Area (total)", "Area (land)", "Area (water)"]
    );
}

#[test]
fn zero_qualifying_rows_is_an_empty_schema() {
    let rows = uniform_rows(50, 0, &[numeric_cell(Some("total"), "10")]);
    let err = discover(&document(&rows), "Area", &DiscoveryOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ExtractError::EmptySchema {
            category: "Area".into(),
            threshold: 50
        }
    );
}

#[test]
fn mixed_kinds_name_the_category() {
    let rows = uniform_rows(
        51,
        0,
        &[
            text_cell(Some("name"), "Kabul"),
            numeric_cell(Some("time difference"), "UTC+4.5"),
        ],
    );
    let err = discover(&document(&rows), "Capital", &DiscoveryOptions::default()).unwrap_err();
    match err {
        ExtractError::MixedKindSchema {
            category,
            numeric,
            text,
        } => {
            assert_eq!(category, "Capital");
            assert_eq!(numeric, vec!["time difference".to_string()]);
            assert_eq!(text, vec!["name".to_string()]);
        }
        other => panic!("expected mixed kind error, got {other:?}"),
    }
}

#[test]
fn single_field_collapse_ignores_declared_name() {
    let mut rows = uniform_rows(
        60,
        0,
        &[numeric_cell(Some("total population (2020 est.)"), "36,643,815")],
    );
    rows.extend(uniform_rows(3, 60, &[numeric_cell(Some("note"), "1")]));
    let schema = discover(&document(&rows), "Population", &DiscoveryOptions::default()).unwrap();
    assert_eq!(schema.field_names(), vec!["Population"]);
    assert_eq!(schema.fields[0].subfield, None);
}

#[test]
fn parenthetical_variants_collapse_unless_verbatim() {
    let mut rows = uniform_rows(30, 0, &[numeric_cell(Some("total (2019)"), "1")]);
    rows.extend(uniform_rows(30, 30, &[numeric_cell(Some("total (2020)"), "2")]));
    let mut with_land = rows.clone();
    for (_, cells) in &mut with_land {
        cells.push(numeric_cell(Some("land"), "3"));
    }
    let doc = document(&with_land);

    let truncated = discover(&doc, "Area", &DiscoveryOptions::default()).unwrap();
    assert_eq!(truncated.field_names(), vec!["Area (total)", "Area (land)"]);
    let dataset = extract(&doc, &truncated);
    assert_eq!(dataset.field("Area (total)").map(|v| v.len()), Some(60));
    assert_eq!(dataset.get("Area (total)", "BH"), Some(&Value::Number(2.0)));

    let verbatim = DiscoveryOptions {
        threshold: 20,
        normalization: NameNormalization::Verbatim,
    };
    let schema = discover(&doc, "Area", &verbatim).unwrap();
    assert_eq!(
        schema.field_names(),
        vec!["Area (total (2019))", "Area (land)", "Area (total (2020))"]
    );
    let dataset = extract(&doc, &schema);
    assert_eq!(dataset.get("Area (total (2019))", "AA"), Some(&Value::Number(1.0)));
    assert!(!dataset.contains("Area (total (2019))", "BH"));
}

#[test]
fn text_cells_with_only_labels_become_na() {
    let mut rows = uniform_rows(51, 0, &[text_cell(Some("name"), "Kabul")]);
    rows.push(("ZZ".to_string(), vec![text_cell(Some("name"), "")]));
    let doc = document(&rows);
    let schema = discover(&doc, "Capital", &DiscoveryOptions::default()).unwrap();
    let dataset = extract(&doc, &schema);
    assert_eq!(dataset.get("Capital", "AA"), Some(&Value::Text("Kabul".into())));
    assert_eq!(dataset.get("Capital", "ZZ"), Some(&Value::Text("NA".into())));
}

#[test]
fn failing_category_does_not_stop_the_run() {
    let workspace = TestWorkspace::new();
    let good = workspace.write(
        "fields/279.html",
        &field_page(&uniform_rows(51, 0, &[numeric_cell(None, "652,230 sq km")])),
    );
    let empty = workspace.write("fields/300.html", &field_page(&[]));
    let missing = workspace.path().join("fields/404.html");
    let links = vec![
        CategoryLink {
            name: "Area".into(),
            source: good,
        },
        CategoryLink {
            name: "Broadcast media".into(),
            source: empty,
        },
        CategoryLink {
            name: "Ghost".into(),
            source: missing,
        },
    ];
    let config = PipelineConfig::default();
    let context = PipelineContext {
        config: &config,
        codes: None,
        alternate_dir: None,
        encoding: encoding_rs::UTF_8,
    };
    let report = scrape_catalog(&links, &context);
    assert_eq!(report.succeeded, vec!["Area".to_string()]);
    assert_eq!(report.failed.len(), 2);
    assert!(
        report.failed[0]
            .1
            .downcast_ref::<ExtractError>()
            .is_some_and(|e| matches!(e, ExtractError::EmptySchema { .. }))
    );
    assert_eq!(report.dataset.field("Area").map(|v| v.len()), Some(51));
}

#[test]
fn alternate_source_takes_precedence() {
    let workspace = TestWorkspace::new();
    let page = workspace.write("fields/1.html", &field_page(&[]));
    workspace.write("alt/GDP.txt", "Afghanistan\t$2,000\nAtlantis\t$1\n");
    let codes = factbook_extract::countries::CountryCodes::from_pairs([("Afghanistan", "AF")]);
    let config = PipelineConfig::default();
    let alt_dir = workspace.path().join("alt");
    let context = PipelineContext {
        config: &config,
        codes: Some(&codes),
        alternate_dir: Some(&alt_dir),
        encoding: encoding_rs::UTF_8,
    };
    let dataset = process_category("GDP", &page, &context).unwrap();
    assert_eq!(dataset.get("GDP", "AF"), Some(&Value::Number(2000.0)));
    assert_eq!(dataset.value_count(), 1);
}
