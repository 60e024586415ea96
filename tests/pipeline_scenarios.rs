use chrono::NaiveDate;
use pricewatch::application::diff::SnapshotDiffer;
use pricewatch::application::parsers::{OptionListParser, ProductFeedParser};
use pricewatch::domain::layout::{ColumnSchema, Palette};
use pricewatch::domain::ports::SnapshotStore;
use pricewatch::{
    process, AppConfig, CellValue, ChangeKind, IdentityKey, RunOptions, Snapshot, SourceJob,
    SourceName,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap()
}

fn option_job() -> SourceJob {
    SourceJob {
        name: SourceName("Mamedica".into()),
        location: String::new(),
        schema: ColumnSchema::from_columns(&ColumnSchema::option_list_columns()).unwrap(),
        palette: Palette::default(),
        currency_symbol: "£".into(),
    }
}

fn feed_job() -> SourceJob {
    SourceJob {
        name: SourceName("Montu".into()),
        location: String::new(),
        schema: ColumnSchema::from_columns(&ColumnSchema::product_feed_columns()).unwrap(),
        palette: Palette::default(),
        currency_symbol: "£".into(),
    }
}

fn option_page(values: &[&str]) -> String {
    let options: String = values
        .iter()
        .map(|v| format!(r#"<option value="{v}">{v}</option>"#))
        .collect();
    format!(
        r#"<html><body><div class="repeat-prescription"><select>
           <option value="">Choose an option</option>{options}</select></div></body></html>"#
    )
}

fn snapshot(pairs: &[(&str, &str)]) -> Snapshot {
    pairs
        .iter()
        .map(|(k, v)| (IdentityKey::from_name(k).unwrap(), dec(v)))
        .collect()
}

// ─── Scenarios on the pure core ───

#[test]
fn scenario_a_malformed_dropped_duplicates_collapsed() {
    let raw = option_page(&["Widget A|12.50", "Widget B|bad", "Widget A|12.50"]);
    let out = process(
        &OptionListParser::new(),
        &SnapshotDiffer::new(),
        raw.as_bytes(),
        &Snapshot::new(),
        &option_job(),
        at(),
    )
    .unwrap();

    assert_eq!(out.sheet.rows.len(), 1);
    assert_eq!(out.sheet.rows[0][0], CellValue::text("Widget A"));
    assert_eq!(out.sheet.rows[0][1], CellValue::Number(dec("12.50")));
    assert_eq!(out.rejected.len(), 1);
}

#[test]
fn scenario_b_price_drop_is_highlighted() {
    let raw = option_page(&["Widget A|10.00"]);
    let out = process(
        &OptionListParser::new(),
        &SnapshotDiffer::new(),
        raw.as_bytes(),
        &snapshot(&[("Widget A", "12.50")]),
        &option_job(),
        at(),
    )
    .unwrap();

    assert_eq!(out.outcome.rows[0].annotation.change, ChangeKind::PriceDecreased);
    assert_eq!(out.sheet.rows[0][1], CellValue::text("£12.50 → £10.00"));
    assert_eq!(out.outcome.next_snapshot, snapshot(&[("Widget A", "10.00")]));
}

#[test]
fn scenario_c_potency_from_description() {
    let raw = json!({"products": [{
        "title": "Flower",
        "body_html": "Contains THC 18.5% and CBD 1%",
        "variants": [{"price": "30.00", "available": true}]
    }]})
    .to_string();
    let out = process(
        &ProductFeedParser::with_default_labels().unwrap(),
        &SnapshotDiffer::new(),
        raw.as_bytes(),
        &Snapshot::new(),
        &feed_job(),
        at(),
    )
    .unwrap();

    let row = &out.sheet.rows[0];
    assert_eq!(row[2], CellValue::text("18.5%"));
    assert_eq!(row[3], CellValue::text("1%"));
    assert_eq!(row[4], CellValue::text("Available"));
}

#[test]
fn scenario_d_unavailable_sinks_to_bottom() {
    let raw = json!({"products": [
        {"title": "A", "variants": [{"price": "1.00", "available": false}]},
        {"title": "Z", "variants": [{"price": "1.00", "available": true}]}
    ]})
    .to_string();
    let out = process(
        &ProductFeedParser::with_default_labels().unwrap(),
        &SnapshotDiffer::new(),
        raw.as_bytes(),
        &Snapshot::new(),
        &feed_job(),
        at(),
    )
    .unwrap();

    let names: Vec<_> = out.sheet.rows.iter().map(|r| r[0].display()).collect();
    assert_eq!(names, vec!["Z", "A"]);
}

#[test]
fn rounded_prices_do_not_flap() {
    let raw = option_page(&["A|9.995", "B|9.994997"]);
    let out = process(
        &OptionListParser::new(),
        &SnapshotDiffer::new(),
        raw.as_bytes(),
        &snapshot(&[("A", "10.00"), ("B", "9.99")]),
        &option_job(),
        at(),
    )
    .unwrap();
    assert!(out
        .outcome
        .rows
        .iter()
        .all(|r| r.annotation.change == ChangeKind::None));
}

// ─── End to end through files ───

struct Workspace {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    fn config(&self) -> AppConfig {
        let toml = format!(
            r#"
            [output]
            dir = "{out}"

            [state]
            dir = "{state}"

            [[sources]]
            name = "Mamedica"
            kind = "option_list"
            payload = "{page}"
            page_marker = "repeat-prescription"

            [[sources]]
            name = "Montu"
            kind = "product_feed"
            payload = "{feed}"
            "#,
            out = self.root.join("out").display(),
            state = self.root.join("state").display(),
            page = self.root.join("mamedica.html").display(),
            feed = self.root.join("montu.json").display(),
        );
        AppConfig::from_toml_str(&toml).unwrap()
    }

    fn write(&self, name: &str, content: &str) {
        std::fs::write(self.root.join(name), content).unwrap();
    }

    fn sheet(&self, slug: &str) -> Value {
        let path = self.root.join("out").join(format!("{slug}.json"));
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }
}

#[tokio::test]
async fn two_runs_detect_changes_and_persist_snapshots() {
    let ws = Workspace::new();
    let cfg = ws.config();
    ws.write("mamedica.html", &option_page(&["Widget A|12.50", "Widget B|3.00"]));
    ws.write(
        "montu.json",
        &json!({"products": [
            {"title": "Z", "body_html": "THC 22%", "variants": [{"price": "£40.00", "available": true}]}
        ]})
        .to_string(),
    );

    let first = pricewatch::run(&cfg, &RunOptions::default()).await.unwrap();
    assert_eq!(first.len(), 2);
    for (_, result) in &first {
        assert_eq!(result.as_ref().unwrap().summary.unchanged, 0);
    }

    ws.write("mamedica.html", &option_page(&["Widget A|10.00"]));
    let second = pricewatch::run(&cfg, &RunOptions::default()).await.unwrap();

    let mamedica = second[0].1.as_ref().unwrap();
    assert_eq!(mamedica.summary.decreased, 1);
    assert_eq!(mamedica.summary.removed, vec![IdentityKey::from_name("Widget B").unwrap()]);
    let montu = second[1].1.as_ref().unwrap();
    assert_eq!(montu.summary.unchanged, 1);

    let sheet = ws.sheet("mamedica");
    assert_eq!(sheet["values"][1], json!(["Widget A", "£12.50 → £10.00"]));
    assert!(ws.root.join("out").join("montu.html").exists());

    let store = pricewatch::infrastructure::snapshot_store::JsonSnapshotStore::new(ws.root.join("state"));
    assert_eq!(
        store.load(&SourceName("Mamedica".into())).unwrap(),
        snapshot(&[("Widget A", "10.00")])
    );
}

#[tokio::test]
async fn broken_source_does_not_block_the_other() {
    let ws = Workspace::new();
    let cfg = ws.config();
    // marker missing: the page was a login wall
    ws.write("mamedica.html", "<html><body>Please sign in</body></html>");
    ws.write(
        "montu.json",
        &json!({"products": [{"title": "Z", "variants": [{"price": 5}]}]}).to_string(),
    );

    let results = pricewatch::run(&cfg, &RunOptions::default()).await.unwrap();
    let err = results[0].1.as_ref().unwrap_err();
    assert_eq!(err.kind(), "batch");
    assert!(results[1].1.is_ok());
    assert!(!ws.root.join("out").join("mamedica.json").exists());
    assert!(!ws.root.join("state").join("mamedica.snapshot.json").exists());
}

#[tokio::test]
async fn dry_run_and_source_filter() {
    let ws = Workspace::new();
    let cfg = ws.config();
    ws.write("mamedica.html", &option_page(&["A|1.00"]));

    let opts = RunOptions {
        dry_run: true,
        source: Some("Mamedica".into()),
        format: "json".into(),
    };
    let results = pricewatch::run(&cfg, &opts).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].1.as_ref().unwrap().dry_run);
    assert!(!ws.root.join("out").exists());

    let unknown = RunOptions {
        source: Some("Nope".into()),
        ..Default::default()
    };
    assert!(pricewatch::run(&cfg, &unknown).await.is_err());
}

#[tokio::test]
async fn missing_payload_is_reported_per_source() {
    let ws = Workspace::new();
    let cfg = ws.config();
    ws.write("mamedica.html", &option_page(&["A|1.00"]));

    let result = pricewatch::run_source(&cfg, "Montu", false).await.unwrap();
    assert_eq!(result.unwrap_err().kind(), "batch");
}

#[tokio::test]
async fn corrupt_snapshot_file_recovers_as_first_run() {
    let ws = Workspace::new();
    let cfg = ws.config();
    ws.write("mamedica.html", &option_page(&["Widget A|12.50"]));
    pricewatch::run_source(&cfg, "Mamedica", false).await.unwrap().unwrap();

    let path = ws.root.join("state").join("mamedica.snapshot.json");
    std::fs::write(&path, "{ not json").unwrap();
    ws.write("mamedica.html", &option_page(&["Widget A|10.00"]));

    let report = pricewatch::run_source(&cfg, "Mamedica", false).await.unwrap().unwrap();
    assert_eq!(report.summary.new, 1);
    assert_eq!(report.summary.decreased, 0);
    assert_eq!(ws.sheet("mamedica")["values"][1], json!(["Widget A", 10.0]));

    let store = pricewatch::infrastructure::snapshot_store::JsonSnapshotStore::new(ws.root.join("state"));
    assert_eq!(
        store.load(&SourceName("Mamedica".into())).unwrap(),
        snapshot(&[("Widget A", "10.00")])
    );
}
