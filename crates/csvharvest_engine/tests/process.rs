use std::fs;
use std::sync::{Arc, Mutex};

use csvharvest_core::{ResourceRecord, RECORD_HEADER};
use csvharvest_engine::{
    load_rows, run_process, JobEvent, JobEventKind, ProcessRunConfig, ProgressSink,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<JobEvent>>>,
}

impl ProgressSink for TestSink {
    fn emit(&self, event: JobEvent) {
        self.events.lock().unwrap().push(event);
    }
}

async fn serve_csv(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn write_input(dir: &TempDir, rows: &[String]) -> std::path::PathBuf {
    let input = dir.path().join("resources.csv");
    let mut text = String::from("dataset|id|url\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(&input, text).unwrap();
    input
}

fn read_array(path: &std::path::Path) -> Vec<Value> {
    let text = fs::read_to_string(path).unwrap();
    match serde_json::from_str(&text).expect("output is valid json") {
        Value::Array(items) => items,
        other => panic!("expected array, got {other}"),
    }
}

#[test]
fn rows_without_url_are_skipped() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        &[
            "ds1|r1|https://files.example/a.csv".to_string(),
            "ds1|r2|".to_string(),
            "ds2|r3".to_string(),
        ],
    );

    let loaded = load_rows(&input).unwrap();
    assert_eq!(loaded.skipped, 2);
    assert_eq!(loaded.rows.len(), 1);
    assert_eq!(loaded.rows[0].url, "https://files.example/a.csv");
    assert_eq!(loaded.rows[0].label(), "r1");
    assert_eq!(loaded.rows[0].meta.get("dataset").map(String::as_str), Some("ds1"));
}

#[test]
fn pipes_inside_urls_are_kept() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("resources.csv");
    let record = ResourceRecord::new("ds1", "r1", "https://x.example/a.csv?cols=a|b");
    fs::write(&input, format!("{RECORD_HEADER}\n{}", record.to_line())).unwrap();

    let loaded = load_rows(&input).unwrap();
    assert_eq!(loaded.skipped, 0);
    assert_eq!(loaded.rows[0].url, "https://x.example/a.csv?cols=a|b");
    assert_eq!(loaded.rows[0].meta.get("id").map(String::as_str), Some("r1"));
}

#[test]
fn unexpected_header_is_an_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("resources.csv");
    fs::write(&input, "url|id\nhttps://x.example/a.csv|r1\n").unwrap();
    assert!(load_rows(&input).is_err());
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_rows(&dir.path().join("absent.csv")).is_err());
}

#[tokio::test]
async fn process_writes_one_profile_per_readable_resource() {
    let server = MockServer::start().await;
    serve_csv(&server, "/a.csv", "code;nom\n01;Ain\n").await;
    serve_csv(&server, "/b.csv", "x,y,z\n1,2,3\n").await;
    Mock::given(method("GET"))
        .and(path("/missing.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        &[
            format!("ds1|ra|{}/a.csv", server.uri()),
            format!("ds1|rb|{}/b.csv", server.uri()),
            format!("ds2|rm|{}/missing.csv", server.uri()),
        ],
    );
    let mut config = ProcessRunConfig::new(&input, dir.path().join("profiles.json"));
    config.workers = 2;

    let sink = Arc::new(TestSink::default());
    let summary = run_process(config, sink.clone()).await.expect("process run");

    assert_eq!(summary.metrics.jobs, 3);
    assert_eq!(summary.metrics.resources, 3);
    assert_eq!(summary.metrics.success, 2);
    assert_eq!(summary.metrics.error, 1);
    assert_eq!(summary.dispatch.completed, 3);

    let mut profiles = read_array(&summary.output);
    assert_eq!(profiles.len(), 2);
    profiles.sort_by_key(|p| p["id"].as_str().unwrap_or_default().to_string());

    assert_eq!(profiles[0]["id"], "ra");
    assert_eq!(profiles[0]["dataset"], "ds1");
    assert_eq!(profiles[0]["delimiter"], ";");
    assert_eq!(profiles[0]["quotechar"], "\"");
    assert_eq!(profiles[0]["charset"], "ascii");
    assert_eq!(profiles[0]["headers"], serde_json::json!(["code", "nom"]));
    assert_eq!(profiles[1]["id"], "rb");
    assert_eq!(profiles[1]["delimiter"], ",");
    assert_eq!(profiles[1]["firstline"], "x,y,z");

    let events = sink.events.lock().unwrap();
    let errors: Vec<&JobEvent> = events
        .iter()
        .filter(|e| e.kind == JobEventKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].subject, "rm");
}

#[tokio::test]
async fn all_failures_still_produce_valid_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        &[
            format!("ds1|r1|{}/one.csv", server.uri()),
            "ds1|r2|".to_string(),
        ],
    );
    let config = ProcessRunConfig::new(&input, dir.path().join("profiles.json"));

    let summary = run_process(config, Arc::new(TestSink::default()))
        .await
        .unwrap();

    assert_eq!(summary.metrics.success, 0);
    assert_eq!(summary.metrics.error, 2);
    assert_eq!(summary.metrics.resources, 2);
    assert!(read_array(&summary.output).is_empty());
    assert_eq!(fs::read_to_string(&summary.output).unwrap(), "[\n]");
}
