//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a miniature directory site and run
//! complete harvests against it end-to-end over HTTP.

use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yp_harvest::config::{parse_config, Config};
use yp_harvest::crawler::{harvest, run_scan, FetchError, HttpFetcher, PageFetcher};
use yp_harvest::metadata::{load_metadata, write_metadata, CategoryTarget};
use yp_harvest::storage::{EntityRecord, SqliteStorage, Storage};

const MAIN: &str = "Ăn Uống";
const SUB: &str = "Bánh Kẹo";

/// Creates a configuration pointing at the mock server with every delay off
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[site]
base-url = "{base_url}/"
page-size = 45

[crawler]
batch-size = 2
page-settle-ms = 0
detail-settle-ms = 0
return-settle-ms = 0
request-timeout-secs = 5

[user-agent]
value = "Mozilla/5.0 (X11; Linux x86_64) TestHarvester"

[input]
metadata-path = '{metadata}'

[output]
database-path = '{database}'
export-dir = '{export}'
"#,
        metadata = dir.join("categories_metadata.csv").display(),
        database = dir.join("harvest.db").display(),
        export = dir.join("out").display(),
    ))
    .expect("Failed to build test config")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{body}</body></html>"))
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn listing(companies: &[(&str, &str)], first_rank: u32, next: Option<&str>) -> ResponseTemplate {
    let items: String = companies
        .iter()
        .enumerate()
        .map(|(i, (name, slug))| {
            format!(
                r#"<div class="rounded-4 border bg-white shadow-sm mb-3 pb-4">
  <div class="yp_sothutu"><div class="yp_sothutu_txt"><small>{rank}</small></div></div>
  <div class="yp_noidunglistings"><h2 class="fs-5 pb-0 text-capitalize"><a href="/company/{slug}">{name}</a></h2></div>
</div>"#,
                rank = first_rank + i as u32
            )
        })
        .collect();

    let paging = match next {
        Some(href) => format!(r#"<div id="paging"><a href="{href}">Tiếp</a></div>"#),
        None => String::new(),
    };

    html(format!(r#"<div class="div_listing">{items}</div>{paging}"#))
}

fn detail(name: &str) -> ResponseTemplate {
    html(format!(
        r#"<div class="fs-3 text-capitalize">{name}</div>
<p class="m-0 pb-2">12 Lê Lợi, Quận 1</p>
<p class="m-0 pb-2"><span class="fw-semibold fs18">028 3822 1234</span></p>"#
    ))
}

const COMPANIES: [(&str, &str); 4] = [
    ("Công Ty A", "a"),
    ("Công Ty B", "b"),
    ("Công Ty C", "c"),
    ("Công Ty D", "d"),
];

/// Mounts the home page, one category, one subcategory with two listing
/// pages, and a detail page per company expected to be fetched `hits` times
async fn mount_site(server: &MockServer, hits: [u64; 4]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<div class="p-2 ps-1"><a class="text-dark" href="/cat/an-uong">{MAIN}</a></div>"#
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cat/an-uong"))
        .respond_with(html(format!(
            r#"<div class="col-sm-6 p-4 pe-3 pt-0 pb-2"><a href="/sub/banh-keo">{SUB} (4)</a></div>"#
        )))
        .mount(server)
        .await;

    // Page 2 is mounted first so it wins over the bare listing path
    Mock::given(method("GET"))
        .and(path("/sub/banh-keo"))
        .and(query_param("page", "2"))
        .respond_with(listing(&COMPANIES[3..], 4, None))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sub/banh-keo"))
        .respond_with(listing(&COMPANIES[..3], 1, Some("?page=2")))
        .mount(server)
        .await;

    for ((name, slug), expected) in COMPANIES.iter().zip(hits) {
        Mock::given(method("GET"))
            .and(path(format!("/company/{slug}")))
            .respond_with(detail(name))
            .expect(expected)
            .mount(server)
            .await;
    }
}

fn write_targets(config: &Config, target_count: u32) {
    write_metadata(
        Path::new(&config.input.metadata_path),
        &[CategoryTarget::new(MAIN, SUB, target_count)],
    )
    .expect("Failed to write metadata");
}

#[tokio::test]
async fn test_full_harvest_single_pair() {
    let server = MockServer::start().await;
    mount_site(&server, [1, 1, 1, 1]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    write_targets(&config, 4);

    let summary = harvest(config.clone(), "hash".to_string())
        .await
        .expect("Harvest failed");

    assert_eq!(summary.captured, 4);
    assert_eq!(summary.pairs_traversed, 1);
    assert_eq!(summary.pairs_failed, 0);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let progress = storage.load_progress().unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].sub_category, SUB);
    assert_eq!(progress[0].crawled_count, 4);

    let stored = storage.load_partition("an_uong").unwrap();
    let names: Vec<&str> = stored.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Công Ty A", "Công Ty B", "Công Ty C", "Công Ty D"]);
    assert_eq!(stored[0].phone, "028 3822 1234");
    assert_eq!(stored[0].sub_category, SUB);

    let export = dir.path().join("out").join("an_uong_company_details.csv");
    let mut reader = csv::Reader::from_path(&export).expect("Export file missing");
    let rows: Vec<EntityRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows, stored);
}

#[tokio::test]
async fn test_second_run_fetches_nothing_again() {
    let server = MockServer::start().await;
    mount_site(&server, [1, 1, 1, 1]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    write_targets(&config, 4);

    harvest(config.clone(), "hash".to_string()).await.unwrap();
    let second = harvest(config.clone(), "hash".to_string()).await.unwrap();

    assert_eq!(second.resume_index, 1);
    assert_eq!(second.captured, 0);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    assert_eq!(storage.count_entities(MAIN).unwrap(), 4);
    // Each detail mock expects exactly one hit; verified when the server drops
}

#[tokio::test]
async fn test_interrupted_pair_resumes_without_refetching() {
    let server = MockServer::start().await;
    mount_site(&server, [0, 0, 1, 1]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    write_targets(&config, 4);

    // State left behind by a run that stopped after its first flush
    {
        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
        let records: Vec<EntityRecord> = COMPANIES[..2]
            .iter()
            .map(|(name, _)| EntityRecord {
                name: name.to_string(),
                main_category: MAIN.to_string(),
                sub_category: SUB.to_string(),
                ..EntityRecord::default()
            })
            .collect();
        storage.append_entities(MAIN, &records).unwrap();
        storage.upsert_progress(MAIN, SUB, 2).unwrap();
        storage.create_run("hash").unwrap();
    }

    let summary = harvest(config.clone(), "hash".to_string()).await.unwrap();
    assert_eq!(summary.resume_index, 0);
    assert_eq!(summary.captured, 2);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    assert_eq!(storage.load_progress().unwrap()[0].crawled_count, 4);
    assert_eq!(storage.count_entities(MAIN).unwrap(), 4);
}

#[tokio::test]
async fn test_missing_metadata_aborts_harvest() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let result = harvest(config.clone(), "hash".to_string()).await;

    assert!(result.is_err());
    assert!(!Path::new(&config.output.database_path).exists());
}

#[tokio::test]
async fn test_scan_writes_metadata() {
    let server = MockServer::start().await;
    mount_site(&server, [0, 0, 0, 0]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let count = run_scan(&config).await.expect("Scan failed");
    assert_eq!(count, 1);

    let targets = load_metadata(Path::new(&config.input.metadata_path)).unwrap();
    assert_eq!(targets, vec![CategoryTarget::new(MAIN, SUB, 4)]);
}

#[tokio::test]
async fn test_http_fetcher_reports_status() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let mut fetcher = HttpFetcher::from_config(&config).unwrap();
    let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();

    let result = fetcher.navigate(&url).await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    assert!(fetcher.current_url().is_none());
}
