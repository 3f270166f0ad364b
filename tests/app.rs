use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use zip::write::{SimpleFileOptions, ZipWriter};

use subharvester::app::App;
use subharvester::dispatch::{self, Outcome, Reporter, Stage, TargetEvent, TargetStatus};
use subharvester::domain::Target;
use subharvester::error::HarvestError;
use subharvester::fetch::Fetcher;
use subharvester::store::Store;

struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn new(responses: HashMap<String, Vec<u8>>) -> Self {
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), HarvestError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(bytes) => std::fs::write(destination, bytes)
                .map_err(|err| HarvestError::Filesystem(err.to_string())),
            None => Err(HarvestError::HttpStatus {
                status: 404,
                message: "not found".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct CollectingReporter {
    events: Mutex<Vec<TargetEvent>>,
}

impl CollectingReporter {
    fn events(&self) -> Vec<TargetEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for CollectingReporter {
    fn event(&self, event: TargetEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        for (name, bytes) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

fn target(name: &str, url: &str) -> Target {
    Target {
        name: name.to_string(),
        url: url.to_string(),
        platform: "p1".to_string(),
        bounty: false,
    }
}

#[test]
fn end_to_end_layout() {
    let temp = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(temp.path().join("subdomains")).unwrap();

    let index_url = "https://catalog.example.com/index.json";
    let archive_url = "https://data.example.com/Foo.zip";
    let catalog = r#"[{"name":"Foo","URL":"https://data.example.com/Foo.zip","platform":"p1","bounty":true}]"#;

    let mut responses = HashMap::new();
    responses.insert(index_url.to_string(), catalog.as_bytes().to_vec());
    responses.insert(
        archive_url.to_string(),
        zip_bytes(&[("found.txt", b"a.foo.example.com\n".as_slice())]),
    );

    let app = App::new(Store::new(base.clone()), MockFetcher::new(responses));
    let reporter = CollectingReporter::default();
    let summary = app.run(index_url, 2, &reporter).unwrap();

    assert_eq!(summary.items.len(), 1);
    assert_eq!(summary.items[0].status, TargetStatus::Completed);

    let target_dir = base.join("p1").join("bounty").join("Foo");
    assert_eq!(
        std::fs::read(target_dir.join("found.txt").as_std_path()).unwrap(),
        b"a.foo.example.com\n"
    );
    assert!(target_dir.join("Foo.zip").as_std_path().exists());
    assert_eq!(summary.items[0].destination, target_dir.as_str());
}

#[test]
fn index_fetch_failure_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(temp.path().join("subdomains")).unwrap();
    let app = App::new(Store::new(base), MockFetcher::new(HashMap::new()));

    let err = app
        .run(
            "https://catalog.example.com/index.json",
            2,
            &CollectingReporter::default(),
        )
        .unwrap_err();
    assert_matches!(err, HarvestError::IndexFetch(_));
}

#[test]
fn dispatcher_runs_each_target_exactly_once() {
    let temp = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(temp.path().join("subdomains")).unwrap();
    let store = Store::new(base);

    let mut responses = HashMap::new();
    let mut targets = Vec::new();
    for index in 0..8 {
        let url = format!("https://files.example.com/t{index}.zip");
        responses.insert(
            url.clone(),
            zip_bytes(&[("list.txt", b"host.example.com\n".as_slice())]),
        );
        targets.push(target(&format!("t{index}"), &url));
    }
    let fetcher = MockFetcher::new(responses);
    let reporter = CollectingReporter::default();

    let summary = dispatch::run(&store, &fetcher, targets, 3, &reporter);

    assert_eq!(summary.items.len(), 8);
    let names: HashSet<_> = summary.items.iter().map(|item| item.name.clone()).collect();
    assert_eq!(names.len(), 8);
    assert!(
        summary
            .items
            .iter()
            .all(|item| item.status == TargetStatus::Completed)
    );

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(calls.iter().collect::<HashSet<_>>().len(), 8);
}

#[test]
fn invalid_url_never_reaches_the_fetcher() {
    let temp = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(temp.path().join("subdomains")).unwrap();
    let store = Store::new(base);
    let fetcher = MockFetcher::new(HashMap::new());
    let reporter = CollectingReporter::default();

    let summary = dispatch::run(
        &store,
        &fetcher,
        vec![target("broken", "not a url")],
        2,
        &reporter,
    );

    assert!(fetcher.calls().is_empty());
    assert_eq!(summary.items.len(), 1);
    assert_matches!(
        &summary.items[0].status,
        TargetStatus::Failed {
            stage: Stage::Validate,
            ..
        }
    );
    assert!(reporter.events().iter().any(|event| {
        event.target == "broken"
            && event.stage == Stage::Validate
            && matches!(event.outcome, Outcome::Failed(_))
    }));
}

#[test]
fn target_failures_stay_isolated() {
    let temp = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(temp.path().join("subdomains")).unwrap();
    let store = Store::new(base.clone());

    let good_url = "https://files.example.com/good.zip";
    let mut responses = HashMap::new();
    responses.insert(
        good_url.to_string(),
        zip_bytes(&[("list.txt", b"ok.example.com\n".as_slice())]),
    );
    let fetcher = MockFetcher::new(responses);
    let reporter = CollectingReporter::default();

    let summary = dispatch::run(
        &store,
        &fetcher,
        vec![
            target("gone", "https://files.example.com/gone.zip"),
            target("good", good_url),
        ],
        1,
        &reporter,
    );

    assert_eq!(fetcher.calls().len(), 2);
    let by_name: HashMap<_, _> = summary
        .items
        .iter()
        .map(|item| (item.name.as_str(), &item.status))
        .collect();
    assert_matches!(
        by_name["gone"],
        TargetStatus::Failed {
            stage: Stage::Fetch,
            ..
        }
    );
    assert_eq!(*by_name["good"], TargetStatus::Completed);
    assert!(
        base.join("p1")
            .join("no_bounty")
            .join("good")
            .join("list.txt")
            .as_std_path()
            .exists()
    );
}
