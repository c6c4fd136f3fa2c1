#![allow(dead_code)]

use std::{fs, panic, path::PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use git2::{Commit, IndexAddOption, Repository, Signature, Time};
use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::{json, Value};
use tempfile::TempDir;

/// 2020-01-15T12:00:00Z
pub const JAN_15_2020: i64 = 1_579_089_600;

pub struct Fixture {
    _temp: TempDir,
    pub project: PathBuf,
    pub cache: PathBuf,
    repo: Option<Repository>,
}

impl Fixture {
    /// A project directory with its own git repository.
    pub fn git(prefix: &str) -> Self {
        let mut fixture = Self::plain(prefix);
        fixture.repo = Some(Repository::init(&fixture.project).expect("git init"));
        fixture
    }

    /// A project directory outside any repository.
    pub fn plain(prefix: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("tempdir");
        let project = temp.path().join("project");
        let cache = temp.path().join("cache");
        fs::create_dir_all(&project).expect("project dir");
        Self {
            _temp: temp,
            project,
            cache,
            repo: None,
        }
    }

    pub fn write(&self, path: &str, contents: &str) {
        let full = self.project.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(full, contents).expect("write");
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.project.join(path)).expect("read")
    }

    /// Commit the whole working tree with the given author timestamp.
    pub fn commit(&self, unix_time: i64) {
        let repo = self.repo.as_ref().expect("fixture has a repository");
        let mut index = repo.index().expect("index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("add");
        index.write().expect("write index");
        let tree = repo
            .find_tree(index.write_tree().expect("tree"))
            .expect("find tree");
        let signature =
            Signature::new("Dev", "dev@example.com", &Time::new(unix_time, 0)).expect("signature");
        let parents: Vec<Commit<'_>> = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().expect("head commit")],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, "update", &tree, &parent_refs)
            .expect("commit");
    }

    /// Pre-populate the mapping cache so no download is attempted.
    pub fn seed_mapping_cache(&self) {
        fs::create_dir_all(&self.cache).expect("cache dir");
        fs::write(self.cache.join("mapping"), "yaml:PyYAML\nsklearn:scikit_learn\n")
            .expect("mapping");
        fs::write(self.cache.join("stdlib"), "os\nsys\njson\n").expect("stdlib");
    }

    pub fn guessreq(&self, index_url: &str) -> Command {
        let mut cmd = cargo_bin_cmd!("guessreq");
        cmd.current_dir(&self.project)
            .env("GUESSREQ_CACHE_DIR", &self.cache)
            .env("GUESSREQ_INDEX_URL", index_url)
            .env("GUESSREQ_KEEP_PROXIES", "0")
            .env("GUESSREQ_HTTP_TIMEOUT", "5")
            .env("NO_COLOR", "1");
        cmd
    }
}

pub fn start_index() -> Option<Server> {
    match panic::catch_unwind(Server::run) {
        Ok(server) => Some(server),
        Err(_) => {
            eprintln!("skipping cli test (httptest server unavailable)");
            None
        }
    }
}

pub fn index_url(server: &Server) -> String {
    server.url_str("/pypi").trim_end_matches('/').to_string()
}

pub fn expect_flask(server: &Server) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/pypi/flask/json")).respond_with(
            json_encoded(json!({
                "releases": {
                    "1.0": [ { "upload_time": "2019-06-01T10:00:00" } ],
                    "1.1": [ { "upload_time": "2020-03-01T10:00:00" } ],
                    "2.0rc1": [ { "upload_time": "2021-04-01T10:00:00" } ]
                }
            })),
        ),
    );
}

pub fn expect_unknown(server: &Server, name: &str) {
    server.expect(
        Expectation::matching(request::method_path("GET", format!("/pypi/{name}/json")))
            .respond_with(status_code(404)),
    );
}

pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("json output")
}

pub fn output_contains(output: &[u8], needle: &str) -> bool {
    String::from_utf8_lossy(output).contains(needle)
}

pub fn unused_index() -> &'static str {
    "http://127.0.0.1:9/pypi"
}
