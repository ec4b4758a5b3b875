mod common;

use common::result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use urlaudit::engine::classifier::Classify;
use urlaudit::engine::log_ops::{LogError, ResultCache, ResultSink, SkipSet, load_skip_set, to_line};
use urlaudit::engine::normalized_hostname;
use urlaudit::engine::progress::{BatchedProgress, create_progress_bar};
use urlaudit::pipeline::{check_for_first_error_or_interrupt, plan_tasks, run_with_concurrency};
use urlaudit::utils::result_paths;
use urlaudit::{
    ClassPolicy, Classification, ClassificationResult, Entity, EntitySource, Opts, PropertyType,
    ResumeGranularity, TaskClass, VerificationTask, audit_urls, run_audit,
};

fn entity(id: &str) -> Entity {
    Entity {
        id: id.to_string(),
        name: format!("Entity {id}"),
        tvl: Some(1.0),
        ..Default::default()
    }
}

/// Classifies without the network: URLs containing "dead" are NOT_FOUND, the rest OK.
struct FakeClassifier {
    seen: Mutex<Vec<String>>,
}

impl FakeClassifier {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Classify for FakeClassifier {
    fn classify(&self, task: &VerificationTask) -> ClassificationResult {
        self.seen.lock().unwrap().push(task.url.clone());
        let c = if task.url.contains("dead") {
            Classification::NotFound
        } else {
            Classification::Ok
        };
        let mut r = ClassificationResult::for_task(task, c);
        r.response_status = Some(if c == Classification::Ok { 200 } else { 404 });
        r
    }
}

// --- planner ---

#[test]
fn test_no_url_or_referral_means_no_default_tasks() {
    let plan = plan_tasks(&[entity("a")], &SkipSet::default());
    assert_eq!(plan.total(), 0);
    assert!(plan.tasks(TaskClass::Default).is_empty());
}

#[test]
fn test_github_handles_become_distinct_tasks() {
    let mut e = entity("a");
    e.github = Some(vec!["one".into(), "two".into(), "three".into()]);
    let plan = plan_tasks(&[e], &SkipSet::default());
    let github = plan.tasks(TaskClass::Github);
    assert_eq!(github.len(), 3);
    assert!(github.iter().all(|t| t.property == PropertyType::Github));
    let mut urls: Vec<_> = github.iter().map(|t| t.url.clone()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 3);
}

#[test]
fn test_skipped_url_property_never_replanned() {
    let mut e = entity("a");
    e.url = Some("https://a.test".into());
    e.referral_url = Some("https://a.test/?ref=1".into());
    e.github = Some(vec!["a-org".into()]);
    for granularity in [ResumeGranularity::Property, ResumeGranularity::Url] {
        let mut skip = SkipSet::new(granularity);
        skip.insert("a", PropertyType::Url, "https://a.test");
        let plan = plan_tasks(std::slice::from_ref(&e), &skip);
        assert!(
            plan.tasks(TaskClass::Default)
                .iter()
                .all(|t| t.property != PropertyType::Url)
        );
        assert_eq!(plan.total(), 2);
    }
}

#[test]
fn test_one_task_per_github_handle() {
    let mut e = entity("a");
    e.github = Some(vec!["org-one".into(), "org-two".into(), "".into()]);
    let plan = plan_tasks(&[e], &SkipSet::new(ResumeGranularity::Url));
    let urls: Vec<_> = plan
        .tasks(TaskClass::Github)
        .iter()
        .map(|t| t.url.as_str())
        .collect();
    assert_eq!(
        urls,
        vec!["https://github.com/org-one", "https://github.com/org-two"]
    );
    assert!(plan.tasks(TaskClass::Default).is_empty());
}

#[test]
fn test_twitter_goes_to_its_own_class() {
    let mut e = entity("a");
    e.twitter = Some("handle".into());
    let plan = plan_tasks(&[e], &SkipSet::default());
    assert_eq!(plan.tasks(TaskClass::Twitter)[0].url, "https://x.com/handle");
    assert_eq!(plan.tasks(TaskClass::Twitter)[0].property, PropertyType::Twitter);
    assert_eq!(plan.count_property(PropertyType::Twitter), 1);
}

#[test]
fn test_default_class_keeps_entity_then_rule_order() {
    let mut a = entity("a");
    a.url = Some("https://a.test".into());
    a.audit_links = Some(vec!["https://audit.test/1".into(), "https://audit.test/2".into()]);
    a.referral_url = Some("https://a.test/?ref=1".into());
    let mut b = entity("b");
    b.url = Some("https://b.test".into());
    let plan = plan_tasks(&[a, b], &SkipSet::default());
    let got: Vec<_> = plan
        .tasks(TaskClass::Default)
        .iter()
        .map(|t| (t.entity_id.as_str(), t.property))
        .collect();
    assert_eq!(
        got,
        vec![
            ("a", PropertyType::Url),
            ("a", PropertyType::ReferralUrl),
            ("a", PropertyType::AuditLink),
            ("a", PropertyType::AuditLink),
            ("b", PropertyType::Url),
        ]
    );
    assert_eq!(plan.count_property(PropertyType::AuditLink), 2);
}

#[test]
fn test_duplicate_links_collapse() {
    let mut e = entity("a");
    e.audit_links = Some(vec!["https://audit.test/1".into(), "https://audit.test/1".into()]);
    let plan = plan_tasks(&[e], &SkipSet::default());
    assert_eq!(plan.total(), 1);
}

#[test]
fn test_property_skip_covers_every_url_of_that_property() {
    let mut e = entity("a");
    e.github = Some(vec!["one".into(), "two".into()]);
    let mut skip = SkipSet::new(ResumeGranularity::Property);
    skip.insert("a", PropertyType::Github, "https://github.com/one");
    let plan = plan_tasks(&[e], &skip);
    assert!(plan.tasks(TaskClass::Github).is_empty());
    assert_eq!(plan.skipped, 2);
}

#[test]
fn test_url_skip_keeps_new_urls() {
    let mut e = entity("a");
    e.github = Some(vec!["one".into(), "two".into()]);
    let mut skip = SkipSet::new(ResumeGranularity::Url);
    skip.insert("a", PropertyType::Github, "https://github.com/one");
    let plan = plan_tasks(&[e], &skip);
    assert_eq!(plan.tasks(TaskClass::Github).len(), 1);
    assert_eq!(plan.tasks(TaskClass::Github)[0].url, "https://github.com/two");
}

// --- hostname normalization ---

#[test]
fn test_hostname_normalization() {
    assert_eq!(
        normalized_hostname("https://WWW.Example.COM"),
        normalized_hostname("https://example.com")
    );
    assert_eq!(normalized_hostname("::not a url::"), None);
}

// --- scheduler ---

#[test]
fn test_ten_tasks_three_workers_each_once() {
    let counts = Mutex::new(HashMap::new());
    let n = run_with_concurrency(
        (0..10).collect::<Vec<u32>>(),
        ClassPolicy::new(3, 0, true),
        None,
        |i| *counts.lock().unwrap().entry(i).or_insert(0) += 1,
    );
    assert_eq!(n, 10);
    let counts = counts.into_inner().unwrap();
    assert_eq!(counts.len(), 10);
    assert!(counts.values().all(|&c| c == 1));
}

#[test]
fn test_worker_count_bounds_parallelism() {
    let active = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    run_with_concurrency(
        (0..12).collect::<Vec<u32>>(),
        ClassPolicy::new(2, 0, true),
        None,
        |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            active.fetch_sub(1, Ordering::SeqCst);
        },
    );
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn test_delay_paces_a_single_worker() {
    let start = Instant::now();
    run_with_concurrency(vec![(); 3], ClassPolicy::new(1, 20, true), None, |_| {});
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[test]
fn test_cancel_stops_claiming() {
    let cancel = AtomicBool::new(false);
    let handled = run_with_concurrency(
        (0..50).collect::<Vec<u32>>(),
        ClassPolicy::new(1, 0, true),
        Some(&cancel),
        |i| {
            if i == 4 {
                cancel.store(true, Ordering::Relaxed);
            }
        },
    );
    assert_eq!(handled, 5);
}

#[test]
fn test_empty_input_spawns_nothing() {
    assert_eq!(
        run_with_concurrency(Vec::<u8>::new(), ClassPolicy::new(4, 0, true), None, |_| {}),
        0
    );
}

// --- progress ---

#[test]
fn test_progress_finish_counts_batches_dropped_under_contention() {
    let bar = create_progress_bar(10, "Checking");
    let progress = BatchedProgress::new(Some(Arc::clone(&bar)), 2);
    {
        let _held = bar.lock().unwrap();
        progress.tick();
        progress.tick();
    }
    for _ in 0..3 {
        progress.tick();
    }
    progress.finish();
    assert_eq!(progress.done(), 5);
    assert_eq!(bar.lock().unwrap().counter, 5);
}

// --- run outcome checks ---

#[test]
fn test_clean_run_state_is_ok() {
    let first = Arc::new(Mutex::new(None));
    assert!(
        check_for_first_error_or_interrupt(&first, &AtomicBool::new(false), Path::new("x.tmp"))
            .is_ok()
    );
}

#[test]
fn test_first_error_wins_over_interrupt() {
    let first = Arc::new(Mutex::new(Some("disk full".to_string())));
    let err = check_for_first_error_or_interrupt(&first, &AtomicBool::new(true), Path::new("x.tmp"))
        .unwrap_err();
    assert!(err.to_string().starts_with("disk full"));
}

// --- sink + reader ---

#[test]
fn test_sink_reader_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let final_path = dir.path().join("protocol-urls.jsonl");
    let temp_path = dir.path().join("protocol-urls.jsonl.tmp");
    let mut written = Vec::new();
    let sink = ResultSink::open(&temp_path, &final_path).unwrap();
    for i in 0..5 {
        let mut r = result(
            &format!("e{i}"),
            PropertyType::AuditLink,
            &format!("https://audits.test/{i}.pdf"),
            Classification::Ok,
        );
        r.entity_tvl = Some(1234.5678 * i as f64);
        r.response_status = Some(200);
        r.response_status_text = Some("OK".into());
        r.response_url = Some(format!("https://audits.test/{i}.pdf"));
        sink.append(&r).unwrap();
        written.push(r);
    }
    sink.finalize().unwrap();

    let cache = ResultCache::new(&final_path);
    let read = cache.get_data().unwrap();
    assert_eq!(read.as_slice(), written.as_slice());

    let expected: String = written.iter().map(|r| to_line(r).unwrap()).collect();
    assert_eq!(fs::read_to_string(&final_path).unwrap(), expected);
}

#[test]
fn test_reader_cache_single_load_then_reload_on_mtime_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("protocol-urls.jsonl");
    let first = result("a", PropertyType::Url, "https://a.test", Classification::Ok);
    fs::write(&path, to_line(&first).unwrap()).unwrap();

    let cache = ResultCache::new(&path);
    let (x, y) = thread::scope(|s| {
        let a = s.spawn(|| cache.get_data().unwrap());
        let b = s.spawn(|| cache.get_data().unwrap());
        (a.join().unwrap(), b.join().unwrap())
    });
    assert!(Arc::ptr_eq(&x, &y));
    assert_eq!(cache.loads(), 1);

    let second = result("b", PropertyType::Url, "https://b.test", Classification::FetchError);
    let content = format!("{}{}", to_line(&first).unwrap(), to_line(&second).unwrap());
    fs::write(&path, content).unwrap();
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    let fresh = cache.get_data().unwrap();
    assert_eq!(fresh.len(), 2);
    assert!(!Arc::ptr_eq(&x, &fresh));
    assert_eq!(cache.loads(), 2);
}

// --- ledger ---

#[test]
fn test_malformed_resume_log_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let temp_path = dir.path().join("protocol-urls.jsonl.tmp");
    let good = result("a", PropertyType::Url, "https://a.test", Classification::Ok);
    fs::write(&temp_path, format!("{}{{\"id\":\"b\"", to_line(&good).unwrap())).unwrap();

    match load_skip_set(&temp_path, ResumeGranularity::Url) {
        Err(LogError::MalformedLine { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected malformed line, got {other:?}"),
    }
}

// --- full run with a fake classifier ---

fn opts_in(dir: &std::path::Path) -> Opts {
    let mut opts = Opts {
        data_dir: dir.to_path_buf(),
        ..Default::default()
    };
    opts.github_class.delay = Duration::ZERO;
    opts
}

#[test]
fn test_run_resumes_from_temp_log_and_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_in(dir.path());
    let temp_path = dir.path().join("protocol-urls.jsonl.tmp");
    let final_path = dir.path().join("protocol-urls.jsonl");

    // A crashed run already recorded a's website.
    let carried = result("a", PropertyType::Url, "https://a.test", Classification::Ok);
    fs::write(&temp_path, to_line(&carried).unwrap()).unwrap();

    let mut a = entity("a");
    a.url = Some("https://a.test".into());
    a.github = Some(vec!["a-org".into()]);
    let mut b = entity("b");
    b.url = Some("https://dead.b.test".into());
    b.audit_links = Some(vec!["https://audits.test/b.pdf".into()]);

    let skip = load_skip_set(&temp_path, opts.resume_by).unwrap();
    let classifier = FakeClassifier::new();
    let summary = run_audit(&opts, &[a, b], skip, &classifier, None).unwrap();

    assert_eq!(summary.resumed, 1);
    assert_eq!(summary.planned, 3);
    assert_eq!(summary.executed, 3);
    assert_eq!(summary.counts.get(&Classification::NotFound), Some(&1));
    assert!(!classifier.seen.lock().unwrap().contains(&"https://a.test".to_string()));

    assert!(!temp_path.exists());
    let records = ResultCache::new(&final_path).get_data().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0], carried);
    let mut keys: Vec<_> = records
        .iter()
        .map(|r| (r.entity_id.clone(), r.property, r.url.clone()))
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 4);
}

#[test]
fn test_twitter_tasks_planned_but_not_run_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_in(dir.path());
    let mut e = entity("a");
    e.twitter = Some("a_handle".into());
    e.url = Some("https://a.test".into());

    let classifier = FakeClassifier::new();
    let summary = run_audit(&opts, &[e], SkipSet::default(), &classifier, None).unwrap();
    assert_eq!(summary.planned, 2);
    assert_eq!(summary.executed, 1);
    assert_eq!(summary.not_scheduled, 1);
    assert_eq!(*classifier.seen.lock().unwrap(), vec!["https://a.test".to_string()]);
}

#[test]
fn test_interrupted_run_keeps_temp_log() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_in(dir.path());
    let mut e = entity("a");
    e.url = Some("https://a.test".into());

    let cancel = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let err = run_audit(&opts, &[e], SkipSet::default(), &FakeClassifier::new(), Some(cancel))
        .unwrap_err();
    assert!(err.to_string().contains("interrupted"));
    assert!(dir.path().join("protocol-urls.jsonl.tmp").exists());
    assert!(!dir.path().join("protocol-urls.jsonl").exists());
}

/// Panics on every task, like a classifier bug would.
struct PanickingClassifier;

impl Classify for PanickingClassifier {
    fn classify(&self, task: &VerificationTask) -> ClassificationResult {
        panic!("classifier bug on {}", task.url);
    }
}

fn sites(ids: &[&str]) -> Vec<Entity> {
    ids.iter()
        .map(|id| {
            let mut e = entity(id);
            e.url = Some(format!("https://{id}.test"));
            e
        })
        .collect()
}

#[test]
fn test_worker_panic_fails_run_and_keeps_both_logs() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = opts_in(dir.path());
    opts.default_class.workers = 1;
    let (final_path, temp_path) = result_paths(dir.path());
    let previous = to_line(&result("old", PropertyType::Url, "https://old.test", Classification::Ok)).unwrap();
    fs::write(&final_path, &previous).unwrap();

    let err = run_audit(&opts, &sites(&["a", "b", "c"]), SkipSet::default(), &PanickingClassifier, None)
        .unwrap_err();

    assert!(err.to_string().contains("panicked"));
    assert!(temp_path.exists());
    assert_eq!(fs::read_to_string(&final_path).unwrap(), previous);
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_append_stops_claims_and_keeps_both_logs() {
    if !Path::new("/dev/full").exists() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut opts = opts_in(dir.path());
    opts.default_class.workers = 1;
    let (final_path, temp_path) = result_paths(dir.path());
    let previous = to_line(&result("old", PropertyType::Url, "https://old.test", Classification::Ok)).unwrap();
    fs::write(&final_path, &previous).unwrap();
    // Every write to /dev/full fails with ENOSPC.
    std::os::unix::fs::symlink("/dev/full", &temp_path).unwrap();

    let classifier = FakeClassifier::new();
    let err = run_audit(&opts, &sites(&["a", "b", "c", "d", "e"]), SkipSet::default(), &classifier, None)
        .unwrap_err();

    assert!(err.to_string().contains("partial results kept"));
    assert_eq!(classifier.seen.lock().unwrap().len(), 1);
    assert!(fs::symlink_metadata(&temp_path).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&final_path).unwrap(), previous);
}

#[test]
fn test_failed_finalize_keeps_temp_log() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_in(dir.path());
    let (final_path, temp_path) = result_paths(dir.path());
    fs::create_dir(&final_path).unwrap();
    fs::write(final_path.join("keep"), "x").unwrap();

    let err = run_audit(&opts, &sites(&["a", "b"]), SkipSet::default(), &FakeClassifier::new(), None)
        .unwrap_err();

    assert!(format!("{err:#}").contains("rename"));
    assert_eq!(ResultCache::new(&temp_path).get_data().unwrap().len(), 2);
    assert!(final_path.join("keep").exists());
}

#[test]
fn test_failed_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let source = dir.path().join("protocols.json");
    fs::write(&source, "<html>maintenance</html>").unwrap();
    let opts = Opts {
        data_dir: data_dir.clone(),
        source: EntitySource::File(source),
        ..Default::default()
    };

    assert!(audit_urls(&opts, None).is_err());
    assert!(!data_dir.exists());

    let missing = Opts {
        source: EntitySource::File(dir.path().join("missing.json")),
        ..opts
    };
    assert!(audit_urls(&missing, None).is_err());
    assert!(!data_dir.exists());
}
