use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_cache::{EnvelopeCache, SqliteStore};
use folio_core::{
    BlogEntry, BlogList, BlogListRoot, BlogSource, ControlEvent, DataAcquirer, Element,
    ListOptions, ManualClock, ReadingTime, Role,
};
use tempfile::TempDir;

const NOW: i64 = 1_717_000_000_000;

/// Serves a fixed payload and counts how often it was asked
struct StubSource {
    entries: Vec<BlogEntry>,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl BlogSource for StubSource {
    async fn fetch(&self) -> folio_core::Result<Vec<BlogEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}

fn create_entry(title: &str, category: &str, date: &str, reading_time: ReadingTime) -> BlogEntry {
    BlogEntry {
        title: Some(title.to_string()),
        author: Some("Folio Team".to_string()),
        content: Some(format!("All about {}", title.to_lowercase())),
        image: Some(format!("/img/{}.png", title.to_lowercase().replace(' ', "-"))),
        published_date: Some(date.to_string()),
        reading_time: Some(reading_time),
        category: Some(category.to_string()),
        tags: vec![category.to_lowercase()],
    }
}

fn payload() -> Vec<BlogEntry> {
    vec![
        create_entry("React Basics", "Frontend", "2024-01-10", ReadingTime::Label("5 min read".into())),
        create_entry("Seed Funding", "Startups", "2024-03-02", ReadingTime::Label("12".into())),
        create_entry("Foldable Phones", "Gadgets", "2023-11-30", ReadingTime::Minutes(7.0)),
        create_entry("Hiring Early", "Startups", "2024-02-14", ReadingTime::Label("no time".into())),
    ]
}

fn page_root() -> BlogListRoot {
    BlogListRoot::from_children(vec![
        Element::new("div").with_class(Role::Content.class_name()),
        Element::new("div").with_class(Role::Loading.class_name()),
        Element::new("div").with_class(Role::Error.class_name()).with_class("hidden"),
        Element::new("select").with_class(Role::Sort.class_name()),
        Element::new("select").with_class(Role::Filter.class_name()),
        Element::new("input").with_class(Role::Search.class_name()),
    ])
    .unwrap()
}

fn build_list(dir: &TempDir, clock: Arc<ManualClock>, calls: Arc<AtomicU32>) -> BlogList {
    let store = SqliteStore::open(dir.path().join("cache.db")).unwrap();
    let cache = EnvelopeCache::new(Arc::new(store), "blogs_cache_v1", Duration::from_secs(600));
    let source = StubSource {
        entries: payload(),
        calls,
    };
    let acquirer = DataAcquirer::new(Box::new(source))
        .with_cache(cache)
        .with_clock(clock);

    BlogList::new(page_root(), acquirer, ListOptions::default())
}

fn titles(list: &BlogList) -> Vec<String> {
    list.state()
        .visible()
        .iter()
        .filter_map(|e| e.title.clone())
        .collect()
}

#[tokio::test]
async fn test_second_load_within_window_uses_cache() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(NOW));
    let calls = Arc::new(AtomicU32::new(0));

    let mut first = build_list(&dir, clock.clone(), calls.clone());
    first.initialize().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::from_secs(5 * 60));
    let mut second = build_list(&dir, clock.clone(), calls.clone());
    second.initialize().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.state().items(), first.state().items());
}

#[tokio::test]
async fn test_load_after_window_goes_to_network() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(NOW));
    let calls = Arc::new(AtomicU32::new(0));

    build_list(&dir, clock.clone(), calls.clone())
        .initialize()
        .await
        .unwrap();

    clock.advance(Duration::from_secs(10 * 60 + 1));
    build_list(&dir, clock.clone(), calls.clone())
        .initialize()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_controls_drive_the_rendered_markup() {
    let dir = TempDir::new().unwrap();
    let mut list = build_list(
        &dir,
        Arc::new(ManualClock::new(NOW)),
        Arc::new(AtomicU32::new(0)),
    );
    list.initialize().await.unwrap();
    assert!(list.root().element(Role::Loading).unwrap().is_hidden());

    list.dispatch(ControlEvent::SortChanged("reading_time".into()));
    assert_eq!(
        titles(&list),
        vec!["React Basics", "Foldable Phones", "Seed Funding", "Hiring Early"]
    );

    list.dispatch(ControlEvent::SortChanged("date".into()));
    assert_eq!(
        titles(&list),
        vec!["Seed Funding", "Hiring Early", "React Basics", "Foldable Phones"]
    );

    list.dispatch(ControlEvent::FilterChanged("startups".into()));
    assert_eq!(titles(&list), vec!["Seed Funding", "Hiring Early"]);

    let html = list.root().content().inner_html();
    assert_eq!(html.matches("<article").count(), 2);
    assert!(html.contains("Mar 2, 2024"));
    assert!(!html.contains("React Basics"));
}

#[tokio::test(start_paused = true)]
async fn test_typing_then_clearing_search_returns_to_filter() {
    let dir = TempDir::new().unwrap();
    let mut list = build_list(
        &dir,
        Arc::new(ManualClock::new(NOW)),
        Arc::new(AtomicU32::new(0)),
    );
    list.initialize().await.unwrap();

    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let user = async move {
        tx.send(ControlEvent::FilterChanged("Startups".into())).await.unwrap();
        tx.send(ControlEvent::SearchInput("react".into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(ControlEvent::SearchInput(String::new())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
    };

    tokio::join!(list.run(rx), user);

    assert_eq!(titles(&list), vec!["Seed Funding", "Hiring Early"]);
}
