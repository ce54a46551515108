//! Shared fixtures for integration tests

use async_trait::async_trait;
use shelf_harvest::record::{Availability, Price, Record};
use shelf_harvest::{FetchError, PageFetcher};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// In-process catalog: every page yields `per_page` records after `delay`,
/// except pages listed in `failures`, which fail on every attempt.
pub struct CatalogFetcher {
    per_page: usize,
    delay: Duration,
    failures: HashMap<u32, FetchError>,
    calls: Mutex<HashMap<u32, u32>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    windows: Mutex<Vec<(u32, Instant, Instant)>>,
}

impl CatalogFetcher {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page,
            delay: Duration::ZERO,
            failures: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, page: u32, error: FetchError) -> Self {
        self.failures.insert(page, error);
        self
    }

    /// Attempts made for `page`
    pub fn calls_for(&self, page: u32) -> u32 {
        self.calls.lock().unwrap().get(&page).copied().unwrap_or(0)
    }

    /// Most attempts observed running at the same time
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Start/end instants of every attempt, in completion order
    pub fn windows(&self) -> Vec<(u32, Instant, Instant)> {
        self.windows.lock().unwrap().clone()
    }
}

/// Decrements the active-attempt counter on every exit path
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for CatalogFetcher {
    async fn fetch(&self, page: u32) -> Result<Vec<Record>, FetchError> {
        *self.calls.lock().unwrap().entry(page).or_insert(0) += 1;

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.windows
            .lock()
            .unwrap()
            .push((page, started, Instant::now()));

        if let Some(error) = self.failures.get(&page) {
            return Err(error.clone());
        }

        Ok(records_for(page, self.per_page))
    }
}

pub fn records_for(page: u32, count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| Record {
            name: format!("Book {}-{}", page, i),
            price: Price::new(1000 + i as u64, "£"),
            availability: if i % 2 == 0 {
                Availability::InStock
            } else {
                Availability::OutOfStock
            },
            source_page: page,
        })
        .collect()
}

/// Data rows of a CSV output file, header excluded
pub fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    let content = std::fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("name,price,availability,source_page"),
        "missing header"
    );
    lines
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

/// Catalog page HTML with `count` items
pub fn catalog_html(page: u32, count: usize) -> String {
    let mut html = String::from("<html><body><ol class=\"row\">");
    for i in 0..count {
        html.push_str(&format!(
            "<li><article class=\"product_pod\">\
             <h3><a href=\"book-{page}-{i}.html\" title=\"Book {page}-{i}\">Book {page}-{i}</a></h3>\
             <div class=\"product_price\">\
             <p class=\"price_color\">&pound;{whole}.{i:02}</p>\
             <p class=\"instock availability\">In stock</p>\
             </div></article></li>",
            page = page,
            i = i,
            whole = 10 + page,
        ));
    }
    html.push_str("</ol></body></html>");
    html
}

/// Index page HTML with a `Page 1 of N` pager
pub fn index_html(total_pages: u32) -> String {
    format!(
        "<html><body><ul class=\"pager\"><li class=\"current\">Page 1 of {}</li></ul></body></html>",
        total_pages
    )
}
