//! HTML extraction of catalog records
//!
//! This module turns the HTML of one catalog page into [`Record`]s and reads
//! the total page count from the pager on the index page.
//!
//! # Extraction Rules
//!
//! - Each item is a `.product_pod` element
//! - Name: `title` attribute of `h3 a`, falling back to the link text
//! - Price: text of `.price_color` (e.g. `£51.77`)
//! - Availability: text of `.availability`; a missing element means unknown
//!
//! A page without any item, an item without a name, or an item whose price
//! cannot be read means the page did not have the expected structure.

use crate::record::{Availability, Price, Record};
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{}': {:?}", css, e))
}

/// Parses a catalog page into records
///
/// # Arguments
///
/// * `html` - The page body
/// * `page` - Page number stamped on every record
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Records in document order
/// * `Err(String)` - The page did not match the expected catalog structure
///
/// # Example
///
/// ```
/// use shelf_harvest::crawler::parse_catalog_page;
///
/// let html = r#"<article class="product_pod">
///     <h3><a title="Sharp Objects" href="sharp-objects.html">Sharp Obj...</a></h3>
///     <p class="price_color">£47.82</p>
///     <p class="instock availability">In stock</p>
/// </article>"#;
/// let records = parse_catalog_page(html, 2).unwrap();
/// assert_eq!(records[0].name, "Sharp Objects");
/// assert_eq!(records[0].source_page, 2);
/// ```
pub fn parse_catalog_page(html: &str, page: u32) -> Result<Vec<Record>, String> {
    let document = Html::parse_document(html);

    let pod_selector = selector(".product_pod")?;
    let pods: Vec<ElementRef<'_>> = document.select(&pod_selector).collect();
    if pods.is_empty() {
        return Err("no product entries found on page".to_string());
    }

    let title_selector = selector("h3 a")?;
    let price_selector = selector(".price_color")?;
    let availability_selector = selector(".availability")?;

    let mut records = Vec::with_capacity(pods.len());
    for (index, pod) in pods.into_iter().enumerate() {
        let name = extract_name(&pod, &title_selector)
            .ok_or_else(|| format!("item {} has no name", index + 1))?;

        let price_text = pod
            .select(&price_selector)
            .next()
            .map(element_text)
            .ok_or_else(|| format!("item '{}' has no price", name))?;
        let price: Price = price_text
            .parse()
            .map_err(|e| format!("item '{}': {}", name, e))?;

        let availability = pod
            .select(&availability_selector)
            .next()
            .map(|element| Availability::from_text(&element_text(element)))
            .unwrap_or(Availability::Unknown);

        records.push(Record {
            name,
            price,
            availability,
            source_page: page,
        });
    }

    Ok(records)
}

fn extract_name(pod: &ElementRef<'_>, title_selector: &Selector) -> Option<String> {
    let link = pod.select(title_selector).next()?;

    link.value()
        .attr("title")
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .or_else(|| Some(element_text(link)).filter(|text| !text.is_empty()))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads the page count from a pager such as `Page 1 of 50`
///
/// Returns None if the pager is missing or does not carry a positive count.
pub fn parse_total_pages(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let current_selector = Selector::parse(".pager .current, .current").ok()?;

    document
        .select(&current_selector)
        .map(element_text)
        .find_map(|text| page_count_from_text(&text))
}

fn page_count_from_text(text: &str) -> Option<u32> {
    let mut words = text.split_whitespace();
    words.find(|word| word.eq_ignore_ascii_case("of"))?;
    words
        .next()?
        .trim_end_matches('.')
        .parse::<u32>()
        .ok()
        .filter(|count| *count > 0)
}
