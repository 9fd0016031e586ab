//! Listing Parser: extracts listing records from a returned document via a
//! fixed selector set (`spec.md` §4.4). Pure function of the input string,
//! grounded on the same `scraper` idiom as the pack's link extractor.

use crate::models::{MetroDistance, RawListing};
use scraper::{ElementRef, Html, Selector};

const UNKNOWN_TYPE: &str = "unknown type";
const UNKNOWN_LAYOUT: &str = "unknown layout";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid css")
}

/// Parse a listing search results document into `RawListing`s. Malformed or
/// unexpected markup degrades to an empty `Vec`, never an error — this is a
/// best-effort extraction over third-party HTML.
pub fn parse(body: &str, site_origin: &str) -> Vec<RawListing> {
    let document = Html::parse_document(body);
    let item_sel = selector("[data-testid='property-item'], .item-info");

    document
        .select(&item_sel)
        .filter_map(|item| parse_item(&item, site_origin))
        .collect()
}

fn parse_item(item: &ElementRef, site_origin: &str) -> Option<RawListing> {
    let title = text_of(item, ".item-info-title, [data-testid='title']")?;
    if title.is_empty() {
        return None;
    }

    let link = link_of(item, "a", site_origin).unwrap_or_default();

    let mut image_urls = attrs_of(item, "img", "data-src");
    if image_urls.is_empty() {
        image_urls = attrs_of(item, "img", "src");
    }

    let tags_list = texts_of(item, ".item-info-tag span, .tags span");

    let layout_sel = selector(".item-info-txt, .layout");
    let (house_type, rooms) = match item.select(&layout_sel).next() {
        Some(layout) => {
            let house_type = first_unclassed_span_text(&layout).unwrap_or_else(|| UNKNOWN_TYPE.to_string());
            let rooms = first_span_text(&layout, ".line").unwrap_or_else(|| UNKNOWN_LAYOUT.to_string());
            (sanitize(house_type, UNKNOWN_TYPE), sanitize(rooms, UNKNOWN_LAYOUT))
        }
        None => (UNKNOWN_TYPE.to_string(), UNKNOWN_LAYOUT.to_string()),
    };

    let price_text = text_of(item, ".item-info-price, [data-testid='price']").unwrap_or_default();

    let metro_sel = selector(".item-info-tworow, .metro-distance");
    let metro = item.select(&metro_sel).next().map(|m| MetroDistance {
        station_id: None,
        station_name: first_span_text(&m, "span"),
        metro_value_text: first_strong_text(&m).unwrap_or_default(),
        distance_meters: None,
    });

    Some(RawListing {
        title,
        link,
        house_type,
        rooms,
        tags_list,
        image_urls,
        price_text,
        metro,
    })
}

/// A value containing a bare "-" or "--" marker is treated as missing.
fn sanitize(value: String, sentinel: &str) -> String {
    if value.trim().is_empty() || value.trim() == "-" || value.trim() == "--" {
        sentinel.to_string()
    } else {
        value
    }
}

fn text_of(scope: &ElementRef, css: &str) -> Option<String> {
    let sel = selector(css);
    scope.select(&sel).next().map(|el| el.text().collect::<String>().trim().to_string())
}

fn texts_of(scope: &ElementRef, css: &str) -> Vec<String> {
    let sel = selector(css);
    scope
        .select(&sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn attrs_of(scope: &ElementRef, css: &str, attr: &str) -> Vec<String> {
    let sel = selector(css);
    scope
        .select(&sel)
        .filter_map(|el| el.value().attr(attr).map(str::to_string))
        .collect()
}

fn link_of(scope: &ElementRef, css: &str, site_origin: &str) -> Option<String> {
    let sel = selector(css);
    let href = scope.select(&sel).next()?.value().attr("href")?;
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else {
        let base = url::Url::parse(site_origin).ok()?;
        base.join(href).ok().map(|u| u.to_string())
    }
}

/// First child `<span>` with no class attribute at all.
fn first_unclassed_span_text(scope: &ElementRef) -> Option<String> {
    let sel = selector("span");
    scope
        .select(&sel)
        .find(|el| el.value().attr("class").is_none())
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn first_span_text(scope: &ElementRef, css: &str) -> Option<String> {
    let sel = selector(css);
    scope.select(&sel).next().map(|el| el.text().collect::<String>().trim().to_string())
}

fn first_strong_text(scope: &ElementRef) -> Option<String> {
    let sel = selector("strong");
    scope.select(&sel).next().map(|el| el.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_skipped_silently() {
        let html = r#"<div class="item-info"><div class="item-info-title"></div></div>"#;
        assert!(parse(html, "https://rent.591.com.tw").is_empty());
    }

    #[test]
    fn relative_link_is_rewritten_absolute() {
        let html = r#"
            <div class="item-info">
                <div class="item-info-title">Cozy studio</div>
                <a href="/rent-detail/12345"></a>
            </div>
        "#;
        let listings = parse(html, "https://rent.591.com.tw");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].link, "https://rent.591.com.tw/rent-detail/12345");
    }

    #[test]
    fn missing_house_type_and_rooms_substitute_sentinels() {
        let html = r#"
            <div class="item-info">
                <div class="item-info-title">Plain room</div>
                <div class="item-info-txt"></div>
            </div>
        "#;
        let listings = parse(html, "https://rent.591.com.tw");
        assert_eq!(listings[0].house_type, UNKNOWN_TYPE);
        assert_eq!(listings[0].rooms, UNKNOWN_LAYOUT);
    }

    #[test]
    fn house_type_and_rooms_come_from_distinct_span_roles() {
        let html = r#"
            <div class="item-info">
                <div class="item-info-title">Nice place</div>
                <div class="item-info-txt">
                    <span>apartment</span>
                    <span class="line">2 rooms</span>
                </div>
            </div>
        "#;
        let listings = parse(html, "https://rent.591.com.tw");
        assert_eq!(listings[0].house_type, "apartment");
        assert_eq!(listings[0].rooms, "2 rooms");
    }

    #[test]
    fn metro_facet_reads_strong_text_and_sibling_span() {
        let html = r#"
            <div class="item-info">
                <div class="item-info-title">Metro-adjacent</div>
                <div class="item-info-tworow">
                    <strong>300 meters</strong>
                    <span>Jiannan Rd.</span>
                </div>
            </div>
        "#;
        let listings = parse(html, "https://rent.591.com.tw");
        let metro = listings[0].metro.as_ref().unwrap();
        assert_eq!(metro.metro_value_text, "300 meters");
        assert_eq!(metro.station_name.as_deref(), Some("Jiannan Rd."));
    }

    #[test]
    fn malformed_document_yields_empty_vec() {
        assert!(parse("<html><body>not a listings page</body></html>", "https://rent.591.com.tw").is_empty());
    }

    #[test]
    fn image_urls_prefer_lazy_load_attribute_and_stay_ordered() {
        let html = r#"
            <div class="item-info">
                <div class="item-info-title">Gallery</div>
                <img data-src="https://img/1.jpg">
                <img data-src="https://img/2.jpg">
            </div>
        "#;
        let listings = parse(html, "https://rent.591.com.tw");
        assert_eq!(listings[0].image_urls, vec!["https://img/1.jpg", "https://img/2.jpg"]);
    }
}
