use crate::common::{listing_html, page, test_client};
use rocket::http::{ContentType, Status};
use std::collections::HashMap;

fn crawl_once(client: &rocket::local::blocking::Client, url: &str) {
    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(r#"{{"url":"{url}","notify_mode":"all"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn health_reports_ok_and_service_name() {
    let client = test_client(HashMap::new());
    let res = client.get("/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "rental-watch");
}

#[test]
fn rentals_for_unknown_query_is_not_found() {
    let client = test_client(HashMap::new());
    let res = client.get("/query/does-not-exist/rentals").dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn rentals_and_list_queries_reflect_a_crawled_query() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(url.to_string(), page(&[listing_html("Listed place", "/rent-detail/700", None)]));
    let client = test_client(responses);
    crawl_once(&client, url);

    let res = client.get("/queries?region=1").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["total"], 1);
    let query_id = body["queries"][0]["id"].as_str().unwrap().to_string();

    let res = client.get(format!("/query/{query_id}/rentals")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["rentals"].as_array().unwrap().len(), 1);
    assert_eq!(body["rentals"][0]["title"], "Listed place");
}

#[test]
fn similar_queries_scores_shared_region_and_station() {
    let url_a = "https://rent.591.com.tw/list?region=1&station=4232";
    let url_b = "https://rent.591.com.tw/list?region=1&station=4232,4233";
    let mut responses = HashMap::new();
    responses.insert(url_a.to_string(), page(&[listing_html("A", "/rent-detail/1", None)]));
    responses.insert(url_b.to_string(), page(&[listing_html("B", "/rent-detail/2", None)]));
    let client = test_client(responses);
    crawl_once(&client, url_a);
    crawl_once(&client, url_b);

    let res = client.get("/queries?region=1").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let query_a = body["queries"].as_array().unwrap().iter().find(|q| q["stations"].as_array().unwrap().len() == 1).unwrap();
    let query_id = query_a["id"].as_str().unwrap();

    let res = client.get(format!("/query/{query_id}/similar")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let similar: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(similar.iter().any(|q| q["score"].as_i64().unwrap() > 0));
}

#[test]
fn statistics_tallies_queries_and_rentals_by_region() {
    let url = "https://rent.591.com.tw/list?region=2&station=4232";
    let mut responses = HashMap::new();
    responses.insert(url.to_string(), page(&[listing_html("Stat place", "/rent-detail/800", None)]));
    let client = test_client(responses);
    crawl_once(&client, url);

    let res = client.get("/query/statistics").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["total_queries"].as_i64().unwrap() >= 1);
    assert!(body["regions"].as_array().unwrap().iter().any(|r| r["region"] == "2"));
}

#[test]
fn clear_without_confirm_is_rejected() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(url.to_string(), page(&[listing_html("To clear", "/rent-detail/900", None)]));
    let client = test_client(responses);
    crawl_once(&client, url);

    let res = client.get("/queries?region=1").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let query_id = body["queries"][0]["id"].as_str().unwrap().to_string();

    let res = client.delete(format!("/query/{query_id}/clear")).dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn clear_with_confirm_removes_the_query_and_its_rentals() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(url.to_string(), page(&[listing_html("To clear", "/rent-detail/901", None)]));
    let client = test_client(responses);
    crawl_once(&client, url);

    let res = client.get("/queries?region=1").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let query_id = body["queries"][0]["id"].as_str().unwrap().to_string();

    let res = client.delete(format!("/query/{query_id}/clear?confirm=true")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["rentals_removed"], 1);

    let res = client.get(format!("/query/{query_id}/rentals")).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn unauthenticated_requests_pass_when_no_api_key_is_configured() {
    let client = test_client(HashMap::new());
    let res = client.get("/queries").dispatch();
    assert_eq!(res.status(), Status::Ok);
}
