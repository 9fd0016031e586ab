use crate::common::{listing_html, page, test_client};
use rocket::http::{ContentType, Status};
use std::collections::HashMap;

#[test]
fn single_station_notify_all_dispatches_every_listing() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(
        url.to_string(),
        page(&[
            listing_html("Cozy studio", "/rent-detail/111", Some(900)),
            listing_html("Sunny loft", "/rent-detail/222", Some(200)),
        ]),
    );
    let client = test_client(responses);

    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(r#"{{"url":"{url}","notify_mode":"all"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["data"]["summary"]["total_rentals"], 2);
    assert_eq!(body["data"]["summary"]["new_rentals"], 2);
    assert_eq!(body["data"]["summary"]["notifications_sent"], true);

    let calls = client.dispatcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
}

#[test]
fn filtered_silent_notifies_far_listing_but_marks_it_silent() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(url.to_string(), page(&[listing_html("Far out place", "/rent-detail/333", Some(900))]));
    let client = test_client(responses);

    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"url":"{url}","notify_mode":"filtered","filtered_mode":"silent","filter":{{"mrt_distance_threshold":600}}}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["data"]["summary"]["new_rentals"], 1);
    let rental = &body["data"]["rentals"][0];
    assert_eq!(rental["notification"]["will_notify"], true);
    assert_eq!(rental["notification"]["is_silent"], true);

    let calls = client.dispatcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].silent, true);
}

#[test]
fn filtered_normal_excludes_far_listings_from_dispatch_but_keeps_them_in_total() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(
        url.to_string(),
        page(&[
            listing_html("Near A", "/rent-detail/1", Some(300)),
            listing_html("Far B", "/rent-detail/2", Some(900)),
            listing_html("Near C", "/rent-detail/3", Some(400)),
        ]),
    );
    let client = test_client(responses);

    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"url":"{url}","notify_mode":"filtered","filtered_mode":"normal","filter":{{"mrt_distance_threshold":600}}}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["data"]["summary"]["total_rentals"], 3);
    assert_eq!(body["data"]["summary"]["new_rentals"], 2);

    let calls = client.dispatcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let dispatched_titles: Vec<&str> = calls[0].iter().map(|p| p.title.as_str()).collect();
    assert_eq!(dispatched_titles, vec!["Near A", "Near C"]);
}

#[test]
fn recrawl_only_notifies_listings_not_previously_seen() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let mut responses = HashMap::new();
    responses.insert(url.to_string(), page(&[listing_html("First seen", "/rent-detail/10", None)]));
    let client = test_client(responses);

    let body = format!(r#"{{"url":"{url}","notify_mode":"all"}}"#);
    let first = client.post("/crawl").header(ContentType::JSON).body(body.clone()).dispatch();
    assert_eq!(first.status(), Status::Ok);

    let second = client.post("/crawl").header(ContentType::JSON).body(body).dispatch();
    assert_eq!(second.status(), Status::Ok);
    let second: serde_json::Value = second.into_json().unwrap();
    assert_eq!(second["data"]["summary"]["total_rentals"], 1);
    assert_eq!(second["data"]["summary"]["new_rentals"], 0);
    assert_eq!(second["data"]["summary"]["notifications_sent"], false);

    assert_eq!(client.dispatcher.calls.lock().unwrap().len(), 1);
}

#[test]
fn multi_station_fan_out_merges_shared_listing_and_unions_metro_facets() {
    let base = "https://rent.591.com.tw/list?region=1&station=4232,4233";
    let station_a = "https://rent.591.com.tw/list?region=1&station=4232";
    let station_b = "https://rent.591.com.tw/list?region=1&station=4233";

    let mut responses = HashMap::new();
    responses.insert(
        station_a.to_string(),
        page(&[
            listing_html("Shared place", "/rent-detail/500", Some(900)),
            listing_html("Only near A", "/rent-detail/501", Some(300)),
        ]),
    );
    responses.insert(
        station_b.to_string(),
        page(&[listing_html("Shared place", "/rent-detail/500", Some(200))]),
    );
    let client = test_client(responses);

    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(r#"{{"url":"{base}","notify_mode":"all"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["data"]["summary"]["total_rentals"], 2);
    assert_eq!(body["data"]["summary"]["multi_station"], true);
    assert_eq!(body["data"]["summary"]["station_count"], 2);

    let shared = body["data"]["rentals"].as_array().unwrap().iter().find(|r| r["id"] == "500").unwrap();
    assert_eq!(shared["metro_distances"].as_array().unwrap().len(), 2);
}

#[test]
fn fetch_failure_on_a_single_station_query_surfaces_as_server_error() {
    let url = "https://rent.591.com.tw/list?region=1&station=4232";
    let client = test_client(HashMap::new());

    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(r#"{{"url":"{url}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::InternalServerError);
}

#[test]
fn multi_station_partial_fetch_failure_is_captured_not_fatal() {
    let base = "https://rent.591.com.tw/list?region=1&station=4232,4233";
    let station_a = "https://rent.591.com.tw/list?region=1&station=4232";

    let mut responses = HashMap::new();
    responses.insert(station_a.to_string(), page(&[listing_html("Only A", "/rent-detail/9", None)]));
    let client = test_client(responses);

    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(format!(r#"{{"url":"{base}","notify_mode":"all"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["data"]["summary"]["total_rentals"], 1);
    assert_eq!(body["data"]["summary"]["crawl_errors"].as_array().unwrap().len(), 1);
}

#[test]
fn invalid_url_is_rejected_before_any_fetch() {
    let client = test_client(HashMap::new());
    let res = client
        .post("/crawl")
        .header(ContentType::JSON)
        .body(r#"{"url":"https://example.com/list?region=1"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn parse_query_returns_canonical_facets_without_fetching() {
    let client = test_client(HashMap::new());
    let res = client
        .post("/query/parse")
        .header(ContentType::JSON)
        .body(r#"{"url":"https://rent.591.com.tw/list?region=1&station=4232"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["search_criteria"]["region"], "1");
    assert!(body["query_id"].as_str().unwrap().contains("region1"));
}
