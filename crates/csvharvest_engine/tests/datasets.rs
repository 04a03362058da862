use csvharvest_engine::{Api, DatasetPager, QueryError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page: u64, ids: &[&str]) {
    let data: Vec<_> = ids
        .iter()
        .map(|id| json!({"id": id, "uri": format!("https://catalog/{id}"), "resources": []}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/1/datasets/"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

fn api_for(server: &MockServer) -> Api {
    Api::new(&format!("{}/api/1/", server.uri()), reqwest::Client::new()).unwrap()
}

#[tokio::test]
async fn yields_every_item_then_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &["a", "b"]).await;
    mount_page(&server, 2, &["c", "d"]).await;
    mount_page(&server, 3, &[]).await;

    let mut pager = DatasetPager::new(api_for(&server), 2, 1);
    let mut ids = Vec::new();
    while let Some(dataset) = pager.next_dataset().await.unwrap() {
        ids.push(dataset.id);
    }
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert_eq!(pager.page(), 3);

    // Exhausted pagers stay exhausted without asking the API again.
    assert!(pager.next_dataset().await.unwrap().is_none());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn start_page_is_honoured() {
    let server = MockServer::start().await;
    mount_page(&server, 2, &["c"]).await;
    mount_page(&server, 3, &[]).await;

    let datasets = DatasetPager::new(api_for(&server), 5, 2)
        .collect(None)
        .await
        .unwrap();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].id, "c");
}

#[tokio::test]
async fn limit_stops_before_next_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &["a", "b", "c"]).await;

    let datasets = DatasetPager::new(api_for(&server), 3, 1)
        .collect(Some(2))
        .await
        .unwrap();
    assert_eq!(datasets.len(), 2);
}

#[tokio::test]
async fn query_failure_propagates() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &["a"]).await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut pager = DatasetPager::new(api_for(&server), 1, 1);
    assert_eq!(pager.next_dataset().await.unwrap().unwrap().id, "a");
    assert!(matches!(
        pager.next_dataset().await,
        Err(QueryError::Status { status: 500, .. })
    ));
}
