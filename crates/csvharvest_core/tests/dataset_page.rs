use csvharvest_core::DatasetPage;
use pretty_assertions::assert_eq;

#[test]
fn page_decodes_with_null_mime_and_missing_fields() {
    let body = r#"{
        "data": [
            {"id": "ds1", "uri": "https://catalog/ds1", "resources": [
                {"id": "r1", "url": "https://f/a.csv", "mime": "text/csv"},
                {"id": "r2", "url": "https://f/b", "mime": null}
            ]},
            {"id": "ds2"}
        ],
        "total": 41,
        "next_page": "https://catalog/api/1/datasets/?page=2"
    }"#;

    let page: DatasetPage = serde_json::from_str(body).unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].resources[1].mime, None);
    assert_eq!(page.data[0].resources[1].mime(), "");
    assert!(page.data[1].resources.is_empty());
    assert_eq!(page.total, Some(41));
}

#[test]
fn pages_to_fetch_rounds_up() {
    let page = DatasetPage {
        total: Some(41),
        ..DatasetPage::default()
    };
    assert_eq!(page.pages_to_fetch(10), 5);
    assert_eq!(page.pages_to_fetch(41), 1);

    let exact = DatasetPage {
        total: Some(40),
        ..DatasetPage::default()
    };
    assert_eq!(exact.pages_to_fetch(10), 4);
    assert_eq!(DatasetPage::default().pages_to_fetch(10), 0);
}
