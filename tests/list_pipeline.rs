use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prms::error::SERVER_ERROR_MESSAGE;
use prms::models::{AuditLog, Patient, RhuExportRecord};
use prms::pipeline::{source, Control, DateRange, FetchState, ListQuery, ListView};
use prms::ApiClient;

fn patient_rows(ids: std::ops::RangeInclusive<i64>) -> Vec<Value> {
    ids.map(|id| json!({"id": id.to_string(), "full_name": format!("Patient {id}"), "sex": "Female"}))
        .collect()
}

fn patients_page(page: u32, ids: std::ops::RangeInclusive<i64>) -> Value {
    json!({
        "success": true,
        "data": patient_rows(ids),
        "pagination": {"currentPage": page, "totalPages": 3, "totalRecords": 53, "itemsPerPage": 25}
    })
}

async fn patients_view(server: &MockServer) -> Arc<ListView<Patient>> {
    let client = ApiClient::with_base_url(&server.uri()).unwrap();
    Arc::new(ListView::new("patients", Arc::new(source::patients(client)), ListQuery::new()))
}

fn query_of(request: &wiremock::Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn second_page_of_fifty_three_patients() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_patients.php"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients_page(1, 1..=25)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get_patients.php"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients_page(2, 26..=50)))
        .expect(1)
        .mount(&server)
        .await;

    let view = patients_view(&server).await;
    view.load().await;
    let snapshot = view.apply(Control::Page(2)).await;

    assert_eq!(snapshot.state, FetchState::Loaded);
    assert_eq!(snapshot.pagination.total_pages, 3);
    assert_eq!(snapshot.pagination.current_page, 2);
    assert_eq!(snapshot.rows.len(), 25);
    assert_eq!(snapshot.rows[0].display_id(), "0026");
}

#[tokio::test]
async fn backend_failure_shows_its_message_and_no_rows() {
    let server = MockServer::start().await;
    Mock::given(path("/get_patients.php"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients_page(1, 1..=25)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(path("/get_patients.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "DB unreachable"})),
        )
        .mount(&server)
        .await;

    let view = patients_view(&server).await;
    assert_eq!(view.load().await.rows.len(), 25);

    let snapshot = view.apply(Control::Refresh).await;
    assert_eq!(snapshot.error(), Some("DB unreachable"));
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.pagination.total_records, 0);
}

#[tokio::test]
async fn transport_failures_use_the_generic_message() {
    let server = MockServer::start().await;
    Mock::given(path("/get_patients.php"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let snapshot = patients_view(&server).await.load().await;
    match &snapshot.state {
        FetchState::Failed { message, transport } => {
            assert_eq!(message, SERVER_ERROR_MESSAGE);
            assert!(transport);
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn slow_stale_response_never_replaces_a_newer_one() {
    let server = MockServer::start().await;
    Mock::given(path("/get_patients.php"))
        .and(query_param("search", "santos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(patients_page(1, 1..=3))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/get_patients.php"))
        .and(query_param("search", "reyes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": 42, "full_name": "Ana Reyes"}],
            "pagination": {"currentPage": 1, "totalPages": 1, "totalRecords": 1, "itemsPerPage": 25}
        })))
        .mount(&server)
        .await;

    let view = patients_view(&server).await;
    let slow = tokio::spawn({
        let view = view.clone();
        async move { view.apply(Control::Search("santos".into())).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fresh = view.apply(Control::Search("reyes".into())).await;
    assert_eq!(fresh.rows.len(), 1);

    slow.await.unwrap();
    let settled = view.snapshot().await;
    assert_eq!(settled.rows.len(), 1);
    assert_eq!(settled.rows[0].full_name, "Ana Reyes");
    assert_eq!(settled.query.search(), "reyes");
}

#[tokio::test]
async fn page_size_change_restarts_at_page_one() {
    let server = MockServer::start().await;
    Mock::given(path("/get_patients.php"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients_page(1, 1..=25)))
        .mount(&server)
        .await;
    Mock::given(path("/get_patients.php"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients_page(2, 26..=50)))
        .mount(&server)
        .await;

    let view = patients_view(&server).await;
    view.load().await;
    view.apply(Control::NextPage).await;
    let snapshot = view.apply(Control::PageSize(50)).await;
    assert_eq!(snapshot.query.page(), 1);

    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    assert_eq!(query_of(last, "page").as_deref(), Some("1"));
    assert_eq!(query_of(last, "limit").as_deref(), Some("50"));
}

#[tokio::test]
async fn audit_log_array_is_paged_locally() {
    let server = MockServer::start().await;
    let rows: Vec<Value> = (1..=30)
        .map(|id| {
            json!({
                "id": id,
                "created_at": format!("2025-03-{:02} 08:00:00", id),
                "username": "admin",
                "action": if id % 2 == 0 { "LOGIN" } else { "UPDATE_PATIENT" },
                "result": "success"
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/get_audit_logs.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(rows)))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&server.uri()).unwrap();
    let view: ListView<AuditLog> = ListView::new(
        "audit_logs",
        Arc::new(source::audit_logs(client)),
        ListQuery::new().with_filter("action", "all"),
    );

    let first = view.load().await;
    assert_eq!(first.rows.len(), 25);
    assert_eq!(first.pagination.total_pages, 2);
    assert_eq!(first.pagination.total_records, 30);

    let second = view.apply(Control::NextPage).await;
    assert_eq!(second.rows.len(), 5);

    let searched = view.apply(Control::Search("login".into())).await;
    assert_eq!(searched.pagination.total_records, 15);
    assert_eq!(searched.query.page(), 1);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| query_of(r, "page").is_none() && query_of(r, "limit").is_none()));
    assert!(requests.iter().all(|r| query_of(r, "action").is_none()));
}

#[tokio::test]
async fn rhu_report_rows_are_paged_locally() {
    let server = MockServer::start().await;
    let rows: Vec<Value> = (1..=30)
        .map(|i| {
            json!({
                "barangay": if i % 3 == 0 { "Bangyas" } else { "Dayap" },
                "disease": "Dengue",
                "icd_code": "A90",
                "age": i + 10,
                "gender": "Female",
                "month_year": "2025-03",
                "case_count": i
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/get_rhu_export_data.php"))
        .and(query_param("days", "30"))
        .and(query_param("disease", "Dengue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": rows})))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&server.uri()).unwrap();
    let query = ListQuery::new()
        .with_filter("days", "30")
        .with_filter("disease", "Dengue")
        .with_filter("barangay", "all");
    let view: ListView<RhuExportRecord> = ListView::new("reports", Arc::new(source::rhu_reports(client)), query);

    let first = view.load().await;
    assert_eq!(first.state, FetchState::Loaded);
    assert_eq!(first.rows.len(), 25);
    assert_eq!(first.pagination.total_records, 30);

    let second = view.apply(Control::Page(2)).await;
    assert_eq!(second.rows.len(), 5);
    assert_eq!(second.rows[4].case_count, 30);

    let searched = view.apply(Control::Search("bangyas".into())).await;
    assert_eq!(searched.pagination.total_records, 10);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| query_of(r, "page").is_none() && query_of(r, "limit").is_none()));
    assert!(requests.iter().all(|r| query_of(r, "barangay").is_none()));
}

#[tokio::test]
async fn initial_search_and_dates_need_a_single_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_patients.php"))
        .and(query_param("page", "1"))
        .and(query_param("search", "dela cruz"))
        .and(query_param("date_from", "2025-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients_page(1, 1..=25)))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&server.uri()).unwrap();
    let query = ListQuery::new()
        .with_search("dela cruz")
        .with_date_range(DateRange { from: chrono::NaiveDate::from_ymd_opt(2025, 3, 1), to: None });
    let view: ListView<Patient> = ListView::new("patients", Arc::new(source::patients(client)), query);

    let snapshot = view.load().await;
    assert_eq!(snapshot.state, FetchState::Loaded);
    assert_eq!(snapshot.rows.len(), 25);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
