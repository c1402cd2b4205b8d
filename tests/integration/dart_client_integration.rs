//! OpenDART client tests against a local mock server

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{logging, test_data};
use dart_financials::api::{DartClient, FilingsSource, StatementRequest};
use dart_financials::models::{MetricId, ReportCode, StatementDivision};
use dart_financials::{CompanyRegistry, FinancialReportService, FinancialsError};

fn client_for(server: &MockServer) -> DartClient {
    DartClient::with_base_url("test-key", &server.uri(), 600, Duration::from_secs(5))
        .expect("Failed to build client")
}

#[tokio::test]
async fn test_fetch_statement_sends_expected_query() {
    logging::init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fnlttSinglAcnt.json"))
        .and(query_param("crtfc_key", "test-key"))
        .and(query_param("corp_code", "00126380"))
        .and(query_param("bsns_year", "2023"))
        .and(query_param("reprt_code", "11011"))
        .and(query_param("fs_div", "CFS"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(test_data::SAMSUNG_2023_RESPONSE, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let items = client_for(&server)
        .get_financial_statement(&StatementRequest::annual("00126380", "2023"))
        .await
        .unwrap();

    assert_eq!(items.len(), 8);
    assert_eq!(items[0].account_nm.as_deref(), Some("유동자산"));
}

#[tokio::test]
async fn test_no_data_status_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fnlttSinglAcnt.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "013",
            "message": "조회된 데이타가 없습니다."
        })))
        .mount(&server)
        .await;

    let items = client_for(&server)
        .get_financial_statement(&StatementRequest::annual("00434003", "2015"))
        .await
        .unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "010",
            "message": "등록되지 않은 키입니다."
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .get_financial_statement(&StatementRequest::annual("00126380", "2023"))
        .await;

    assert_matches!(
        result,
        Err(FinancialsError::Api { status, message }) if status == "010" && message.contains("키")
    );
}

#[tokio::test]
async fn test_http_failure_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .get_financial_statement(&StatementRequest::annual("00126380", "2023"))
        .await;

    assert_matches!(result, Err(FinancialsError::Http(_)));
}

#[tokio::test]
async fn test_report_service_end_to_end() {
    logging::init_test_logging();
    logging::log_test_step("Fetching a separate half-year report through the service");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fnlttSinglAcnt.json"))
        .and(query_param("reprt_code", "11012"))
        .and(query_param("fs_div", "OFS"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(test_data::SAMSUNG_2023_RESPONSE, "application/json"),
        )
        .mount(&server)
        .await;

    let registry = CompanyRegistry::with_records(test_data::sample_companies()).unwrap();
    let service = FinancialReportService::new(registry, client_for(&server));

    let report = service
        .fetch_report("00126380", "2023", ReportCode::HalfYear, StatementDivision::Separate)
        .await
        .unwrap();

    assert_eq!(report.company.corp_name, "삼성전자");
    assert_eq!(report.report_code, ReportCode::HalfYear);
    assert!(report.financial_data.key_metrics.get(MetricId::TotalEquity).is_some());

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["report_code"], "11012");
    assert_eq!(value["statement_division"], "OFS");
}
