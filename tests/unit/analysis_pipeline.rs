//! Normalization pipeline tests over realistic filing data

use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::{logging, test_data};
use dart_financials::analysis::{parse_raw_items, process_financial_data};
use dart_financials::models::{MetricId, StatementDivision, StatementType};

#[test]
fn test_revenue_and_operating_profit_example() {
    let raw = vec![
        test_data::line_item("매출액", "IS", "1,000,000", "900,000", "1"),
        test_data::line_item("영업이익", "IS", "100,000", "80,000", "2"),
    ];

    let result = process_financial_data(&raw);

    let revenue = result.key_metrics.get(MetricId::Revenue).unwrap();
    assert_eq!(revenue.current, 1_000_000);
    assert_eq!(revenue.previous, 900_000);
    assert_eq!(revenue.change, 100_000);
    assert!((revenue.change_rate - 11.11).abs() < 0.01);

    let operating_margin = result.key_metrics.ratios.operating_margin.unwrap();
    assert!((operating_margin - 10.0).abs() < 1e-9);

    // Net income is missing, so its margin is left out entirely
    assert_eq!(result.key_metrics.ratios.net_margin, None);
    assert_eq!(result.key_metrics.ratios.debt_ratio, None);
}

#[test]
fn test_samsung_annual_report() {
    logging::init_test_logging();
    logging::log_test_step("Processing abridged Samsung 2023 filing");

    let result = process_financial_data(&test_data::samsung_line_items());
    logging::log_test_data("summary", &result.summary);

    assert_eq!(result.summary.total_items, 8);
    assert_eq!(result.summary.balance_sheet_items, 4);
    assert_eq!(result.summary.income_statement_items, 4);
    assert_eq!(result.summary.amount_parse_failures, 0);

    let first = &result.balance_sheet[0];
    assert_eq!(first.account_name, "유동자산");
    assert_eq!(first.statement_division, StatementDivision::Consolidated);
    assert_eq!(first.statement_type, StatementType::BalanceSheet);
    assert_eq!(first.current_period.date, "2023.12.31 현재");
    assert_eq!(first.currency, "KRW");

    let metrics = &result.key_metrics;
    assert_eq!(metrics.metrics.len(), 6);
    assert_eq!(metrics.get(MetricId::TotalAssets).unwrap().change, 7_481_473_000_000);
    assert_eq!(metrics.get(MetricId::Revenue).unwrap().change, -43_295_866_000_000);
    assert!(metrics.get(MetricId::Revenue).unwrap().change_rate < 0.0);

    // Only the exact "당기순이익" label counts, not "당기순이익(손실)"
    assert_eq!(metrics.get(MetricId::NetIncome).unwrap().name, "당기순이익");

    let debt_ratio = metrics.ratios.debt_ratio.unwrap();
    assert!(debt_ratio > 20.0 && debt_ratio < 20.5);
    let operating_margin = metrics.ratios.operating_margin.unwrap();
    assert!(operating_margin > 2.5 && operating_margin < 2.6);
}

#[test]
fn test_statements_sorted_by_order() {
    let raw = vec![
        test_data::line_item("영업이익", "IS", "3", "0", "10"),
        test_data::line_item("매출원가", "IS", "2", "0", "9"),
        test_data::line_item("매출액", "IS", "1", "0", "1"),
        test_data::line_item("기타", "IS", "4", "0", "not a number"),
    ];

    let result = process_financial_data(&raw);
    let names: Vec<&str> = result
        .income_statement
        .iter()
        .map(|item| item.account_name.as_str())
        .collect();

    // Unparseable order counts as 0; "10" sorts after "9" numerically
    assert_eq!(names, vec!["기타", "매출액", "매출원가", "영업이익"]);
}

#[test]
fn test_malformed_amounts_are_counted_not_fatal() {
    let raw = vec![
        test_data::line_item("자산총계", "BS", "12억", "1,000", "1"),
        test_data::line_item("부채총계", "BS", "-", "", "2"),
    ];

    let result = process_financial_data(&raw);

    let assets = result.key_metrics.get(MetricId::TotalAssets).unwrap();
    assert_eq!(assets.current, 0);
    assert_eq!(assets.previous, 1_000);
    assert_eq!(result.summary.amount_parse_failures, 1);

    // Zero assets means no debt ratio
    assert_eq!(result.key_metrics.ratios.debt_ratio, None);
}

#[test]
fn test_other_statements_are_excluded() {
    let raw = vec![
        test_data::line_item("자산총계", "BS", "100", "90", "1"),
        test_data::line_item("현금흐름", "CF", "5", "4", "1"),
    ];

    let result = process_financial_data(&raw);

    assert_eq!(result.summary.total_items, 2);
    assert_eq!(result.summary.other_items, 1);
    assert_eq!(result.balance_sheet.len() + result.income_statement.len(), 1);
}

#[test]
fn test_processing_is_deterministic() {
    let raw = test_data::samsung_line_items();

    let first = serde_json::to_string(&process_financial_data(&raw)).unwrap();
    let second = serde_json::to_string(&process_financial_data(&raw)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_serialized_shape() {
    let raw = parse_raw_items(
        r#"[{"account_nm": "매출액", "sj_div": "IS", "thstrm_amount": "200", "frmtrm_amount": "100", "ord": "1"}]"#,
    )
    .unwrap();

    let value = serde_json::to_value(process_financial_data(&raw)).unwrap();

    assert_eq!(value["key_metrics"]["revenue"]["current"], 200);
    assert_eq!(value["key_metrics"]["revenue"]["change_rate"], 100.0);
    assert!(value["key_metrics"]["ratios"].as_object().unwrap().is_empty());
    assert_eq!(value["summary"]["income_statement_items"], 1);
    assert_eq!(value["income_statement"][0]["statement_division"], "CFS");
}
