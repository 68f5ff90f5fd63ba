use fqa_agent::source::dart::parse_list_json;
use fqa_core::error::codes;
use pretty_assertions::assert_eq;

#[test]
fn ok_status_lists_filings_in_provider_order() {
    let body = r#"{
        "status": "000",
        "message": "정상",
        "list": [
            {"corp_code": "00126380", "rcept_no": "20251127000739", "report_nm": "증권발행실적보고서 ", "rcept_dt": "20251127"},
            {"rcept_no": "20251120000111", "report_nm": "투자설명서", "rcept_dt": "20251120", "rm": ""}
        ]
    }"#;
    let items = parse_list_json(body).expect("parse");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].rcept_no, "20251127000739");
    assert_eq!(items[0].report_nm, "증권발행실적보고서");
    assert_eq!(items[1].rcept_dt, "20251120");
}

#[test]
fn no_data_status_is_an_empty_result() {
    let items = parse_list_json(r#"{"status":"013","message":"조회된 데이타가 없습니다."}"#)
        .expect("parse");
    assert!(items.is_empty());
}

#[test]
fn other_statuses_are_errors() {
    let err = parse_list_json(r#"{"status":"010","message":"등록되지 않은 키입니다."}"#)
        .expect_err("status");
    assert_eq!(err.code, codes::DART_API_STATUS);
    assert!(!err.retryable);
    assert!(err.details.unwrap_or_default().contains("status=010"));

    let err = parse_list_json(r#"{"status":"020","message":"요청 제한을 초과하였습니다."}"#)
        .expect_err("status");
    assert!(err.retryable);
}

#[test]
fn malformed_body_is_a_request_failure() {
    let err = parse_list_json("<html>").expect_err("garbage");
    assert_eq!(err.code, codes::DART_REQUEST_FAILED);
}
