use chrono::TimeZone;
use chrono_tz::Asia::Tokyo;

use super::*;

fn tokyo(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Tokyo
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn sale(id: i64) -> Sale {
    Sale {
        id,
        name: format!("sale {id}"),
        status: SaleStatus::NotHeld,
        start_datetime: tokyo(2024, 6, 1, 10, 0),
        end_datetime: None,
        sale_end_datetime: None,
        repeat_cron_rule: None,
        end_total_item_count: None,
        end_unit_item_count: None,
        products: Vec::new(),
        product_history: Vec::new(),
    }
}

fn history(product_id: i64, total_item_count: i64) -> ProductHistory {
    ProductHistory {
        product_id,
        total_item_count,
    }
}

fn include(product_id: i64) -> SaleProduct {
    SaleProduct {
        product_id,
        rule: SaleRule::Include,
    }
}

fn file(sales: Vec<Sale>) -> SalesFile {
    SalesFile { sales }
}

#[test]
fn parses_catalog_yaml() {
    let yaml = r#"
sales:
  - id: 1
    name: "Weekend singles"
    start_datetime: "2024-06-01T10:00:00+09:00"
    end_datetime: "2024-06-01T18:00:00+09:00"
    repeat_cron_rule: "0 10 * * 6,7"
    end_unit_item_count: 3
    products:
      - product_id: 100
        rule: include
      - product_id: 101
        rule: exclude
  - id: 2
    name: "Opening week"
    status: on_held
    start_datetime: "2024-06-01T00:00:00+09:00"
    sale_end_datetime: "2024-06-08T00:00:00+09:00"
    end_total_item_count: 50
    product_history:
      - product_id: 100
        total_item_count: 12
"#;
    let parsed: SalesFile = serde_yaml::from_str(yaml).expect("valid yaml");
    assert_eq!(parsed.sales.len(), 2);

    let weekend = &parsed.sales[0];
    assert_eq!(weekend.status, SaleStatus::NotHeld);
    assert_eq!(weekend.start_datetime, tokyo(2024, 6, 1, 10, 0));
    assert!(weekend.is_repeating());
    assert_eq!(weekend.products[1].rule, SaleRule::Exclude);

    let opening = &parsed.sales[1];
    assert_eq!(opening.status, SaleStatus::OnHeld);
    assert!(!opening.is_repeating());
    assert_eq!(opening.total_item_count(), 12);

    validate_sales(&parsed, Tokyo).expect("catalog validates");
}

#[test]
fn blank_rule_is_not_repeating() {
    let mut s = sale(1);
    s.repeat_cron_rule = Some("  ".to_string());
    assert!(!s.is_repeating());
    assert_eq!(s.repeat_rule(), "");
}

#[test]
fn window_uses_occurrence_end() {
    let mut s = sale(1);
    s.end_datetime = Some(tokyo(2024, 6, 1, 12, 0));
    s.sale_end_datetime = Some(tokyo(2024, 12, 1, 0, 0));
    let window = s.window();
    assert_eq!(window.start_date, s.start_datetime);
    assert_eq!(window.end_date, Some(tokyo(2024, 6, 1, 12, 0)));
}

#[test]
fn total_limit_reached_at_threshold() {
    let mut s = sale(1);
    s.end_total_item_count = Some(10);
    s.product_history = vec![history(100, 4), history(101, 5)];
    assert!(!s.is_item_limit_reached());
    s.record_sold(101, 1).expect("in range");
    assert!(s.is_item_limit_reached());
}

#[test]
fn zero_total_limit_is_no_limit() {
    let mut s = sale(1);
    s.end_total_item_count = Some(0);
    assert!(!s.is_item_limit_reached());
}

#[test]
fn unit_limit_needs_every_included_product() {
    let mut s = sale(1);
    s.end_unit_item_count = Some(2);
    s.products = vec![include(100), include(101)];
    s.product_history = vec![history(100, 2)];
    assert!(!s.is_item_limit_reached(), "101 has no history yet");

    s.record_sold(101, 2).expect("in range");
    assert!(s.is_item_limit_reached());
}

#[test]
fn unit_limit_overrides_total_limit() {
    let mut s = sale(1);
    s.end_total_item_count = Some(3);
    s.end_unit_item_count = Some(5);
    s.products = vec![include(100)];
    s.product_history = vec![history(100, 4)];
    assert!(!s.is_item_limit_reached());
}

#[test]
fn unit_limit_without_included_products_falls_back_to_total() {
    let mut s = sale(1);
    s.end_total_item_count = Some(3);
    s.end_unit_item_count = Some(1);
    s.products = vec![SaleProduct {
        product_id: 100,
        rule: SaleRule::Exclude,
    }];
    s.product_history = vec![history(200, 3)];
    assert!(s.is_item_limit_reached());
}

#[test]
fn record_sold_accumulates_per_product() {
    let mut s = sale(1);
    s.record_sold(100, 2).expect("in range");
    s.record_sold(100, 3).expect("in range");
    s.record_sold(200, 1).expect("in range");
    assert_eq!(s.product_history, vec![history(100, 5), history(200, 1)]);
}

#[test]
fn record_sold_rejects_count_overflow() {
    let mut s = sale(1);
    s.product_history = vec![history(100, i64::MAX - 1)];
    assert_eq!(
        s.record_sold(100, 2),
        Err(SoldCountOverflow { product_id: 100 })
    );
    assert_eq!(s.product_history, vec![history(100, i64::MAX - 1)]);

    s.record_sold(100, 1).expect("still in range");
    assert_eq!(s.product_history, vec![history(100, i64::MAX)]);
}

#[test]
fn total_item_count_saturates_across_products() {
    let mut s = sale(1);
    s.end_total_item_count = Some(i64::MAX);
    s.product_history = vec![history(100, i64::MAX), history(200, 5)];
    assert_eq!(s.total_item_count(), i64::MAX);
    assert!(s.is_item_limit_reached());
}

#[test]
fn validate_rejects_empty_name() {
    let mut s = sale(1);
    s.name = "   ".to_string();
    let err = validate_sales(&file(vec![s]), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("non-empty name")));
}

#[test]
fn validate_rejects_duplicate_ids() {
    let err = validate_sales(&file(vec![sale(7), sale(7)]), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("duplicate sale id: 7")));
}

#[test]
fn validate_rejects_off_grid_minutes() {
    let mut s = sale(1);
    s.end_datetime = Some(tokyo(2024, 6, 1, 10, 15));
    let err = validate_sales(&file(vec![s]), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("end_datetime")));
}

#[test]
fn validate_rejects_seconds() {
    let mut s = sale(1);
    s.start_datetime = Tokyo
        .with_ymd_and_hms(2024, 6, 1, 10, 0, 30)
        .unwrap()
        .with_timezone(&Utc);
    let err = validate_sales(&file(vec![s]), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("seconds")));
}

#[test]
fn validate_checks_grid_in_operating_zone() {
    // 04:15 UTC is 10:00 in Kathmandu and 13:15 in Tokyo.
    let s = Sale {
        start_datetime: Utc.with_ymd_and_hms(2024, 6, 1, 4, 15, 0).unwrap(),
        ..sale(1)
    };
    assert!(validate_sales(&file(vec![s.clone()]), chrono_tz::Asia::Kathmandu).is_ok());
    assert!(validate_sales(&file(vec![s]), Tokyo).is_err());
}

#[test]
fn validate_rejects_end_before_start() {
    let mut s = sale(1);
    s.end_datetime = Some(tokyo(2024, 5, 31, 10, 0));
    let err = validate_sales(&file(vec![s]), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("before start_datetime")));
}

#[test]
fn validate_rejects_unparseable_rule() {
    let mut s = sale(1);
    s.repeat_cron_rule = Some("0 0 * *".to_string());
    let err = validate_sales(&file(vec![s]), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("repeat_cron_rule")));
}

#[test]
fn validate_rejects_rule_whose_day_never_occurs() {
    let mut s = sale(1);
    s.repeat_cron_rule = Some("0 0 30 2 *".to_string());
    let err = validate_sales(&file(vec![s]), Tokyo).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ref msg) if msg.contains("sale 1 repeat_cron_rule")
            && msg.contains("never occurs")
    ));
}

#[test]
fn load_sales_reports_missing_file() {
    let err = load_sales(Path::new("/nonexistent/sales.yaml"), Tokyo).unwrap_err();
    assert!(matches!(err, ConfigError::SalesFileIo { .. }));
}

#[test]
fn load_sales_reads_and_validates_file() {
    let path = std::env::temp_dir().join(format!("tcgpos-sales-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "sales:\n  - id: 1\n    name: Daily\n    start_datetime: \"2024-06-01T10:00:00+09:00\"\n    repeat_cron_rule: \"0 10 * * *\"\n",
    )
    .unwrap();
    let loaded = load_sales(&path, Tokyo);
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.unwrap().sales[0].repeat_rule(), "0 10 * * *");
}

#[test]
fn status_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(SaleStatus::OnHeld).unwrap(),
        serde_json::json!("on_held")
    );
    assert_eq!(SaleStatus::NotHeld.to_string(), "not_held");
}

#[test]
fn bundled_catalog_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/sales.yaml");
    let loaded = load_sales(&path, Tokyo).expect("bundled catalog loads");
    assert_eq!(loaded.sales.len(), 4);
    assert!(loaded.sales.iter().filter(|s| s.is_repeating()).count() == 3);
}
