use chrono::TimeZone;
use chrono_tz::Asia::Tokyo;

use super::*;
use crate::sales::{ProductHistory, SaleProduct, SaleRule};

fn tokyo(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Tokyo
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn one_off(id: i64) -> Sale {
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

/// Daily 10:00-12:00 occurrences starting 2024-06-01.
fn daily(id: i64, status: SaleStatus) -> Sale {
    Sale {
        status,
        end_datetime: Some(tokyo(2024, 6, 1, 12, 0)),
        repeat_cron_rule: Some("0 10 * * *".to_string()),
        ..one_off(id)
    }
}

fn plan(sales: &[Sale], now: DateTime<Utc>) -> Vec<StatusTransition> {
    plan_status_updates(sales, now, &RecurrenceWindowEvaluator::new(Tokyo))
}

fn transition(
    sale_id: i64,
    from: SaleStatus,
    to: SaleStatus,
    history_cleared: bool,
) -> StatusTransition {
    StatusTransition {
        sale_id,
        from,
        to,
        history_cleared,
    }
}

#[test]
fn floor_truncates_to_ten_minute_slot() {
    let now = Tokyo
        .with_ymd_and_hms(2024, 6, 3, 11, 7, 45)
        .unwrap()
        .with_timezone(&Utc)
        + TimeDelta::milliseconds(500);
    assert_eq!(floor_to_ten_minutes(now, Tokyo), tokyo(2024, 6, 3, 11, 0));
}

#[test]
fn floor_keeps_aligned_instant() {
    let now = tokyo(2024, 6, 3, 11, 50);
    assert_eq!(floor_to_ten_minutes(now, Tokyo), now);
}

#[test]
fn floor_follows_zone_offset() {
    // 04:20 UTC is 10:05 in Kathmandu (+05:45).
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 4, 20, 0).unwrap();
    assert_eq!(
        floor_to_ten_minutes(now, chrono_tz::Asia::Kathmandu),
        Utc.with_ymd_and_hms(2024, 6, 3, 4, 15, 0).unwrap()
    );
    assert_eq!(
        floor_to_ten_minutes(now, Tokyo),
        Utc.with_ymd_and_hms(2024, 6, 3, 4, 20, 0).unwrap()
    );
}

#[test]
fn one_off_sale_starts_once_start_passes() {
    let sales = [one_off(1)];
    assert_eq!(
        plan(&sales, tokyo(2024, 6, 1, 10, 5)),
        [transition(1, SaleStatus::NotHeld, SaleStatus::OnHeld, false)]
    );
}

#[test]
fn sales_not_yet_started_are_skipped() {
    let sales = [one_off(1)];
    assert!(plan(&sales, tokyo(2024, 6, 1, 9, 59)).is_empty());
}

#[test]
fn finished_sales_are_skipped() {
    let mut sale = one_off(1);
    sale.status = SaleStatus::Finished;
    assert!(plan(&[sale], tokyo(2024, 6, 2, 0, 0)).is_empty());
}

#[test]
fn running_sale_without_change_emits_nothing() {
    let mut sale = one_off(1);
    sale.status = SaleStatus::OnHeld;
    assert!(plan(&[sale], tokyo(2024, 6, 2, 0, 0)).is_empty());
}

#[test]
fn sale_end_finishes_the_sale() {
    let mut sale = one_off(1);
    sale.status = SaleStatus::OnHeld;
    sale.sale_end_datetime = Some(tokyo(2024, 6, 8, 0, 0));
    assert!(plan(&[sale.clone()], tokyo(2024, 6, 7, 23, 50)).is_empty());
    assert_eq!(
        plan(&[sale], tokyo(2024, 6, 8, 0, 0)),
        [transition(1, SaleStatus::OnHeld, SaleStatus::Finished, false)]
    );
}

#[test]
fn sold_out_one_off_sale_finishes() {
    let mut sale = one_off(1);
    sale.end_total_item_count = Some(5);
    sale.product_history = vec![ProductHistory {
        product_id: 100,
        total_item_count: 5,
    }];
    assert_eq!(
        plan(&[sale], tokyo(2024, 6, 1, 12, 0)),
        [transition(1, SaleStatus::NotHeld, SaleStatus::Finished, false)]
    );
}

#[test]
fn recurring_sale_starts_inside_an_occurrence() {
    let sales = [daily(1, SaleStatus::NotHeld)];
    assert_eq!(
        plan(&sales, tokyo(2024, 6, 3, 11, 5)),
        [transition(1, SaleStatus::NotHeld, SaleStatus::OnHeld, false)]
    );
}

#[test]
fn recurring_sale_waits_between_occurrences() {
    let sales = [daily(1, SaleStatus::NotHeld)];
    assert!(plan(&sales, tokyo(2024, 6, 3, 13, 0)).is_empty());
}

#[test]
fn recurring_sale_stops_after_occurrence_and_resets_history() {
    let mut sale = daily(1, SaleStatus::OnHeld);
    sale.record_sold(100, 3).expect("in range");
    assert_eq!(
        plan(&[sale], tokyo(2024, 6, 3, 12, 10)),
        [transition(1, SaleStatus::OnHeld, SaleStatus::NotHeld, true)]
    );
}

#[test]
fn sold_out_recurring_sale_returns_to_waiting() {
    let mut sale = daily(1, SaleStatus::OnHeld);
    sale.end_unit_item_count = Some(1);
    sale.products = vec![SaleProduct {
        product_id: 100,
        rule: SaleRule::Include,
    }];
    sale.record_sold(100, 1).expect("in range");
    assert_eq!(
        plan(&[sale], tokyo(2024, 6, 3, 10, 30)),
        [transition(1, SaleStatus::OnHeld, SaleStatus::NotHeld, true)]
    );
}

#[test]
fn recurring_sale_finishes_at_sale_end() {
    let mut sale = daily(1, SaleStatus::OnHeld);
    sale.sale_end_datetime = Some(tokyo(2024, 6, 30, 0, 0));
    let transitions = plan(&[sale], tokyo(2024, 6, 30, 10, 0));
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].to, SaleStatus::Finished);
}

#[test]
fn recurring_sale_without_occurrence_end_is_always_running() {
    let mut sale = daily(1, SaleStatus::NotHeld);
    sale.end_datetime = None;
    assert_eq!(
        plan(&[sale], tokyo(2024, 7, 15, 3, 0)),
        [transition(1, SaleStatus::NotHeld, SaleStatus::OnHeld, false)]
    );
}

#[test]
fn day_step_counts_from_campaign_start() {
    let mut sale = daily(1, SaleStatus::NotHeld);
    sale.repeat_cron_rule = Some("0 10 */2 * *".to_string());
    assert!(plan(&[sale.clone()], tokyo(2024, 6, 2, 10, 30)).is_empty());
    assert_eq!(plan(&[sale], tokyo(2024, 6, 3, 10, 30)).len(), 1);
}

#[test]
fn apply_transition_updates_status_and_history() {
    let mut sale = daily(1, SaleStatus::OnHeld);
    sale.record_sold(100, 2).expect("in range");

    apply_transition(
        &mut sale,
        &transition(1, SaleStatus::OnHeld, SaleStatus::NotHeld, true),
    );
    assert_eq!(sale.status, SaleStatus::NotHeld);
    assert!(sale.product_history.is_empty());

    sale.record_sold(100, 1).expect("in range");
    apply_transition(
        &mut sale,
        &transition(1, SaleStatus::NotHeld, SaleStatus::Finished, false),
    );
    assert_eq!(sale.status, SaleStatus::Finished);
    assert_eq!(sale.total_item_count(), 1);
}
