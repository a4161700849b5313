use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tcgpos_recurrence::{CampaignWindow, RecurrenceExpression};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    NotHeld,
    OnHeld,
    Finished,
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleStatus::NotHeld => write!(f, "not_held"),
            SaleStatus::OnHeld => write!(f, "on_held"),
            SaleStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleRule {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleProduct {
    pub product_id: i64,
    pub rule: SaleRule,
}

/// Units sold under a sale, per product, since the current occurrence began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductHistory {
    pub product_id: i64,
    pub total_item_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: SaleStatus,
    pub start_datetime: DateTime<Utc>,
    /// End of a single occurrence; bounds the recurrence window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<Utc>>,
    /// End of the whole sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_end_datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_cron_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_total_item_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_unit_item_count: Option<i64>,
    #[serde(default)]
    pub products: Vec<SaleProduct>,
    #[serde(default)]
    pub product_history: Vec<ProductHistory>,
}

impl Sale {
    /// The cron rule, or `""` when the sale does not repeat.
    #[must_use]
    pub fn repeat_rule(&self) -> &str {
        self.repeat_cron_rule.as_deref().unwrap_or_default().trim()
    }

    #[must_use]
    pub fn is_repeating(&self) -> bool {
        !self.repeat_rule().is_empty()
    }

    #[must_use]
    pub fn window(&self) -> CampaignWindow {
        CampaignWindow::new(self.start_datetime, self.end_datetime)
    }

    #[must_use]
    pub fn total_item_count(&self) -> i64 {
        self.product_history
            .iter()
            .fold(0_i64, |acc, h| acc.saturating_add(h.total_item_count))
    }

    /// Whether the sale has sold out its item limits.
    ///
    /// When a per-unit limit applies to explicitly included products, it
    /// decides the outcome on its own: every included product must have
    /// reached the limit. Otherwise the total-count limit is used.
    #[must_use]
    pub fn is_item_limit_reached(&self) -> bool {
        let included: Vec<i64> = self
            .products
            .iter()
            .filter(|p| p.rule == SaleRule::Include)
            .map(|p| p.product_id)
            .collect();

        match self.end_unit_item_count {
            Some(limit) if limit > 0 && !included.is_empty() => included.iter().all(|id| {
                self.product_history
                    .iter()
                    .find(|h| h.product_id == *id)
                    .is_some_and(|h| h.total_item_count >= limit)
            }),
            _ => self
                .end_total_item_count
                .is_some_and(|limit| limit != 0 && self.total_item_count() >= limit),
        }
    }

    /// Add `item_count` units of `product_id` to the sale's history.
    ///
    /// # Errors
    ///
    /// Returns [`SoldCountOverflow`] and leaves the history untouched when the
    /// product's running total would leave the `i64` range.
    pub fn record_sold(
        &mut self,
        product_id: i64,
        item_count: i64,
    ) -> Result<(), SoldCountOverflow> {
        match self
            .product_history
            .iter_mut()
            .find(|h| h.product_id == product_id)
        {
            Some(history) => {
                history.total_item_count = history
                    .total_item_count
                    .checked_add(item_count)
                    .ok_or(SoldCountOverflow { product_id })?;
            }
            None => self.product_history.push(ProductHistory {
                product_id,
                total_item_count: item_count,
            }),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sold count for product {product_id} is out of range")]
pub struct SoldCountOverflow {
    pub product_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SalesFile {
    pub sales: Vec<Sale>,
}

/// Load and validate the sales catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sales(path: &Path, zone: Tz) -> Result<SalesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SalesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sales_file: SalesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SalesFileParse)?;

    validate_sales(&sales_file, zone)?;

    Ok(sales_file)
}

/// Validate a parsed catalog against the scheduling rules.
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first offending sale.
pub fn validate_sales(sales_file: &SalesFile, zone: Tz) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for sale in &sales_file.sales {
        if sale.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "sale {} must have a non-empty name",
                sale.id
            )));
        }

        if !seen_ids.insert(sale.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate sale id: {}",
                sale.id
            )));
        }

        let datetimes = [
            ("start_datetime", Some(sale.start_datetime)),
            ("end_datetime", sale.end_datetime),
            ("sale_end_datetime", sale.sale_end_datetime),
        ];
        for (field, value) in datetimes {
            if let Some(at) = value {
                check_ten_minute_boundary(at, zone).map_err(|reason| {
                    ConfigError::Validation(format!("sale {} {field}: {reason}", sale.id))
                })?;
            }
        }

        if sale.end_datetime.is_some_and(|end| end < sale.start_datetime) {
            return Err(ConfigError::Validation(format!(
                "sale {} end_datetime is before start_datetime",
                sale.id
            )));
        }

        if sale.is_repeating() {
            sale.repeat_rule()
                .parse::<RecurrenceExpression>()
                .map_err(|e| {
                    ConfigError::Validation(format!("sale {} repeat_cron_rule: {e}", sale.id))
                })?;
        }
    }

    Ok(())
}

/// Sale instants are entered on a 10-minute grid with no seconds.
fn check_ten_minute_boundary(at: DateTime<Utc>, zone: Tz) -> Result<(), String> {
    let local = at.with_timezone(&zone);
    if local.second() != 0 || local.nanosecond() != 0 {
        return Err(format!("{local} must not carry seconds"));
    }
    if local.minute() % 10 != 0 {
        return Err(format!("{local} is not on a 10-minute boundary"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "sales_test.rs"]
mod tests;
