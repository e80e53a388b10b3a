//! Commission attribution and sales aggregation.
//!
//! Pure folds over ledger rows; every route that reports money goes through
//! here. All arithmetic is integer cents, converted to major units only when
//! a response is serialized.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::entity::{group, sale};

/// Cents to major units, exact for two decimal places.
pub fn to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Merge the per-site commission table of every group the user belongs to.
///
/// Site keys are lowercased. When the user appears in several groups with
/// conflicting percentages for the same site, the last group in iteration
/// order wins.
pub fn merge_percentages(groups: &[group::Model], username: &str) -> HashMap<String, f64> {
    let mut merged = HashMap::new();
    for group in groups {
        let Some(user_table) = group.percentages.get(username).and_then(|v| v.as_object()) else {
            continue;
        };
        for (site, pct) in user_table {
            merged.insert(site.to_lowercase(), pct.as_f64().unwrap_or(0.0));
        }
    }
    merged
}

/// The user's share of a sale: net amount times their percentage for the
/// sale's site. A site absent from the table earns exactly zero.
pub fn commission_cents(net_cents: i64, percent: Option<f64>) -> i64 {
    let Some(percent) = percent else { return 0 };
    (net_cents as f64 * percent / 100.0).round() as i64
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummaryTotals {
    pub paid_cents: i64,
    pub pending_cents: i64,
    pub net_cents: i64,
    pub count_paid: u64,
    pub count_pending: u64,
    pub total_count: u64,
}

impl SummaryTotals {
    /// Total mirrors the paid gross; other statuses contribute only to the
    /// record count.
    pub fn total_cents(&self) -> i64 {
        self.paid_cents
    }
}

/// Fold sales into per-status sums. Status comparison is case-insensitive;
/// every sale lands in at most one bucket.
pub fn summarize<'a, I>(sales: I) -> SummaryTotals
where
    I: IntoIterator<Item = &'a sale::Model>,
{
    let mut totals = SummaryTotals::default();
    for sale in sales {
        totals.total_count += 1;
        match sale.status.to_lowercase().as_str() {
            "paid" => {
                totals.paid_cents += sale.total_amount_cents;
                totals.net_cents += sale.net_amount_cents;
                totals.count_paid += 1;
            }
            "pending" => {
                totals.pending_cents += sale.total_amount_cents;
                totals.count_pending += 1;
            }
            _ => {}
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub net_cents: i64,
}

const MONTH_LABELS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Net revenue bucketed into the trailing `months` calendar months ending at
/// `today`'s month. Buckets are keyed by (year, month) so equal month names
/// from different years never merge.
pub fn monthly_buckets(sales: &[sale::Model], months: u32, today: NaiveDate) -> Vec<MonthBucket> {
    let current = today.year() * 12 + today.month0() as i32;

    let mut buckets: Vec<MonthBucket> = (0..months as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            let year = index.div_euclid(12);
            let month0 = index.rem_euclid(12) as usize;
            MonthBucket {
                year,
                month: month0 as u32 + 1,
                label: MONTH_LABELS[month0].to_string(),
                net_cents: 0,
            }
        })
        .collect();

    let oldest = current - months as i32 + 1;
    for sale in sales {
        let date = sale.created_at.date();
        let index = date.year() * 12 + date.month0() as i32;
        if index < oldest || index > current {
            continue;
        }
        buckets[(index - oldest) as usize].net_cents += sale.net_amount_cents;
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::sea_orm_active_enums::GroupStatus;
    use chrono::NaiveDateTime;
    use selltrack_types::json::json;

    fn sale(status: &str, total_cents: i64, net_cents: i64, created_at: &str) -> sale::Model {
        let created_at: NaiveDateTime = created_at.parse().unwrap();
        sale::Model {
            id: selltrack_types::create_id(),
            transaction_id: selltrack_types::create_id(),
            status: status.to_string(),
            method: None,
            total_amount_cents: total_cents,
            net_amount_cents: net_cents,
            offer_name: None,
            offer_price_cents: None,
            offer_quantity: 1,
            buyer_name: None,
            buyer_email: None,
            buyer_phone: None,
            buyer_document: None,
            tracking: json!({}),
            source_site: "sitex".to_string(),
            created_at,
            received_at: created_at,
        }
    }

    fn group_with(percentages: selltrack_types::Value) -> group::Model {
        group::Model {
            id: selltrack_types::create_id(),
            name: selltrack_types::create_id(),
            image: String::new(),
            status: GroupStatus::Active,
            percentages,
            created_at: "2025-01-01T00:00:00".parse().unwrap(),
        }
    }

    #[test]
    fn missing_site_earns_zero() {
        let table = HashMap::from([("sitex".to_string(), 50.0)]);
        assert_eq!(commission_cents(20_000, table.get("sitey").copied()), 0);
    }

    #[test]
    fn half_share_of_net() {
        // net 200.00 at 50% -> 100.00
        assert_eq!(commission_cents(20_000, Some(50.0)), 10_000);
    }

    #[test]
    fn fractional_percent_rounds_to_nearest_cent() {
        assert_eq!(commission_cents(9_999, Some(12.5)), 1_250);
    }

    #[test]
    fn later_group_overwrites_earlier_on_conflict() {
        let groups = vec![
            group_with(json!({"alice": {"SiteX": 30}})),
            group_with(json!({"alice": {"sitex": 70, "sitey": 10}})),
        ];
        let table = merge_percentages(&groups, "alice");
        assert_eq!(table.get("sitex"), Some(&70.0));
        assert_eq!(table.get("sitey"), Some(&10.0));
    }

    #[test]
    fn merge_skips_groups_without_the_user() {
        let groups = vec![group_with(json!({"bob": {"sitex": 40}}))];
        assert!(merge_percentages(&groups, "alice").is_empty());
    }

    #[test]
    fn summary_partitions_by_status() {
        let sales = vec![
            sale("paid", 10_000, 8_000, "2025-03-01T10:00:00"),
            sale("PAID", 5_000, 4_000, "2025-03-02T10:00:00"),
            sale("pending", 2_000, 1_500, "2025-03-03T10:00:00"),
            sale("failed", 9_000, 7_000, "2025-03-04T10:00:00"),
        ];
        let totals = summarize(&sales);
        assert_eq!(totals.paid_cents, 15_000);
        assert_eq!(totals.pending_cents, 2_000);
        assert_eq!(totals.net_cents, 12_000);
        assert_eq!(totals.count_paid, 2);
        assert_eq!(totals.count_pending, 1);
        assert_eq!(totals.total_count, 4);
        assert!(totals.count_paid + totals.count_pending <= totals.total_count);
        assert_eq!(totals.total_cents(), totals.paid_cents);
    }

    #[test]
    fn buckets_cover_trailing_months_in_order() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let buckets = monthly_buckets(&[], 6, today);
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["sep", "oct", "nov", "dec", "jan", "feb"]);
        assert_eq!(buckets[0].year, 2025);
        assert_eq!(buckets[5].year, 2026);
    }

    #[test]
    fn same_month_name_different_year_does_not_alias() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let sales = vec![
            sale("paid", 10_000, 8_000, "2026-01-05T10:00:00"),
            // Same month name one year earlier, outside the window
            sale("paid", 99_000, 90_000, "2025-01-05T10:00:00"),
        ];
        let buckets = monthly_buckets(&sales, 6, today);
        let jan = buckets.last().unwrap();
        assert_eq!((jan.year, jan.label.as_str()), (2026, "jan"));
        assert_eq!(jan.net_cents, 8_000);
    }

    #[test]
    fn minor_units_convert_to_major() {
        assert_eq!(to_major(10_000), 100.0);
        assert_eq!(to_major(12_345), 123.45);
    }
}
