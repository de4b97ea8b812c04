//! # Sales Reporting
//!
//! Read-only aggregations over ledger lines for the dashboard and the
//! ticket history view. Nothing here mutates state.
//!
//! Every function accepts any iterator of `&LineItem`, so callers can chain
//! a filter first:
//!
//! ```rust
//! use tamal_core::report::{at_location, summarize};
//! use tamal_core::{Ledger, Location};
//!
//! let ledger = Ledger::default();
//! let feria = summarize(at_location(ledger.lines(), Location::Feria));
//! assert_eq!(feria.ticket_count, 0);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{LineItem, Location, TicketId};

/// Headline KPIs for a set of ledger lines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub revenue: Money,
    pub margin: Money,
    /// revenue − margin
    pub cost: Money,
    /// Distinct ticket ids.
    pub ticket_count: usize,
    pub units: i64,
    /// revenue / ticket_count, zero when there are no tickets.
    pub average_ticket: Money,
}

impl SalesSummary {
    /// Margin as a percentage of revenue.
    pub fn margin_pct(&self) -> f64 {
        self.margin.percent_of(self.revenue)
    }
}

/// Lines sold at one location.
pub fn at_location<'a>(
    lines: impl IntoIterator<Item = &'a LineItem>,
    location: Location,
) -> impl Iterator<Item = &'a LineItem> {
    lines
        .into_iter()
        .filter(move |line| line.location.known() == Some(location))
}

pub fn summarize<'a>(lines: impl IntoIterator<Item = &'a LineItem>) -> SalesSummary {
    let mut revenue = Money::zero();
    let mut margin = Money::zero();
    let mut units = 0;
    let mut tickets: HashSet<&TicketId> = HashSet::new();

    for line in lines {
        revenue += line.revenue();
        margin += line.margin();
        units += line.quantity;
        tickets.insert(&line.ticket_id);
    }

    let ticket_count = tickets.len();
    let average_ticket = revenue
        .checked_div_round(ticket_count as i64)
        .unwrap_or_default();

    SalesSummary {
        revenue,
        margin,
        cost: revenue - margin,
        ticket_count,
        units,
        average_ticket,
    }
}

/// Summary per stored location label, ordered by label.
///
/// Unrecognized labels get their own row rather than being folded into a
/// known site.
pub fn summarize_by_location<'a>(
    lines: impl IntoIterator<Item = &'a LineItem>,
) -> Vec<(String, SalesSummary)> {
    let mut groups: BTreeMap<&str, Vec<&LineItem>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.location.label()).or_default().push(line);
    }

    groups
        .into_iter()
        .map(|(label, lines)| (label.to_string(), summarize(lines)))
        .collect()
}

/// Revenue per hour of day (0-23), only hours with sales, ascending.
pub fn revenue_by_hour<'a>(lines: impl IntoIterator<Item = &'a LineItem>) -> Vec<(u32, Money)> {
    let mut hours: BTreeMap<u32, Money> = BTreeMap::new();
    for line in lines {
        *hours.entry(line.time.hour()).or_default() += line.revenue();
    }
    hours.into_iter().collect()
}

/// Per-product sales figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfit {
    pub product: String,
    pub quantity: i64,
    pub revenue: Money,
    pub margin: Money,
    /// margin / revenue × 100
    pub margin_pct: f64,
}

/// Products ranked by total margin, highest first (ties by name).
pub fn product_profitability<'a>(
    lines: impl IntoIterator<Item = &'a LineItem>,
) -> Vec<ProductProfit> {
    let mut by_product: HashMap<&str, (i64, Money, Money)> = HashMap::new();
    for line in lines {
        let entry = by_product.entry(line.product.as_str()).or_default();
        entry.0 += line.quantity;
        entry.1 += line.revenue();
        entry.2 += line.margin();
    }

    let mut rows: Vec<ProductProfit> = by_product
        .into_iter()
        .map(|(product, (quantity, revenue, margin))| ProductProfit {
            product: product.to_string(),
            quantity,
            revenue,
            margin,
            margin_pct: margin.percent_of(revenue),
        })
        .collect();

    rows.sort_by(|a, b| b.margin.cmp(&a.margin).then_with(|| a.product.cmp(&b.product)));
    rows
}

/// One row of the ticket history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub sold_at: NaiveDateTime,
    pub location: String,
    pub units: i64,
    pub revenue: Money,
}

/// The `limit` most recent tickets, newest first.
pub fn recent_tickets<'a>(
    lines: impl IntoIterator<Item = &'a LineItem>,
    limit: usize,
) -> Vec<TicketSummary> {
    let mut tickets: Vec<TicketSummary> = Vec::new();
    let mut index: HashMap<&TicketId, usize> = HashMap::new();

    for line in lines {
        match index.get(&line.ticket_id) {
            Some(&i) => {
                tickets[i].units += line.quantity;
                tickets[i].revenue += line.revenue();
            }
            None => {
                index.insert(&line.ticket_id, tickets.len());
                tickets.push(TicketSummary {
                    id: line.ticket_id.clone(),
                    sold_at: line.sold_at(),
                    location: line.location.label().to_string(),
                    units: line.quantity,
                    revenue: line.revenue(),
                });
            }
        }
    }

    tickets.sort_by(|a, b| b.sold_at.cmp(&a.sold_at).then_with(|| b.id.cmp(&a.id)));
    tickets.truncate(limit);
    tickets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, SaleLocation};
    use chrono::NaiveDate;

    fn line(id: &str, hour: u32, location: &str, product: &str, qty: i64, price: i64, cost: i64) -> LineItem {
        LineItem {
            ticket_id: TicketId::new(id),
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            time: chrono::NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            location: SaleLocation::parse(location),
            category: Category::Tamales,
            product: product.to_string(),
            quantity: qty,
            unit_price: Money::from_cents(price),
            unit_cost: Money::from_cents(cost),
        }
    }

    fn sample() -> Vec<LineItem> {
        vec![
            line("20260501-090000", 9, "Local 1", "Tamal Verde", 3, 2000, 850),
            line("20260501-090000", 9, "Local 1", "Atole", 1, 1500, 400),
            line("20260501-140000", 14, "Feria", "Tamal Verde", 2, 2000, 850),
            line("20260501-150000", 15, "Bodega", "Atole", 2, 1500, 400),
        ]
    }

    #[test]
    fn test_summarize() {
        let lines = sample();
        let summary = summarize(&lines);

        assert_eq!(summary.revenue, Money::from_cents(14500));
        assert_eq!(summary.margin, Money::from_cents(9050));
        assert_eq!(summary.cost, Money::from_cents(5450));
        assert_eq!(summary.ticket_count, 3);
        assert_eq!(summary.units, 8);
        assert_eq!(summary.average_ticket, Money::from_cents(4833));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&Vec::<LineItem>::new());
        assert_eq!(summary, SalesSummary::default());
        assert_eq!(summary.margin_pct(), 0.0);
    }

    #[test]
    fn test_location_breakdown() {
        let lines = sample();
        let feria = summarize(at_location(&lines, Location::Feria));
        assert_eq!(feria.revenue, Money::from_cents(4000));

        let groups = summarize_by_location(&lines);
        let labels: Vec<_> = groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["Bodega", "Feria", "Local 1"]);
        assert_eq!(groups[2].1.ticket_count, 1);
    }

    #[test]
    fn test_revenue_by_hour() {
        let lines = sample();
        let hours = revenue_by_hour(&lines);
        assert_eq!(
            hours,
            vec![
                (9, Money::from_cents(7500)),
                (14, Money::from_cents(4000)),
                (15, Money::from_cents(3000)),
            ]
        );
    }

    #[test]
    fn test_product_profitability_ranked_by_margin() {
        let lines = sample();
        let rows = product_profitability(&lines);

        assert_eq!(rows[0].product, "Tamal Verde");
        assert_eq!(rows[0].quantity, 5);
        assert_eq!(rows[0].margin, Money::from_cents(5750));
        assert!((rows[0].margin_pct - 57.5).abs() < 1e-9);
        assert_eq!(rows[1].product, "Atole");
    }

    #[test]
    fn test_recent_tickets_newest_first() {
        let lines = sample();
        let recent = recent_tickets(&lines, 2);

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id.as_str(), "20260501-150000");
        assert_eq!(recent[0].location, "Bodega");
        assert_eq!(recent[1].id.as_str(), "20260501-140000");

        let all = recent_tickets(&lines, 10);
        assert_eq!(all[2].units, 4);
        assert_eq!(all[2].revenue, Money::from_cents(7500));
    }
}
