//! Read-only sales reports over the current ledger.

use chrono::NaiveDate;
use tamal_core::report::{self, ProductProfit, SalesSummary, TicketSummary};
use tamal_core::{LineItem, Location, Money};
use tamal_store::SnapshotStore;

use super::Engine;
use crate::error::EngineResult;

/// Which ledger lines a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportFilter {
    /// Only lines sold at this location.
    pub location: Option<Location>,
    /// Only lines sold on this date.
    pub date: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn at(location: Location) -> Self {
        ReportFilter {
            location: Some(location),
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    fn matches(&self, line: &LineItem) -> bool {
        self.location.map_or(true, |loc| line.location.known() == Some(loc))
            && self.date.map_or(true, |date| line.date == date)
    }
}

impl<S: SnapshotStore> Engine<S> {
    async fn filtered_lines(&self, filter: ReportFilter) -> EngineResult<Vec<LineItem>> {
        let ledger = self.load_ledger().await?;
        Ok(ledger
            .into_lines()
            .into_iter()
            .filter(|line| filter.matches(line))
            .collect())
    }

    /// Revenue, margin, ticket count and average ticket.
    pub async fn sales_summary(&self, filter: ReportFilter) -> EngineResult<SalesSummary> {
        let lines = self.filtered_lines(filter).await?;
        Ok(report::summarize(&lines))
    }

    /// One summary per stored location label.
    pub async fn sales_by_location(&self, filter: ReportFilter) -> EngineResult<Vec<(String, SalesSummary)>> {
        let lines = self.filtered_lines(filter).await?;
        Ok(report::summarize_by_location(&lines))
    }

    /// Revenue per hour of day, for spotting peak hours.
    pub async fn revenue_by_hour(&self, filter: ReportFilter) -> EngineResult<Vec<(u32, Money)>> {
        let lines = self.filtered_lines(filter).await?;
        Ok(report::revenue_by_hour(&lines))
    }

    /// Products ranked by margin.
    pub async fn product_profitability(&self, filter: ReportFilter) -> EngineResult<Vec<ProductProfit>> {
        let lines = self.filtered_lines(filter).await?;
        Ok(report::product_profitability(&lines))
    }

    /// Ticket history, newest first.
    pub async fn recent_tickets(&self, limit: usize) -> EngineResult<Vec<TicketSummary>> {
        let ledger = self.load_ledger().await?;
        Ok(report::recent_tickets(ledger.lines(), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::ReportFilter;
    use chrono::Duration;
    use tamal_core::{CartSession, Location, Money};

    #[tokio::test]
    async fn test_reports_follow_ledger() {
        let (engine, _, clock) = engine();

        let mut cart = CartSession::new();
        cart.add("Tamal Verde", 3).unwrap();
        engine.checkout(&mut cart, Location::Local1).await.unwrap();

        clock.advance(Duration::hours(2));
        cart.add("Atole", 2).unwrap();
        engine.checkout(&mut cart, Location::Feria).await.unwrap();

        let all = engine.sales_summary(ReportFilter::all()).await.unwrap();
        assert_eq!(all.revenue, Money::from_cents(9000));
        assert_eq!(all.margin, Money::from_cents(3450 + 2200));
        assert_eq!(all.ticket_count, 2);
        assert_eq!(all.average_ticket, Money::from_cents(4500));

        let feria = engine.sales_summary(ReportFilter::at(Location::Feria)).await.unwrap();
        assert_eq!(feria.revenue, Money::from_cents(3000));

        let other_day = ReportFilter::all().on(noon().date() + Duration::days(1));
        assert_eq!(engine.sales_summary(other_day).await.unwrap().ticket_count, 0);

        let hours = engine.revenue_by_hour(ReportFilter::all()).await.unwrap();
        assert_eq!(
            hours,
            vec![(12, Money::from_cents(6000)), (14, Money::from_cents(3000))]
        );

        let by_location = engine.sales_by_location(ReportFilter::all()).await.unwrap();
        assert_eq!(by_location.len(), 2);

        let ranking = engine.product_profitability(ReportFilter::all()).await.unwrap();
        assert_eq!(ranking[0].product, "Tamal Verde");

        let recent = engine.recent_tickets(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].location, "Feria");
    }
}
