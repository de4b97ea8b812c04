//! # Checkout and Cancellation
//!
//! Both touch `menu` and `ventas`, so both lock the pair.
//!
//! ```text
//! checkout:  validate ──► save ventas ──► save menu ──► clear cart
//!                                            │
//!                                   fails ───┴──► restore ventas
//!
//! cancel:    validate ──► save menu ──► save ventas
//!                                           │
//!                                  fails ───┴──► restore menu
//! ```

use tamal_core::ledger::{self, CancelledTicket};
use tamal_core::{CartSession, Location, Money, Ticket};
use tamal_store::schema::{MENU, VENTAS};
use tamal_store::SnapshotStore;
use tracing::{debug, info, warn};

use super::Engine;
use crate::error::EngineResult;

impl<S: SnapshotStore> Engine<S> {
    /// Running total of a cart at current catalog prices.
    pub async fn cart_total(&self, cart: &CartSession) -> EngineResult<Money> {
        let catalog = self.load_catalog().await?;
        Ok(cart.total(&catalog)?)
    }

    /// Turns the cart into a ticket sold at `location`.
    ///
    /// Stock for every line is validated before anything is written. On
    /// success the ticket lines are appended to `ventas`, the decremented
    /// catalog is saved and the cart is cleared. On any error the cart is
    /// left as it was.
    ///
    /// ## Errors
    /// - `EmptyCart`, `UnknownProduct`, `InsufficientStock` (nothing saved)
    /// - `Store` if a table could not be loaded or saved
    pub async fn checkout(&self, cart: &mut CartSession, location: Location) -> EngineResult<Ticket> {
        let _guard = self.locks.acquire(&[MENU, VENTAS]).await;

        let (mut catalog, _) = self.read_catalog().await?;
        let (mut ledger, previous_ledger) = self.read_ledger().await?;

        let ticket = ledger::checkout(
            &mut catalog,
            &mut ledger,
            location,
            cart.lines(),
            self.clock.now(),
        )?;
        debug!(ticket_id = %ticket.id, lines = ticket.lines.len(), "Checkout validated");

        self.save_ledger(&ledger).await?;
        if let Err(err) = self.save_catalog(&catalog).await {
            return Err(self.restore(VENTAS, &previous_ledger, err).await);
        }

        cart.clear();
        info!(
            ticket_id = %ticket.id,
            location = %location,
            total = %ticket.total(),
            margin = %ticket.margin(),
            lines = ticket.lines.len(),
            "Checkout complete"
        );
        Ok(ticket)
    }

    /// Reverses a ticket: stock goes back where it was sold and the ticket's
    /// lines leave the ledger.
    ///
    /// Lines whose product has since been removed from the catalog are
    /// dropped without restoring stock.
    ///
    /// ## Errors
    /// - `TicketNotFound`, also for a second cancel of the same id
    /// - `UnknownLocation` for an unrecognized stored location under the
    ///   `reject` policy
    pub async fn cancel(&self, ticket_id: &str) -> EngineResult<CancelledTicket> {
        let _guard = self.locks.acquire(&[MENU, VENTAS]).await;

        let (mut catalog, previous_catalog) = self.read_catalog().await?;
        let (mut ledger, _) = self.read_ledger().await?;

        let cancelled = ledger::cancel(&mut catalog, &mut ledger, ticket_id, self.location_policy)?;
        for product in &cancelled.skipped_products {
            warn!(
                ticket_id = %cancelled.ticket_id,
                product = %product,
                "Product no longer in catalog, stock not restored"
            );
        }

        self.save_catalog(&catalog).await?;
        if let Err(err) = self.save_ledger(&ledger).await {
            return Err(self.restore(MENU, &previous_catalog, err).await);
        }

        info!(
            ticket_id = %cancelled.ticket_id,
            lines = cancelled.lines.len(),
            restored = cancelled.restored.len(),
            "Ticket cancelled"
        );
        Ok(cancelled)
    }

    /// One ticket by id.
    pub async fn ticket(&self, ticket_id: &str) -> EngineResult<Option<Ticket>> {
        Ok(self.load_ledger().await?.ticket(ticket_id))
    }
}
