//! Client-side order view state machine.
//!
//! A dashboard client runs two independent async operations from mount: the
//! bulk snapshot fetch and the live push subscription. Either may complete
//! first. This view stays consistent regardless: live orders arriving before
//! the snapshot are buffered and flushed (in arrival order) once the snapshot
//! lands, and an order seen through both paths is collapsed by id.

use log::debug;

use crate::orders::{DeliveryType, Order, OrderStatus};

/// One dimension of the dashboard filter: a specific value or "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

enum ViewPhase {
    /// Snapshot fetch still outstanding; live arrivals are parked here.
    AwaitingSnapshot { pending: Vec<Order> },
    Ready,
}

/// Per-client in-memory order state.
///
/// The sequence is snapshot order (store sort, newest-created-first) with
/// live orders always prepended, regardless of their creation time relative
/// to snapshot entries. That is a deliberate simplicity tradeoff, not a
/// chronological-ordering guarantee.
pub struct OrderView {
    phase: ViewPhase,
    orders: Vec<Order>,
    error: Option<String>,
    status_filter: Filter<OrderStatus>,
    delivery_filter: Filter<DeliveryType>,
}

impl OrderView {
    pub fn new() -> Self {
        Self {
            phase: ViewPhase::AwaitingSnapshot {
                pending: Vec::new(),
            },
            orders: Vec::new(),
            error: None,
            status_filter: Filter::All,
            delivery_filter: Filter::All,
        }
    }

    /// True while the bulk fetch is still outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, ViewPhase::AwaitingSnapshot { .. })
    }

    /// The bulk-fetch error to display in place of the list, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The full underlying sequence, unfiltered.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Installs the bulk snapshot, then applies any live orders that arrived
    /// while the fetch was outstanding, in arrival order.
    ///
    /// The bulk fetch is single-shot: once a snapshot has been installed,
    /// further snapshots are ignored. After a failed fetch a retry is
    /// accepted, and live orders already shown stay in front of it.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Order>) {
        if !self.is_loading() && self.error.is_none() {
            debug!("Ignoring repeat snapshot of {} order(s)", snapshot.len());
            return;
        }
        let live = std::mem::take(&mut self.orders);
        self.orders = snapshot;
        self.error = None;
        for order in live.into_iter().rev() {
            self.prepend_unique(order);
        }
        self.flush_pending();
    }

    /// Records a bulk-fetch failure. Buffered live orders are still applied
    /// so the push stream keeps working over an empty list.
    pub fn snapshot_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.flush_pending();
    }

    /// Feeds one live `new-order` event into the view.
    ///
    /// Before the snapshot resolves the order is buffered; afterwards it is
    /// prepended. An id already present in the sequence is ignored, which
    /// collapses the snapshot/live overlap window.
    pub fn push_live(&mut self, order: Order) {
        match &mut self.phase {
            ViewPhase::AwaitingSnapshot { pending } => pending.push(order),
            ViewPhase::Ready => self.prepend_unique(order),
        }
    }

    /// Locally sets the status of one order, identified by id. Returns false
    /// if the id is unknown. Deliberately not wired to any persistence: this
    /// is an operator-side proposal, not a server mutation.
    pub fn propose_status_change(&mut self, order_id: &str, status: OrderStatus) -> bool {
        match self.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) => {
                order.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_status_filter(&mut self, filter: Filter<OrderStatus>) {
        self.status_filter = filter;
    }

    pub fn set_delivery_filter(&mut self, filter: Filter<DeliveryType>) {
        self.delivery_filter = filter;
    }

    /// Applies both filter dimensions as a pure projection over the current
    /// sequence. Never mutates the underlying orders.
    pub fn filtered(&self) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|order| {
                self.status_filter.matches(&order.status)
                    && self.delivery_filter.matches(&order.delivery_type)
            })
            .collect()
    }

    fn flush_pending(&mut self) {
        let pending = match std::mem::replace(&mut self.phase, ViewPhase::Ready) {
            ViewPhase::AwaitingSnapshot { pending } => pending,
            ViewPhase::Ready => Vec::new(),
        };
        for order in pending {
            self.prepend_unique(order);
        }
    }

    fn prepend_unique(&mut self, order: Order) {
        if self.orders.iter().any(|o| o.id == order.id) {
            debug!("Ignoring duplicate live order {}", order.id);
            return;
        }
        self.orders.insert(0, order);
    }
}

impl Default for OrderView {
    fn default() -> Self {
        Self::new()
    }
}
