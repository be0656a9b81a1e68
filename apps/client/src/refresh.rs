use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::app::App;

impl App {
    /// One reconciliation pass. The calendar follows the clock and every
    /// visible list is re-fetched; the expanded day stays as it is.
    pub async fn reconcile(&self) {
        let today = self.inner.clock.today();
        let stale_calendar = self
            .state()
            .document
            .calendar
            .first()
            .map_or(true, |day| day.date != today);
        if stale_calendar {
            self.render_calendar();
        }

        let admin = self.admin_granted();
        tokio::join!(self.refresh_slots(), self.list_mine(), async {
            if admin {
                tokio::join!(self.load_admin_bookings(), self.load_pending());
            }
        });
        tracing::debug!(expanded = ?self.expanded(), "reconciled");
    }
}

/// Run `reconcile` every `period`, first tick one period from now.
pub fn spawn_refresh(app: App, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            app.reconcile().await;
        }
    })
}
