use crate::app::{App, Outcome};
use crate::models::Slot;
use crate::render::{self, Section, MSG_AUTH_PROMPT};

pub const MSG_LOGIN_TO_BOOK: &str = "Откройте приложение через Telegram, чтобы забронировать время";
pub const MSG_LOGIN_TO_CANCEL: &str = "Откройте приложение через Telegram, чтобы отменить бронирование";
pub const MSG_SLOT_OCCUPIED: &str = "Это время уже занято";
pub const MSG_CONFIRM_CANCEL: &str = "Отменить бронирование?";
pub const MSG_BOOKED: &str = "✅ Забронировано";
pub const MSG_CANCELLED: &str = "Бронирование отменено";

impl App {
    /// Book a free slot for the current user after confirmation.
    pub async fn book(&self, slot: &Slot) -> Outcome {
        let identity = self.identity();
        let Some(tg_user) = identity.id else {
            return self.refuse(MSG_LOGIN_TO_BOOK);
        };
        if slot.occupied {
            return self.refuse(MSG_SLOT_OCCUPIED);
        }
        if !self
            .confirm(&render::confirm_booking_text(slot, self.inner.locale))
            .await
        {
            return Outcome::Declined;
        }

        match self.inner.api.book(slot, &identity, tg_user).await {
            Ok(()) => {
                tracing::info!(tg_user, start = %slot.start, "slot booked");
                self.alert(MSG_BOOKED);
                let admin = self.admin_granted();
                tokio::join!(self.refresh_slots(), self.list_mine(), async {
                    if admin {
                        self.load_admin_bookings().await;
                    }
                });
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(tg_user, start = %slot.start, "booking failed: {}", e);
                let message = e.user_message();
                self.alert(&format!("❌ Ошибка бронирования: {message}"));
                Outcome::Failed(message)
            }
        }
    }

    /// Cancel one of the user's own bookings after confirmation.
    pub async fn cancel(&self, booking_id: i64) -> Outcome {
        let Some(tg_user) = self.identity().id else {
            return self.refuse(MSG_LOGIN_TO_CANCEL);
        };
        if !self.confirm(MSG_CONFIRM_CANCEL).await {
            return Outcome::Declined;
        }

        let message = match self.inner.api.cancel(booking_id, tg_user).await {
            Ok(resp) if resp.ok => {
                tracing::info!(tg_user, booking_id, "booking cancelled");
                self.alert(resp.message.as_deref().unwrap_or(MSG_CANCELLED));
                let admin = self.admin_granted();
                tokio::join!(self.list_mine(), self.refresh_slots(), async {
                    if admin {
                        self.load_admin_bookings().await;
                    }
                });
                return Outcome::Done;
            }
            Ok(resp) => resp
                .error
                .or(resp.message)
                .unwrap_or_else(|| "Не удалось отменить бронирование".into()),
            Err(e) => {
                tracing::warn!(tg_user, booking_id, "cancel failed: {}", e);
                e.user_message()
            }
        };
        self.alert(&format!("Ошибка: {message}"));
        Outcome::Failed(message)
    }

    /// Load the user's active bookings, or show the login prompt for guests.
    pub async fn list_mine(&self) {
        let Some(tg_user) = self.identity().id else {
            self.state().document.my_bookings = Section::Notice(MSG_AUTH_PROMPT.into());
            return;
        };

        let section = match self.inner.api.bookings(tg_user).await {
            Ok(bookings) => render::my_bookings(&bookings, self.inner.locale),
            Err(e) => {
                tracing::warn!(tg_user, "failed to load own bookings: {}", e);
                Section::Error(e.user_message())
            }
        };
        self.state().document.my_bookings = section;
    }
}
