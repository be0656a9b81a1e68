use crate::api::Upload;
use crate::app::{App, Outcome};
use crate::render::{self, Section, MSG_MODELS_ERROR};

pub const MSG_LOGIN_TO_SUBMIT: &str = "Откройте приложение через Telegram, чтобы отправить модель";
pub const MSG_EMPTY_TITLE: &str = "Введите название модели";
pub const MSG_NO_FILE: &str = "Выберите файл модели";
pub const MSG_SUBMITTED: &str = "Модель отправлена на модерацию";

/// Contents of the submission form.
#[derive(Debug, Clone, Default)]
pub struct ModelForm {
    pub title: String,
    pub file: Option<Upload>,
    pub image: Option<Upload>,
}

impl ModelForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl App {
    /// Fetch and render the approved models.
    pub async fn load_models(&self) {
        let section = match self.inner.api.models().await {
            Ok(models) => render::models(&models),
            Err(e) => {
                tracing::warn!("failed to load models: {}", e);
                Section::Error(MSG_MODELS_ERROR.into())
            }
        };
        self.state().document.models = section;
    }

    /// Send the form for moderation. The server's message is shown as is;
    /// the form is cleared only on success.
    pub async fn submit(&self, form: &mut ModelForm) -> Outcome {
        let identity = self.identity();
        if identity.is_anonymous() {
            return self.refuse(MSG_LOGIN_TO_SUBMIT);
        }
        let title = form.title.trim().to_string();
        if title.is_empty() {
            return self.refuse(MSG_EMPTY_TITLE);
        }
        let Some(file) = form.file.as_ref() else {
            return self.refuse(MSG_NO_FILE);
        };

        let result = self
            .inner
            .api
            .upload_model(&title, file, form.image.as_ref(), &identity)
            .await;

        let (text, outcome) = match result {
            Ok(resp) if resp.success => {
                let text = resp.message.unwrap_or_else(|| MSG_SUBMITTED.into());
                tracing::info!(id = ?identity.id, %title, "model submitted");
                (text, Outcome::Done)
            }
            Ok(resp) => {
                let text = resp
                    .error
                    .or(resp.message)
                    .unwrap_or_else(|| "Не удалось отправить модель".into());
                (text.clone(), Outcome::Failed(text))
            }
            Err(e) => {
                tracing::warn!(id = ?identity.id, "model upload failed: {}", e);
                let text = e.user_message();
                (text.clone(), Outcome::Failed(text))
            }
        };
        self.state().document.submit_result = Some(text);

        if outcome == Outcome::Done {
            form.clear();
            tokio::join!(self.load_models(), self.load_pending());
        }
        outcome
    }
}

// ── Tests ──
