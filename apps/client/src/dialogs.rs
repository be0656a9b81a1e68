use async_trait::async_trait;

/// Blocking user dialogs of the host: confirmation before destructive
/// actions and one-line notices.
#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Ask a yes/no question. `false` aborts the action.
    async fn confirm(&self, message: &str) -> bool;

    fn alert(&self, message: &str);
}
