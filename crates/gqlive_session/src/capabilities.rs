//! Capability traits for the host surfaces the session drives.

use async_trait::async_trait;

/// Interactive input surface.
///
/// One call per question, no batching. `None` means the human dismissed
/// the prompt; callers recover with a deterministic fallback and never
/// treat it as an error.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks for a free-form text value.
    async fn prompt(&self, message: &str) -> Option<String>;

    /// Asks the human to pick one of `options`. `None` means dismissed;
    /// callers default to the first option.
    async fn select(&self, message: &str, options: &[String]) -> Option<String>;
}

/// Output surface that displays the live document buffer.
///
/// Invoked synchronously after every buffer mutation with the full
/// buffer contents.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &str);
}
