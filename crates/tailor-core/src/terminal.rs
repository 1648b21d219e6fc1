//! Terminal prompt and notification adapters built on dialoguer.
//!
//! dialoguer blocks on stdin, so every interaction runs on the blocking pool.

use crate::core_types::{NotificationAction, PickerItem, PromptOptions};
use crate::errors::TailorError;
use crate::services::{NotificationService, PromptService};
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Select};

/// One line per picker row: label, then markers and description.
pub fn render_item(item: &PickerItem) -> String {
    let mut line = item.label.clone();
    if item.is_new {
        line.push_str(" [new]");
    }
    if item.recently_used {
        line.push_str(" [current]");
    }
    if !item.description.is_empty() {
        line.push_str(" - ");
        line.push_str(&item.description);
    }
    if !item.detail.is_empty() {
        line.push_str(&format!(" ({})", item.detail));
    }
    line
}

pub struct TerminalPrompt;

#[async_trait]
impl PromptService for TerminalPrompt {
    async fn show_selection(
        &self,
        items: &[PickerItem],
        options: &PromptOptions,
    ) -> Result<Option<usize>, TailorError> {
        let lines: Vec<String> = items.iter().map(render_item).collect();
        let default = items.iter().position(|i| i.recently_used).unwrap_or(0);
        let prompt = if options.placeholder.is_empty() {
            options.title.clone()
        } else {
            format!("{} ({})", options.title, options.placeholder)
        };

        tokio::task::spawn_blocking(move || {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(&lines)
                .default(default)
                .interact_opt()
                .map_err(|e| TailorError::PromptError(e.to_string()))
        })
        .await
        .map_err(|e| TailorError::PromptError(e.to_string()))?
    }
}

/// Prints notifications and, when interactive, offers their actions.
pub struct TerminalNotifier {
    interactive: bool,
}

impl TerminalNotifier {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    async fn show(&self, level: &str, message: &str, actions: &[NotificationAction]) -> Option<NotificationAction> {
        println!("[{}] {}", level, message);
        if !self.interactive || actions.is_empty() {
            return None;
        }

        let actions = actions.to_vec();
        let mut labels: Vec<&'static str> = actions.iter().map(|a| a.label()).collect();
        labels.push("Dismiss");

        let choice = tokio::task::spawn_blocking(move || {
            Select::with_theme(&ColorfulTheme::default())
                .items(&labels)
                .default(labels.len() - 1)
                .interact_opt()
        })
        .await;

        match choice {
            Ok(Ok(Some(index))) => actions.get(index).copied(),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                log::warn!("Notification prompt failed: {}", e);
                None
            }
            Err(e) => {
                log::warn!("Notification prompt task failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl NotificationService for TerminalNotifier {
    async fn info(&self, message: &str, actions: &[NotificationAction]) -> Option<NotificationAction> {
        self.show("info", message, actions).await
    }

    async fn warn(&self, message: &str, actions: &[NotificationAction]) -> Option<NotificationAction> {
        self.show("warning", message, actions).await
    }

    async fn open_link(&self, url: &str) {
        println!("Learn more: {}", url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Customization;

    #[test]
    fn test_render_item_markers() {
        let item = PickerItem {
            label: "Foo (Team A)".to_string(),
            description: "Internal libraries".to_string(),
            detail: "Profile: Team A".to_string(),
            customization: Customization::new("c1", "Foo"),
            is_new: true,
            recently_used: true,
            invalid_selection: false,
        };

        assert_eq!(
            render_item(&item),
            "Foo (Team A) [new] [current] - Internal libraries (Profile: Team A)"
        );
    }

    #[tokio::test]
    async fn test_non_interactive_notifier_returns_no_action() {
        let notifier = TerminalNotifier::new(false);
        let action = notifier
            .info("hello", &[NotificationAction::SelectCustomization])
            .await;
        assert_eq!(action, None);
    }
}
