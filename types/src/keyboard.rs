use crate::ButtonAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

impl InlineButton {
    #[must_use]
    pub fn new(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Two-dimensional grid of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    rows: Vec<Vec<InlineButton>>,
}

impl Keyboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<InlineButton>] {
        &self.rows
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }

    /// Label of the first button carrying `action`, if any.
    #[must_use]
    pub fn label_for(&self, action: ButtonAction) -> Option<&str> {
        self.buttons()
            .find(|button| button.action == action)
            .map(|button| button.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Navigation;

    #[test]
    fn empty_rows_are_skipped() {
        let keyboard = Keyboard::new()
            .row(vec![])
            .row(vec![InlineButton::new(
                "Back",
                ButtonAction::Navigate(Navigation::BackToPrompt),
            )]);
        assert_eq!(keyboard.rows().len(), 1);
        assert_eq!(
            keyboard.label_for(ButtonAction::Navigate(Navigation::BackToPrompt)),
            Some("Back")
        );
    }
}
