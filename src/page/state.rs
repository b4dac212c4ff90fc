use crate::render::DisplayModel;

// The one view the presentation layer draws at any moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageState {
    Loading,
    /// Shown verbatim next to a "Try Again" action.
    Error(String),
    Ready(DisplayModel),
}

impl PageState {
    pub fn is_error(&self) -> bool {
        matches!(self, PageState::Error(_))
    }
}

// Actions triggered by the visitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    Retry,
    ClickDownload { platform_key: String },
}

/// What the presentation layer should do after a click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Follow the link natively.
    Navigate(String),
    /// Stay on the page and show this message.
    Alert(String),
}
