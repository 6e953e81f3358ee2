use std::fmt;

use serde::{Deserialize, Serialize};

use super::DateTime;

/// Display line inside a hosted app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub author: String,
    pub text: String,
    pub create_time: DateTime,
}

impl OutputLine {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            create_time: DateTime::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.text.starts_with("error: ")
    }
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactAlert {
    Joined,
    Quit,
}

impl ContactAlert {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Joined => "added to conversation",
            Self::Quit => "quit conversation",
        }
    }
}

/// Entry of a conversation's message list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationItem {
    Contact {
        contact_id: String,
        name: String,
        alert: ContactAlert,
    },
    App {
        app_id: String,
        name: String,
    },
    // Rendered envelope of a message nobody knows how to show.
    Unknown {
        text: String,
    },
}

impl fmt::Display for ConversationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contact { name, alert, .. } => write!(f, "{} {}", name, alert.text()),
            Self::App { name, .. } => write!(f, "[app] {name}"),
            Self::Unknown { text } => write!(f, "unknown message: {text}"),
        }
    }
}
