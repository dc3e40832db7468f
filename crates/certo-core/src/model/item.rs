use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ParseEnumError;

/// The four checklist phases, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Setup,
    Design,
    Execution,
    Completion,
}

impl Category {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Design => "design",
            Self::Execution => "execution",
            Self::Completion => "completion",
        }
    }

    /// Section heading used by human-facing checklist output.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::Design => "Test design",
            Self::Execution => "Test execution",
            Self::Completion => "Completion",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "setup" => Ok(Self::Setup),
            "design" => Ok(Self::Design),
            "execution" => Ok(Self::Execution),
            "completion" => Ok(Self::Completion),
            _ => Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            }),
        }
    }
}

/// One discrete unit of certification work.
///
/// Items come from the built-in template at `ct init` and are immutable
/// afterwards apart from the `applicable` display flag, which marks an item
/// as not relevant to the current test. The gate engine reads the id and
/// category only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub applicable: bool,
    pub position: u32,
}

impl ChecklistItem {
    #[must_use]
    pub fn new(id: &str, title: &str, category: Category, position: u32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category,
            applicable: true,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, ChecklistItem};
    use std::str::FromStr;

    #[test]
    fn category_json_roundtrips() {
        assert_eq!(
            serde_json::to_string(&Category::Setup).unwrap(),
            "\"setup\""
        );
        assert_eq!(
            serde_json::from_str::<Category>("\"execution\"").unwrap(),
            Category::Execution
        );
    }

    #[test]
    fn category_display_parse_roundtrips() {
        for value in [
            Category::Setup,
            Category::Design,
            Category::Execution,
            Category::Completion,
        ] {
            let rendered = value.to_string();
            let reparsed = Category::from_str(&rendered).unwrap();
            assert_eq!(value, reparsed);
        }
    }

    #[test]
    fn category_parse_rejects_unknown_values() {
        assert!(Category::from_str("teardown").is_err());
        assert!(Category::from_str("").is_err());
    }

    #[test]
    fn category_ordering_follows_workflow() {
        assert!(Category::Setup < Category::Design);
        assert!(Category::Design < Category::Execution);
        assert!(Category::Execution < Category::Completion);
    }

    #[test]
    fn new_item_is_applicable() {
        let item = ChecklistItem::new("exec-security", "Security testing", Category::Execution, 9);
        assert!(item.applicable);
        assert_eq!(item.position, 9);
    }
}
