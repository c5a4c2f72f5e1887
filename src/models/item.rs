use super::Category;
use crate::constants::UNKNOWN_LABEL;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Application,
    Website,
}

/// What the user is looking at on a given tick.
///
/// `label` is already normalized: a bare lowercase domain for websites, a
/// display name (or the executable's base name) for applications. Two items
/// are "the same thing" exactly when their labels are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveItem {
    pub label: String,
    pub kind: ItemKind,
    pub category_hint: Category,
}

impl ActiveItem {
    pub fn application(label: impl Into<String>, category_hint: Category) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::Application,
            category_hint,
        }
    }

    pub fn website(domain: impl Into<String>, category_hint: Category) -> Self {
        Self {
            label: domain.into(),
            kind: ItemKind::Website,
            category_hint,
        }
    }

    /// Sentinel used when the foreground window could not be inspected.
    pub fn unknown() -> Self {
        Self::application(UNKNOWN_LABEL, Category::Unknown)
    }

    pub fn same_label(&self, other: &ActiveItem) -> bool {
        self.label == other.label
    }
}
