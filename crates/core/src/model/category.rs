use serde::{Deserialize, Serialize};

use crate::model::ids::{CategoryId, PageNumber};

//
// ─── CONTENT KIND ──────────────────────────────────────────────────────────────
//

/// Shape of the items a category publishes.
///
/// Decides both the file-name suffix of the category's pages and whether the
/// category is presented as long-form text (scroller / dialogue) or as a card list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Words,
    Sentences,
    Phrases,
    Speech,
    Conversation,
    /// Unknown category; items must carry their own `kind` or be classifiable.
    Generic,
}

impl ContentKind {
    /// Suffix used in `/data/{category}/{page}.{file_kind}.json`.
    #[must_use]
    pub fn file_kind(self) -> &'static str {
        match self {
            ContentKind::Words => "words",
            ContentKind::Sentences => "sentences",
            ContentKind::Phrases => "phrases",
            ContentKind::Speech => "speech",
            ContentKind::Conversation => "conversation",
            ContentKind::Generic => "json",
        }
    }

    #[must_use]
    pub fn is_long_form(self) -> bool {
        matches!(self, ContentKind::Speech | ContentKind::Conversation)
    }

    /// Content kind for a category id, falling back to `Generic` for ids
    /// outside the built-in registry.
    #[must_use]
    pub fn for_category(id: &CategoryId) -> Self {
        match id.as_str() {
            "words" => ContentKind::Words,
            "sentences" => ContentKind::Sentences,
            "phrases" => ContentKind::Phrases,
            "public-speaking" => ContentKind::Speech,
            "interviews" | "office" => ContentKind::Conversation,
            _ => ContentKind::Generic,
        }
    }
}

/// Builds the static resource path of one page of a category.
#[must_use]
pub fn page_resource_path(category: &CategoryId, page: PageNumber) -> String {
    let kind = ContentKind::for_category(category);
    format!("/data/{category}/{page}.{}.json", kind.file_kind())
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Static descriptor of a top-level content grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    display_name: &'static str,
    description: &'static str,
    icon: &'static str,
    content_kind: ContentKind,
}

impl Category {
    #[must_use]
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.description
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        self.icon
    }

    #[must_use]
    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    /// Route of the category page, e.g. `/categories/words`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/categories/{}", self.id)
    }

    #[must_use]
    pub fn is_long_form(&self) -> bool {
        self.content_kind.is_long_form()
    }
}

const BUILTIN: [(&str, &str, &str, &str); 6] = [
    ("words", "Words", "Learn essential English vocabulary", "📚"),
    ("sentences", "Sentences", "Practice common English sentences", "💬"),
    ("phrases", "Phrases", "Master English idioms and phrases", "🎯"),
    (
        "public-speaking",
        "Public Speaking",
        "Improve your speech delivery",
        "🎤",
    ),
    (
        "interviews",
        "Interviews",
        "Practice interview conversations",
        "🤝",
    ),
    ("office", "Office", "Learn workplace communication", "🏢"),
];

/// The fixed, build-time set of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    #[must_use]
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .iter()
            .filter_map(|&(id, display_name, description, icon)| {
                let id = CategoryId::new(id).ok()?;
                let content_kind = ContentKind::for_category(&id);
                Some(Category {
                    id,
                    display_name,
                    description,
                    icon,
                    content_kind,
                })
            })
            .collect();
        Self { categories }
    }

    #[must_use]
    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id() == id)
    }

    /// Looks a category up by its raw id string.
    #[must_use]
    pub fn find(&self, raw: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id().as_str() == raw)
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
