//! Default visual hints per canonical category.
//!
//! A single process-wide, read-only map built lazily on first use; never
//! mutated at request time. Renderers may override any of it, these are
//! only the defaults.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::normalize::CanonicalCategory;

/// Default display hints for one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryStyle {
    pub display_name: &'static str,
    pub icon: &'static str,
    /// Hex color.
    pub color: &'static str,
}

const STYLES: &[(CanonicalCategory, CategoryStyle)] = &[
    (
        CanonicalCategory::PromptTemplate,
        CategoryStyle {
            display_name: "Prompt Template",
            icon: "📝",
            color: "#10B981",
        },
    ),
    (
        CanonicalCategory::LanguageModel,
        CategoryStyle {
            display_name: "Language Model",
            icon: "🤖",
            color: "#FF6B35",
        },
    ),
    (
        CanonicalCategory::OutputParser,
        CategoryStyle {
            display_name: "Output Parser",
            icon: "🔧",
            color: "#8B5CF6",
        },
    ),
    (
        CanonicalCategory::Retriever,
        CategoryStyle {
            display_name: "Retriever",
            icon: "🔍",
            color: "#0EA5E9",
        },
    ),
    (
        CanonicalCategory::VectorStore,
        CategoryStyle {
            display_name: "Vector Store",
            icon: "🗄️",
            color: "#F59E0B",
        },
    ),
    (
        CanonicalCategory::Memory,
        CategoryStyle {
            display_name: "Memory",
            icon: "🧠",
            color: "#EC4899",
        },
    ),
    (
        CanonicalCategory::Tool,
        CategoryStyle {
            display_name: "Tool",
            icon: "🛠️",
            color: "#14B8A6",
        },
    ),
    (
        CanonicalCategory::Agent,
        CategoryStyle {
            display_name: "Agent",
            icon: "🎯",
            color: "#4F46E5",
        },
    ),
    (
        CanonicalCategory::Chain,
        CategoryStyle {
            display_name: "Chain",
            icon: "🔗",
            color: "#4F46E5",
        },
    ),
];

const UNKNOWN_STYLE: CategoryStyle = CategoryStyle {
    display_name: "Unknown",
    icon: "❓",
    color: "#6B7280",
};

fn style_table() -> &'static FxHashMap<CanonicalCategory, CategoryStyle> {
    static TABLE: OnceLock<FxHashMap<CanonicalCategory, CategoryStyle>> = OnceLock::new();
    TABLE.get_or_init(|| STYLES.iter().copied().collect())
}

/// Returns the default style for a category.
///
/// # Examples
///
/// ```
/// use tracegraph::normalize::CanonicalCategory;
/// use tracegraph::styles::style_for;
///
/// assert_eq!(style_for(CanonicalCategory::Unknown).icon, "❓");
/// assert_eq!(style_for(CanonicalCategory::LanguageModel).display_name, "Language Model");
/// ```
#[must_use]
pub fn style_for(category: CanonicalCategory) -> &'static CategoryStyle {
    style_table().get(&category).unwrap_or(&UNKNOWN_STYLE)
}
