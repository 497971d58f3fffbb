//! Expense category labels.

/// Category selected for a new expense when none is given.
pub const DEFAULT_CATEGORY: &str = "عام";

/// Labels seeded into a fresh store: general, materials, equipment, services.
pub const DEFAULT_CATEGORIES: [&str; 4] = [DEFAULT_CATEGORY, "مواد", "معدات", "خدمات"];

/// Returns the seeded category list.
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|label| label.to_string()).collect()
}

/// Trims a category label; `None` when nothing is left.
pub fn normalize_category(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
