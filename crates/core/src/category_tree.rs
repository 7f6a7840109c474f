//! Category hierarchy guard and slug generation.
//!
//! Categories form a forest through their optional `parent_id`. Every write
//! that sets a parent is checked against the full current graph so that no
//! category ever becomes its own ancestor.

use std::collections::{HashMap, HashSet};

use crate::types::CategoryId;

/// Reasons a parent assignment is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryTreeError {
    #[error("A category cannot be its own parent")]
    SelfParent,
    #[error("Category hierarchy cycle")]
    Cycle,
    #[error("Parent category not found: {0}")]
    UnknownParent(CategoryId),
}

/// Snapshot of the category parent graph.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    parents: HashMap<CategoryId, Option<CategoryId>>,
}

impl CategoryTree {
    /// Build from `(id, parent_id)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (CategoryId, Option<CategoryId>)>,
    {
        Self {
            parents: edges.into_iter().collect(),
        }
    }

    /// Whether the category is known.
    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        self.parents.contains_key(&id)
    }

    /// The current parent of `id`, if any.
    #[must_use]
    pub fn parent_of(&self, id: CategoryId) -> Option<CategoryId> {
        self.parents.get(&id).copied().flatten()
    }

    /// Check that `id` may be placed under `new_parent`.
    ///
    /// `id` does not have to exist yet; a brand-new category can only fail
    /// when its parent is unknown. Detaching (`None`) always succeeds.
    ///
    /// # Errors
    ///
    /// - [`CategoryTreeError::SelfParent`] if `new_parent == id`
    /// - [`CategoryTreeError::UnknownParent`] if the parent does not exist
    /// - [`CategoryTreeError::Cycle`] if the parent is a descendant of `id`
    pub fn check_reparent(
        &self,
        id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> Result<(), CategoryTreeError> {
        let Some(parent) = new_parent else {
            return Ok(());
        };
        if parent == id {
            return Err(CategoryTreeError::SelfParent);
        }
        if !self.contains(parent) {
            return Err(CategoryTreeError::UnknownParent(parent));
        }

        let mut seen = HashSet::new();
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            // Reaching `id` means `parent` sits below it. Revisiting a node
            // means the stored graph already loops.
            if current == id || !seen.insert(current) {
                return Err(CategoryTreeError::Cycle);
            }
            cursor = self.parent_of(current);
        }

        Ok(())
    }
}

/// Derive a URL slug from a display name.
///
/// Lowercases ASCII letters, keeps ASCII digits, and collapses every other
/// run of characters into a single `-`. Leading and trailing dashes are
/// removed, so the result may be empty for names with no ASCII alphanumerics.
///
/// ```
/// use beauty_shop_core::slugify;
///
/// assert_eq!(slugify("Skin Care & Serums"), "skin-care-serums");
/// assert_eq!(slugify("  Lips!! "), "lips");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<const N: usize>() -> [CategoryId; N] {
        [(); N].map(|()| CategoryId::generate())
    }

    /// root <- skin <- serums
    fn sample() -> (CategoryTree, [CategoryId; 4]) {
        let [root, skin, serums, hair] = ids::<4>();
        let tree = CategoryTree::from_edges([
            (root, None),
            (skin, Some(root)),
            (serums, Some(skin)),
            (hair, None),
        ]);
        (tree, [root, skin, serums, hair])
    }

    #[test]
    fn test_valid_reparent() {
        let (tree, [root, _, serums, hair]) = sample();
        assert_eq!(tree.check_reparent(hair, Some(root)), Ok(()));
        assert_eq!(tree.check_reparent(serums, Some(hair)), Ok(()));
        assert_eq!(tree.check_reparent(root, None), Ok(()));
    }

    #[test]
    fn test_self_parent_rejected() {
        let (tree, [root, ..]) = sample();
        assert_eq!(
            tree.check_reparent(root, Some(root)),
            Err(CategoryTreeError::SelfParent)
        );
    }

    #[test]
    fn test_descendant_parent_rejected() {
        let (tree, [root, skin, serums, _]) = sample();
        assert_eq!(
            tree.check_reparent(root, Some(serums)),
            Err(CategoryTreeError::Cycle)
        );
        assert_eq!(
            tree.check_reparent(skin, Some(serums)),
            Err(CategoryTreeError::Cycle)
        );
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let (tree, [root, ..]) = sample();
        let stranger = CategoryId::generate();
        assert_eq!(
            tree.check_reparent(root, Some(stranger)),
            Err(CategoryTreeError::UnknownParent(stranger))
        );
    }

    #[test]
    fn test_new_category_under_existing_parent() {
        let (tree, [_, skin, ..]) = sample();
        assert_eq!(tree.check_reparent(CategoryId::generate(), Some(skin)), Ok(()));
    }

    #[test]
    fn test_corrupt_stored_loop_is_reported() {
        let [a, b, c] = ids::<3>();
        let tree = CategoryTree::from_edges([(a, Some(b)), (b, Some(a)), (c, None)]);
        assert_eq!(tree.check_reparent(c, Some(a)), Err(CategoryTreeError::Cycle));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hair Care"), "hair-care");
        assert_eq!(slugify("Face -- Masks"), "face-masks");
        assert_eq!(slugify("SPF 50+"), "spf-50");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Crème Brûlée"), "cr-me-br-l-e");
    }
}
