//! Decides how one category moves from its old entry list to its new one.

use worldforge_core::{
    description::{style_signature, Styled},
    CategoryOperation,
};

/// Outcome of comparing a category's old and new entry lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryChange {
    /// Leave every live member untouched.
    Unchanged,
    /// Remove every live member and rebuild from the new list.
    ReplaceAll,
    /// Append the new entries starting at `from`.
    Grow {
        /// Length of the old list; entries from here on are new.
        from: usize,
    },
    /// Remove `count` live members.
    Shrink {
        /// Number of members to drop.
        count: usize,
    },
}

/// Classifies a scenery or building category.
///
/// An explicit operation wins. Otherwise attribute keys absent from a
/// non-empty old list signal a restyle, equal lengths with different content
/// signal a replacement, and longer lists grow only when the old entries form
/// an unchanged prefix.
pub(crate) fn classify<T>(
    old: &[&T],
    new: &[&T],
    operation: Option<CategoryOperation>,
) -> CategoryChange
where
    T: PartialEq + Styled,
{
    if let Some(operation) = operation {
        return classify_explicit(old, new, operation);
    }

    if !old.is_empty() {
        let before = style_signature(old.iter().copied());
        let restyled = style_signature(new.iter().copied())
            .into_iter()
            .any(|key| !before.contains(key));
        if restyled {
            return CategoryChange::ReplaceAll;
        }
    }

    match new.len().cmp(&old.len()) {
        std::cmp::Ordering::Equal if old == new => CategoryChange::Unchanged,
        std::cmp::Ordering::Equal => CategoryChange::ReplaceAll,
        std::cmp::Ordering::Greater if new[..old.len()] == *old => {
            CategoryChange::Grow { from: old.len() }
        }
        std::cmp::Ordering::Greater => CategoryChange::ReplaceAll,
        std::cmp::Ordering::Less => CategoryChange::Shrink {
            count: old.len() - new.len(),
        },
    }
}

/// Classifies a category whose members carry positional identity.
///
/// Only the list length matters: entries are appended to or popped from the
/// end, and equal lengths are left alone. An explicit `set` still replaces.
pub(crate) fn classify_by_count<T: PartialEq>(
    old: &[T],
    new: &[T],
    operation: Option<CategoryOperation>,
) -> CategoryChange {
    if let Some(operation) = operation {
        return classify_explicit(old, new, operation);
    }
    by_length(old.len(), new.len())
}

fn classify_explicit<T: PartialEq>(
    old: &[T],
    new: &[T],
    operation: CategoryOperation,
) -> CategoryChange {
    match operation {
        CategoryOperation::Set if old == new => CategoryChange::Unchanged,
        CategoryOperation::Set => CategoryChange::ReplaceAll,
        CategoryOperation::Add if new.len() > old.len() => CategoryChange::Grow { from: old.len() },
        CategoryOperation::Remove if new.len() < old.len() => CategoryChange::Shrink {
            count: old.len() - new.len(),
        },
        CategoryOperation::Add | CategoryOperation::Remove => {
            log::warn!(
                "{operation:?} does not match list lengths {} -> {}; leaving category untouched",
                old.len(),
                new.len()
            );
            CategoryChange::Unchanged
        }
    }
}

fn by_length(old: usize, new: usize) -> CategoryChange {
    match new.cmp(&old) {
        std::cmp::Ordering::Equal => CategoryChange::Unchanged,
        std::cmp::Ordering::Greater => CategoryChange::Grow { from: old },
        std::cmp::Ordering::Less => CategoryChange::Shrink { count: old - new },
    }
}
