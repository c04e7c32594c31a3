//! Per-role permission bundles.

use std::collections::BTreeMap;

use permstore_storage::RolePermissionRow;
use tracing::debug;

use super::object_type;
use super::permissions::Permissions;
use super::LanguageId;
use crate::error::DomainResult;

/// Language key for role page permissions that apply to all languages.
pub const ALL_LANGUAGES: LanguageId = 0;

/// Permissions granted by one role.
///
/// `file` applies to files and images, `page` is keyed by content language
/// with [`ALL_LANGUAGES`] as the language-independent entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissions {
    file: Option<Permissions>,
    page: BTreeMap<LanguageId, Permissions>,
}

impl RolePermissions {
    /// The bundle granting nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a bundle from its parts. All-zero entries are dropped.
    pub fn new(
        file: Option<Permissions>,
        page: impl IntoIterator<Item = (LanguageId, Option<Permissions>)>,
    ) -> Self {
        Self {
            file,
            page: page
                .into_iter()
                .filter_map(|(lang, perms)| perms.map(|p| (lang, p)))
                .collect(),
        }
    }

    /// Builds the bundle from the role's stored rows.
    ///
    /// A file row sets the file permissions, a page row the
    /// [`ALL_LANGUAGES`] entry and a content language row the entry of that
    /// language. Rows of other types are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBitPattern` for a malformed bit string.
    pub fn from_rows(rows: &[RolePermissionRow]) -> DomainResult<Self> {
        let mut file = None;
        let mut page = BTreeMap::new();
        for row in rows {
            let perms = Permissions::parse(&row.bits)?;
            match row.obj_type {
                object_type::FILE => file = perms,
                object_type::PAGE => set_entry(&mut page, ALL_LANGUAGES, perms),
                object_type::CONTENT_LANGUAGE => set_entry(&mut page, row.obj_id, perms),
                other => debug!(obj_type = other, "ignoring role permission row"),
            }
        }
        Ok(Self { file, page })
    }

    /// Permissions on files and images.
    pub fn file_perm(&self) -> Option<Permissions> {
        self.file
    }

    /// Permissions stored for exactly `language_id`.
    pub fn page_perm(&self, language_id: LanguageId) -> Option<Permissions> {
        self.page.get(&language_id).copied()
    }

    /// Permissions effective for a page in `language_id`.
    ///
    /// A role grants page access either for the specific language or for all
    /// languages, so both entries are merged.
    pub fn effective_page_perm(&self, language_id: LanguageId) -> Option<Permissions> {
        if language_id == ALL_LANGUAGES {
            return self.page_perm(ALL_LANGUAGES);
        }
        Permissions::merge([self.page_perm(language_id), self.page_perm(ALL_LANGUAGES)])
    }

    /// Returns whether the role grants nothing.
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.page.is_empty()
    }
}

fn set_entry(
    page: &mut BTreeMap<LanguageId, Permissions>,
    language_id: LanguageId,
    perms: Option<Permissions>,
) {
    match perms {
        Some(p) => {
            page.insert(language_id, p);
        }
        None => {
            page.remove(&language_id);
        }
    }
}
