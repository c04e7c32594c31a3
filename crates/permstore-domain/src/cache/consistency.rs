//! Cache/storage consistency diagnostics.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use super::{ObjectKey, PermissionCache};
use crate::error::DomainResult;
use crate::model::{GroupId, Permissions};

/// Outcome of a consistency check.
///
/// Lines are kept unescaped; [`render`](Self::render) produces the text or
/// HTML form requested when the check ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub lines: Vec<String>,
    html: bool,
}

impl ConsistencyReport {
    fn new(html: bool) -> Self {
        Self {
            consistent: true,
            lines: Vec::new(),
            html,
        }
    }

    fn note(&mut self, line: String) {
        self.lines.push(line);
    }

    fn mismatch(&mut self, line: String) {
        self.consistent = false;
        self.lines.push(line);
    }

    /// Renders the report, one line per message.
    ///
    /// In HTML mode every line is escaped and lines are joined with `<br/>`.
    pub fn render(&self) -> String {
        if self.html {
            self.lines
                .iter()
                .map(|line| escape_html(line))
                .collect::<Vec<_>>()
                .join("<br/>")
        } else {
            self.lines.join("\n")
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl PermissionCache {
    /// Compares the cache with storage.
    ///
    /// Always compares the number of cached entries with the number of
    /// distinct non-empty rows in storage. With `full` set, every group is
    /// diffed in both directions: each stored row must be cached with the
    /// same bits and each cached entry must have a stored row.
    ///
    /// Mismatches never produce an error; they are collected in the report.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `initialize()` and storage failures.
    pub fn check_consistency(&self, full: bool, html: bool) -> DomainResult<ConsistencyReport> {
        self.ensure_initialized()?;
        let mut report = ConsistencyReport::new(html);

        let stored = self.source.count_distinct_permissions()?;
        let cached = self.entry_count() as u64;
        if stored == cached {
            report.note(format!("cache and storage hold {cached} permission entries"));
        } else {
            report.mismatch(format!(
                "cache holds {cached} permission entries, storage holds {stored}"
            ));
        }

        if full {
            let mut groups: BTreeSet<GroupId> = self.source.group_ids()?.into_iter().collect();
            groups.extend(self.permissions.iter().map(|e| *e.key()));
            for group_id in groups {
                self.diff_group(group_id, &mut report)?;
            }
        }

        if report.consistent {
            info!(full, entries = cached, "permission cache is consistent");
        } else {
            warn!(
                full,
                mismatches = report.lines.len(),
                "permission cache is inconsistent"
            );
        }
        Ok(report)
    }

    fn diff_group(&self, group_id: GroupId, report: &mut ConsistencyReport) -> DomainResult<()> {
        let mut stored: BTreeMap<ObjectKey, Permissions> = BTreeMap::new();
        for row in self.source.group_permissions(group_id)? {
            match Permissions::parse(&row.bits) {
                Ok(Some(perms)) => {
                    stored.insert((row.obj_type, row.obj_id), perms);
                }
                Ok(None) => {}
                Err(_) => report.mismatch(format!(
                    "group {group_id}: {}/{} has malformed bits '{}'",
                    row.obj_type, row.obj_id, row.bits
                )),
            }
        }

        let cached: BTreeMap<ObjectKey, Permissions> = self
            .permissions
            .get(&group_id)
            .map(|map| map.iter().map(|e| (*e.key(), *e.value())).collect())
            .unwrap_or_default();

        for ((obj_type, obj_id), perms) in &stored {
            match cached.get(&(*obj_type, *obj_id)) {
                None => report.mismatch(format!(
                    "group {group_id}: {obj_type}/{obj_id} stored as {perms} but not cached"
                )),
                Some(cached_perms) if cached_perms != perms => report.mismatch(format!(
                    "group {group_id}: {obj_type}/{obj_id} stored as {perms} but cached as {cached_perms}"
                )),
                Some(_) => {}
            }
        }
        for ((obj_type, obj_id), perms) in &cached {
            if !stored.contains_key(&(*obj_type, *obj_id)) {
                report.mismatch(format!(
                    "group {group_id}: {obj_type}/{obj_id} cached as {perms} but not stored"
                ));
            }
        }
        Ok(())
    }
}
