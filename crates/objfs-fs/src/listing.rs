//! Directory-style listing over a flat object namespace.
//!
//! Pools have no directories, only object ids that conventionally use `/`
//! as a separator. A listing scans every id in the pool and keeps the first
//! path segment below the requested prefix, which yields one level of a
//! synthesized directory tree.

use std::collections::BTreeSet;

use objfs_store::{PoolContext, StoreResult};

const SEPARATOR: char = '/';

/// Collect the immediate children of `prefix` from a stream of object ids.
///
/// - An id equal to `prefix` contributes its own basename, so listing a
///   path that names an object (rather than a "directory") still finds it.
/// - An id below `prefix/` contributes its first segment after the prefix.
/// - Empty segments are dropped and duplicates collapse.
///
/// An empty prefix lists the top level of the pool. The first failed item
/// aborts the scan and its error is returned; nothing partial escapes.
pub fn collect_children<I>(names: I, prefix: &str) -> StoreResult<BTreeSet<String>>
where
    I: IntoIterator<Item = StoreResult<String>>,
{
    let trimmed = prefix.trim_end_matches(SEPARATOR);
    let dir_prefix = if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}{SEPARATOR}")
    };

    let mut children = BTreeSet::new();
    for name in names {
        let name = name?;
        if !prefix.is_empty() && name == prefix {
            let basename = name.rsplit(SEPARATOR).next().unwrap_or_default();
            if !basename.is_empty() {
                children.insert(basename.to_string());
            }
        }
        if let Some(rest) = name.strip_prefix(dir_prefix.as_str()) {
            let child = rest.split(SEPARATOR).next().unwrap_or_default();
            if !child.is_empty() {
                children.insert(child.to_string());
            }
        }
    }
    Ok(children)
}

/// List the immediate children of `prefix` in the pool behind `ctx`.
///
/// This is a full scan of the pool: its cost grows with the number of
/// objects in the pool, not with the size of the result.
pub fn list_children(ctx: &dyn PoolContext, prefix: &str) -> StoreResult<Vec<String>> {
    let children = collect_children(ctx.object_names()?, prefix)?;
    Ok(children.into_iter().collect())
}
