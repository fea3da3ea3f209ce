use glob::{glob, Pattern};
use std::{
    borrow::Cow,
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, trace, warn};

use super::CompileError;

pub const DETAIL_SUFFIX: &str = "_e_detail.csv";
pub const SUPPLEMENTAL_SUFFIX: &str = "_e_sup.csv";

/// Metadata files some archivers add next to every real file.
const RESERVED_PREFIX: &str = "._";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Detail,
    Supplemental,
}

/// The detail and supplemental files that share one base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePair {
    pub detail: Option<PathBuf>,
    pub supplemental: Option<PathBuf>,
}

impl FilePair {
    fn set(&mut self, member: Member, path: PathBuf) {
        match member {
            Member::Detail => self.detail = Some(path),
            Member::Supplemental => self.supplemental = Some(path),
        }
    }
}

/// Base name and member type for a recognised file name, `None` otherwise.
pub fn classify(file_name: &str) -> Option<(&str, Member)> {
    if file_name.starts_with(RESERVED_PREFIX) {
        return None;
    }
    if let Some(base) = file_name.strip_suffix(DETAIL_SUFFIX) {
        Some((base, Member::Detail))
    } else {
        file_name
            .strip_suffix(SUPPLEMENTAL_SUFFIX)
            .map(|base| (base, Member::Supplemental))
    }
}

/// Group paths into pairs, visiting them in the given order. A later path
/// for the same base name and member replaces an earlier one.
pub fn group_paths<I>(paths: I) -> BTreeMap<String, FilePair>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut pairs: BTreeMap<String, FilePair> = BTreeMap::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };
        if let Cow::Owned(_) = name {
            warn!(path = %path.display(), "file name is not valid UTF-8, matching on a lossy copy");
        }
        let Some((base, member)) = classify(&name) else {
            trace!(path = %path.display(), "ignoring file");
            continue;
        };
        let base = base.to_string();
        let pair = pairs.entry(base.clone()).or_default();
        let replaced = match member {
            Member::Detail => pair.detail.is_some(),
            Member::Supplemental => pair.supplemental.is_some(),
        };
        if replaced {
            warn!(base = %base, ?member, path = %path.display(), "duplicate base name, later file wins");
        }
        pair.set(member, path);
    }
    pairs
}

/// Walk every file under `root` and group the recognised ones by base name.
///
/// Paths are sorted before grouping so duplicates across directories always
/// resolve the same way.
#[instrument(level = "debug", skip(root), fields(root = %root.display()))]
pub fn discover_pairs(root: &Path) -> Result<BTreeMap<String, FilePair>, CompileError> {
    let pattern = format!("{}/**/*", Pattern::escape(&root.to_string_lossy()));

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in glob(&pattern)? {
        match entry {
            Ok(p) if p.is_file() => paths.push(p),
            Ok(_) => {}
            Err(e) => warn!("cannot read extracted entry: {}", e),
        }
    }
    paths.sort();

    let pairs = group_paths(paths);
    debug!(pairs = pairs.len(), "grouped file pairs");
    Ok(pairs)
}
