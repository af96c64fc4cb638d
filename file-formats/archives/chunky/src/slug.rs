//! Filesystem-safe names for materialized chunks
//!
//! A chunk named `Icon Large` with FourCC `TPIC` materializes as
//! `Icon-Large.TPIC`. When a sibling already holds that name, `-2`, `-3`, ...
//! is appended to the slug (`Icon-Large-2.TPIC`) until a free name is found
//! or the suffix budget runs out.

use crate::error::{ChunkyError, Result};
use crate::fourcc::FourCc;

/// Slug used when a name has no safe characters at all
pub const EMPTY_SLUG: &str = "unnamed";

/// Default upper bound for collision suffixes
pub const DEFAULT_MAX_SUFFIX: u32 = 99;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Turn a chunk name into a filesystem-safe slug
///
/// Runs of unsafe characters collapse into a single `-`. Leading dots are
/// dropped so a slug never names a hidden or relative entry.
///
/// # Examples
///
/// ```
/// use chunky::slug::slugify;
///
/// assert_eq!(slugify("icon"), "icon");
/// assert_eq!(slugify("art/ui icons"), "art-ui-icons");
/// assert_eq!(slugify("../up"), "up");
/// assert_eq!(slugify(""), "unnamed");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if is_safe(c) {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let trimmed = slug
        .trim_start_matches(['-', '.'])
        .trim_end_matches(['-', '.']);
    if trimmed.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// FourCC as it appears in a materialized name
fn fourcc_extension(fourcc: &FourCc) -> String {
    fourcc
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Materialized name for the `attempt`-th candidate (1-based)
pub fn materialized_name(name: &str, fourcc: &FourCc, attempt: u32) -> String {
    let slug = slugify(name);
    let ext = fourcc_extension(fourcc);
    if attempt <= 1 {
        format!("{slug}.{ext}")
    } else {
        format!("{slug}-{attempt}.{ext}")
    }
}

/// Create an entry under the first free candidate name
///
/// `create` is called with successive candidates until it succeeds. A
/// collision (see [`ChunkyError::is_collision`]) moves on to the next
/// suffix, any other error is returned as is. Returns the name that was
/// created.
pub fn create_unique<F>(
    name: &str,
    fourcc: &FourCc,
    max_suffix: u32,
    mut create: F,
) -> Result<String>
where
    F: FnMut(&str) -> Result<()>,
{
    let last = max_suffix.max(1);
    for attempt in 1..=last {
        let candidate = materialized_name(name, fourcc, attempt);
        match create(&candidate) {
            Ok(()) => {
                if attempt > 1 {
                    log::debug!(
                        "Materialized chunk {:?} as {} after collision",
                        name,
                        candidate
                    );
                }
                return Ok(candidate);
            }
            Err(e) if e.is_collision() => {
                log::trace!("Name {} is taken", candidate);
            }
            Err(e) => return Err(e),
        }
    }

    Err(ChunkyError::CollisionExhausted {
        path: materialized_name(name, fourcc, 1),
        attempts: last,
    })
}
