//! Version comparison primitive used by the `vergt`/`verge`/... predicates.
//!
//! The matcher only ever calls [`VersionComparator::compare`]; the collation
//! rules live behind the trait so that deployments can plug in their own
//! implementation.

use std::cmp::Ordering;

/// Three-way comparison of two version strings.
pub trait VersionComparator: Send + Sync {
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

impl<F> VersionComparator for F
where
    F: Fn(&str, &str) -> Ordering + Send + Sync,
{
    fn compare(&self, left: &str, right: &str) -> Ordering {
        self(left, right)
    }
}

/// Component-wise version collation.
///
/// Versions are split on any non-alphanumeric character and at every
/// digit/letter boundary. Components are ranked:
///
/// | Rank | Example |
/// |------|---------|
/// | pre-release word | `alpha`, `beta`, `rc`, `pre` |
/// | zero / missing | `0`, padding |
/// | post-release word | `patch`, `post`, `pl`, `errata` |
/// | non-zero number | `1`, `20` |
///
/// so `1.0 == 1.0.0`, `1.0rc1 < 1.0 < 1.0patch1 < 1.0.1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardVersionComparator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    PreRelease,
    Zero,
    PostRelease,
    NonZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Component<'a> {
    rank: Rank,
    text: &'a str,
}

const POST_RELEASE_WORDS: [&str; 5] = ["patch", "post", "pl", "errata", "p"];

impl<'a> Component<'a> {
    const PADDING: Component<'static> = Component {
        rank: Rank::Zero,
        text: "",
    };

    fn numeric(text: &'a str) -> Self {
        let trimmed = text.trim_start_matches('0');
        if trimmed.is_empty() {
            Component::PADDING
        } else {
            Component {
                rank: Rank::NonZero,
                text: trimmed,
            }
        }
    }

    fn alphabetic(text: &'a str) -> Self {
        let rank = if POST_RELEASE_WORDS
            .iter()
            .any(|word| text.eq_ignore_ascii_case(word))
        {
            Rank::PostRelease
        } else {
            Rank::PreRelease
        };
        Component { rank, text }
    }

    fn cmp_with(&self, other: &Component<'_>) -> Ordering {
        self.rank.cmp(&other.rank).then_with(|| match self.rank {
            Rank::NonZero => self
                .text
                .len()
                .cmp(&other.text.len())
                .then_with(|| self.text.cmp(other.text)),
            Rank::PreRelease | Rank::PostRelease => self
                .text
                .to_ascii_lowercase()
                .cmp(&other.text.to_ascii_lowercase()),
            Rank::Zero => Ordering::Equal,
        })
    }
}

fn components(version: &str) -> Vec<Component<'_>> {
    let mut result = Vec::new();
    for part in version.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut start = 0;
        let bytes = part.as_bytes();
        while start < bytes.len() {
            let digit = bytes[start].is_ascii_digit();
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() == digit {
                end += 1;
            }
            let text = &part[start..end];
            result.push(if digit {
                Component::numeric(text)
            } else {
                Component::alphabetic(text)
            });
            start = end;
        }
    }
    result
}

impl VersionComparator for StandardVersionComparator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        let left = components(left);
        let right = components(right);
        let len = left.len().max(right.len());

        for i in 0..len {
            let l = left.get(i).unwrap_or(&Component::PADDING);
            let r = right.get(i).unwrap_or(&Component::PADDING);
            match l.cmp_with(r) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}
