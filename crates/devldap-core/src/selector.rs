//! Entry selector: candidate entries for a search base.
//!
//! A key is selected when it *ends with* the base DN, compared byte-exact.
//! This is a string test, not RDN-aware containment: `o=example` also selects
//! `cn=x,ou=example`. The empty base selects everything.

use crate::directory::Directory;
use crate::entry::Entry;
use tracing::trace;

/// Entries whose DN ends with `base`, in directory iteration order.
pub fn select_entries<'d>(
    directory: &'d Directory,
    base: &'d str,
) -> impl Iterator<Item = (&'d str, &'d Entry)> + 'd {
    directory.iter().filter(move |(dn, _)| {
        let selected = dn.ends_with(base);
        if !selected {
            trace!(%dn, %base, "entry not under search base");
        }
        selected
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directory() -> Directory {
        Directory::new()
            .with("dc=example,dc=org", Entry::new())
            .with("ou=people,dc=example,dc=org", Entry::new())
            .with("uid=ada,ou=people,dc=example,dc=org", Entry::new())
            .with("uid=bob,ou=people,dc=other,dc=org", Entry::new())
    }

    fn dns<'a>(it: impl Iterator<Item = (&'a str, &'a Entry)>) -> Vec<&'a str> {
        let mut dns: Vec<&str> = it.map(|(dn, _)| dn).collect();
        dns.sort_unstable();
        dns
    }

    #[test]
    fn empty_base_selects_everything() {
        let dir = directory();
        assert_eq!(select_entries(&dir, "").count(), dir.len());
    }

    #[test]
    fn full_key_selects_that_key() {
        let dir = directory();
        assert_eq!(
            dns(select_entries(&dir, "uid=ada,ou=people,dc=example,dc=org")),
            vec!["uid=ada,ou=people,dc=example,dc=org"]
        );
    }

    #[test]
    fn suffix_selects_subtree() {
        let dir = directory();
        assert_eq!(
            dns(select_entries(&dir, "ou=people,dc=example,dc=org")),
            vec![
                "ou=people,dc=example,dc=org",
                "uid=ada,ou=people,dc=example,dc=org"
            ]
        );
        assert_eq!(select_entries(&dir, "dc=org").count(), 4);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let dir = directory();
        assert_eq!(select_entries(&dir, "DC=ORG").count(), 0);
    }

    #[test]
    fn plain_suffix_over_matches() {
        let dir = Directory::new()
            .with("cn=x,ou=example", Entry::new())
            .with("cn=z,o=bigexample", Entry::new())
            .with("cn=y,o=example", Entry::new());
        assert_eq!(
            dns(select_entries(&dir, "o=example")),
            vec!["cn=x,ou=example", "cn=y,o=example"]
        );
    }
}
