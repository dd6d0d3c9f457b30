//! Slash-separated remote path handling.
//!
//! Remote paths are always `/` separated regardless of the local platform,
//! so [`std::path`] is not used here.

/// Lexically normalizes a path: collapses repeated slashes, drops `.`
/// elements and resolves `..` against the preceding element.
///
/// An empty result is `"."`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    let _ = parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}

/// Joins the configured root with a path relative to it.
pub fn join(root: &str, remote: &str) -> String {
    match (root.is_empty(), remote.is_empty()) {
        (true, true) => ".".to_owned(),
        (true, false) => clean(remote),
        (false, true) => clean(root),
        (false, false) => clean(&format!("{root}/{remote}")),
    }
}

/// Everything but the last element, `"."` when there is no parent.
pub fn dir(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => clean(&path[..=i]),
        None => ".".to_owned(),
    }
}

/// The last element. Trailing slashes are ignored.
pub fn base(path: &str) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_owned();
    }

    match trimmed.rfind('/') {
        Some(i) => trimmed[i + 1..].to_owned(),
        None => trimmed.to_owned(),
    }
}

/// The top of a remote: nothing above it can be created or listed.
pub fn is_top(path: &str) -> bool {
    path == "." || path == "/"
}

/// A remote path resolved against a root, split the way every operation
/// needs it: the full path, its parent directory and its last element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub full: String,
    pub dir: String,
    pub base: String,
}

impl Resolved {
    pub fn new(root: &str, remote: &str) -> Self {
        Self::from_full(join(root, remote))
    }

    pub fn from_full(full: String) -> Self {
        Self {
            dir: dir(&full),
            base: base(&full),
            full,
        }
    }
}

#[cfg(test)]
mod test_path {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a//b/./c/"), "a/b/c");
        assert_eq!(clean("a/../../b"), "../b");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("/"), "/");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", ""), ".");
        assert_eq!(join("", "a/b"), "a/b");
        assert_eq!(join("/srv/ftp", ""), "/srv/ftp");
        assert_eq!(join("/srv/ftp/", "a/b"), "/srv/ftp/a/b");
        assert_eq!(join("root", "../x"), "x");
    }

    #[test]
    fn test_dir_and_base() {
        assert_eq!(dir("a"), ".");
        assert_eq!(dir("/a"), "/");
        assert_eq!(dir("a/b/c"), "a/b");
        assert_eq!(base("a/b/c"), "c");
        assert_eq!(base("a/b/"), "b");
        assert_eq!(base("/"), "/");
        assert_eq!(base(""), ".");
    }

    #[test]
    fn test_resolved() {
        let resolved = Resolved::new("/home/user", "docs/readme.txt");
        assert_eq!(resolved.full, "/home/user/docs/readme.txt");
        assert_eq!(resolved.dir, "/home/user/docs");
        assert_eq!(resolved.base, "readme.txt");

        let top = Resolved::new("", "");
        assert!(is_top(&top.full));
    }
}
