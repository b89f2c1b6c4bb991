//! Materialized path codec.
//!
//! A path is the `/`-joined sequence of zero-padded ids from the root down to
//! the comment itself, e.g. `0000000001/0000000007`. Every segment has the
//! same width, so comparing two paths as strings orders them as a pre-order
//! walk of the tree.

use crate::config::TreeConfig;
use crate::core::{CoreError, CoreResult};

/// Render one zero-padded segment for `id`.
pub fn segment(id: i64, config: &TreeConfig) -> CoreResult<String> {
    if id < 0 || id > config.max_id() {
        return Err(CoreError::PathCapacity {
            id,
            digits: config.path_digits,
        });
    }
    Ok(format!("{id:0width$}", width = config.path_digits))
}

/// Path of a root comment.
pub fn root(id: i64, config: &TreeConfig) -> CoreResult<String> {
    segment(id, config)
}

/// Path of a child of the comment at `parent_path`.
pub fn join(parent_path: &str, id: i64, config: &TreeConfig) -> CoreResult<String> {
    Ok(format!(
        "{parent_path}{}{}",
        config.path_separator,
        segment(id, config)?
    ))
}

/// Number of segments. An unassigned (empty) path has depth 0.
#[must_use]
pub fn depth(path: &str, config: &TreeConfig) -> usize {
    if path.is_empty() {
        return 0;
    }
    path.split(config.path_separator.as_str()).count()
}

/// Decode every segment into an id, root first.
pub fn segments(path: &str, config: &TreeConfig) -> CoreResult<Vec<i64>> {
    if path.is_empty() {
        return Err(CoreError::MalformedPath {
            path: path.to_string(),
        });
    }
    path.split(config.path_separator.as_str())
        .map(|seg| {
            seg.parse::<i64>().map_err(|_| CoreError::MalformedPath {
                path: path.to_string(),
            })
        })
        .collect()
}

/// Id of the thread root: the first segment.
pub fn root_id(path: &str, config: &TreeConfig) -> CoreResult<i64> {
    segments(path, config)?
        .first()
        .copied()
        .ok_or_else(|| CoreError::MalformedPath {
            path: path.to_string(),
        })
}

/// Ids of every ancestor, root first, excluding the comment itself.
pub fn ancestor_ids(path: &str, config: &TreeConfig) -> CoreResult<Vec<i64>> {
    let mut ids = segments(path, config)?;
    ids.pop();
    Ok(ids)
}

/// Half-open string range `[lower, upper)` covering every strict descendant
/// of the comment at `path`.
///
/// The upper bound bumps the last character of the separator, so the range
/// holds exactly the paths that start with `path + separator`.
#[must_use]
pub fn descendant_range(path: &str, config: &TreeConfig) -> (String, String) {
    let lower = format!("{path}{}", config.path_separator);
    let mut upper = path.to_string();
    let mut sep = config.path_separator.chars();
    let last = sep.next_back().unwrap_or('/');
    upper.push_str(sep.as_str());
    upper.push(char::from_u32(u32::from(last) + 1).unwrap_or(char::MAX));
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TreeConfig {
        TreeConfig::default()
    }

    #[test]
    fn test_segment_is_zero_padded() {
        assert_eq!(segment(1, &cfg()).unwrap(), "0000000001");
        assert_eq!(segment(9_999_999_999, &cfg()).unwrap(), "9999999999");
    }

    #[test]
    fn test_segment_overflow() {
        let err = segment(10_000_000_000, &cfg()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PathCapacity {
                id: 10_000_000_000,
                digits: 10
            }
        ));
    }

    #[test]
    fn test_join_and_decode() {
        let config = cfg();
        let p = join(&root(1, &config).unwrap(), 7, &config).unwrap();
        assert_eq!(p, "0000000001/0000000007");
        assert_eq!(depth(&p, &config), 2);
        assert_eq!(root_id(&p, &config).unwrap(), 1);
        assert_eq!(segments(&p, &config).unwrap(), vec![1, 7]);
        assert_eq!(ancestor_ids(&p, &config).unwrap(), vec![1]);
    }

    #[test]
    fn test_root_has_no_ancestors() {
        let config = cfg();
        let p = root(42, &config).unwrap();
        assert_eq!(depth(&p, &config), 1);
        assert!(ancestor_ids(&p, &config).unwrap().is_empty());
    }

    #[test]
    fn test_empty_path() {
        let config = cfg();
        assert_eq!(depth("", &config), 0);
        assert!(matches!(
            root_id("", &config),
            Err(CoreError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_non_numeric_segment() {
        assert!(matches!(
            segments("0000000001/abc", &cfg()),
            Err(CoreError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_custom_separator_and_width() {
        let config = TreeConfig {
            path_separator: "::".to_string(),
            path_digits: 4,
            ..TreeConfig::default()
        };
        let p = join(&join("0001", 12, &config).unwrap(), 300, &config).unwrap();
        assert_eq!(p, "0001::0012::0300");
        assert_eq!(depth(&p, &config), 3);
        assert_eq!(ancestor_ids(&p, &config).unwrap(), vec![1, 12]);
    }

    #[test]
    fn test_string_order_is_preorder() {
        let config = cfg();
        let r1 = root(1, &config).unwrap();
        let c2 = join(&r1, 2, &config).unwrap();
        let c10 = join(&r1, 10, &config).unwrap();
        let g11 = join(&c2, 11, &config).unwrap();
        let r3 = root(3, &config).unwrap();

        let mut paths = vec![r3.clone(), c10.clone(), g11.clone(), r1.clone(), c2.clone()];
        paths.sort();
        assert_eq!(paths, vec![r1, c2, g11, c10, r3]);
    }

    #[test]
    fn test_descendant_range() {
        let config = cfg();
        let (lower, upper) = descendant_range("0000000001", &config);
        assert_eq!(lower, "0000000001/");
        assert_eq!(upper, "00000000010");

        let child = "0000000001/0000000002";
        assert!(child >= lower.as_str() && child < upper.as_str());
        assert!("0000000001" < lower.as_str());
        assert!("0000000002" >= upper.as_str());
    }
}
