//! Health service - read-only consistency checks over the tree bookkeeping.

use serde::Serialize;
use tracing::warn;

use crate::store::{self, CommentStore};
use crate::tree::TreeManager;

use super::CoreResult;

/// How many offending ids a check lists before truncating.
const SAMPLE_LIMIT: usize = 10;

/// Result of a single health check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: "pass".to_string(),
            message: message.to_string(),
            remediation: None,
        }
    }

    fn fail(name: &str, message: &str, remediation: &str) -> Self {
        Self {
            name: name.to_string(),
            status: "fail".to_string(),
            message: message.to_string(),
            remediation: Some(remediation.to_string()),
        }
    }

    fn warn(name: &str, message: &str, remediation: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status: "warn".to_string(),
            message: message.to_string(),
            remediation: remediation.map(ToString::to_string),
        }
    }

    #[must_use]
    pub fn is_fail(&self) -> bool {
        self.status == "fail"
    }
}

/// Overall health status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub comment_count: usize,
    pub checks: Vec<CheckResult>,
}

/// Service for consistency checks.
pub struct HealthService<'a> {
    store: &'a CommentStore,
    tree: &'a TreeManager,
}

impl<'a> HealthService<'a> {
    pub(crate) const fn new(store: &'a CommentStore, tree: &'a TreeManager) -> Self {
        Self { store, tree }
    }

    /// Compare every row's bookkeeping with what its parent links imply.
    ///
    /// Path and last-child mismatches fail the report. Activity drift only
    /// warns: with sibling stamping on, removing a child re-stamps siblings
    /// with an older time than their own replies, which a rebuild undoes.
    pub fn check(&self) -> CoreResult<HealthReport> {
        let config = self.tree.config();
        let rows = store::list_all(self.store.conn())?;
        let max_id = rows.iter().map(|c| c.id).max().unwrap_or(0);

        if config.check_capacity(max_id).is_err() {
            // Paths cannot be derived at all, so the other checks are skipped.
            let check = CheckResult::fail(
                "capacity",
                &format!(
                    "largest id {max_id} does not fit {} digits",
                    config.path_digits
                ),
                "Increase tree.path_digits, then run 'threadedcomments rebuild-paths'",
            );
            warn!(check = %check.name, status = %check.status, "{}", check.message);
            return Ok(HealthReport {
                healthy: false,
                comment_count: rows.len(),
                checks: vec![check],
            });
        }

        let plan = self.tree.plan_bookkeeping(&rows)?;
        let mut checks = vec![CheckResult::pass(
            "capacity",
            &format!(
                "largest id {max_id} fits {} digits (limit {})",
                config.path_digits,
                config.max_id()
            ),
        )];

        let mut bad_paths = Vec::new();
        let mut bad_last_child = Vec::new();
        let mut stale_activity = Vec::new();
        for row in &rows {
            let Some(expected) = plan.get(&row.id) else {
                bad_paths.push(row.id);
                continue;
            };
            if row.tree_path != expected.tree_path {
                bad_paths.push(row.id);
            }
            if row.last_child_id != expected.last_child_id {
                bad_last_child.push(row.id);
            }
            if row.newest_activity != Some(expected.newest_activity) {
                stale_activity.push(row.id);
            }
        }

        let rebuild = "Run 'threadedcomments rebuild-paths'";
        checks.push(if bad_paths.is_empty() {
            CheckResult::pass("tree_path", "every path matches its ancestry")
        } else {
            CheckResult::fail(
                "tree_path",
                &format!(
                    "{} comment(s) with missing or wrong path: {}",
                    bad_paths.len(),
                    sample(&bad_paths)
                ),
                rebuild,
            )
        });
        checks.push(if bad_last_child.is_empty() {
            CheckResult::pass("last_child", "every last_child is the most recent reply")
        } else {
            CheckResult::fail(
                "last_child",
                &format!(
                    "{} comment(s) with wrong last_child: {}",
                    bad_last_child.len(),
                    sample(&bad_last_child)
                ),
                rebuild,
            )
        });
        checks.push(if stale_activity.is_empty() {
            CheckResult::pass("newest_activity", "activity timestamps are current")
        } else {
            CheckResult::warn(
                "newest_activity",
                &format!(
                    "{} comment(s) with drifted newest_activity: {}",
                    stale_activity.len(),
                    sample(&stale_activity)
                ),
                Some(rebuild),
            )
        });

        for check in checks.iter().filter(|c| c.status != "pass") {
            warn!(check = %check.name, status = %check.status, "{}", check.message);
        }

        Ok(HealthReport {
            healthy: !checks.iter().any(CheckResult::is_fail),
            comment_count: rows.len(),
            checks,
        })
    }
}

fn sample(ids: &[i64]) -> String {
    let mut shown: Vec<String> = ids.iter().take(SAMPLE_LIMIT).map(ToString::to_string).collect();
    if ids.len() > SAMPLE_LIMIT {
        shown.push("...".to_string());
    }
    shown.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::core::CommentServices;
    use crate::store::NewComment;
    use crate::tree::CreateOptions;
    use rusqlite::params;

    fn services() -> CommentServices {
        let store = CommentStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        CommentServices::new(store, TreeConfig::default()).unwrap()
    }

    fn status<'r>(report: &'r HealthReport, name: &str) -> &'r str {
        report
            .checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.status.as_str())
            .unwrap()
    }

    #[test]
    fn test_empty_store_is_healthy() {
        let services = services();
        let report = services.health().check().unwrap();
        assert!(report.healthy);
        assert_eq!(report.comment_count, 0);
    }

    #[test]
    fn test_healthy_after_normal_use() {
        let services = services();
        let comments = services.comments();
        let opts = CreateOptions::default();
        comments.post(NewComment::new("p", "a", "1"), opts).unwrap();
        comments.post(NewComment::new("p", "a", "2").reply_to(1), opts).unwrap();
        comments.post(NewComment::new("p", "a", "3").reply_to(1), opts).unwrap();
        comments.post(NewComment::new("p", "a", "4").reply_to(2), opts).unwrap();
        comments.delete(3).unwrap();

        let report = services.health().check().unwrap();
        assert!(report.healthy, "{report:?}");
        assert_eq!(status(&report, "tree_path"), "pass");
        assert_eq!(status(&report, "last_child"), "pass");
    }

    #[test]
    fn test_detects_corrupted_last_child() {
        let services = services();
        let comments = services.comments();
        let opts = CreateOptions::default();
        comments.post(NewComment::new("p", "a", "1"), opts).unwrap();
        comments.post(NewComment::new("p", "a", "2").reply_to(1), opts).unwrap();

        services
            .store()
            .conn()
            .execute(
                "UPDATE threadedcomments_comment SET last_child_id = NULL WHERE id = ?",
                params![1],
            )
            .unwrap();

        let report = services.health().check().unwrap();
        assert!(!report.healthy);
        assert_eq!(status(&report, "last_child"), "fail");

        services.threads().rebuild_paths().unwrap();
        assert!(services.health().check().unwrap().healthy);
    }

    #[test]
    fn test_unassigned_path_fails() {
        let services = services();
        services
            .comments()
            .post(
                NewComment::new("p", "a", "raw"),
                CreateOptions {
                    skip_tree_path: true,
                },
            )
            .unwrap();

        let report = services.health().check().unwrap();
        assert!(!report.healthy);
        assert_eq!(status(&report, "tree_path"), "fail");
    }

    #[test]
    fn test_capacity_overflow_reports_fail() {
        let store = CommentStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO threadedcomments_comment
                 (id, content_object, user_name, comment, submit_date)
                 VALUES (10, 'p', 'a', 'wide', '2024-01-01T00:00:00.000000Z')",
                [],
            )
            .unwrap();
        let tree = TreeManager::new(TreeConfig {
            path_digits: 1,
            ..TreeConfig::default()
        })
        .unwrap();

        let report = HealthService::new(&store, &tree).check().unwrap();
        assert!(!report.healthy);
        assert_eq!(report.comment_count, 1);
        assert_eq!(status(&report, "capacity"), "fail");
        assert_eq!(report.checks.len(), 1);
    }

    #[test]
    fn test_sample_truncates() {
        let ids: Vec<i64> = (1..=12).collect();
        assert_eq!(sample(&ids), "1,2,3,4,5,6,7,8,9,10,...");
        assert_eq!(sample(&[4]), "4");
    }
}
