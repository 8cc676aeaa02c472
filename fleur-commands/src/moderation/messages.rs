use fleur_utils::purge::{PurgeOutcome, PurgeReport};

use crate::CommandMeta;

pub fn usage_message(prefix: &str, meta: &CommandMeta) -> String {
    format!("Syntax error: `{}`", meta.usage_with(prefix))
}

pub fn guild_only_message(command: &str) -> String {
    format!("`{command}` only works in servers.")
}

pub fn missing_role_message(command: &str) -> String {
    format!("Insufficient rights to use `{command}`.")
}

pub fn missing_permission_message(command: &str) -> String {
    format!("`{command}` needs the Manage Messages permission.")
}

pub fn failure_message(command: &str, detail: &str) -> String {
    format!("Failed to run `{command}`: {detail}")
}

/// Log description for a finished purge, e.g. `Deleted 3 message(s) from Ann.`
pub fn purge_summary(report: &PurgeReport, scope: &str) -> String {
    if scope.is_empty() {
        format!("Deleted {} message(s).", report.deleted)
    } else {
        format!("Deleted {} message(s) {scope}.", report.deleted)
    }
}

/// Extra log detail for outcomes other than a satisfied count.
pub fn purge_outcome_note(report: &PurgeReport, scan_limit: usize) -> Option<String> {
    match report.outcome {
        PurgeOutcome::Complete | PurgeOutcome::Exhausted => None,
        PurgeOutcome::Partial => Some(format!(
            "partial result: stopped after scanning {scan_limit} messages"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_scope() {
        let report = PurgeReport {
            deleted: 3,
            outcome: PurgeOutcome::Complete,
        };

        assert_eq!(purge_summary(&report, ""), "Deleted 3 message(s).");
        assert_eq!(
            purge_summary(&report, "containing «spam»"),
            "Deleted 3 message(s) containing «spam»."
        );
        assert_eq!(purge_outcome_note(&report, 100), None);
    }

    #[test]
    fn partial_outcome_is_called_out() {
        let report = PurgeReport {
            deleted: 1,
            outcome: PurgeOutcome::Partial,
        };

        assert_eq!(
            purge_outcome_note(&report, 5_000).as_deref(),
            Some("partial result: stopped after scanning 5000 messages")
        );
    }
}
