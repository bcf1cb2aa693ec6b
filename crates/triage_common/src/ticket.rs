//! Ticket assembly.
//!
//! Combines the classifier's tier, the priority matrix and the action
//! resolver into one escalation ticket. Remediation and system-info
//! collection belong to the host; they come in through the two traits below.
//! Submission never fails because the classifier is unavailable.

use crate::actions::{self, FixAction};
use crate::engine::TriageEngine;
use crate::priority::Priority;
use crate::tier::TierVerdict;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Note shown on tickets submitted without a tier
pub const ANALYSIS_UNAVAILABLE_NOTE: &str = "Automated analysis unavailable";

/// System-info keys read when rendering a ticket
pub const INFO_USERNAME: &str = "Username";
pub const INFO_IP_ADDRESS: &str = "IP Address";

/// Executes remediation actions on the host
pub trait FixRunner {
    /// Run one action, returning a human-readable log
    fn run_fix(&self, action: FixAction) -> String;
}

/// Supplies host context (user, IP, boot time) for ticket assembly
pub trait SystemInfoSource {
    fn system_info(&self) -> BTreeMap<String, String>;
}

/// Result of trying the automated fix for an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AutoFixOutcome {
    Executed { action: FixAction, log: String },
    /// Diagnostics-only path
    NoAutomatedFix,
}

impl AutoFixOutcome {
    /// Line recorded in the ticket log
    pub fn log_line(&self) -> String {
        match self {
            Self::Executed { action, log } => format!("AutoFix: {} -> {}", action, log),
            Self::NoAutomatedFix => "No AutoFix available.".to_string(),
        }
    }
}

/// Resolve the issue and run its fix, if one exists
pub fn attempt_fix(issue: &str, runner: &dyn FixRunner) -> AutoFixOutcome {
    match actions::resolve_action(issue) {
        Some(action) => AutoFixOutcome::Executed {
            action,
            log: runner.run_fix(action),
        },
        None => AutoFixOutcome::NoAutomatedFix,
    }
}

/// What the user entered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub description: String,
    /// 1 (high) to 3 (low)
    pub urgency: u8,
    /// 1 (high) to 3 (low)
    pub impact: u8,
    /// Issue picked from the catalog, if any
    #[serde(default)]
    pub issue: Option<String>,
    /// Auto-fix and assistant lines collected before escalation
    #[serde(default)]
    pub log: Vec<String>,
}

impl TicketDraft {
    pub fn new(description: impl Into<String>, urgency: u8, impact: u8) -> Self {
        Self {
            description: description.into().trim().to_string(),
            urgency,
            impact,
            issue: None,
            log: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = Some(issue.into());
        self
    }

    pub fn record(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// Classify, prioritise and resolve; always produces a ticket
    pub fn assemble(self, engine: &TriageEngine, info: &dyn SystemInfoSource) -> TriageTicket {
        let tier = engine.classify(&self.description);
        let priority = engine.priority(self.urgency, self.impact);
        let action = self
            .issue
            .as_deref()
            .and_then(|issue| engine.resolve_action(issue));
        let note = (!tier.is_available()).then(|| ANALYSIS_UNAVAILABLE_NOTE.to_string());

        TriageTicket {
            draft: self,
            tier,
            priority,
            action,
            system_info: info.system_info(),
            note,
        }
    }
}

/// Assembled escalation ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageTicket {
    pub draft: TicketDraft,
    pub tier: TierVerdict,
    pub priority: Priority,
    pub action: Option<FixAction>,
    pub system_info: BTreeMap<String, String>,
    /// Visible note when automated analysis was unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TriageTicket {
    fn info(&self, key: &str) -> &str {
        self.system_info
            .get(key)
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Plain-text ticket block
    pub fn render(&self) -> String {
        let rule = "---------------------------\n";
        let mut out = String::new();
        out.push_str("\n*** SUPPORT TICKET ***\n");
        out.push_str(rule);
        out.push_str(&format!(
            "User : {}  |  IP: {}\n",
            self.info(INFO_USERNAME),
            self.info(INFO_IP_ADDRESS)
        ));
        out.push_str(&format!("Desc : {}\n", self.draft.description));
        if let Some(issue) = &self.draft.issue {
            out.push_str(&format!("Issue: {}\n", issue));
        }
        out.push_str(&format!("Logs : {:?}\n", self.draft.log));
        out.push_str(rule);
        out.push_str("[AI ANALYSIS]\n");
        out.push_str(&format!("Predicted Level : {}\n", self.tier));
        out.push_str(&format!("Priority        : {}\n", self.priority));
        if let Some(action) = self.action {
            out.push_str(&format!("Suggested Fix   : {}\n", action));
        }
        if let Some(note) = &self.note {
            out.push_str(&format!("Note            : {}\n", note));
        }
        out.push_str(rule);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactSettings;
    use tempfile::TempDir;

    struct EchoRunner;

    impl FixRunner for EchoRunner {
        fn run_fix(&self, action: FixAction) -> String {
            format!("ran {}", action)
        }
    }

    struct FixedInfo;

    impl SystemInfoSource for FixedInfo {
        fn system_info(&self) -> BTreeMap<String, String> {
            BTreeMap::from([
                (INFO_USERNAME.to_string(), "jdoe".to_string()),
                (INFO_IP_ADDRESS.to_string(), "10.0.0.7".to_string()),
            ])
        }
    }

    #[test]
    fn test_attempt_fix_known_issue() {
        let outcome = attempt_fix("Internet not working", &EchoRunner);
        assert_eq!(
            outcome,
            AutoFixOutcome::Executed {
                action: FixAction::FlushDns,
                log: "ran flush_dns".to_string()
            }
        );
        assert_eq!(outcome.log_line(), "AutoFix: flush_dns -> ran flush_dns");
    }

    #[test]
    fn test_attempt_fix_unknown_issue() {
        let outcome = attempt_fix("Describe Issue to AI", &EchoRunner);
        assert_eq!(outcome, AutoFixOutcome::NoAutomatedFix);
        assert_eq!(outcome.log_line(), "No AutoFix available.");
    }

    #[test]
    fn test_assemble_without_model_still_submits() {
        let dir = TempDir::new().unwrap();
        let engine = TriageEngine::new(ArtifactSettings::in_dir(dir.path()));

        let mut draft = TicketDraft::new("  Printer keeps jamming  ", 1, 2).with_issue("Printer not working");
        draft.record(attempt_fix("Printer not working", &EchoRunner).log_line());
        let ticket = draft.assemble(&engine, &FixedInfo);

        assert_eq!(ticket.tier, TierVerdict::Unavailable);
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.action, Some(FixAction::RestartPrintSpooler));
        assert_eq!(ticket.note.as_deref(), Some(ANALYSIS_UNAVAILABLE_NOTE));
        assert_eq!(ticket.draft.description, "Printer keeps jamming");

        let text = ticket.render();
        assert!(text.contains("User : jdoe  |  IP: 10.0.0.7"));
        assert!(text.contains("Predicted Level : unavailable"));
        assert!(text.contains("Priority        : High"));
        assert!(text.contains("AutoFix: restart_print_spooler"));
        assert!(text.contains(ANALYSIS_UNAVAILABLE_NOTE));
    }

    #[test]
    fn test_render_missing_info_fields() {
        struct NoInfo;
        impl SystemInfoSource for NoInfo {
            fn system_info(&self) -> BTreeMap<String, String> {
                BTreeMap::new()
            }
        }
        let dir = TempDir::new().unwrap();
        let engine = TriageEngine::new(ArtifactSettings::in_dir(dir.path()));
        let ticket = TicketDraft::new("vpn drops", 2, 2).assemble(&engine, &NoInfo);
        assert!(ticket.render().contains("User : unknown"));
        assert_eq!(ticket.action, None);
    }
}
