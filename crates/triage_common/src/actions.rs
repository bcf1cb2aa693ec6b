//! Issue catalog and remediation actions.
//!
//! The host presents issues grouped by category. Known issues map to one
//! automated fix; everything else gets the diagnostics-only path.

use serde::{Deserialize, Serialize};

/// Automated remediation, executed by the host's fix runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    FlushDns,
    RestartExplorer,
    ClearTempFiles,
    ClearTeamsCache,
    RestartOutlook,
    RestartPrintSpooler,
    ReinstallHidDrivers,
    RestartDisplayDriver,
    RestartAudioService,
}

impl FixAction {
    pub const ALL: [FixAction; 9] = [
        FixAction::FlushDns,
        FixAction::RestartExplorer,
        FixAction::ClearTempFiles,
        FixAction::ClearTeamsCache,
        FixAction::RestartOutlook,
        FixAction::RestartPrintSpooler,
        FixAction::ReinstallHidDrivers,
        FixAction::RestartDisplayDriver,
        FixAction::RestartAudioService,
    ];

    /// Action key understood by the fix runner
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlushDns => "flush_dns",
            Self::RestartExplorer => "restart_explorer",
            Self::ClearTempFiles => "clear_temp_files",
            Self::ClearTeamsCache => "clear_teams_cache",
            Self::RestartOutlook => "restart_outlook",
            Self::RestartPrintSpooler => "restart_print_spooler",
            Self::ReinstallHidDrivers => "reinstall_hid_drivers",
            Self::RestartDisplayDriver => "restart_display_driver",
            Self::RestartAudioService => "restart_audio_service",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == key)
    }
}

impl std::fmt::Display for FixAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue → action. Issues not listed have no automated fix.
const ISSUE_ACTIONS: [(&str, FixAction); 10] = [
    ("Internet not working", FixAction::FlushDns),
    ("WiFi connected no internet", FixAction::FlushDns),
    ("App Frozen", FixAction::RestartExplorer),
    ("Computer Slow", FixAction::ClearTempFiles),
    ("Teams Cache", FixAction::ClearTeamsCache),
    ("Outlook not opening", FixAction::RestartOutlook),
    ("Printer not working", FixAction::RestartPrintSpooler),
    ("Mouse / Keyboard unresponsive", FixAction::ReinstallHidDrivers),
    ("Monitor no signal", FixAction::RestartDisplayDriver),
    ("Headset no sound", FixAction::RestartAudioService),
];

/// Remediation for an issue; `None` means no automated fix is known
pub fn resolve_action(issue: &str) -> Option<FixAction> {
    ISSUE_ACTIONS
        .iter()
        .find(|(name, _)| *name == issue)
        .map(|(_, action)| *action)
}

/// Category whose issues go to the language-model path instead of a fix
pub const ASK_AI_CATEGORY: &str = "Other / Ask AI";

/// Category → issues, in presentation order
const ISSUE_CATALOG: [(&str, &[&str]); 5] = [
    ("Network", &["Internet not working", "WiFi connected no internet"]),
    ("Performance", &["Computer Slow", "App Frozen"]),
    ("Software", &["Teams Cache", "Outlook not opening"]),
    (
        "Peripheral",
        &[
            "Printer not working",
            "Mouse / Keyboard unresponsive",
            "Monitor no signal",
            "Headset no sound",
        ],
    ),
    (ASK_AI_CATEGORY, &["Describe Issue to AI"]),
];

pub fn categories() -> impl Iterator<Item = &'static str> {
    ISSUE_CATALOG.iter().map(|(category, _)| *category)
}

/// Issues offered for a category; empty for unknown categories
pub fn issues_for(category: &str) -> &'static [&'static str] {
    ISSUE_CATALOG
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, issues)| *issues)
        .unwrap_or(&[])
}

pub fn category_of(issue: &str) -> Option<&'static str> {
    ISSUE_CATALOG
        .iter()
        .find(|(_, issues)| issues.contains(&issue))
        .map(|(category, _)| *category)
}

/// True when the issue should be routed to the language-model path
pub fn routes_to_ai(issue: &str) -> bool {
    category_of(issue) == Some(ASK_AI_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_issue() {
        assert_eq!(
            resolve_action("Internet not working").map(|a| a.as_str()),
            Some("flush_dns")
        );
        assert_eq!(
            resolve_action("Printer not working"),
            Some(FixAction::RestartPrintSpooler)
        );
    }

    #[test]
    fn test_resolve_absent() {
        assert_eq!(resolve_action("Describe Issue to AI"), None);
        assert_eq!(resolve_action("internet not working"), None);
        assert_eq!(resolve_action(""), None);
    }

    #[test]
    fn test_every_catalog_issue_outside_ai_has_fix() {
        for category in categories().filter(|c| *c != ASK_AI_CATEGORY) {
            for issue in issues_for(category) {
                assert!(resolve_action(issue).is_some(), "{}", issue);
            }
        }
    }

    #[test]
    fn test_action_keys_round_trip() {
        for action in FixAction::ALL {
            assert_eq!(FixAction::from_key(action.as_str()), Some(action));
        }
        assert_eq!(FixAction::from_key("format_disk"), None);
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(categories().count(), 5);
        assert_eq!(issues_for("Peripheral").len(), 4);
        assert!(issues_for("Kitchen").is_empty());
        assert_eq!(category_of("App Frozen"), Some("Performance"));
        assert!(routes_to_ai("Describe Issue to AI"));
        assert!(!routes_to_ai("App Frozen"));
    }
}
