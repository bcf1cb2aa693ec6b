//! Host-side collaborators for ticket assembly
//!
//! `SysinfoSource` reads user, machine and boot details. `DryRunFixer`
//! reports which remediation would run without touching the system.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::net::UdpSocket;
use sysinfo::System;
use triage_common::actions::FixAction;
use triage_common::ticket::{FixRunner, SystemInfoSource, INFO_IP_ADDRESS, INFO_USERNAME};

pub const INFO_COMPUTER_NAME: &str = "Computer Name";
pub const INFO_OS: &str = "OS";
pub const INFO_LAST_BOOT: &str = "Last Boot";

/// System info via `sysinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoSource;

impl SysinfoSource {
    fn username() -> Option<String> {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|u| !u.is_empty())
    }

    /// Address of the interface holding the default route. No packet is sent.
    fn local_ip() -> Option<String> {
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("192.0.2.1:80").ok()?;
        socket.local_addr().ok().map(|addr| addr.ip().to_string())
    }

    fn last_boot() -> Option<String> {
        let boot = DateTime::from_timestamp(System::boot_time() as i64, 0)?;
        Some(
            boot.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        )
    }
}

impl SystemInfoSource for SysinfoSource {
    fn system_info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                info.insert(key.to_string(), v);
            }
        };

        put(INFO_USERNAME, Self::username());
        put(INFO_COMPUTER_NAME, System::host_name());
        put(
            INFO_OS,
            System::name().map(|name| match System::os_version() {
                Some(version) => format!("{} {}", name, version),
                None => name,
            }),
        );
        put(INFO_IP_ADDRESS, Self::local_ip());
        put(INFO_LAST_BOOT, Self::last_boot());
        info
    }
}

/// Remediation runner that only describes the step
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunFixer;

impl DryRunFixer {
    /// What the fix would do on a managed workstation
    pub fn describe(action: FixAction) -> &'static str {
        match action {
            FixAction::FlushDns => "flush the DNS resolver cache",
            FixAction::RestartExplorer => "restart the desktop shell",
            FixAction::ClearTempFiles => "clear temporary files",
            FixAction::ClearTeamsCache => "clear the Teams cache",
            FixAction::RestartOutlook => "restart Outlook",
            FixAction::RestartPrintSpooler => "restart the print spooler",
            FixAction::ReinstallHidDrivers => "reinstall input device drivers",
            FixAction::RestartDisplayDriver => "restart the display driver",
            FixAction::RestartAudioService => "restart the audio service",
        }
    }
}

impl FixRunner for DryRunFixer {
    fn run_fix(&self, action: FixAction) -> String {
        format!("[dry-run] would {}", Self::describe(action))
    }
}
