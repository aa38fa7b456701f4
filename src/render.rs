//! Terminal rendering for sync outcomes and review records.

use owo_colors::OwoColorize;

use lodgesync_core::alert::{AlertSeverity, SyncAlert};
use lodgesync_core::staging::StagedReservation;
use lodgesync_core::sync::{SyncLogEntry, SyncLogStatus, SyncOutcome};

/// Extension trait for terminal rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for SyncOutcome {
    fn render(&self) -> String {
        if let Some(error) = &self.error {
            return error.red().to_string();
        }

        if !self.has_changes {
            return format!("up to date ({} events)", self.events_found)
                .dimmed()
                .to_string();
        }

        let (added, removed, modified) = self
            .delta
            .as_ref()
            .map(|d| d.counts())
            .unwrap_or((0, 0, 0));

        let mut parts = Vec::new();
        if added > 0 {
            parts.push(format!("+{} added", added).green().to_string());
        }
        if modified > 0 {
            parts.push(format!("~{} modified", modified).yellow().to_string());
        }
        if removed > 0 {
            parts.push(format!("-{} removed", removed).red().to_string());
        }
        if parts.is_empty() {
            // First sync against an empty feed still reconciles
            parts.push("reconciled (no events)".dimmed().to_string());
        }
        parts.join(", ")
    }
}

impl Render for StagedReservation {
    fn render(&self) -> String {
        let guest = self
            .guest_name_guess
            .as_deref()
            .unwrap_or("(unknown guest)");
        format!(
            "#{} {} {} [{} – {}] {}",
            self.id,
            self.source_platform,
            guest.bold(),
            self.stay_start,
            self.stay_end,
            self.raw_label.dimmed(),
        )
    }
}

impl Render for SyncAlert {
    fn render(&self) -> String {
        let tag = match self.severity {
            AlertSeverity::Info => self.severity.as_str().green().to_string(),
            AlertSeverity::Warning => self.severity.as_str().yellow().to_string(),
            AlertSeverity::Critical => self.severity.as_str().red().to_string(),
        };
        let read_marker = if self.is_read { " " } else { "*" };
        format!(
            "{}[{}] {} {}",
            read_marker,
            tag,
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.message
        )
    }
}

impl Render for SyncLogEntry {
    fn render(&self) -> String {
        let status = match self.status {
            SyncLogStatus::Success => self.status.as_str().green().to_string(),
            SyncLogStatus::NoChanges => self.status.as_str().dimmed().to_string(),
            SyncLogStatus::Error => self.status.as_str().red().to_string(),
        };
        format!(
            "{} apt {} [{}] {}",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.apartment_id,
            status,
            self.message
        )
    }
}
