//! Implements InputPort. Inquire-based interactive menu over the roster use cases.

use crate::adapters::import::read_complaints_csv;
use crate::adapters::ui::progress;
use crate::domain::{BusinessRecord, ComplaintRecord, ComplaintStatus, DomainError};
use crate::ports::InputPort;
use crate::usecases::{IntakeService, RefreshScheduler, RosterService};
use async_trait::async_trait;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, CustomType, InquireError, Select, Text};
use std::fmt;
use std::sync::Arc;

/// Sets the global inquire render config (prompt prefix and highlight colors).
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("?").with_fg(Color::LightRed))
        .with_highlighted_option_prefix(Styled::new(">").with_fg(Color::LightYellow));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Analyze,
    Top,
    ForceUpdate,
    BusinessDetail,
    ByDistrict,
    AboveScore,
    ComplaintsForBusiness,
    ImportCsv,
    ChangeStatus,
    SetInspectionFlag,
    MergeBusinesses,
    RunScheduler,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 13] = [
        MenuAction::Analyze,
        MenuAction::Top,
        MenuAction::ForceUpdate,
        MenuAction::BusinessDetail,
        MenuAction::ByDistrict,
        MenuAction::AboveScore,
        MenuAction::ComplaintsForBusiness,
        MenuAction::ImportCsv,
        MenuAction::ChangeStatus,
        MenuAction::SetInspectionFlag,
        MenuAction::MergeBusinesses,
        MenuAction::RunScheduler,
        MenuAction::Exit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::Analyze => "Show inspection roster",
            MenuAction::Top => "Top businesses",
            MenuAction::ForceUpdate => "Force roster update",
            MenuAction::BusinessDetail => "Business details",
            MenuAction::ByDistrict => "Businesses in a district",
            MenuAction::AboveScore => "Businesses above a score",
            MenuAction::ComplaintsForBusiness => "Complaints for a business",
            MenuAction::ImportCsv => "Import complaints from CSV",
            MenuAction::ChangeStatus => "Change complaint status",
            MenuAction::SetInspectionFlag => "Set inspection flag",
            MenuAction::MergeBusinesses => "Merge businesses",
            MenuAction::RunScheduler => "Run refresh scheduler",
            MenuAction::Exit => "Exit",
        };
        f.write_str(label)
    }
}

const STATUSES: [ComplaintStatus; 5] = [
    ComplaintStatus::Pending,
    ComplaintStatus::InReview,
    ComplaintStatus::Positive,
    ComplaintStatus::Negative,
    ComplaintStatus::Rejected,
];

fn ui_err(e: InquireError) -> DomainError {
    DomainError::Ui(e.to_string())
}

fn roster_line(b: &BusinessRecord) -> String {
    let mark = if b.is_ready_for_inspection { "!" } else { " " };
    format!(
        "{} {:>4.1}  {:<32} {:<28} {:>3} complaints  [{}]",
        mark,
        b.score,
        b.business_name,
        b.business_address,
        b.total_complaints(),
        b.business_id
    )
}

fn complaint_line(c: &ComplaintRecord) -> String {
    format!(
        "{}  {:<9}  {}  {}",
        c.created_at.format("%Y-%m-%d %H:%M"),
        c.status.as_str(),
        c.id,
        c.description.lines().next().unwrap_or_default()
    )
}

fn print_business(b: &BusinessRecord) {
    println!("\n{}  [{}]", b.business_name, b.business_id);
    println!("  address:   {}", b.business_address);
    println!(
        "  score:     {:.1}{}",
        b.score,
        if b.is_ready_for_inspection { "  (ready for inspection)" } else { "" }
    );
    println!(
        "  pending {} / in review {} / positive {} / negative {}",
        b.counts.pending, b.counts.in_review, b.counts.positive, b.counts.negative
    );
    if let Some(original) = &b.original_name {
        println!("  merged from {} names, originally {}", b.merged_count, original);
    }
    for note in &b.notes {
        println!("  note: {}", note);
    }
    println!("  updated:   {}", b.last_updated.format("%Y-%m-%d %H:%M"));
}

/// Splits a comma-separated id list, dropping blanks.
fn parse_id_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_roster(title: &str, roster: &[BusinessRecord]) {
    println!("\n{} ({} businesses)", title, roster.len());
    if roster.is_empty() {
        println!("  (none)");
        return;
    }
    for b in roster {
        println!("{}", roster_line(b));
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    roster: Arc<RosterService>,
    intake: Arc<IntakeService>,
    scheduler: Arc<RefreshScheduler>,
    import_path: String,
}

impl TuiInputPort {
    pub fn new(
        roster: Arc<RosterService>,
        intake: Arc<IntakeService>,
        scheduler: Arc<RefreshScheduler>,
        import_path: String,
    ) -> Self {
        Self {
            roster,
            intake,
            scheduler,
            import_path,
        }
    }

    async fn dispatch(&self, action: MenuAction) -> Result<(), DomainError> {
        match action {
            MenuAction::Analyze => {
                let roster = self.roster.analyze().await?;
                print_roster("Inspection roster", &roster);
            }
            MenuAction::Top => {
                let limit = CustomType::<usize>::new("How many:")
                    .with_default(10)
                    .with_error_message("Enter a whole number")
                    .prompt()
                    .map_err(ui_err)?;
                let roster = self.roster.top(limit).await?;
                print_roster(&format!("Top {}", limit), &roster);
            }
            MenuAction::BusinessDetail => {
                let id = Text::new("Business id:").prompt().map_err(ui_err)?;
                let business = self.roster.business(id.trim()).await?;
                print_business(&business);
            }
            MenuAction::ForceUpdate => {
                let pb = progress::spinner("Recomputing scores...");
                let result = self.roster.force_update().await;
                match &result {
                    Ok(summary) => pb.finish_with_message(summary.message.clone()),
                    Err(e) => pb.abandon_with_message(format!("Update failed: {}", e)),
                }
                result?;
            }
            MenuAction::ByDistrict => {
                let district = Text::new("District:").prompt().map_err(ui_err)?;
                let roster = self.roster.businesses_in_district(district.trim()).await?;
                print_roster(&format!("District '{}'", district.trim()), &roster);
            }
            MenuAction::AboveScore => {
                let min = CustomType::<f64>::new("Minimum score:")
                    .with_default(3.0)
                    .with_error_message("Enter a number")
                    .prompt()
                    .map_err(ui_err)?;
                let roster = self.roster.businesses_above(min).await?;
                print_roster(&format!("Score >= {:.1}", min), &roster);
            }
            MenuAction::ComplaintsForBusiness => {
                let id = Text::new("Business id:").prompt().map_err(ui_err)?;
                let complaints = self.roster.complaints_for_business(id.trim()).await?;
                println!("\n{} complaints", complaints.len());
                for c in &complaints {
                    println!("{}", complaint_line(c));
                }
            }
            MenuAction::ImportCsv => {
                let path = Text::new("CSV path:")
                    .with_default(&self.import_path)
                    .prompt()
                    .map_err(ui_err)?;
                let drafts = read_complaints_csv(path.trim())?;
                let stored = self.intake.submit_all(drafts).await?;
                println!("Imported {} complaints.", stored);
            }
            MenuAction::ChangeStatus => {
                let id = Text::new("Complaint id:").prompt().map_err(ui_err)?;
                let status = Select::new("New status:", STATUSES.to_vec())
                    .prompt()
                    .map_err(ui_err)?;
                let message = Text::new("Admin message (optional):")
                    .prompt()
                    .map_err(ui_err)?;
                let message = Some(message.trim()).filter(|m| !m.is_empty());
                self.intake.set_status(id.trim(), status, message).await?;
                println!("Status set to {}.", status);
            }
            MenuAction::SetInspectionFlag => {
                let id = Text::new("Business id:").prompt().map_err(ui_err)?;
                let ready = Confirm::new("Ready for inspection?")
                    .with_default(true)
                    .prompt()
                    .map_err(ui_err)?;
                let business = self.roster.set_inspection_flag(id.trim(), ready).await?;
                print_business(&business);
            }
            MenuAction::MergeBusinesses => {
                let target = Text::new("Target business id:").prompt().map_err(ui_err)?;
                let sources = Text::new("Business ids to absorb (comma-separated):")
                    .prompt()
                    .map_err(ui_err)?;
                let sources = parse_id_list(&sources);
                let confirmed = Confirm::new(&format!(
                    "Merge {} businesses into {} and delete them?",
                    sources.len(),
                    target.trim()
                ))
                .with_default(false)
                .prompt()
                .map_err(ui_err)?;
                if confirmed {
                    let business = self.roster.merge_businesses(target.trim(), &sources).await?;
                    print_business(&business);
                }
            }
            MenuAction::RunScheduler => {
                println!("Scheduler running. Press Ctrl+C to stop.");
                self.scheduler.run_loop().await?;
            }
            MenuAction::Exit => {}
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let action = match Select::new("What next?", MenuAction::ALL.to_vec()).prompt() {
                Ok(a) => a,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(ui_err(e)),
            };
            if action == MenuAction::Exit {
                return Ok(());
            }
            // A failed action is reported; the menu stays up.
            if let Err(e) = self.dispatch(action).await {
                eprintln!("Error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    #[test]
    fn test_roster_line_marks_ready_businesses() {
        let b = BusinessRecord {
            business_id: "baba kebap_konak".to_string(),
            business_name: "Baba Kebap".to_string(),
            district: Some("Konak".to_string()),
            neighborhood: None,
            location: None,
            business_address: "Konak".to_string(),
            counts: Default::default(),
            complaint_ids: BTreeSet::new(),
            score: 3.5,
            is_ready_for_inspection: true,
            merged: false,
            merged_count: 0,
            original_name: None,
            notes: Vec::new(),
            last_updated: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let line = roster_line(&b);
        assert!(line.starts_with("!  3.5"));
        assert!(line.ends_with("[baba kebap_konak]"));
    }

    #[test]
    fn test_id_list_drops_blanks() {
        assert_eq!(
            parse_id_list(" a_konak, ,b_konak,"),
            vec!["a_konak".to_string(), "b_konak".to_string()]
        );
        assert!(parse_id_list("  ").is_empty());
    }

    #[test]
    fn test_menu_ends_with_exit() {
        assert_eq!(MenuAction::ALL.last(), Some(&MenuAction::Exit));
        assert_eq!(MenuAction::ForceUpdate.to_string(), "Force roster update");
    }
}
