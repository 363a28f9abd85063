//! Plain-text views of the wizard for the terminal shell.

use std::fmt::Write as _;

use crate::gateway::TimeBlockStatus;
use crate::wizard::{BookingWizard, Notice, NoticeLevel, WizardStep};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Note shown with the time blocks and before submitting.
const BLOCK_NOTE: &str =
    "All time blocks are 90 minutes long. Please arrive 10 minutes early.";

/// "● ● ○ ○" style progress line.
pub fn progress_line(wizard: &BookingWizard) -> String {
    if wizard.step().is_terminal() {
        return String::new();
    }
    let progress = wizard.progress();
    let dots: Vec<&str> = (1..=progress.total)
        .map(|n| if n <= progress.current { "●" } else { "○" })
        .collect();
    format!(
        "{}  step {} of {}",
        dots.join(" "),
        progress.current,
        progress.total
    )
}

/// Render the current step.
pub fn render(wizard: &BookingWizard) -> String {
    let mut out = String::new();
    let progress = progress_line(wizard);
    if !progress.is_empty() {
        let _ = writeln!(out, "{progress}\n");
    }

    match wizard.step() {
        WizardStep::ProgramSelection => render_programs(wizard, &mut out),
        WizardStep::DateSelection => render_calendar(wizard, &mut out),
        WizardStep::TimeBlockSelection => render_time_blocks(wizard, &mut out),
        WizardStep::DetailsAndContact => render_details(wizard, &mut out),
        WizardStep::Submitted => render_confirmation(wizard, &mut out),
    }
    out
}

fn render_programs(wizard: &BookingWizard, out: &mut String) {
    let _ = writeln!(out, "Choose a program");
    if wizard.is_loading() {
        let _ = writeln!(out, "  ⏳ Loading programs...");
        return;
    }
    let language = wizard.session().language;
    let selected = &wizard.draft().program_id;
    for (i, program) in wizard.programs().iter().enumerate() {
        let marker = if &program.id == selected { "*" } else { " " };
        let (min, max) = program.capacity();
        let group = program
            .group_type()
            .map(|g| g.label())
            .unwrap_or(program.age_group.as_str());
        let _ = writeln!(
            out,
            "{marker}[{}] {} ({} min, {group}, {min}-{max} persons)",
            i + 1,
            program.name(language),
            program.duration
        );
        let description = program.description(language);
        if !description.is_empty() {
            let _ = writeln!(out, "      {description}");
        }
    }
}

fn render_calendar(wizard: &BookingWizard, out: &mut String) {
    let (year, month) = wizard.view_month();
    let name = MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    let _ = writeln!(out, "<  {name} {year}  >");
    if wizard.is_loading() {
        let _ = writeln!(out, "  ⏳ Loading availability...");
        return;
    }
    let Some(calendar) = wizard.calendar() else {
        let _ = writeln!(out, "  Calendar unavailable. Use < or > to retry.");
        return;
    };
    let selectable = wizard.selectable_days();
    if selectable.is_empty() {
        let _ = writeln!(out, "  No free days this month.");
    }
    for day in &calendar.dates {
        let free = selectable.iter().any(|d| d.date == day.date);
        if free {
            let dots = "•".repeat(day.available_blocks.min(3) as usize);
            let chosen = if wizard.draft().date == Some(day.date) { "*" } else { " " };
            let _ = writeln!(
                out,
                "{chosen} {}  {dots} {} free",
                day.date.format("%a %d"),
                day.available_blocks
            );
        }
    }
}

fn render_time_blocks(wizard: &BookingWizard, out: &mut String) {
    if let Some(date) = wizard.draft().date {
        let _ = writeln!(out, "Choose a time block for {}", date.format("%A %-d %B %Y"));
    }
    if wizard.is_loading() {
        let _ = writeln!(out, "  ⏳ Loading time blocks...");
        return;
    }
    for (i, block) in wizard.time_blocks().iter().enumerate() {
        let marker = if wizard.draft().time_block == block.time { "*" } else { " " };
        let status = match block.status {
            TimeBlockStatus::Available => "free",
            TimeBlockStatus::Booked => "booked",
            TimeBlockStatus::Unavailable => "unavailable",
        };
        let _ = writeln!(out, "{marker}[{}] {}  {status}", i + 1, block.time);
    }
    let _ = writeln!(out, "\n{BLOCK_NOTE}");
}

fn render_details(wizard: &BookingWizard, out: &mut String) {
    let draft = wizard.draft();
    let (min, max) = wizard
        .selected_program()
        .map(|p| p.capacity())
        .unwrap_or((
            crate::gateway::schema::DEFAULT_MIN_CAPACITY,
            crate::gateway::schema::DEFAULT_MAX_CAPACITY,
        ));
    let blank = |s: &str| if s.trim().is_empty() { "-".to_string() } else { s.to_string() };

    let _ = writeln!(out, "Booking details");
    if let (Some(program), Some(date)) = (wizard.selected_program(), draft.date) {
        let _ = writeln!(
            out,
            "  {} on {date} at {}",
            program.name(wizard.session().language),
            draft.time_block
        );
    }
    let _ = writeln!(out, "\nGroup");
    let _ = writeln!(out, "  school:  {}", blank(&draft.school_name));
    let _ = writeln!(out, "  group:   {}", draft.group_type.label());
    let _ = writeln!(out, "  age:     {}", blank(&draft.age_or_class));
    let _ = writeln!(out, "  count:   {} (min {min}, max {max})", draft.num_students);
    let _ = writeln!(out, "  notes:   {}", blank(&draft.special_requirements));
    let _ = writeln!(out, "\nContact");
    let _ = writeln!(out, "  name:    {}", blank(&draft.contact_name));
    let _ = writeln!(out, "  email:   {}", blank(&draft.contact_email));
    let _ = writeln!(out, "  phone:   {}", blank(&draft.contact_phone));
    let _ = writeln!(
        out,
        "  consent: {}",
        if draft.gdpr_consent { "yes" } else { "no" }
    );
    if wizard.is_loading() {
        let _ = writeln!(out, "\n⏳ Sending booking...");
    } else {
        let _ = writeln!(out, "\n{BLOCK_NOTE}\nType 'submit' to send.");
    }
}

fn render_confirmation(wizard: &BookingWizard, out: &mut String) {
    let _ = writeln!(out, "✅ Booking sent");
    if let Some(receipt) = wizard.receipt() {
        let _ = writeln!(out, "   Reference: {}", receipt.id);
    }
    let _ = writeln!(
        out,
        "   We have received your booking and will contact you with a confirmation."
    );
    if let Some(footer) = &wizard.session().theme.footer_text {
        let _ = writeln!(out, "\n{footer}");
    }
    let _ = writeln!(out, "\nType 'restart' to make another booking.");
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("ℹ️  {}", notice.message),
        NoticeLevel::Success => format!("✅ {}", notice.message),
        NoticeLevel::Error => format!("❌ {}", notice.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Language, Session};

    #[test]
    fn fresh_wizard_shows_first_step() {
        let wizard = BookingWizard::new(Session::new("demo", Language::Cs));
        let text = render(&wizard);
        assert!(text.contains("step 1 of 4"));
        assert!(text.contains("Choose a program"));
    }

    #[test]
    fn loading_programs_shows_spinner() {
        let mut wizard = BookingWizard::new(Session::new("demo", Language::Cs));
        let _cmd = wizard.mount();
        assert!(render(&wizard).contains("Loading programs"));
    }

    #[test]
    fn notice_prefixes() {
        assert!(render_notice(&Notice::error("boom")).starts_with("❌"));
        assert!(render_notice(&Notice::success("ok")).starts_with("✅"));
        assert!(render_notice(&Notice::info("hi")).contains("hi"));
    }
}
