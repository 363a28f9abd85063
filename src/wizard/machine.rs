//! `BookingWizard` owns the draft, the current step and the fetched
//! read-only data. It turns user operations into transitions and gateway
//! commands.
//!
//! Operations are synchronous. A transition that needs data returns a
//! [`Command`]; the caller runs it (see `driver`) and feeds the
//! [`Outcome`] back through [`BookingWizard::apply`]. Responses that are
//! no longer current are dropped there.

use chrono::{Datelike, Months, NaiveDate};

use super::command::{Action, Command, Outcome};
use super::draft::{BookingDraft, check_participants};
use super::guard::{FetchGuard, Resource, Ticket};
use super::notice::Notice;
use super::step::WizardStep;
use crate::error::{Field, GatewayError, ValidationError, WizardError};
use crate::gateway::{
    BookingReceipt, CalendarDay, CalendarMonth, GroupType, Program, TimeBlock,
    TimeBlockAvailability,
};
use crate::session::Session;

/// Shown when a submission fails without a server detail.
pub const GENERIC_SUBMIT_ERROR: &str = "The booking could not be sent. Please try again.";

/// Progress indicator position ("step 2 of 4").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: u8,
    pub total: u8,
}

/// The booking wizard state machine.
pub struct BookingWizard {
    session: Session,
    step: WizardStep,
    draft: BookingDraft,
    programs: Vec<Program>,
    /// Month shown in the calendar step.
    view_month: (i32, u32),
    calendar: Option<CalendarMonth>,
    time_blocks: Option<TimeBlockAvailability>,
    /// Advance to TimeBlockSelection once the pending time-block fetch lands.
    advance_on_blocks: bool,
    receipt: Option<BookingReceipt>,
    guard: FetchGuard,
    notices: Vec<Notice>,
    today: Option<NaiveDate>,
}

impl BookingWizard {
    pub fn new(session: Session) -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            session,
            step: WizardStep::default(),
            draft: BookingDraft::default(),
            programs: Vec::new(),
            view_month: (today.year(), today.month()),
            calendar: None,
            time_blocks: None,
            advance_on_blocks: false,
            receipt: None,
            guard: FetchGuard::new(),
            notices: Vec::new(),
            today: None,
        }
    }

    /// Pin "today" (dates on or before it are not bookable) and show its month.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self.view_month = (today.year(), today.month());
        self
    }

    /// Mount the wizard: fetch the program list.
    pub fn mount(&mut self) -> Command {
        self.programs.clear();
        tracing::info!(institution_id = %self.session.institution_id, "Booking wizard mounted");
        self.command(Resource::Programs, Action::LoadPrograms)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Programs to choose from; empty while loading.
    pub fn programs(&self) -> &[Program] {
        if self.guard.in_flight(Resource::Programs) {
            &[]
        } else {
            &self.programs
        }
    }

    pub fn selected_program(&self) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == self.draft.program_id)
    }

    pub fn view_month(&self) -> (i32, u32) {
        self.view_month
    }

    /// Calendar of the viewed month; `None` while loading or after a failed fetch.
    pub fn calendar(&self) -> Option<&CalendarMonth> {
        if self.guard.in_flight(Resource::Calendar) {
            None
        } else {
            self.calendar.as_ref()
        }
    }

    /// Days the user may pick: free and strictly after today.
    pub fn selectable_days(&self) -> Vec<&CalendarDay> {
        let today = self.today();
        self.calendar()
            .map(|cal| {
                cal.dates
                    .iter()
                    .filter(|d| d.has_availability && d.date > today)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Time blocks of the selected date; empty while loading.
    pub fn time_blocks(&self) -> &[TimeBlock] {
        if self.guard.in_flight(Resource::TimeBlocks) {
            return &[];
        }
        self.time_blocks
            .as_ref()
            .map(|a| a.time_blocks.as_slice())
            .unwrap_or_default()
    }

    pub fn receipt(&self) -> Option<&BookingReceipt> {
        self.receipt.as_ref()
    }

    /// Whether the current step waits on a gateway call.
    pub fn is_loading(&self) -> bool {
        match self.step {
            WizardStep::ProgramSelection => self.guard.in_flight(Resource::Programs),
            WizardStep::DateSelection => {
                self.guard.in_flight(Resource::Calendar)
                    || self.guard.in_flight(Resource::TimeBlocks)
            }
            WizardStep::TimeBlockSelection => self.guard.in_flight(Resource::TimeBlocks),
            WizardStep::DetailsAndContact => self.guard.in_flight(Resource::Submission),
            WizardStep::Submitted => false,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.step.ordinal().unwrap_or(WizardStep::INPUT_STEPS),
            total: WizardStep::INPUT_STEPS,
        }
    }

    /// Drain pending notifications.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Choose a program in step 1. Does not advance.
    pub fn select_program(&mut self, program_id: &str) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::ProgramSelection)?;
        self.ensure_idle(Resource::Programs)?;
        let program_id = program_id.trim();
        if program_id.is_empty() {
            return self.reject(ValidationError::Missing(Field::Program));
        }
        if !self.programs.iter().any(|p| p.id == program_id) {
            return self.reject(ValidationError::UnknownProgram(program_id.to_string()));
        }
        if self.draft.program_id != program_id {
            // Blocks were validated for the previous program.
            self.draft.time_block.clear();
            self.time_blocks = None;
            self.draft.program_id = program_id.to_string();
        }
        tracing::debug!(program_id, "Program selected");
        Ok(())
    }

    /// Advance to the next step if the current one is complete.
    ///
    /// Returns a command when the transition needs fresh data. From
    /// DateSelection the wizard advances only once that command's outcome
    /// is applied.
    pub fn next(&mut self) -> Result<Option<Command>, WizardError> {
        match self.step {
            WizardStep::ProgramSelection => {
                self.ensure_idle(Resource::Programs)?;
                if !self.draft.has_program() {
                    return self.reject(ValidationError::Missing(Field::Program));
                }
                if self.selected_program().is_none() {
                    let id = self.draft.program_id.clone();
                    return self.reject(ValidationError::UnknownProgram(id));
                }
                self.transition(WizardStep::DateSelection);
                Ok(Some(self.load_calendar()))
            }
            WizardStep::DateSelection => match self.draft.date {
                Some(date) => self.select_date(date).map(Some),
                None => self.reject(ValidationError::Missing(Field::Date)),
            },
            WizardStep::TimeBlockSelection => {
                self.ensure_idle(Resource::TimeBlocks)?;
                if !self.draft.has_time_block() {
                    return self.reject(ValidationError::Missing(Field::TimeBlock));
                }
                let time = self.draft.time_block.clone();
                self.check_block(&time)?;
                self.transition(WizardStep::DetailsAndContact);
                Ok(None)
            }
            WizardStep::DetailsAndContact | WizardStep::Submitted => {
                Err(WizardError::NoTransition {
                    step: self.step,
                    direction: "forward",
                })
            }
        }
    }

    /// Go back one step, keeping everything entered so far.
    ///
    /// Returns a command when the step re-entered shows gateway data.
    pub fn back(&mut self) -> Result<Option<Command>, WizardError> {
        let Some(previous) = self.step.previous() else {
            return Err(WizardError::NoTransition {
                step: self.step,
                direction: "back",
            });
        };
        match previous {
            WizardStep::ProgramSelection => {
                self.guard.cancel(Resource::Calendar);
                self.guard.cancel(Resource::TimeBlocks);
                self.advance_on_blocks = false;
                self.transition(previous);
                Ok(None)
            }
            WizardStep::DateSelection => {
                self.transition(previous);
                Ok(Some(self.load_calendar()))
            }
            WizardStep::TimeBlockSelection => {
                // An acknowledged booking must reach Submitted.
                self.ensure_idle(Resource::Submission)?;
                self.transition(previous);
                Ok(self.refresh_time_blocks(false))
            }
            WizardStep::DetailsAndContact | WizardStep::Submitted => Ok(None),
        }
    }

    /// Show a month in the calendar step and fetch it.
    pub fn show_month(&mut self, year: i32, month: u32) -> Result<Command, WizardError> {
        self.ensure_step(WizardStep::DateSelection)?;
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(WizardError::InvalidMonth { year, month });
        }
        self.view_month = (year, month);
        // A date pick still loading belongs to the month being left.
        self.guard.cancel(Resource::TimeBlocks);
        self.advance_on_blocks = false;
        Ok(self.load_calendar())
    }

    pub fn previous_month(&mut self) -> Result<Command, WizardError> {
        let (year, month) = self.shift_month(false);
        self.show_month(year, month)
    }

    pub fn next_month(&mut self) -> Result<Command, WizardError> {
        let (year, month) = self.shift_month(true);
        self.show_month(year, month)
    }

    fn shift_month(&self, forward: bool) -> (i32, u32) {
        let (year, month) = self.view_month;
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.today());
        let shifted = if forward {
            first.checked_add_months(Months::new(1))
        } else {
            first.checked_sub_months(Months::new(1))
        }
        .unwrap_or(first);
        (shifted.year(), shifted.month())
    }

    /// Pick a day in the calendar. Fetches its time blocks; the wizard
    /// moves to TimeBlockSelection when they arrive.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<Command, WizardError> {
        self.ensure_step(WizardStep::DateSelection)?;
        self.ensure_idle(Resource::Calendar)?;
        let today = self.today();
        let day = self
            .calendar
            .as_ref()
            .and_then(|cal| cal.day(date))
            .cloned();
        let Some(day) = day else {
            return self.reject(ValidationError::DateNotInCalendar(date));
        };
        if !day.has_availability {
            return self.reject(ValidationError::DateUnavailable(date));
        }
        if date <= today {
            return self.reject(ValidationError::DateInPast(date));
        }

        if self.draft.date != Some(date) {
            self.draft.time_block.clear();
        }
        self.draft.date = Some(date);
        tracing::debug!(%date, "Date selected");
        match self.refresh_time_blocks(true) {
            Some(command) => Ok(command),
            None => self.reject(ValidationError::Missing(Field::Program)),
        }
    }

    /// Pick one of the fetched time blocks. Does not advance.
    pub fn select_time_block(&mut self, time: &str) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::TimeBlockSelection)?;
        self.ensure_idle(Resource::TimeBlocks)?;
        let time = time.trim();
        self.check_block(time)?;
        self.draft.time_block = time.to_string();
        tracing::debug!(time, "Time block selected");
        Ok(())
    }

    fn check_block(&mut self, time: &str) -> Result<(), WizardError> {
        let available = self
            .time_blocks
            .as_ref()
            .and_then(|a| a.find(time))
            .is_some_and(TimeBlock::is_available);
        if available {
            Ok(())
        } else {
            self.reject(ValidationError::TimeBlockUnavailable(time.to_string()))
        }
    }

    // ── Details step ────────────────────────────────────────────────

    pub fn set_school_name(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.school_name = value.into();
        Ok(())
    }

    pub fn set_group_type(&mut self, group_type: GroupType) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.group_type = group_type;
        Ok(())
    }

    pub fn set_age_or_class(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.age_or_class = value.into();
        Ok(())
    }

    /// Set the participant count; out-of-bounds values are rejected and
    /// the previous value kept.
    pub fn set_participants(&mut self, count: u32) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        if let Err(e) = check_participants(count, self.selected_program()) {
            return self.reject(e);
        }
        self.draft.num_students = count;
        Ok(())
    }

    pub fn set_special_requirements(
        &mut self,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.special_requirements = value.into();
        Ok(())
    }

    pub fn set_contact_name(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.contact_name = value.into();
        Ok(())
    }

    pub fn set_contact_email(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.contact_email = value.into();
        Ok(())
    }

    pub fn set_contact_phone(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.contact_phone = value.into();
        Ok(())
    }

    pub fn set_consent(&mut self, consent: bool) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.draft.gdpr_consent = consent;
        Ok(())
    }

    /// Validate the whole draft and produce the submission command.
    pub fn submit(&mut self) -> Result<Command, WizardError> {
        self.ensure_step(WizardStep::DetailsAndContact)?;
        self.ensure_idle(Resource::Submission)?;
        let request = match self.draft.to_request(self.selected_program()) {
            Ok(request) => request,
            Err(e) => return self.reject(e),
        };
        tracing::info!(
            program_id = %request.program_id,
            date = %request.date,
            time_block = %request.time_block,
            "Submitting booking"
        );
        Ok(self.command(Resource::Submission, Action::Submit(request)))
    }

    /// Leave the confirmation and start a fresh booking.
    pub fn start_over(&mut self) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::Submitted)?;
        self.draft = BookingDraft::default();
        self.receipt = None;
        self.calendar = None;
        self.time_blocks = None;
        self.advance_on_blocks = false;
        self.transition(WizardStep::ProgramSelection);
        Ok(())
    }

    // ── Outcomes ────────────────────────────────────────────────────

    /// Apply a gateway outcome. Stale outcomes are ignored.
    pub fn apply(&mut self, outcome: Outcome) {
        let ticket = outcome.ticket();
        if !self.guard.settle(ticket) {
            tracing::debug!(resource = %ticket.resource, seq = ticket.seq, "Discarding stale response");
            return;
        }

        match outcome {
            Outcome::Programs { result, .. } => self.apply_programs(result),
            Outcome::Calendar {
                year,
                month,
                result,
                ..
            } => self.apply_calendar(ticket, year, month, result),
            Outcome::TimeBlocks {
                program_id,
                date,
                result,
                ..
            } => self.apply_time_blocks(ticket, &program_id, date, result),
            Outcome::Submission { result, .. } => self.apply_submission(result),
        }
    }

    fn apply_programs(&mut self, result: Result<Vec<Program>, GatewayError>) {
        match result {
            Ok(programs) => {
                tracing::info!(count = programs.len(), "Programs loaded");
                if programs.is_empty() {
                    self.notices
                        .push(Notice::info("This institution has no programs open for booking."));
                }
                if !programs.iter().any(|p| p.id == self.draft.program_id) {
                    self.draft.program_id.clear();
                }
                self.programs = programs;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load programs");
                self.programs.clear();
                self.notices.push(Notice::error("Could not load programs."));
            }
        }
    }

    fn apply_calendar(
        &mut self,
        ticket: Ticket,
        year: i32,
        month: u32,
        result: Result<CalendarMonth, GatewayError>,
    ) {
        if (year, month) != self.view_month || self.step != WizardStep::DateSelection {
            tracing::debug!(seq = ticket.seq, year, month, "Calendar no longer displayed");
            return;
        }
        match result {
            Ok(calendar) => {
                tracing::debug!(year, month, days = calendar.dates.len(), "Calendar loaded");
                self.calendar = Some(calendar);
            }
            Err(e) => {
                tracing::warn!(error = %e, year, month, "Failed to load calendar");
                self.calendar = None;
                self.notices
                    .push(Notice::error("Could not load the calendar. Please try again."));
            }
        }
    }

    fn apply_time_blocks(
        &mut self,
        ticket: Ticket,
        program_id: &str,
        date: NaiveDate,
        result: Result<TimeBlockAvailability, GatewayError>,
    ) {
        let advance = std::mem::take(&mut self.advance_on_blocks);
        if self.draft.program_id != program_id || self.draft.date != Some(date) {
            tracing::debug!(seq = ticket.seq, program_id, %date, "Time blocks no longer selected");
            return;
        }
        match result {
            Ok(availability) => {
                if self.draft.has_time_block()
                    && !availability
                        .find(&self.draft.time_block)
                        .is_some_and(TimeBlock::is_available)
                {
                    let lost = std::mem::take(&mut self.draft.time_block);
                    tracing::info!(time_block = %lost, %date, "Selected time block is no longer free");
                    self.notices.push(Notice::error(
                        ValidationError::TimeBlockUnavailable(lost).to_string(),
                    ));
                }
                self.time_blocks = Some(availability);
                if advance && self.step == WizardStep::DateSelection {
                    self.transition(WizardStep::TimeBlockSelection);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, program_id, %date, "Failed to load time blocks");
                self.time_blocks = None;
                self.notices
                    .push(Notice::error("Could not load free time blocks."));
            }
        }
    }

    fn apply_submission(&mut self, result: Result<BookingReceipt, GatewayError>) {
        if self.step != WizardStep::DetailsAndContact {
            return;
        }
        match result {
            Ok(receipt) => {
                tracing::info!(booking_id = %receipt.id, "Booking acknowledged");
                self.receipt = Some(receipt);
                self.draft = BookingDraft::default();
                self.transition(WizardStep::Submitted);
                self.notices.push(Notice::success("Your booking has been sent."));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Booking submission failed");
                let message = e
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_SUBMIT_ERROR.to_string());
                self.notices.push(Notice::error(message));
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn command(&mut self, resource: Resource, action: Action) -> Command {
        Command {
            institution_id: self.session.institution_id.clone(),
            ticket: self.guard.issue(resource),
            action,
        }
    }

    fn load_calendar(&mut self) -> Command {
        let (year, month) = self.view_month;
        self.calendar = None;
        self.command(Resource::Calendar, Action::LoadCalendar { year, month })
    }

    /// Fetch blocks for the drafted program and date, if both are set.
    fn refresh_time_blocks(&mut self, advance: bool) -> Option<Command> {
        let date = self.draft.date?;
        if !self.draft.has_program() {
            return None;
        }
        self.time_blocks = None;
        self.advance_on_blocks = advance;
        let program_id = self.draft.program_id.clone();
        Some(self.command(
            Resource::TimeBlocks,
            Action::LoadTimeBlocks { program_id, date },
        ))
    }

    fn transition(&mut self, target: WizardStep) {
        debug_assert!(self.step.can_transition_to(target), "{} -> {target}", self.step);
        tracing::info!(from = %self.step, to = %target, "Wizard step changed");
        self.step = target;
    }

    fn ensure_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn ensure_idle(&self, resource: Resource) -> Result<(), WizardError> {
        if self.guard.in_flight(resource) {
            Err(WizardError::Busy(self.step))
        } else {
            Ok(())
        }
    }

    /// Record a validation failure as an inline notice and return it.
    fn reject<T>(&mut self, error: ValidationError) -> Result<T, WizardError> {
        tracing::debug!(step = %self.step, %error, "Input rejected");
        self.notices.push(Notice::error(error.to_string()));
        Err(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::TimeBlockStatus;
    use crate::session::Language;
    use crate::wizard::NoticeLevel;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn program(id: &str, min: u32, max: u32) -> Program {
        Program {
            id: id.to_string(),
            institution_id: "demo".to_string(),
            name_cs: format!("Program {id}"),
            name_en: String::new(),
            description_cs: String::new(),
            description_en: String::new(),
            duration: 90,
            age_group: "zs1_7_12".to_string(),
            min_capacity: Some(min),
            max_capacity: Some(max),
            target_group: "schools".to_string(),
            price: None,
            status: "active".to_string(),
        }
    }

    fn march(days: &[(u32, bool)]) -> CalendarMonth {
        month_of(2026, 3, days)
    }

    fn month_of(year: i32, month: u32, days: &[(u32, bool)]) -> CalendarMonth {
        CalendarMonth {
            year,
            month,
            dates: days
                .iter()
                .map(|&(d, free)| CalendarDay {
                    date: NaiveDate::from_ymd_opt(year, month, d).unwrap(),
                    has_availability: free,
                    available_blocks: if free { 2 } else { 0 },
                })
                .collect(),
        }
    }

    fn blocks(day: &str, list: &[(&str, TimeBlockStatus)]) -> TimeBlockAvailability {
        TimeBlockAvailability {
            date: Some(date(day)),
            time_blocks: list
                .iter()
                .map(|&(time, status)| TimeBlock {
                    time: time.to_string(),
                    status,
                })
                .collect(),
        }
    }

    fn calendar_outcome(cmd: &Command, result: Result<CalendarMonth, GatewayError>) -> Outcome {
        let Action::LoadCalendar { year, month } = cmd.action else {
            panic!("expected calendar command, got {:?}", cmd.action);
        };
        Outcome::Calendar {
            ticket: cmd.ticket,
            year,
            month,
            result,
        }
    }

    fn blocks_outcome(
        cmd: &Command,
        result: Result<TimeBlockAvailability, GatewayError>,
    ) -> Outcome {
        let Action::LoadTimeBlocks { program_id, date } = &cmd.action else {
            panic!("expected time block command, got {:?}", cmd.action);
        };
        Outcome::TimeBlocks {
            ticket: cmd.ticket,
            program_id: program_id.clone(),
            date: *date,
            result,
        }
    }

    fn status_error(detail: Option<&str>) -> GatewayError {
        GatewayError::Status {
            endpoint: "bookings".to_string(),
            status: 400,
            detail: detail.map(str::to_string),
        }
    }

    /// Wizard on 2026-03-01 with programs P1 (5..=30) and P2 loaded.
    fn loaded_wizard() -> BookingWizard {
        let mut wizard =
            BookingWizard::new(Session::new("demo", Language::Cs)).with_today(date("2026-03-01"));
        let cmd = wizard.mount();
        assert_eq!(cmd.action, Action::LoadPrograms);
        wizard.apply(Outcome::Programs {
            ticket: cmd.ticket,
            result: Ok(vec![program("P1", 5, 30), program("P2", 10, 20)]),
        });
        wizard
    }

    /// Wizard in DateSelection with March loaded (10 free, 15 full, 20 free).
    fn at_calendar() -> BookingWizard {
        let mut wizard = loaded_wizard();
        wizard.select_program("P1").unwrap();
        let cmd = wizard.next().unwrap().unwrap();
        wizard.apply(calendar_outcome(
            &cmd,
            Ok(march(&[(1, true), (10, true), (15, false), (20, true)])),
        ));
        wizard
    }

    /// Wizard in TimeBlockSelection for 2026-03-10.
    fn at_time_blocks() -> BookingWizard {
        let mut wizard = at_calendar();
        let cmd = wizard.select_date(date("2026-03-10")).unwrap();
        wizard.apply(blocks_outcome(
            &cmd,
            Ok(blocks(
                "2026-03-10",
                &[
                    ("08:00", TimeBlockStatus::Booked),
                    ("10:00", TimeBlockStatus::Available),
                    ("13:00", TimeBlockStatus::Available),
                ],
            )),
        ));
        wizard
    }

    /// Wizard in DetailsAndContact with 10:00 chosen.
    fn at_details() -> BookingWizard {
        let mut wizard = at_time_blocks();
        wizard.select_time_block("10:00").unwrap();
        assert!(wizard.next().unwrap().is_none());
        wizard
    }

    fn fill_details(wizard: &mut BookingWizard) {
        wizard.set_school_name("ZŠ Komenského").unwrap();
        wizard.set_age_or_class("4.A").unwrap();
        wizard.set_participants(20).unwrap();
        wizard.set_contact_name("Jana Nováková").unwrap();
        wizard.set_contact_email("a@b.cz").unwrap();
        wizard.set_contact_phone("+420 722 960 890").unwrap();
    }

    #[test]
    fn programs_hidden_while_loading() {
        let mut wizard = BookingWizard::new(Session::new("demo", Language::Cs));
        let cmd = wizard.mount();
        assert!(wizard.is_loading());
        assert!(wizard.programs().is_empty());
        assert_eq!(
            wizard.select_program("P1"),
            Err(WizardError::Busy(WizardStep::ProgramSelection))
        );
        wizard.apply(Outcome::Programs {
            ticket: cmd.ticket,
            result: Ok(vec![program("P1", 5, 30)]),
        });
        assert!(!wizard.is_loading());
        assert_eq!(wizard.programs().len(), 1);
    }

    #[test]
    fn program_load_failure_notifies() {
        let mut wizard = BookingWizard::new(Session::new("demo", Language::Cs));
        let cmd = wizard.mount();
        wizard.apply(Outcome::Programs {
            ticket: cmd.ticket,
            result: Err(GatewayError::RequestFailed {
                endpoint: "programs".to_string(),
                reason: "connection refused".to_string(),
            }),
        });
        assert!(wizard.programs().is_empty());
        assert!(wizard.take_notices().iter().any(Notice::is_error));
        assert_eq!(wizard.step(), WizardStep::ProgramSelection);
    }

    #[test]
    fn next_without_program_is_rejected() {
        let mut wizard = loaded_wizard();
        let err = wizard.next().unwrap_err();
        assert_eq!(err, ValidationError::Missing(Field::Program).into());
        assert_eq!(wizard.step(), WizardStep::ProgramSelection);
        let notices = wizard.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn empty_or_unknown_program_is_rejected() {
        let mut wizard = loaded_wizard();
        assert!(wizard.select_program("").is_err());
        assert_eq!(
            wizard.select_program("P9"),
            Err(ValidationError::UnknownProgram("P9".to_string()).into())
        );
        assert!(!wizard.draft().has_program());
    }

    #[test]
    fn entering_date_selection_fetches_viewed_month() {
        let mut wizard = loaded_wizard();
        wizard.select_program("P1").unwrap();
        let cmd = wizard.next().unwrap().unwrap();
        assert_eq!(wizard.step(), WizardStep::DateSelection);
        assert_eq!(cmd.institution_id, "demo");
        assert_eq!(cmd.action, Action::LoadCalendar { year: 2026, month: 3 });
        assert!(wizard.is_loading());
        assert!(wizard.calendar().is_none());
        assert!(wizard.selectable_days().is_empty());
    }

    #[test]
    fn unavailable_day_does_not_fetch_or_advance() {
        let mut wizard = at_calendar();
        let err = wizard.select_date(date("2026-03-15")).unwrap_err();
        assert_eq!(err, ValidationError::DateUnavailable(date("2026-03-15")).into());
        assert_eq!(wizard.step(), WizardStep::DateSelection);
        assert!(!wizard.is_loading());
        assert!(wizard.draft().date.is_none());
    }

    #[test]
    fn today_and_past_days_are_not_selectable() {
        let mut wizard = at_calendar();
        assert_eq!(
            wizard.select_date(date("2026-03-01")),
            Err(ValidationError::DateInPast(date("2026-03-01")).into())
        );
        let selectable: Vec<NaiveDate> =
            wizard.selectable_days().iter().map(|d| d.date).collect();
        assert_eq!(selectable, vec![date("2026-03-10"), date("2026-03-20")]);
    }

    #[test]
    fn day_outside_calendar_is_rejected() {
        let mut wizard = at_calendar();
        assert!(matches!(
            wizard.select_date(date("2026-04-02")),
            Err(WizardError::Validation(ValidationError::DateNotInCalendar(_)))
        ));
    }

    #[test]
    fn selecting_date_advances_after_blocks_arrive() {
        let mut wizard = at_calendar();
        let cmd = wizard.select_date(date("2026-03-10")).unwrap();
        assert_eq!(
            cmd.action,
            Action::LoadTimeBlocks {
                program_id: "P1".to_string(),
                date: date("2026-03-10"),
            }
        );
        // Still waiting
        assert_eq!(wizard.step(), WizardStep::DateSelection);
        assert!(wizard.is_loading());
        assert!(matches!(wizard.next(), Ok(Some(_))), "next re-issues the fetch");

        let cmd = wizard.select_date(date("2026-03-10")).unwrap();
        wizard.apply(blocks_outcome(
            &cmd,
            Ok(blocks("2026-03-10", &[("10:00", TimeBlockStatus::Available)])),
        ));
        assert_eq!(wizard.step(), WizardStep::TimeBlockSelection);
        assert_eq!(wizard.time_blocks().len(), 1);
    }

    #[test]
    fn failed_block_fetch_stays_on_calendar() {
        let mut wizard = at_calendar();
        let cmd = wizard.select_date(date("2026-03-10")).unwrap();
        wizard.apply(blocks_outcome(&cmd, Err(status_error(None))));
        assert_eq!(wizard.step(), WizardStep::DateSelection);
        assert!(wizard.time_blocks().is_empty());
        assert!(wizard.take_notices().iter().any(Notice::is_error));
    }

    #[test]
    fn late_month_response_does_not_overwrite_newer_month() {
        let mut wizard = loaded_wizard();
        wizard.select_program("P1").unwrap();
        let march_cmd = wizard.next().unwrap().unwrap();
        let april_cmd = wizard.next_month().unwrap();
        assert_eq!(april_cmd.action, Action::LoadCalendar { year: 2026, month: 4 });

        // April resolves first, March afterwards
        wizard.apply(calendar_outcome(&april_cmd, Ok(month_of(2026, 4, &[(7, true)]))));
        wizard.apply(calendar_outcome(&march_cmd, Ok(march(&[(10, true)]))));

        let calendar = wizard.calendar().unwrap();
        assert_eq!((calendar.year, calendar.month), (2026, 4));
        assert_eq!(wizard.view_month(), (2026, 4));
    }

    #[test]
    fn superseded_month_is_ignored_even_when_it_lands_first() {
        let mut wizard = loaded_wizard();
        wizard.select_program("P1").unwrap();
        let march_cmd = wizard.next().unwrap().unwrap();
        let april_cmd = wizard.next_month().unwrap();

        wizard.apply(calendar_outcome(&march_cmd, Ok(march(&[(10, true)]))));
        assert!(wizard.calendar().is_none(), "April is still loading");
        wizard.apply(calendar_outcome(&april_cmd, Ok(month_of(2026, 4, &[(7, true)]))));
        assert_eq!(wizard.calendar().unwrap().month, 4);
    }

    #[test]
    fn month_navigation_wraps_years() {
        let mut wizard = BookingWizard::new(Session::new("demo", Language::Cs))
            .with_today(date("2026-12-05"));
        let cmd = wizard.mount();
        wizard.apply(Outcome::Programs {
            ticket: cmd.ticket,
            result: Ok(vec![program("P1", 5, 30)]),
        });
        wizard.select_program("P1").unwrap();
        wizard.next().unwrap();
        let cmd = wizard.next_month().unwrap();
        assert_eq!(cmd.action, Action::LoadCalendar { year: 2027, month: 1 });
        let cmd = wizard.previous_month().unwrap();
        assert_eq!(cmd.action, Action::LoadCalendar { year: 2026, month: 12 });
        assert_eq!(
            wizard.show_month(2026, 13).unwrap_err(),
            WizardError::InvalidMonth { year: 2026, month: 13 }
        );
    }

    #[test]
    fn calendar_failure_leaves_user_on_step() {
        let mut wizard = loaded_wizard();
        wizard.select_program("P1").unwrap();
        let cmd = wizard.next().unwrap().unwrap();
        wizard.apply(calendar_outcome(&cmd, Err(status_error(None))));
        assert_eq!(wizard.step(), WizardStep::DateSelection);
        assert!(wizard.calendar().is_none());
        assert!(wizard.take_notices().iter().any(Notice::is_error));
        // Retry by navigating again
        let retry = wizard.show_month(2026, 3).unwrap();
        wizard.apply(calendar_outcome(&retry, Ok(march(&[(10, true)]))));
        assert!(wizard.calendar().is_some());
    }

    #[test]
    fn booked_block_is_not_selectable() {
        let mut wizard = at_time_blocks();
        assert_eq!(
            wizard.select_time_block("08:00"),
            Err(ValidationError::TimeBlockUnavailable("08:00".to_string()).into())
        );
        assert_eq!(
            wizard.select_time_block("11:00"),
            Err(ValidationError::TimeBlockUnavailable("11:00".to_string()).into())
        );
        assert!(!wizard.draft().has_time_block());
    }

    #[test]
    fn next_without_block_is_rejected() {
        let mut wizard = at_time_blocks();
        assert_eq!(
            wizard.next(),
            Err(ValidationError::Missing(Field::TimeBlock).into())
        );
        assert_eq!(wizard.step(), WizardStep::TimeBlockSelection);
    }

    #[test]
    fn draft_carries_earlier_choices_into_details() {
        let mut wizard = at_details();
        fill_details(&mut wizard);
        wizard.set_special_requirements("Wheelchair access").unwrap();
        let draft = wizard.draft();
        assert_eq!(wizard.step(), WizardStep::DetailsAndContact);
        assert_eq!(draft.program_id, "P1");
        assert_eq!(draft.date, Some(date("2026-03-10")));
        assert_eq!(draft.time_block, "10:00");
        assert_eq!(wizard.progress(), Progress { current: 4, total: 4 });
    }

    #[test]
    fn details_setters_need_details_step() {
        let mut wizard = at_time_blocks();
        assert_eq!(
            wizard.set_school_name("x"),
            Err(WizardError::WrongStep {
                expected: WizardStep::DetailsAndContact,
                actual: WizardStep::TimeBlockSelection,
            })
        );
    }

    #[test]
    fn participant_bounds_follow_program() {
        let mut wizard = at_details();
        assert_eq!(
            wizard.set_participants(3),
            Err(ValidationError::ParticipantsOutOfRange { count: 3, min: 5, max: 30 }.into())
        );
        assert_eq!(wizard.draft().num_students, 15, "previous value kept");
        assert!(wizard.set_participants(15).is_ok());
        assert!(wizard.set_participants(31).is_err());
        assert_eq!(wizard.draft().num_students, 15);
    }

    #[test]
    fn submit_without_consent_makes_no_call() {
        let mut wizard = at_details();
        fill_details(&mut wizard);
        assert_eq!(
            wizard.submit(),
            Err(ValidationError::ConsentRequired.into())
        );
        assert!(!wizard.is_loading());
        assert_eq!(wizard.step(), WizardStep::DetailsAndContact);
    }

    #[test]
    fn successful_submission_reaches_submitted() {
        let mut wizard = at_details();
        fill_details(&mut wizard);
        wizard.set_consent(true).unwrap();
        let cmd = wizard.submit().unwrap();
        let Action::Submit(request) = &cmd.action else {
            panic!("expected submit");
        };
        assert_eq!(request.program_id, "P1");
        assert_eq!(request.num_students, 20);
        assert!(wizard.is_loading());
        assert_eq!(wizard.submit(), Err(WizardError::Busy(WizardStep::DetailsAndContact)));

        wizard.apply(Outcome::Submission {
            ticket: cmd.ticket,
            result: Ok(BookingReceipt {
                id: "abc123".to_string(),
                status: Some("pending".to_string()),
                created_at: None,
            }),
        });
        assert_eq!(wizard.step(), WizardStep::Submitted);
        assert_eq!(wizard.receipt().unwrap().id, "abc123");
        assert_eq!(wizard.draft(), &BookingDraft::default());
        assert!(wizard
            .take_notices()
            .iter()
            .any(|n| n.level == NoticeLevel::Success));

        wizard.start_over().unwrap();
        assert_eq!(wizard.step(), WizardStep::ProgramSelection);
        assert!(wizard.receipt().is_none());
        assert_eq!(wizard.programs().len(), 2);
    }

    #[test]
    fn rejected_submission_keeps_draft_and_shows_detail() {
        let mut wizard = at_details();
        fill_details(&mut wizard);
        wizard.set_consent(true).unwrap();
        let before = wizard.draft().clone();

        let cmd = wizard.submit().unwrap();
        wizard.apply(Outcome::Submission {
            ticket: cmd.ticket,
            result: Err(status_error(Some("Time block already booked"))),
        });
        assert_eq!(wizard.step(), WizardStep::DetailsAndContact);
        assert_eq!(wizard.draft(), &before);
        let notices = wizard.take_notices();
        assert_eq!(notices.last().unwrap().message, "Time block already booked");

        // No automatic retry; a manual resubmit is allowed
        assert!(!wizard.is_loading());
        let cmd = wizard.submit().unwrap();
        wizard.apply(Outcome::Submission {
            ticket: cmd.ticket,
            result: Err(GatewayError::RequestFailed {
                endpoint: "bookings".to_string(),
                reason: "timeout".to_string(),
            }),
        });
        assert_eq!(
            wizard.take_notices().last().unwrap().message,
            GENERIC_SUBMIT_ERROR
        );
    }

    #[test]
    fn back_keeps_data_and_revalidates_on_return() {
        let mut wizard = at_details();
        fill_details(&mut wizard);

        // Details → time blocks refetches the day's blocks
        let cmd = wizard.back().unwrap().unwrap();
        assert_eq!(wizard.step(), WizardStep::TimeBlockSelection);
        assert_eq!(wizard.next(), Err(WizardError::Busy(WizardStep::TimeBlockSelection)));
        wizard.apply(blocks_outcome(
            &cmd,
            Ok(blocks("2026-03-10", &[("10:00", TimeBlockStatus::Available)])),
        ));
        assert_eq!(wizard.draft().time_block, "10:00");

        // Time blocks → calendar refetches the month
        let cmd = wizard.back().unwrap().unwrap();
        assert_eq!(wizard.step(), WizardStep::DateSelection);
        wizard.apply(calendar_outcome(&cmd, Ok(march(&[(10, true)]))));
        assert_eq!(wizard.draft().date, Some(date("2026-03-10")));

        // Re-advance: the block got booked meanwhile
        let cmd = wizard.next().unwrap().unwrap();
        wizard.apply(blocks_outcome(
            &cmd,
            Ok(blocks(
                "2026-03-10",
                &[
                    ("10:00", TimeBlockStatus::Booked),
                    ("13:00", TimeBlockStatus::Available),
                ],
            )),
        ));
        assert_eq!(wizard.step(), WizardStep::TimeBlockSelection);
        assert!(!wizard.draft().has_time_block());
        assert!(wizard.take_notices().iter().any(Notice::is_error));
        assert_eq!(wizard.draft().school_name, "ZŠ Komenského");
    }

    #[test]
    fn back_to_programs_drops_pending_fetches() {
        let mut wizard = at_calendar();
        let cmd = wizard.select_date(date("2026-03-10")).unwrap();
        assert!(wizard.back().unwrap().is_none());
        assert_eq!(wizard.step(), WizardStep::ProgramSelection);
        wizard.apply(blocks_outcome(
            &cmd,
            Ok(blocks("2026-03-10", &[("10:00", TimeBlockStatus::Available)])),
        ));
        assert_eq!(wizard.step(), WizardStep::ProgramSelection);
        assert!(wizard.back().is_err());
    }

    #[test]
    fn switching_program_clears_block_but_keeps_date() {
        let mut wizard = at_details();
        wizard.back().unwrap();
        wizard.back().unwrap();
        wizard.back().unwrap();
        assert_eq!(wizard.step(), WizardStep::ProgramSelection);
        wizard.select_program("P2").unwrap();
        assert_eq!(wizard.draft().program_id, "P2");
        assert_eq!(wizard.draft().date, Some(date("2026-03-10")));
        assert!(!wizard.draft().has_time_block());
    }

    #[test]
    fn changing_month_cancels_pending_date_pick() {
        let mut wizard = at_calendar();
        let cmd = wizard.select_date(date("2026-03-10")).unwrap();
        let _april = wizard.next_month().unwrap();
        wizard.apply(blocks_outcome(
            &cmd,
            Ok(blocks("2026-03-10", &[("10:00", TimeBlockStatus::Available)])),
        ));
        assert_eq!(wizard.step(), WizardStep::DateSelection);
    }

    #[test]
    fn forward_from_details_needs_submit() {
        let mut wizard = at_details();
        assert!(matches!(
            wizard.next(),
            Err(WizardError::NoTransition { direction: "forward", .. })
        ));
    }

    #[test]
    fn back_is_refused_while_booking_is_sent() {
        let mut wizard = at_details();
        fill_details(&mut wizard);
        wizard.set_consent(true).unwrap();
        let cmd = wizard.submit().unwrap();

        assert_eq!(
            wizard.back(),
            Err(WizardError::Busy(WizardStep::DetailsAndContact))
        );
        assert_eq!(wizard.step(), WizardStep::DetailsAndContact);

        wizard.apply(Outcome::Submission {
            ticket: cmd.ticket,
            result: Ok(BookingReceipt {
                id: "abc123".to_string(),
                status: None,
                created_at: None,
            }),
        });
        assert_eq!(wizard.step(), WizardStep::Submitted);
        assert_eq!(wizard.receipt().unwrap().id, "abc123");
    }

    #[test]
    fn back_is_allowed_after_failed_submission() {
        let mut wizard = at_details();
        fill_details(&mut wizard);
        wizard.set_consent(true).unwrap();
        let cmd = wizard.submit().unwrap();
        wizard.apply(Outcome::Submission {
            ticket: cmd.ticket,
            result: Err(status_error(None)),
        });
        assert!(wizard.back().unwrap().is_some());
        assert_eq!(wizard.step(), WizardStep::TimeBlockSelection);
    }

    #[test]
    fn latest_date_pick_wins_over_earlier_one() {
        let mut wizard = at_calendar();
        let first = wizard.select_date(date("2026-03-10")).unwrap();
        let second = wizard.select_date(date("2026-03-20")).unwrap();

        wizard.apply(blocks_outcome(
            &second,
            Ok(blocks("2026-03-20", &[("13:00", TimeBlockStatus::Available)])),
        ));
        wizard.apply(blocks_outcome(
            &first,
            Ok(blocks(
                "2026-03-10",
                &[
                    ("08:00", TimeBlockStatus::Available),
                    ("10:00", TimeBlockStatus::Available),
                ],
            )),
        ));

        assert_eq!(wizard.step(), WizardStep::TimeBlockSelection);
        assert_eq!(wizard.draft().date, Some(date("2026-03-20")));
        let times: Vec<&str> = wizard.time_blocks().iter().map(|b| b.time.as_str()).collect();
        assert_eq!(times, vec!["13:00"]);
    }

    #[test]
    fn date_pick_without_program_is_reported() {
        let mut wizard = at_calendar();
        // A program reload that no longer lists P1 drops the selection
        let cmd = wizard.mount();
        wizard.apply(Outcome::Programs {
            ticket: cmd.ticket,
            result: Ok(vec![program("P2", 10, 20)]),
        });
        wizard.take_notices();

        assert_eq!(
            wizard.select_date(date("2026-03-10")),
            Err(ValidationError::Missing(Field::Program).into())
        );
        let notices = wizard.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert!(!wizard.is_loading());
    }
}
