//! Terminal presentation shell. Renders the wizard and maps typed
//! commands onto wizard operations. All validation stays in the wizard.

pub mod input;
pub mod render;

pub use input::{Choice, DayRef, DetailInput, ShellInput, parse};
pub use render::{render, render_notice};

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::GatewayConfig;
use crate::error::{Result, ValidationError, WizardError};
use crate::gateway::{AvailabilityGateway, HttpGateway};
use crate::session::Session;
use crate::wizard::{BookingWizard, Command, Driver};

/// What the loop should do after handling an input.
#[derive(Debug)]
pub enum Handled {
    /// Redraw; optionally run a gateway command.
    Continue(Option<Command>),
    Help,
    Quit,
}

/// Build the HTTP gateway, load the portal theme and return a wizard
/// ready to mount.
pub async fn connect(config: &GatewayConfig) -> Result<(BookingWizard, Driver)> {
    let gateway: Arc<dyn AvailabilityGateway> = Arc::new(HttpGateway::new(config)?);
    let session = Session::new(config.institution_id.clone(), config.language)
        .load_theme(gateway.as_ref())
        .await;
    Ok((BookingWizard::new(session), Driver::new(gateway)))
}

/// Apply one parsed input to the wizard.
pub fn handle(
    wizard: &mut BookingWizard,
    input: ShellInput,
) -> std::result::Result<Handled, WizardError> {
    let command = match input {
        ShellInput::Next => wizard.next()?,
        ShellInput::Back => wizard.back()?,
        ShellInput::PreviousMonth => Some(wizard.previous_month()?),
        ShellInput::NextMonth => Some(wizard.next_month()?),
        ShellInput::Program(choice) => {
            let id = match choice {
                Choice::Index(n) => wizard
                    .programs()
                    .get(n.wrapping_sub(1))
                    .map(|p| p.id.clone())
                    .ok_or_else(|| ValidationError::UnknownProgram(n.to_string()))?,
                Choice::Value(id) => id,
            };
            wizard.select_program(&id)?;
            // Picking a program card moves straight on to the calendar.
            wizard.next()?
        }
        ShellInput::Date(day) => {
            let date = match day {
                DayRef::Date(date) => date,
                DayRef::DayOfMonth(d) => {
                    let (year, month) = wizard.view_month();
                    NaiveDate::from_ymd_opt(year, month, d).ok_or(
                        ValidationError::NoSuchDay {
                            year,
                            month,
                            day: d,
                        },
                    )?
                }
            };
            Some(wizard.select_date(date)?)
        }
        ShellInput::TimeBlock(choice) => {
            let time = match choice {
                Choice::Index(n) => wizard
                    .time_blocks()
                    .get(n.wrapping_sub(1))
                    .map(|b| b.time.clone())
                    .ok_or_else(|| ValidationError::TimeBlockUnavailable(n.to_string()))?,
                Choice::Value(time) => time,
            };
            wizard.select_time_block(&time)?;
            wizard.next()?
        }
        ShellInput::Detail(detail) => {
            match detail {
                DetailInput::SchoolName(v) => wizard.set_school_name(v)?,
                DetailInput::GroupType(g) => wizard.set_group_type(g)?,
                DetailInput::AgeOrClass(v) => wizard.set_age_or_class(v)?,
                DetailInput::Participants(n) => wizard.set_participants(n)?,
                DetailInput::Notes(v) => wizard.set_special_requirements(v)?,
                DetailInput::ContactName(v) => wizard.set_contact_name(v)?,
                DetailInput::ContactEmail(v) => wizard.set_contact_email(v)?,
                DetailInput::ContactPhone(v) => wizard.set_contact_phone(v)?,
                DetailInput::Consent(c) => wizard.set_consent(c)?,
            }
            None
        }
        ShellInput::Submit => Some(wizard.submit()?),
        ShellInput::StartOver => {
            wizard.start_over()?;
            None
        }
        ShellInput::Help => return Ok(Handled::Help),
        ShellInput::Quit => return Ok(Handled::Quit),
    };
    Ok(Handled::Continue(command))
}

fn flush_notices(wizard: &mut BookingWizard) {
    for notice in wizard.take_notices() {
        eprintln!("{}", render_notice(&notice));
    }
}

fn redraw(wizard: &mut BookingWizard) {
    flush_notices(wizard);
    println!("\n{}", render(wizard));
    eprint!("> ");
}

/// Run the interactive loop on stdin/stdout until EOF or `quit`.
pub async fn run(mut wizard: BookingWizard, mut driver: Driver) -> anyhow::Result<()> {
    driver.dispatch(wizard.mount());
    redraw(&mut wizard);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    eprint!("> ");
                    continue;
                }
                let input = match parse(line) {
                    Ok(input) => input,
                    Err(hint) => {
                        eprintln!("{hint}");
                        eprint!("> ");
                        continue;
                    }
                };
                match handle(&mut wizard, input) {
                    Ok(Handled::Continue(command)) => driver.dispatch_opt(command),
                    Ok(Handled::Help) => {
                        println!("{}", input::HELP);
                        eprint!("> ");
                        continue;
                    }
                    Ok(Handled::Quit) => break,
                    Err(e) => {
                        let notices = wizard.take_notices();
                        if notices.is_empty() {
                            eprintln!("❌ {e}");
                        }
                        for notice in &notices {
                            eprintln!("{}", render_notice(notice));
                        }
                    }
                }
                redraw(&mut wizard);
            }
            Some(outcome) = driver.next_outcome(), if driver.has_pending() => {
                wizard.apply(outcome);
                redraw(&mut wizard);
            }
        }
    }

    tracing::info!(step = %wizard.step(), "Booking shell closed");
    Ok(())
}
