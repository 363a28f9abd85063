//! Parse shell input lines into wizard operations.

use chrono::NaiveDate;

use crate::gateway::GroupType;

/// A detail field the user can set from the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailInput {
    SchoolName(String),
    GroupType(GroupType),
    AgeOrClass(String),
    Participants(u32),
    Notes(String),
    ContactName(String),
    ContactEmail(String),
    ContactPhone(String),
    Consent(bool),
}

/// A day reference: either a full date or a day of the viewed month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRef {
    Date(NaiveDate),
    DayOfMonth(u32),
}

/// A choice from a listed set: by 1-based position or by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Index(usize),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Next,
    Back,
    PreviousMonth,
    NextMonth,
    Program(Choice),
    Date(DayRef),
    TimeBlock(Choice),
    Detail(DetailInput),
    Submit,
    StartOver,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  program <n|id>        choose a program
  date <day|YYYY-MM-DD> choose a day in the calendar
  < / >                 previous / next month
  time <n|HH:MM>        choose a time block
  set school|group|age|count|notes|name|email|phone <value>
  consent yes|no        GDPR consent
  next / back           move between steps
  submit                send the booking
  restart               start a new booking after sending
  help / quit";

/// Parse one line. Errors are user-facing hints.
pub fn parse(line: &str) -> Result<ShellInput, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "next" | "n" => Ok(ShellInput::Next),
        "back" | "b" => Ok(ShellInput::Back),
        "<" | "prev-month" => Ok(ShellInput::PreviousMonth),
        ">" | "next-month" => Ok(ShellInput::NextMonth),
        "program" | "p" => Ok(ShellInput::Program(choice(rest, "program")?)),
        "date" | "d" => Ok(ShellInput::Date(day_ref(rest)?)),
        "time" | "t" => Ok(ShellInput::TimeBlock(choice(rest, "time block")?)),
        "set" => Ok(ShellInput::Detail(detail(rest)?)),
        "consent" => Ok(ShellInput::Detail(DetailInput::Consent(yes_no(rest)?))),
        "submit" => Ok(ShellInput::Submit),
        "restart" => Ok(ShellInput::StartOver),
        "help" | "?" => Ok(ShellInput::Help),
        "quit" | "exit" | "/quit" => Ok(ShellInput::Quit),
        other => Err(format!("Unknown command '{other}'. Type 'help'.")),
    }
}

fn choice(arg: &str, what: &str) -> Result<Choice, String> {
    if arg.is_empty() {
        return Err(format!("Which {what}?"));
    }
    match arg.parse::<usize>() {
        Ok(0) => Err(format!("{what} numbers start at 1")),
        Ok(n) => Ok(Choice::Index(n)),
        Err(_) => Ok(Choice::Value(arg.to_string())),
    }
}

fn day_ref(arg: &str) -> Result<DayRef, String> {
    if let Ok(date) = arg.parse::<NaiveDate>() {
        return Ok(DayRef::Date(date));
    }
    match arg.parse::<u32>() {
        Ok(day @ 1..=31) => Ok(DayRef::DayOfMonth(day)),
        _ => Err(format!("'{arg}' is not a day or YYYY-MM-DD date")),
    }
}

fn yes_no(arg: &str) -> Result<bool, String> {
    match arg.to_ascii_lowercase().as_str() {
        "yes" | "y" | "ano" | "true" => Ok(true),
        "no" | "n" | "ne" | "false" => Ok(false),
        _ => Err("Answer yes or no".to_string()),
    }
}

fn detail(rest: &str) -> Result<DetailInput, String> {
    let (field, value) = match rest.split_once(char::is_whitespace) {
        Some((field, value)) => (field, value.trim()),
        None => (rest, ""),
    };
    let value_owned = value.to_string();
    match field.to_ascii_lowercase().as_str() {
        "school" => Ok(DetailInput::SchoolName(value_owned)),
        "group" => GroupType::from_code(value)
            .map(DetailInput::GroupType)
            .ok_or_else(|| {
                let codes: Vec<&str> = GroupType::ALL.iter().map(|g| g.code()).collect();
                format!("Group must be one of: {}", codes.join(", "))
            }),
        "age" | "class" => Ok(DetailInput::AgeOrClass(value_owned)),
        "count" | "students" => value
            .parse()
            .map(DetailInput::Participants)
            .map_err(|_| format!("'{value}' is not a number")),
        "notes" => Ok(DetailInput::Notes(value_owned)),
        "name" => Ok(DetailInput::ContactName(value_owned)),
        "email" => Ok(DetailInput::ContactEmail(value_owned)),
        "phone" => Ok(DetailInput::ContactPhone(value_owned)),
        "consent" => yes_no(value).map(DetailInput::Consent),
        "" => Err("set what? Type 'help'.".to_string()),
        other => Err(format!("Unknown field '{other}'")),
    }
}
