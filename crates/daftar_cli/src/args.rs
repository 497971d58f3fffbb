//! Command-line argument parsing.
//!
//! # Responsibility
//! - Turn `argv` into a typed `Command` without touching any state.
//!
//! # Invariants
//! - Parsing never reads the store, environment, or network.

use daftar_core::{ExpenseId, NoteId, NoteType, DEFAULT_CATEGORY};
use std::fmt::{Display, Formatter};

pub const USAGE: &str = "\
usage: daftar <command>

  expense add <amount> <description> [category]
  expense edit <id> <amount> <description> [category]
  expense delete <id> [--yes]
  expense list
  expense summary
  category add <name>
  category list
  note add <type> <title> <content>
  note edit <id> <type> <title> <content>
  note delete <id> [--yes]
  note list
  login <username> <password>
  logout
  session
  reset-password
  version

note types: development-idea | reminder | future-idea";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ExpenseAdd {
        amount: String,
        description: String,
        category: String,
    },
    ExpenseEdit {
        id: ExpenseId,
        amount: String,
        description: String,
        /// `None` keeps the expense's current category.
        category: Option<String>,
    },
    ExpenseDelete {
        id: ExpenseId,
        assume_yes: bool,
    },
    ExpenseList,
    ExpenseSummary,
    CategoryAdd {
        name: String,
    },
    CategoryList,
    NoteAdd {
        kind: NoteType,
        title: String,
        content: String,
    },
    NoteEdit {
        id: NoteId,
        kind: NoteType,
        title: String,
        content: String,
    },
    NoteDelete {
        id: NoteId,
        assume_yes: bool,
    },
    NoteList,
    Login {
        username: String,
        password: String,
    },
    Logout,
    Session,
    ResetPassword,
    Version,
}

impl Command {
    /// Commands that read or write expense/note data.
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Self::Login { .. } | Self::Logout | Self::Session | Self::ResetPassword | Self::Version
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError(pub String);

impl Display for UsageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UsageError {}

/// Parses arguments after the program name.
pub fn parse_args<I, A>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = A>,
    A: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let words: Vec<&str> = args.iter().map(String::as_str).collect();

    match words.as_slice() {
        ["expense", rest @ ..] => parse_expense(rest),
        ["category", "add", name] => Ok(Command::CategoryAdd {
            name: name.to_string(),
        }),
        ["category", "list"] => Ok(Command::CategoryList),
        ["note", rest @ ..] => parse_note(rest),
        ["login", username, password] => Ok(Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        }),
        ["logout"] => Ok(Command::Logout),
        ["session"] => Ok(Command::Session),
        ["reset-password"] => Ok(Command::ResetPassword),
        ["version"] | ["--version"] | ["-V"] => Ok(Command::Version),
        [] => Err(UsageError("missing command".to_string())),
        _ => Err(UsageError(format!("unrecognised arguments: {}", words.join(" ")))),
    }
}

fn parse_expense(rest: &[&str]) -> Result<Command, UsageError> {
    match rest {
        ["add", amount, description] => Ok(Command::ExpenseAdd {
            amount: amount.to_string(),
            description: description.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }),
        ["add", amount, description, category] => Ok(Command::ExpenseAdd {
            amount: amount.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        }),
        ["edit", id, amount, description] => Ok(Command::ExpenseEdit {
            id: parse_id(id)?,
            amount: amount.to_string(),
            description: description.to_string(),
            category: None,
        }),
        ["edit", id, amount, description, category] => Ok(Command::ExpenseEdit {
            id: parse_id(id)?,
            amount: amount.to_string(),
            description: description.to_string(),
            category: Some(category.to_string()),
        }),
        ["delete", id] => Ok(Command::ExpenseDelete {
            id: parse_id(id)?,
            assume_yes: false,
        }),
        ["delete", id, "--yes"] | ["delete", "--yes", id] => Ok(Command::ExpenseDelete {
            id: parse_id(id)?,
            assume_yes: true,
        }),
        ["list"] => Ok(Command::ExpenseList),
        ["summary"] => Ok(Command::ExpenseSummary),
        _ => Err(UsageError(format!("bad expense arguments: {}", rest.join(" ")))),
    }
}

fn parse_note(rest: &[&str]) -> Result<Command, UsageError> {
    match rest {
        ["add", kind, title, content] => Ok(Command::NoteAdd {
            kind: parse_note_type(kind)?,
            title: title.to_string(),
            content: content.to_string(),
        }),
        ["edit", id, kind, title, content] => Ok(Command::NoteEdit {
            id: parse_id(id)?,
            kind: parse_note_type(kind)?,
            title: title.to_string(),
            content: content.to_string(),
        }),
        ["delete", id] => Ok(Command::NoteDelete {
            id: parse_id(id)?,
            assume_yes: false,
        }),
        ["delete", id, "--yes"] | ["delete", "--yes", id] => Ok(Command::NoteDelete {
            id: parse_id(id)?,
            assume_yes: true,
        }),
        ["list"] => Ok(Command::NoteList),
        _ => Err(UsageError(format!("bad note arguments: {}", rest.join(" ")))),
    }
}

fn parse_id(value: &str) -> Result<i64, UsageError> {
    value
        .trim()
        .parse()
        .map_err(|_| UsageError(format!("invalid id `{value}`")))
}

fn parse_note_type(value: &str) -> Result<NoteType, UsageError> {
    NoteType::parse(value).ok_or_else(|| UsageError(format!("unknown note type `{value}`")))
}
