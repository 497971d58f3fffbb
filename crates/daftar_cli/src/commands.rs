//! Command execution against the core books and auth gate.
//!
//! # Responsibility
//! - Run one parsed `Command` and render its result as text.
//! - Map core errors to Arabic user messages and exit codes.
//!
//! # Invariants
//! - Delete without `--yes` only mutates after an affirmative answer on the
//!   input stream.
//! - Data commands are refused when a gate is present and no session is live.

use crate::args::Command;
use daftar_core::{
    format_amount, AuthGate, AuthGateError, AuthProvider, ConfigError, DbError, Expense,
    ExpenseBook, ExpenseServiceError, LocalStore, LoginOutcome, Note, NoteBook, NoteServiceError,
    ResetOutcome, StoreError,
};
use log::{error, info};
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

const AFFIRMATIVE_ANSWERS: [&str; 4] = ["y", "yes", "نعم", "ن"];

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Db(DbError),
    Store(StoreError),
    Expense(ExpenseServiceError),
    Note(NoteServiceError),
    AuthNotConfigured,
    LoginRequired,
    Busy(AuthGateError),
    LoginFailed(LoginOutcome),
    ResetFailed(String),
    Io(std::io::Error),
}

impl CliError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => format!("إعدادات غير صالحة: {err}"),
            Self::Db(_) | Self::Store(_) => "حدث خطأ أثناء الوصول إلى البيانات".to_string(),
            Self::Expense(err) => err.user_message().to_string(),
            Self::Note(err) => err.user_message().to_string(),
            Self::AuthNotConfigured => "تسجيل الدخول غير مهيأ".to_string(),
            Self::LoginRequired => "الرجاء تسجيل الدخول أولاً".to_string(),
            Self::Busy(_) => "هناك طلب قيد التنفيذ، الرجاء الانتظار".to_string(),
            Self::LoginFailed(outcome) => outcome.user_message().to_string(),
            Self::ResetFailed(message) => format!("تعذر إرسال رابط إعادة التعيين: {message}"),
            Self::Io(_) => "حدث خطأ في الإدخال أو الإخراج".to_string(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Expense(err) => write!(f, "{err}"),
            Self::Note(err) => write!(f, "{err}"),
            Self::AuthNotConfigured => write!(f, "auth is not configured"),
            Self::LoginRequired => write!(f, "no live session"),
            Self::Busy(err) => write!(f, "{err}"),
            Self::LoginFailed(outcome) => write!(f, "login failed: {outcome:?}"),
            Self::ResetFailed(message) => write!(f, "password reset failed: {message}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ExpenseServiceError> for CliError {
    fn from(value: ExpenseServiceError) -> Self {
        Self::Expense(value)
    }
}

impl From<NoteServiceError> for CliError {
    fn from(value: NoteServiceError) -> Self {
        Self::Note(value)
    }
}

impl From<AuthGateError> for CliError {
    fn from(value: AuthGateError) -> Self {
        Self::Busy(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Everything a command may touch.
pub struct Context<'a, S: LocalStore, P: AuthProvider, R: BufRead, W: Write> {
    pub store: S,
    pub gate: Option<&'a AuthGate<P>>,
    pub input: R,
    pub out: W,
}

/// Runs one command.
pub fn run<S, P, R, W>(command: &Command, ctx: &mut Context<'_, S, P, R, W>) -> Result<(), CliError>
where
    S: LocalStore + Copy,
    P: AuthProvider,
    R: BufRead,
    W: Write,
{
    if command.needs_session() {
        if let Some(gate) = ctx.gate {
            if !gate.check_session() {
                return Err(CliError::LoginRequired);
            }
        }
    }

    match command {
        Command::ExpenseAdd {
            amount,
            description,
            category,
        } => {
            let mut book = ExpenseBook::open(ctx.store)?;
            let expense = book.create(amount, description, category)?;
            writeln!(ctx.out, "تمت إضافة المصروف بنجاح")?;
            write_expense(&mut ctx.out, &expense)?;
        }
        Command::ExpenseEdit {
            id,
            amount,
            description,
            category,
        } => {
            let mut book = ExpenseBook::open(ctx.store)?;
            let category = match category {
                Some(category) => category.clone(),
                None => book
                    .get(*id)
                    .map(|expense| expense.category.clone())
                    .ok_or(ExpenseServiceError::NotFound(*id))?,
            };
            match book.update(*id, amount, description, &category)? {
                Some(expense) => {
                    writeln!(ctx.out, "تم تحديث المصروف بنجاح")?;
                    write_expense(&mut ctx.out, &expense)?;
                }
                None => return Err(ExpenseServiceError::NotFound(*id).into()),
            }
        }
        Command::ExpenseDelete { id, assume_yes } => {
            let mut book = ExpenseBook::open(ctx.store)?;
            book.request_delete(*id)?;
            if *assume_yes || confirm(ctx, "هل أنت متأكد من حذف هذا المصروف؟")? {
                let removed = book.confirm_delete()?;
                writeln!(ctx.out, "تم حذف المصروف {}", removed.id)?;
            } else {
                book.cancel_delete();
                writeln!(ctx.out, "تم إلغاء الحذف")?;
            }
        }
        Command::ExpenseList => {
            let book = ExpenseBook::open(ctx.store)?;
            if book.expenses().is_empty() {
                writeln!(ctx.out, "لا توجد مصروفات")?;
            }
            for expense in book.expenses() {
                write_expense(&mut ctx.out, expense)?;
            }
        }
        Command::ExpenseSummary => {
            let book = ExpenseBook::open(ctx.store)?;
            let summary = book.summary();
            writeln!(ctx.out, "عدد المصروفات: {}", summary.count)?;
            writeln!(ctx.out, "إجمالي المصروفات: {}", format_amount(summary.total))?;
            writeln!(
                ctx.out,
                "مصروفات آخر 7 أيام: {}",
                format_amount(summary.trailing_week_total)
            )?;
            writeln!(
                ctx.out,
                "متوسط المصروف اليومي: {}",
                format_amount(summary.average_per_day)
            )?;
            match summary.week_over_week_change {
                Some(change) => writeln!(ctx.out, "التغير الأسبوعي: {}%", format_amount(change))?,
                None => writeln!(ctx.out, "التغير الأسبوعي: -")?,
            }
            for entry in &summary.category_totals {
                writeln!(ctx.out, "  {}: {}", entry.category, format_amount(entry.total))?;
            }
        }
        Command::CategoryAdd { name } => {
            let mut book = ExpenseBook::open(ctx.store)?;
            let label = book.add_category(name)?;
            writeln!(ctx.out, "تمت إضافة الفئة: {label}")?;
        }
        Command::CategoryList => {
            let book = ExpenseBook::open(ctx.store)?;
            for category in book.categories() {
                writeln!(ctx.out, "{category}")?;
            }
        }
        Command::NoteAdd {
            kind,
            title,
            content,
        } => {
            let mut book = NoteBook::open(ctx.store)?;
            let note = book.create(title, content, *kind)?;
            writeln!(ctx.out, "تمت إضافة الملاحظة بنجاح")?;
            write_note(&mut ctx.out, &note)?;
        }
        Command::NoteEdit {
            id,
            kind,
            title,
            content,
        } => {
            let mut book = NoteBook::open(ctx.store)?;
            match book.update(*id, title, content, *kind)? {
                Some(note) => {
                    writeln!(ctx.out, "تم تحديث الملاحظة بنجاح")?;
                    write_note(&mut ctx.out, &note)?;
                }
                None => return Err(NoteServiceError::NotFound(*id).into()),
            }
        }
        Command::NoteDelete { id, assume_yes } => {
            let mut book = NoteBook::open(ctx.store)?;
            book.request_delete(*id)?;
            if *assume_yes || confirm(ctx, "هل أنت متأكد من حذف هذه الملاحظة؟")? {
                let removed = book.confirm_delete()?;
                writeln!(ctx.out, "تم حذف الملاحظة {}", removed.id)?;
            } else {
                book.cancel_delete();
                writeln!(ctx.out, "تم إلغاء الحذف")?;
            }
        }
        Command::NoteList => {
            let book = NoteBook::open(ctx.store)?;
            if book.notes().is_empty() {
                writeln!(ctx.out, "لا توجد ملاحظات")?;
            }
            for note in book.notes() {
                write_note(&mut ctx.out, note)?;
            }
        }
        Command::Login { username, password } => {
            let gate = ctx.gate.ok_or(CliError::AuthNotConfigured)?;
            match gate.login(username, password)? {
                LoginOutcome::Success => {
                    writeln!(ctx.out, "{}", LoginOutcome::Success.user_message())?
                }
                failure => return Err(CliError::LoginFailed(failure)),
            }
        }
        Command::Logout => {
            let gate = ctx.gate.ok_or(CliError::AuthNotConfigured)?;
            gate.sign_out()?;
            writeln!(ctx.out, "تم تسجيل الخروج")?;
        }
        Command::Session => {
            let gate = ctx.gate.ok_or(CliError::AuthNotConfigured)?;
            if gate.check_session() {
                writeln!(ctx.out, "الجلسة نشطة")?;
            } else {
                writeln!(ctx.out, "لا توجد جلسة نشطة")?;
            }
        }
        Command::ResetPassword => {
            let gate = ctx.gate.ok_or(CliError::AuthNotConfigured)?;
            match gate.reset_password()? {
                ResetOutcome::Sent => writeln!(
                    ctx.out,
                    "تم إرسال رابط إعادة تعيين كلمة المرور إلى {}",
                    gate.credentials().email
                )?,
                ResetOutcome::Failed(message) => return Err(CliError::ResetFailed(message)),
            }
        }
        Command::Version => {
            writeln!(ctx.out, "daftar {}", daftar_core::core_version())?;
        }
    }

    Ok(())
}

fn confirm<S, P, R, W>(ctx: &mut Context<'_, S, P, R, W>, prompt: &str) -> Result<bool, CliError>
where
    S: LocalStore,
    P: AuthProvider,
    R: BufRead,
    W: Write,
{
    write!(ctx.out, "{prompt} (y/N) ")?;
    ctx.out.flush()?;
    let mut answer = String::new();
    ctx.input.read_line(&mut answer)?;
    let accepted = AFFIRMATIVE_ANSWERS.contains(&answer.trim().to_lowercase().as_str());
    info!("event=delete_confirm module=cli status=ok accepted={accepted}");
    Ok(accepted)
}

fn write_expense(out: &mut impl Write, expense: &Expense) -> std::io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}",
        expense.id,
        expense.date,
        format_amount(expense.amount),
        expense.category,
        expense.description
    )
}

fn write_note(out: &mut impl Write, note: &Note) -> std::io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{} {}\t{}\t{}",
        note.id,
        note.date,
        note.kind.icon(),
        note.kind.label(),
        note.title,
        note.content
    )
}

/// Logs the failure and returns the process exit code for it.
pub fn report_failure(err: &CliError) -> u8 {
    error!("event=cli_command module=cli status=error error={err}");
    match err {
        CliError::Config(_) => 2,
        CliError::LoginRequired | CliError::LoginFailed(_) | CliError::AuthNotConfigured => 3,
        _ => 1,
    }
}
