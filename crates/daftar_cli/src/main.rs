//! `daftar` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, open the local store.
//! - Wire the hosted auth gate when configured and persist its session
//!   between invocations.

mod args;
mod commands;

use commands::{report_failure, run, CliError, Context};
use daftar_core::auth::transport::{ReqwestTransport, RetryingTransport};
use daftar_core::{
    init_logging, open_db, AppConfig, AuthGate, HostedAuthProvider, SqliteLocalStore,
};
use log::warn;
use std::process::ExitCode;

type LiveProvider = HostedAuthProvider<RetryingTransport<ReqwestTransport>>;

fn main() -> ExitCode {
    let command = match args::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n\n{}", args::USAGE);
            return ExitCode::from(64);
        }
    };

    match execute(&command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.user_message());
            ExitCode::from(report_failure(&err))
        }
    }
}

fn execute(command: &args::Command) -> Result<(), CliError> {
    if *command == args::Command::Version {
        println!("daftar {}", daftar_core::core_version());
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("logging disabled: {err}");
    }

    let conn = open_db(config.db_path())?;
    let store = SqliteLocalStore::new(&conn);
    let stdin = std::io::stdin();

    let Some(auth) = config.auth else {
        let mut ctx = Context::<_, LiveProvider, _, _> {
            store,
            gate: None,
            input: stdin.lock(),
            out: std::io::stdout().lock(),
        };
        return run(command, &mut ctx);
    };

    let provider = match HostedAuthProvider::connect(auth.hosted) {
        Ok(provider) => provider,
        Err(err) => {
            warn!("event=auth_connect module=cli status=error error={err}");
            return Err(CliError::AuthNotConfigured);
        }
    };
    provider.load_session(&store)?;
    let gate = AuthGate::new(&provider, auth.credentials);

    let mut ctx = Context {
        store,
        gate: Some(&gate),
        input: stdin.lock(),
        out: std::io::stdout().lock(),
    };
    let outcome = run(command, &mut ctx);
    provider.save_session(&store)?;
    outcome
}
