use anyhow::Error;
use setu_config::ConfigError;
use setu_core::CoreError;
use setu_dispatch::DispatchError;
use setu_server::ApiError;
use setu_store::error::{StoreError, StoreErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return ExitCode::from(match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
            });
        }
        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            return ExitCode::from(store_exit_code(store_err));
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return ExitCode::from(config_exit_code(config_err));
        }
        if let Some(api_err) = cause.downcast_ref::<ApiError>() {
            return ExitCode::from(api_exit_code(api_err));
        }
        if let Some(dispatch_err) = cause.downcast_ref::<DispatchError>() {
            return ExitCode::from(dispatch_exit_code(dispatch_err));
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }
    ExitCode::from(EXIT_FAILURE)
}

fn store_exit_code(err: &StoreError) -> u8 {
    match err.kind() {
        StoreErrorKind::NotFound => EXIT_NOT_FOUND,
        StoreErrorKind::InvalidId | StoreErrorKind::InvalidDataPath | StoreErrorKind::Core => {
            EXIT_INVALID_INPUT
        }
        StoreErrorKind::MissingHomeDir
        | StoreErrorKind::Migration
        | StoreErrorKind::Sql
        | StoreErrorKind::Io => EXIT_FAILURE,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidCountryCode(_)
        | ConfigError::InvalidBind(_)
        | ConfigError::InvalidTwilioField { .. }
        | ConfigError::MissingTwilioSection
        | ConfigError::VerifyWithoutTwilio
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn api_exit_code(err: &ApiError) -> u8 {
    match err {
        ApiError::Validation(_) => EXIT_INVALID_INPUT,
        ApiError::NotFound(_) => EXIT_NOT_FOUND,
        ApiError::Unavailable(_) | ApiError::Upstream(_) | ApiError::Internal(_) => EXIT_FAILURE,
    }
}

fn dispatch_exit_code(err: &DispatchError) -> u8 {
    match err {
        DispatchError::MissingPhone | DispatchError::InvalidPhone(_) => EXIT_INVALID_INPUT,
        DispatchError::Config(_) | DispatchError::Unavailable(_) => EXIT_INVALID_INPUT,
        _ => EXIT_FAILURE,
    }
}
