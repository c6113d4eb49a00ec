use std::process::ExitCode;

fn main() -> ExitCode {
    match mailveil_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            mailveil_cli::output::print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
