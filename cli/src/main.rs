use ntto::NttoError;

fn main() {
    if let Err(err) = ntto_cli::run() {
        eprintln!("Error: {:#}", err);
        let code = err
            .downcast_ref::<NttoError>()
            .map(NttoError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
