// Deadline backend server entry point

fn main() {
    if let Err(e) = deadline_lib::run() {
        tracing::error!(error = %e, "deadline failed");
        eprintln!("deadline: {e}");
        std::process::exit(1);
    }
}
