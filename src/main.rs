fn main() {
    match vizguard::run() {
        Ok(true) => {}
        // Still invalid after checking or repair: block the render step.
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
