fn main() {
    let code = release_runner::run_cli();
    if code != 0 {
        std::process::exit(code);
    }
}
