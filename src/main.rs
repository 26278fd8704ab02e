fn main() {
    if let Err(error) = lincfg::run_from_env() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
