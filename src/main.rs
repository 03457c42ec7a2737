fn main() {
    if let Err(err) = factbook_extract::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
