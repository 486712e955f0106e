use clap::Parser;

fn main() {
    let cli = lumina_core::runtime::Cli::parse();

    if let Err(error) = lumina_core::runtime::run(cli) {
        eprintln!("[lumina-core] runtime failed: {error}");
        std::process::exit(1);
    }
}
