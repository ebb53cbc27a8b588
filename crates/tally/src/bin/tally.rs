//! tally - Bookkeeping over a JSON ledger file.

fn main() -> std::process::ExitCode {
    tally::cmd::main()
}
