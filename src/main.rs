fn main() -> miette::Result<()> {
    deffix::cli::run()
}
