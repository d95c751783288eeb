fn main() -> anyhow::Result<()> {
    notegrid::cli::run()
}
