fn main() -> anyhow::Result<()> {
    rescope_cli::run()
}
