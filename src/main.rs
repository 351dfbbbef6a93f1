fn main() -> anyhow::Result<()> {
    wakechain_lib::run()
}
