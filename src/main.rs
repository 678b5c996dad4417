fn main() -> anyhow::Result<()> {
    picsort_app::run()
}
