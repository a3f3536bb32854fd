fn main() -> anyhow::Result<()> {
    cube_maze::flow::run()
}
