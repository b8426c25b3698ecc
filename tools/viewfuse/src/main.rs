//! 三平面预测的融合, 标签还原与中层切片可视化工具.

mod runner;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    runner::run();
}
