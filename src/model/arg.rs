use clap::Parser;

/// Bilingo 后端服务
#[derive(Parser, Debug)]
#[command(name = "bilingo", version, about)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,
}
