/// 日志工具模块
///
/// 提供日志初始化与格式化输出的辅助函数
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// 日志级别由 `RUST_LOG` 控制，默认 info。
/// 重复调用不报错（测试中可能多次初始化）
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "interview_trainer=debug"
    } else {
        "interview_trainer=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `model_name`: 使用的模型名称
/// - `catalog_size`: 维度目录大小
/// - `max_questions`: 回答轮数上限
pub fn log_startup(model_name: &str, catalog_size: usize, max_questions: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟面试训练模式");
    info!("🤖 模型: {}", model_name);
    info!("📊 评价维度: {} 个 / 回答上限: {} 轮", catalog_size, max_questions);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `answered`: 回答轮数
/// - `covered`: 已覆盖的维度数量
/// - `aggregate_score`: 聚合指标
pub fn print_final_stats(answered: usize, covered: usize, aggregate_score: i64) {
    info!("\n{}", "=".repeat(60));
    info!("📊 面试结束统计");
    info!(
        "完成时间: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 回答轮数: {}", answered);
    info!("📋 覆盖维度: {}", covered);
    info!("📈 聚合指标: {}", aggregate_score);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短い", 10), "短い");
        assert_eq!(
            truncate_text("これはとても長いテキストです", 5),
            "これはとて..."
        );
    }
}
