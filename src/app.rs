//! 应用层 - 交互式面试训练
//!
//! 宿主层参考实现：从标准输入读取回答，驱动面试流程，
//! 展示反馈与下一问，结束后输出统计、总评与翻译投影。
//! 页面渲染、HTTP 路由等外层界面不在本 crate 范围内

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{load_deployment, SessionPhase, SessionState, Speaker};
use crate::services::{
    LlmFeedbackGenerator, LlmQuestionGenerator, LlmSummaryGenerator, LlmTranslator,
    TranslationOverlay,
};
use crate::utils::logging;
use crate::workflow::InterviewFlow;

/// 会话快照的源语言（部署数据为日语）
const SOURCE_LOCALE: &str = "ja";

/// 应用主结构
pub struct App {
    config: Config,
    flow: InterviewFlow,
    overlay: TranslationOverlay,
    /// 反馈字段的展示顺序
    feedback_keys: Vec<String>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 加载部署配置；文件不存在时回退到内置默认部署
        let deployment = match load_deployment(config.deployment_file.as_ref()).await {
            Ok(deployment) => deployment,
            Err(e) => {
                warn!("⚠️ 部署配置加载失败，使用内置默认部署: {}", e);
                Default::default()
            }
        };

        logging::log_startup(
            &config.llm_model_name,
            deployment.catalog_size(),
            deployment.max_questions,
        );

        let feedback_keys = deployment
            .feedback_schema
            .keys()
            .into_iter()
            .map(str::to_string)
            .collect();

        let question_gen = Box::new(LlmQuestionGenerator::new(&config, &deployment));
        let feedback_gen = Box::new(LlmFeedbackGenerator::new(&config, &deployment));
        let summary_gen = Box::new(LlmSummaryGenerator::new(&config));
        let overlay =
            TranslationOverlay::new(Box::new(LlmTranslator::new(&config)), SOURCE_LOCALE);

        let flow = InterviewFlow::new(deployment, question_gen, feedback_gen, summary_gen);

        Ok(Self {
            config,
            flow,
            overlay,
            feedback_keys,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        let state = self.flow.start()?;
        print_latest_question(&state);

        // 主循环：读回答 → 跑回合 → 展示反馈与下一问
        while !self.flow.is_complete() {
            let answer = read_answer()?;
            if answer.trim().is_empty() {
                warn!("回答不能为空，请重新输入");
                continue;
            }

            self.submit_with_retry(&answer).await?;
        }

        self.finish().await
    }

    /// 提交回答；回合中断时由用户决定是否续跑
    async fn submit_with_retry(&mut self, answer: &str) -> Result<()> {
        loop {
            match self.flow.submit_answer(answer).await {
                Ok(state) => {
                    self.print_latest_feedback(&state);
                    print_latest_question(&state);
                    return Ok(());
                }
                Err(e) if e.is_timeout() => {
                    error!("⏰ 服务等待超时: {}", e);
                }
                Err(e) => {
                    error!("❌ 回合处理失败: {}", e);
                }
            }

            if !confirm_retry()? {
                info!("已放弃本轮，会话保持可续跑状态");
                return Ok(());
            }
        }
    }

    /// 展示最新一条反馈
    fn print_latest_feedback(&self, state: &SessionState) {
        let Some(record) = state.feedbacks.last() else {
            return;
        };

        println!("\n---------- 即時フィードバック ----------");
        for key in &self.feedback_keys {
            match record.get(key) {
                Some(value) if value.is_string() => {
                    println!("[{}] {}", key, value.as_str().unwrap_or_default());
                }
                Some(value) => println!("[{}] {}", key, value),
                None => {}
            }
        }
        println!("----------------------------------------\n");
    }

    /// 收尾：统计、总评、翻译投影、导出
    async fn finish(&mut self) -> Result<()> {
        let state = self.flow.current_state();

        logging::print_final_stats(
            state.candidate_count(),
            state.consumed.len(),
            self.flow.aggregate_score(),
        );

        match self.flow.summarize().await {
            Ok(summary) => {
                println!("\n========== 総評 ==========");
                println!("{}", summary);
                println!("==========================\n");
            }
            Err(e) => warn!("⚠️ 总评生成失败: {}", e),
        }

        // 展示语言与源语言不同时，对展示视图做翻译投影
        if self.config.display_locale != SOURCE_LOCALE {
            info!("🌐 正在生成 {} 语言的展示投影...", self.config.display_locale);
            let view = state.view();
            let projected = self.overlay.project(&view, &self.config.display_locale).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&projected).unwrap_or_default()
            );
        }

        self.export(&state)
    }

    /// 导出会话快照到文件（持久化机制由宿主自行决定）
    fn export(&self, state: &SessionState) -> Result<()> {
        let export = self.flow.export_session();
        let file_name = format!(
            "session_{}.json",
            export["session_id"].as_str().unwrap_or("unknown")
        );

        let content = serde_json::to_string_pretty(&export)
            .context("会话快照序列化失败")?;
        fs::write(&file_name, content)
            .with_context(|| format!("写入会话快照失败: {}", file_name))?;

        info!(
            "💾 会话快照已导出: {} (共 {} 条发言)",
            file_name,
            state.turns.len()
        );

        Ok(())
    }
}

// ========== 终端输入输出辅助函数 ==========

/// 打印最新一条面试官发言（下一问或结束语）
fn print_latest_question(state: &SessionState) {
    let Some(turn) = state.last_turn() else {
        return;
    };
    if turn.speaker != Speaker::Interviewer {
        return;
    }

    if state.phase == SessionPhase::Complete {
        println!("\n{}\n", turn.text);
    } else {
        println!("\nQ{}: {}\n", state.candidate_count() + 1, turn.text);
    }
}

/// 读取一行回答
fn read_answer() -> Result<String> {
    print!("A> ");
    io::stdout().flush().context("刷新标准输出失败")?;

    let mut line = String::new();
    let bytes = io::stdin()
        .read_line(&mut line)
        .context("读取标准输入失败")?;
    if bytes == 0 {
        anyhow::bail!("标准输入已关闭，无法继续面试");
    }

    Ok(line.trim().to_string())
}

/// 询问是否重试
fn confirm_retry() -> Result<bool> {
    print!("回车重试，输入 q 放弃本轮 > ");
    io::stdout().flush().context("刷新标准输出失败")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("读取标准输入失败")?;

    Ok(line.trim() != "q")
}
