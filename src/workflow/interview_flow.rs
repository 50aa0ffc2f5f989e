//! 面试会话流程 - 流程层
//!
//! 核心职责：定义"一场面试"的完整回合流程
//!
//! 回合顺序：
//! 1. 追加候选人发言
//! 2. 反馈生成 → 提取校验 → 登记反馈与评价
//! 3. 终止判断（目录耗尽或回答数达到上限 → 结束语）
//! 4. 否则向调度器要下一个维度 → 生成提问 → 追加面试官发言
//!
//! ## 原子性约定
//!
//! 反馈登记与后续出题要么都成功、要么不留半截：出题失败时
//! 已登记的反馈保留、不追加面试官发言；反馈步骤失败时候选人
//! 发言保留、不登记任何反馈。两种中断都把错误上抛，会话停在
//! 可续跑的状态，下一次 `submit_answer` 从中断的步骤继续
//! （续跑调用的入参被忽略，见 DESIGN.md 的重试策略决定）。

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::config::DeploymentConfig;
use crate::error::{AppError, AppResult, SessionError};
use crate::models::{
    EvaluationResult, FieldSpec, PayloadSchema, SessionPhase, SessionState, Speaker, Turn,
};
use crate::services::collaborator::{FeedbackGenerator, QuestionGenerator, SummaryGenerator};
use crate::services::{CoverageScheduler, ExtractMode, ResponseExtractor, ScoreAggregator};
use crate::utils::logging::truncate_text;
use crate::workflow::session_ctx::SessionCtx;

/// 回合所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleStage {
    /// 新回答，从头跑完整回合
    Fresh,
    /// 上次反馈生成中断，从反馈步骤续跑
    ResumeFeedback,
    /// 上次出题中断，从出题步骤续跑
    ResumeQuestion,
}

/// 面试会话流程
///
/// - 独占持有 `SessionState`，调用方只拿克隆快照
/// - 编排完整的回合流程，决定何时反馈、何时出题、何时收尾
/// - 协作服务以 trait 对象注入，启动时决定具体后端
pub struct InterviewFlow {
    ctx: SessionCtx,
    deployment: DeploymentConfig,
    question_gen: Box<dyn QuestionGenerator>,
    feedback_gen: Box<dyn FeedbackGenerator>,
    summary_gen: Box<dyn SummaryGenerator>,
    extractor: ResponseExtractor,
    scheduler: CoverageScheduler,
    aggregator: ScoreAggregator,
    state: SessionState,
    /// 单槽位进行中标记：一轮协作调用未归来之前拒绝新回答
    in_flight: bool,
}

impl InterviewFlow {
    /// 创建新的面试会话流程
    pub fn new(
        deployment: DeploymentConfig,
        question_gen: Box<dyn QuestionGenerator>,
        feedback_gen: Box<dyn FeedbackGenerator>,
        summary_gen: Box<dyn SummaryGenerator>,
    ) -> Self {
        let scheduler = CoverageScheduler::new(deployment.dimensions.clone());
        let aggregator = ScoreAggregator::new(deployment.weights.clone(), deployment.max_score);

        Self {
            ctx: SessionCtx::new(),
            deployment,
            question_gen,
            feedback_gen,
            summary_gen,
            extractor: ResponseExtractor::new(),
            scheduler,
            aggregator,
            state: SessionState::new(),
            in_flight: false,
        }
    }

    /// 启动会话，播种固定的开场提问
    pub fn start(&mut self) -> AppResult<SessionState> {
        if self.state.phase != SessionPhase::Idle {
            return Err(AppError::Session(SessionError::AlreadyStarted));
        }

        self.state.phase = SessionPhase::InProgress;

        let dimension_id = self.deployment.opening_dimension;
        if let Some(id) = dimension_id {
            self.state.consumed.insert(id);
        }

        let turn = Turn::interviewer(
            self.deployment.opening_question.clone(),
            self.state.next_turn_index(),
            dimension_id,
        );
        self.state.turns.push(turn);

        info!(
            "{} 🚀 会话开始: {}",
            self.ctx,
            truncate_text(&self.deployment.opening_question, 40)
        );

        Ok(self.state.clone())
    }

    /// 提交一个回答，跑完一个回合
    ///
    /// 输入校验与终态校验在任何协作调用之前同步拒绝，零副作用。
    /// 回合中途失败时状态保持可续跑，错误原样上抛
    pub async fn submit_answer(&mut self, text: &str) -> AppResult<SessionState> {
        if self.in_flight {
            return Err(AppError::Session(SessionError::CycleInProgress));
        }
        match self.state.phase {
            SessionPhase::Idle => return Err(AppError::Session(SessionError::NotStarted)),
            SessionPhase::Complete => return Err(AppError::Session(SessionError::Completed)),
            SessionPhase::InProgress => {}
        }
        if text.trim().is_empty() {
            return Err(AppError::empty_answer());
        }

        self.in_flight = true;
        let outcome = self.run_cycle(text.trim()).await;
        self.in_flight = false;

        outcome?;
        Ok(self.state.clone())
    }

    /// 当前状态的只读快照
    pub fn current_state(&self) -> SessionState {
        self.state.clone()
    }

    /// 会话是否已结束
    pub fn is_complete(&self) -> bool {
        self.state.phase == SessionPhase::Complete
    }

    /// 导出可序列化的会话快照（持久化由宿主层自行处理）
    pub fn export_session(&self) -> JsonValue {
        json!({
            "session_id": &self.ctx.session_id,
            "exported_at": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "state": &self.state,
            "view": self.state.view(),
        })
    }

    /// 当前评价列表的聚合指标
    pub fn aggregate_score(&self) -> i64 {
        self.aggregator.aggregate(&self.state.evaluations)
    }

    /// 生成总评（仅在会话结束后可用）
    pub async fn summarize(&self) -> AppResult<String> {
        if !self.is_complete() {
            return Err(AppError::Session(SessionError::NotComplete));
        }

        let qa_pairs = serde_json::to_value(self.state.qa_pairs())
            .map_err(|e| AppError::Other(format!("问答对序列化失败: {}", e)))?;
        let aggregate = self.aggregate_score();

        info!("{} 📊 正在生成总评 (聚合指标 {})...", self.ctx, aggregate);

        let raw = self
            .summary_gen
            .generate(&qa_pairs, &self.state.evaluations, aggregate)
            .await?;

        // 总评是会话文本，宽松提取
        let schema = PayloadSchema::new(vec![FieldSpec::text(
            "summary",
            self.deployment.summary_fallback.clone(),
        )]);
        let record = self.extractor.extract(&raw, &schema, ExtractMode::Lenient)?;

        Ok(record["summary"]
            .as_str()
            .unwrap_or(&self.deployment.summary_fallback)
            .to_string())
    }

    // ========== 回合内部步骤 ==========

    async fn run_cycle(&mut self, answer: &str) -> AppResult<()> {
        match self.pending_stage() {
            CycleStage::Fresh => {
                let turn = Turn::candidate(answer, self.state.next_turn_index());
                self.state.turns.push(turn);
                info!(
                    "{} 📨 第 {} 个回答已登记",
                    self.ctx,
                    self.state.candidate_count()
                );
            }
            CycleStage::ResumeFeedback => {
                warn!(
                    "{} ⚠️ 上次反馈生成中断，续跑该回答（本次入参忽略）",
                    self.ctx
                );
            }
            CycleStage::ResumeQuestion => {
                warn!("{} ⚠️ 上次出题中断，续跑下一问（本次入参忽略）", self.ctx);
            }
        }

        if self.state.feedbacks.len() < self.state.candidate_count() {
            self.run_feedback_step().await?;
        }

        self.run_next_question_step().await
    }

    /// 判断本次调用从哪个步骤开始
    fn pending_stage(&self) -> CycleStage {
        if self.state.feedbacks.len() < self.state.candidate_count() {
            return CycleStage::ResumeFeedback;
        }
        if matches!(self.state.last_turn(), Some(t) if t.speaker == Speaker::Candidate) {
            return CycleStage::ResumeQuestion;
        }
        CycleStage::Fresh
    }

    /// 反馈步骤：生成 → 提取校验 → 登记
    ///
    /// 提取成功之前不改动状态；登记反馈与登记评价一起提交
    async fn run_feedback_step(&mut self) -> AppResult<()> {
        let question_turn = self
            .state
            .last_interviewer()
            .cloned()
            .ok_or_else(|| AppError::Other("会话中不存在面试官发言".to_string()))?;

        let answer = self
            .state
            .last_turn()
            .filter(|t| t.speaker == Speaker::Candidate)
            .map(|t| t.text.clone())
            .ok_or_else(|| AppError::Other("待反馈的回答不存在".to_string()))?;

        info!("{} 🧠 正在生成反馈...", self.ctx);

        let raw = self
            .feedback_gen
            .generate(&question_turn.text, &answer)
            .await?;

        let mode = if self.deployment.strict_feedback {
            ExtractMode::Strict
        } else {
            ExtractMode::Lenient
        };
        let record = self
            .extractor
            .extract(&raw, &self.deployment.feedback_schema, mode)?;

        // ---- 提交点：以下不再失败 ----

        // 数值得分只有在被回答的提问携带维度时才能落到评价轴上
        if let (Some(score_key), Some(dimension_id)) =
            (self.deployment.score_key.as_ref(), question_turn.dimension_id)
        {
            if let Some(score) = record.get(score_key).and_then(|v| v.as_f64()) {
                let comment = self
                    .deployment
                    .comment_key
                    .as_ref()
                    .and_then(|k| record.get(k))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();

                self.state.evaluations.push(EvaluationResult {
                    dimension_id,
                    score,
                    comment,
                });
            }
        }

        self.state.feedbacks.push(record);

        info!(
            "{} ✓ 反馈已登记 ({}/{})",
            self.ctx,
            self.state.feedbacks.len(),
            self.deployment.max_questions
        );

        Ok(())
    }

    /// 终止判断与出题步骤
    ///
    /// 调度器报告目录耗尽时无条件走结束语路径，与回答轮数无关
    async fn run_next_question_step(&mut self) -> AppResult<()> {
        let answered = self.state.candidate_count();
        let next_unused = self.scheduler.next_unused(&self.state.consumed).cloned();

        let next_dimension = match next_unused {
            None => {
                self.append_closing(answered);
                return Ok(());
            }
            Some(_) if answered >= self.deployment.max_questions => {
                self.append_closing(answered);
                return Ok(());
            }
            Some(dimension) => dimension,
        };

        info!("{} 📋 下一个考察维度: {}", self.ctx, next_dimension);

        let raw = self
            .question_gen
            .generate(&self.state.turns, &next_dimension)
            .await?;

        // 提问是会话文本：宽松提取，格式问题替换为兜底提问，绝不阻塞对话
        let record =
            self.extractor
                .extract(&raw, &self.deployment.question_schema, ExtractMode::Lenient)?;

        let question = record
            .get(&self.deployment.question_key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.question_fallback());

        let turn = Turn::interviewer(
            question,
            self.state.next_turn_index(),
            Some(next_dimension.id),
        );
        self.state.turns.push(turn);
        self.state.consumed.insert(next_dimension.id);

        info!(
            "{} ❓ 已出题 (已覆盖 {}/{} 个维度)",
            self.ctx,
            self.state.consumed.len(),
            self.scheduler.catalog_size()
        );

        Ok(())
    }

    fn append_closing(&mut self, answered: usize) {
        let turn = Turn::interviewer(
            self.deployment.closing_message.clone(),
            self.state.next_turn_index(),
            None,
        );
        self.state.turns.push(turn);
        self.state.phase = SessionPhase::Complete;

        info!(
            "{} 🏁 面试结束 (回答 {} 轮, 覆盖 {} 个维度)",
            self.ctx,
            answered,
            self.state.consumed.len()
        );
    }

    fn question_fallback(&self) -> String {
        self.deployment
            .question_schema
            .field(&self.deployment.question_key)
            .and_then(|f| f.fallback.as_str())
            .unwrap_or_default()
            .to_string()
    }
}
