//! 会话数据模型
//!
//! `SessionState` 保存一场面试的全部进展：按序的发言、已出题的
//! 评价维度、与候选人发言一一对应的反馈记录以及生命周期状态。
//! 状态只由流程层（`workflow::InterviewFlow`）修改，调用方拿到的
//! 都是克隆出来的快照。

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeSet;

/// 发言者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// 面试官
    Interviewer,
    /// 候选人
    Candidate,
}

/// 一条发言
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 发言者
    pub speaker: Speaker,
    /// 发言内容
    pub text: String,
    /// 发言序号（从1开始）
    pub turn_index: usize,
    /// 该提问针对的评价维度（开场提问与结束语不携带）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_id: Option<u32>,
}

impl Turn {
    /// 创建面试官发言
    pub fn interviewer(text: impl Into<String>, turn_index: usize, dimension_id: Option<u32>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
            turn_index,
            dimension_id,
        }
    }

    /// 创建候选人发言
    pub fn candidate(text: impl Into<String>, turn_index: usize) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
            turn_index,
            dimension_id: None,
        }
    }
}

/// 会话生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// 尚未启动
    Idle,
    /// 进行中
    InProgress,
    /// 已结束（终态）
    Complete,
}

/// 单个维度的评价结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 评价维度编号
    pub dimension_id: u32,
    /// 得分（0..=max_score）
    pub score: f64,
    /// 评语
    pub comment: String,
}

/// 问答对（用于总评与展示视图）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_id: Option<u32>,
}

/// 会话状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// 生命周期状态
    pub phase: SessionPhase,
    /// 按序的发言列表
    pub turns: Vec<Turn>,
    /// 已出题的维度编号集合
    pub consumed: BTreeSet<u32>,
    /// 反馈记录，与候选人发言按顺序一一对应
    pub feedbacks: Vec<JsonValue>,
    /// 数值评价结果（仅针对携带维度的提问）
    pub evaluations: Vec<EvaluationResult>,
}

impl SessionState {
    /// 创建空会话（尚未启动）
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            turns: Vec::new(),
            consumed: BTreeSet::new(),
            feedbacks: Vec::new(),
            evaluations: Vec::new(),
        }
    }

    /// 下一条发言的序号
    pub fn next_turn_index(&self) -> usize {
        self.turns.len() + 1
    }

    /// 候选人发言数量
    pub fn candidate_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::Candidate)
            .count()
    }

    /// 最后一条发言
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// 最近一条面试官发言
    pub fn last_interviewer(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Interviewer)
    }

    /// 提取问答对
    ///
    /// 每条面试官发言与紧随其后的候选人发言配成一对，
    /// 结束语没有后继回答，自然不会出现在结果中
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        let mut pairs = Vec::new();
        for window in self.turns.windows(2) {
            if window[0].speaker == Speaker::Interviewer && window[1].speaker == Speaker::Candidate
            {
                pairs.push(QaPair {
                    question: window[0].text.clone(),
                    answer: window[1].text.clone(),
                    dimension_id: window[0].dimension_id,
                });
            }
        }
        pairs
    }

    /// 构建展示视图
    ///
    /// 把问答对与对应的反馈记录按序合并成 `{ items: [...] }` 结构，
    /// 这是翻译投影的输入
    pub fn view(&self) -> JsonValue {
        let items: Vec<JsonValue> = self
            .qa_pairs()
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                json!({
                    "id": i + 1,
                    "question": &pair.question,
                    "answer": &pair.answer,
                    "feedback": self.feedbacks.get(i).cloned().unwrap_or(JsonValue::Null),
                })
            })
            .collect();

        json!({ "items": items })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
