use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 评价维度
///
/// 面试评分目录中的一个固定考察项，目录大小 K 由部署配置决定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// 维度编号（1..=K）
    pub id: u32,
    /// 维度名称
    pub name: String,
}

impl Dimension {
    /// 创建新的评价维度
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}
