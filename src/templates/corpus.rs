//! Reference game templates
//!
//! The corpus is built once and shared read-only (behind an `Arc`) by every
//! retrieval call and pipeline run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id of the template returned when nothing else matches
pub const DEFAULT_TEMPLATE_ID: &str = "snake_game";

/// One reference game descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub game_type: String,
    pub tech_stack: String,
    pub mechanics: Vec<String>,
    /// File name to its role in the game
    pub file_structure: BTreeMap<String, String>,
    /// Opaque handle for the reference implementation
    pub reference_code: String,
    pub keywords: Vec<String>,
}

impl TemplateRecord {
    /// Text used to embed this template for vector search
    pub fn document(&self) -> String {
        format!(
            "游戏名称: {}\n描述: {}\n类型: {}\n技术栈: {}\n玩法机制: {}\n关键词: {}",
            self.name,
            self.description,
            self.game_type,
            self.tech_stack,
            self.mechanics.join(", "),
            self.keywords.join(", ")
        )
    }
}

/// Immutable set of templates, in insertion order
#[derive(Debug, Clone)]
pub struct TemplateCorpus {
    templates: Vec<TemplateRecord>,
    default_index: usize,
}

impl TemplateCorpus {
    /// Builds a corpus; `default_id` must name one of the templates
    pub fn new(templates: Vec<TemplateRecord>, default_id: &str) -> Option<Self> {
        let default_index = templates.iter().position(|t| t.id == default_id)?;
        Some(Self {
            templates,
            default_index,
        })
    }

    /// The six built-in casual game templates
    pub fn with_defaults() -> Self {
        let templates = vec![
            template(
                "snake_game",
                "贪吃蛇",
                "经典的贪吃蛇游戏，控制蛇吃食物变长",
                "Vanilla JS + Canvas API",
                &["蛇的移动", "食物生成", "碰撞检测", "得分系统", "游戏结束"],
                "snake_template",
                &["蛇", "吃", "移动", "canvas", "2D", "经典", "简单", "休闲"],
            ),
            template(
                "brick_breaker",
                "打砖块",
                "用挡板接球并打破所有砖块",
                "Vanilla JS + Canvas API",
                &["挡板控制", "球体物理", "砖块碰撞", "生命系统", "关卡设计"],
                "brick_breaker_template",
                &["挡板", "球", "砖块", "反弹", "经典", "街机", "消除"],
            ),
            template(
                "whack_a_mole",
                "打地鼠",
                "点击随机出现的地鼠得分",
                "Vanilla JS + DOM操作",
                &["随机出现", "点击判定", "时间限制", "计分系统", "难度递增"],
                "whack_mole_template",
                &["地鼠", "点击", "反应", "速度", "儿童", "休闲", "趣味"],
            ),
            template(
                "dodge_ball",
                "躲避球",
                "躲避不断出现的障碍物",
                "Vanilla JS + Canvas API",
                &["玩家移动", "障碍物生成", "碰撞检测", "生存时间", "得分系统"],
                "dodge_ball_template",
                &["躲避", "障碍", "移动", "生存", "反应", "速度", "挑战"],
            ),
            template(
                "guess_number",
                "猜数字",
                "猜测随机生成的数字",
                "Vanilla JS + DOM操作",
                &["随机数生成", "输入判断", "提示反馈", "尝试次数", "胜利条件"],
                "guess_number_template",
                &["数字", "猜测", "逻辑", "益智", "简单", "儿童", "教育"],
            ),
            template(
                "tetris",
                "俄罗斯方块",
                "经典方块消除游戏",
                "Vanilla JS + Canvas API",
                &["方块下落", "移动旋转", "行消除", "得分系统", "等级系统"],
                "tetris_template",
                &["方块", "消除", "下落", "旋转", "经典", "益智", "策略"],
            ),
        ];

        Self {
            templates,
            default_index: 0,
        }
    }

    pub fn get(&self, id: &str) -> Option<&TemplateRecord> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[TemplateRecord] {
        &self.templates
    }

    pub fn default_template(&self) -> &TemplateRecord {
        &self.templates[self.default_index]
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCorpus {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    tech_stack: &str,
    mechanics: &[&str],
    reference_code: &str,
    keywords: &[&str],
) -> TemplateRecord {
    let file_structure = [
        ("index.html", "主页面"),
        ("styles.css", "样式文件"),
        ("game.js", "游戏逻辑"),
    ]
    .into_iter()
    .map(|(file, role)| (file.to_string(), role.to_string()))
    .collect();

    TemplateRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        game_type: name.to_string(),
        tech_stack: tech_stack.to_string(),
        mechanics: mechanics.iter().map(|s| s.to_string()).collect(),
        file_structure,
        reference_code: reference_code.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_corpus() {
        let corpus = TemplateCorpus::with_defaults();
        assert_eq!(corpus.len(), 6);
        assert_eq!(corpus.default_template().id, DEFAULT_TEMPLATE_ID);
        assert_eq!(corpus.get("tetris").unwrap().name, "俄罗斯方块");
        assert!(corpus.get("pong").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let corpus = TemplateCorpus::with_defaults();
        let mut ids: Vec<&str> = corpus.all().iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), corpus.len());
    }

    #[test]
    fn test_new_requires_known_default() {
        let templates = TemplateCorpus::with_defaults().all().to_vec();
        assert!(TemplateCorpus::new(templates.clone(), "tetris").is_some());
        assert!(TemplateCorpus::new(templates, "missing").is_none());
        assert!(TemplateCorpus::new(Vec::new(), DEFAULT_TEMPLATE_ID).is_none());
    }

    #[test]
    fn test_document_mentions_keywords() {
        let corpus = TemplateCorpus::with_defaults();
        let doc = corpus.get("brick_breaker").unwrap().document();
        assert!(doc.contains("打砖块"));
        assert!(doc.contains("挡板, 球, 砖块"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let corpus = TemplateCorpus::with_defaults();
        let json = serde_json::to_value(corpus.default_template()).unwrap();
        assert_eq!(json["gameType"], "贪吃蛇");
        assert_eq!(json["fileStructure"]["game.js"], "游戏逻辑");
    }
}
