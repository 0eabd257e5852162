//! Shared fixtures for pipeline integration tests
#![allow(dead_code)]

use gamesmith::llm::{MockLLMClient, MockResponse};
use gamesmith::pipeline::{PipelineConfig, PipelineContext};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

pub fn snake_requirements() -> Value {
    json!({
        "game_type": "贪吃蛇",
        "core_mechanics": ["蛇的移动", "吃食物", "身体增长", "碰撞检测"],
        "visual_style": "极简",
        "difficulty": "简单",
        "controls": ["键盘方向键"],
        "features": ["计分系统"]
    })
}

pub fn snake_architecture() -> Value {
    json!({
        "tech_stack": "Vanilla JS + Canvas API",
        "file_structure": {
            "entry": ["index.html"],
            "logic": ["game.js"],
            "style": ["styles.css"]
        },
        "main_components": ["GameLoop", "Snake", "Food", "ScoreBoard"],
        "key_functions": ["init", "update", "render", "handleInput"]
    })
}

/// An entry page that passes every structural check
pub fn playable_html() -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>贪吃蛇</title></head>\n<body>\n\
         <canvas id=\"game\" width=\"400\" height=\"400\"></canvas>\n<script>\n\
         const ctx = document.getElementById('game').getContext('2d');\n\
         document.addEventListener('keydown', (e) => turn(e.key));\n{}</script>\n</body>\n</html>\n",
        "// game loop, scoring and game over handling\n".repeat(30)
    )
}

pub fn code_response(html: &str) -> MockResponse {
    let body = json!({
        "files": {
            "index.html": html,
            "README.md": "# 贪吃蛇"
        }
    });
    MockResponse::text(format!("Here is the game:\n```json\n{}\n```", body))
}

/// Client scripted for one successful run of all three model calls
pub fn scripted_client() -> MockLLMClient {
    let client = MockLLMClient::new();
    client.add_response(MockResponse::json(snake_requirements()));
    client.add_response(MockResponse::json(snake_architecture()));
    client.add_response(code_response(&playable_html()));
    client
}

pub fn test_context(client: Arc<MockLLMClient>, projects_dir: &Path) -> PipelineContext {
    PipelineContext::minimal(
        client,
        PipelineConfig::default().with_projects_dir(projects_dir.to_path_buf()),
    )
}
