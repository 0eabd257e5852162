//! Built-in reference game used when code generation produces nothing usable

use std::collections::BTreeMap;

const SNAKE_HTML: &str = include_str!("assets/snake.html");
const SNAKE_README: &str = "# 贪吃蛇游戏\n\n使用方向键或WASD控制蛇的移动。";

/// The fixed fallback bundle: a complete snake game with its page at `entry_file`
pub fn reference_bundle(entry_file: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (entry_file.to_string(), SNAKE_HTML.to_string()),
        ("README.md".to_string(), SNAKE_README.to_string()),
    ])
}
