//! # 美化输出工具
//!
//! 统一的终端输出样式：状态前缀、标题栏、键值行。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块和 `main.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;
use std::path::Path;

pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印 输入 -> 输出 的文件对应关系
pub fn print_conversion(from: &Path, to: &Path) {
    println!(
        "{} {} {} {}",
        "[OK]".green().bold(),
        from.display().to_string().dimmed(),
        "->".cyan(),
        to.display()
    );
}

/// 打印已写出的文件
pub fn print_written(what: &str, path: &Path) {
    println!(
        "{} {:<14} {}",
        "[OK]".green().bold(),
        what,
        path.display().to_string().cyan()
    );
}

/// 打印对齐的键值行
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<22} {}", format!("{}:", key).dimmed(), value);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}
