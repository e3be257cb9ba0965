use crate::error::{HopError, Result};
use std::collections::HashMap;
use tokio::process::Command;
use tracing::debug;

/// Запустить внешнюю утилиту и вернуть её stdout
pub async fn run_tool(program: &str, args: &[&str], envs: &HashMap<String, String>) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .envs(envs)
        .output()
        .await
        .map_err(|e| HopError::ServiceUnavailable(format!("{} не найден: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} вернул ошибку: {}", program, stderr.trim());
        return Err(HopError::ServiceUnavailable(format!(
            "{} вернул ошибку: {}",
            program,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Одно число в выводе, как у `xdotool get_desktop`
pub fn parse_number(stdout: &str) -> Option<i64> {
    stdout.trim().parse().ok()
}
