use anyhow::{Context, Result};
use std::path::Path;

use crate::menu::sample::SAMPLE_QUERIES;

/// Load questions from `queries.txt`, writing the sample set when the file is missing.
pub fn load_queries(input_dir: &Path) -> Result<Vec<String>> {
    let path = input_dir.join("queries.txt");

    if !path.exists() {
        tracing::info!("No queries at {}, writing sample queries", path.display());
        std::fs::create_dir_all(input_dir)
            .with_context(|| format!("Failed to create {}", input_dir.display()))?;
        std::fs::write(&path, SAMPLE_QUERIES.join("\n"))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(SAMPLE_QUERIES.iter().map(|q| q.to_string()).collect());
    }

    read_lines(&path)
}

/// Load reference answers from `answers.txt`. Missing file means no ground truth.
pub fn load_answers(input_dir: &Path) -> Result<Vec<String>> {
    let path = input_dir.join("answers.txt");
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_lines(&path)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_queries_are_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        let queries = load_queries(&input).unwrap();
        assert_eq!(queries.len(), SAMPLE_QUERIES.len());
        assert_eq!(queries[1], "Phở bò giá bao nhiêu?");

        let reloaded = load_queries(&input).unwrap();
        assert_eq!(reloaded, queries);
    }

    #[test]
    fn test_lines_are_trimmed_and_blank_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("queries.txt"),
            "  Có món gà rán không?  \n\n\t\nCó đồ uống gì?\n",
        )
        .unwrap();
        let queries = load_queries(dir.path()).unwrap();
        assert_eq!(queries, vec!["Có món gà rán không?", "Có đồ uống gì?"]);
    }

    #[test]
    fn test_missing_answers_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_answers(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_answers_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("answers.txt"), "Có.\nKhông có.\n").unwrap();
        assert_eq!(load_answers(dir.path()).unwrap(), vec!["Có.", "Không có."]);
    }
}
