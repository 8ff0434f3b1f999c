// ==========================================
// 测试用例导入 - 字段映射器实现
// ==========================================
// 职责: 原始列 → 规范字段 + 显式文本化
// 解析顺序（每个规范字段）:
//   1. 精确键名
//   2. 大小写变体（全大写/全小写/首字母大写）
//   3. 驼峰拆词后的 空格/下划线/连字符 变体
//   4. 固定同义词表
//   5. 忽略大小写与分隔符的兜底匹配
// 红线: 纯函数；无对应列的字段取默认值，记录永远结构完整
//       列存在但值为空时保留空串，交给自动修复（补齐缺失字段）或校验处理
// ==========================================

use crate::domain::import::RawRow;
use crate::domain::test_case::{CandidateRecord, CanonicalField};
use crate::importer::importer_trait::FieldMapper;

pub struct SynonymFieldMapper;

impl FieldMapper for SynonymFieldMapper {
    fn map(
        &self,
        row: &RawRow,
        row_index: usize,
        project_id: Option<&str>,
        suite_id: Option<&str>,
    ) -> CandidateRecord {
        let mut record = CandidateRecord::with_defaults(row_index);
        record.project_id = project_id.map(|s| s.to_string());
        record.suite_id = suite_id.map(|s| s.to_string());

        for field in CanonicalField::ALL {
            if let Some(value) = self.resolve(row, field) {
                record.set(field, value);
            }
        }

        record
    }
}

impl SynonymFieldMapper {
    /// 按解析顺序生成候选列名（去重，保持顺序）
    pub fn candidate_keys(field: CanonicalField) -> Vec<String> {
        let key = field.key();
        let words = split_camel(key);

        let mut keys = vec![
            key.to_string(),
            key.to_uppercase(),
            key.to_lowercase(),
            title_case(key),
        ];

        for sep in [" ", "_", "-"] {
            let lower = words.join(sep);
            let title = words.iter().map(|w| title_case(w)).collect::<Vec<_>>().join(sep);
            keys.push(title);
            keys.push(lower.clone());
            keys.push(lower.to_uppercase());
        }

        keys.extend(field.synonyms().iter().map(|s| s.to_string()));

        let mut unique = Vec::with_capacity(keys.len());
        for k in keys {
            if !unique.contains(&k) {
                unique.push(k);
            }
        }
        unique
    }

    /// 解析单个字段：首个非空值生效；匹配到的列全为空时返回空串，无匹配列返回 None
    fn resolve(&self, row: &RawRow, field: CanonicalField) -> Option<String> {
        let candidates = Self::candidate_keys(field);
        let mut present = false;

        for candidate in &candidates {
            if let Some(value) = row.get(candidate) {
                if !value.is_blank() {
                    return Some(value.to_text());
                }
                present = true;
            }
        }

        // 兜底: 折叠后比较
        let folded: Vec<String> = candidates.iter().map(|c| fold_key(c)).collect();
        for (header, value) in row.iter() {
            if !folded.contains(&fold_key(header)) {
                continue;
            }
            if !value.is_blank() {
                return Some(value.to_text());
            }
            present = true;
        }

        present.then(String::new)
    }
}

/// 驼峰拆词（全部小写）
fn split_camel(key: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// 去除空格/下划线/连字符并小写
fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::CellValue;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_candidate_keys_order() {
        let keys = SynonymFieldMapper::candidate_keys(CanonicalField::ExpectedResult);
        assert_eq!(keys[0], "expectedResult");
        assert!(keys.contains(&"Expected Result".to_string()));
        assert!(keys.contains(&"expected_result".to_string()));
        assert!(keys.contains(&"EXPECTED-RESULT".to_string()));
        let variant_pos = keys.iter().position(|k| k == "Expected Result").unwrap();
        let synonym_pos = keys.iter().position(|k| k == "Expected").unwrap();
        assert!(variant_pos < synonym_pos);
    }

    #[test]
    fn test_map_resolves_variants_and_synonyms() {
        let raw = row(&[
            ("Test Case Name", "Login works"),
            ("Expected Result", "User is logged in"),
            ("Assigned To", "alice"),
            ("PRIORITY", "high"),
            ("test_steps", "1. open\n2. login"),
        ]);
        let record = SynonymFieldMapper.map(&raw, 1, Some("p1"), None);

        assert_eq!(record.name, "Login works");
        assert_eq!(record.expected_result, "User is logged in");
        assert_eq!(record.assigned_tester, "alice");
        assert_eq!(record.priority, "high");
        assert_eq!(record.test_steps, "1. open\n2. login");
        assert_eq!(record.project_id.as_deref(), Some("p1"));
        assert_eq!(record.suite_id, None);
    }

    #[test]
    fn test_map_defaults_when_unresolved() {
        let raw = row(&[("Name", "X")]);
        let record = SynonymFieldMapper.map(&raw, 7, None, None);
        assert_eq!(record.row_index, 7);
        assert_eq!(record.status, "not_run");
        assert_eq!(record.priority, "medium");
        assert_eq!(record.description, "");
    }

    #[test]
    fn test_map_blank_column_stays_empty() {
        let raw = row(&[("Name", "X"), ("Status", "  "), ("Category", "")]);
        let record = SynonymFieldMapper.map(&raw, 1, None, None);
        assert_eq!(record.status, "");
        assert_eq!(record.category, "");
        assert_eq!(record.priority, "medium");
    }

    #[test]
    fn test_map_later_non_blank_column_wins() {
        let raw = row(&[("Status", ""), ("Test Status", "passed")]);
        let record = SynonymFieldMapper.map(&raw, 1, None, None);
        assert_eq!(record.status, "passed");
    }

    #[test]
    fn test_map_exact_key_wins_over_synonym() {
        let raw = row(&[("Owner", "bob"), ("assignedTester", "carol")]);
        let record = SynonymFieldMapper.map(&raw, 1, None, None);
        assert_eq!(record.assigned_tester, "carol");
    }

    #[test]
    fn test_map_fallback_fold() {
        let raw = row(&[("Test  Steps", "do it"), ("ASSIGNEE", "dan")]);
        let record = SynonymFieldMapper.map(&raw, 1, None, None);
        assert_eq!(record.test_steps, "do it");
        assert_eq!(record.assigned_tester, "dan");
    }

    #[test]
    fn test_map_numbers_and_bools_become_text() {
        let mut raw = RawRow::new();
        raw.insert("name", CellValue::Number(1001.0));
        raw.insert("testData", CellValue::Bool(false));
        let record = SynonymFieldMapper.map(&raw, 1, None, None);
        assert_eq!(record.name, "1001");
        assert_eq!(record.test_data, "false");
    }

    #[test]
    fn test_map_is_pure() {
        let raw = row(&[("Title", "Same"), ("Env", "staging")]);
        let a = SynonymFieldMapper.map(&raw, 2, Some("p"), Some("s"));
        let b = SynonymFieldMapper.map(&raw, 2, Some("p"), Some("s"));
        assert_eq!(a, b);
        assert_eq!(a.environment, "staging");
    }
}
