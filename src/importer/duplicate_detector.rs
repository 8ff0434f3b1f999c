// ==========================================
// 测试用例导入 - 重复检测器实现
// ==========================================
// 算法: 两两比较（O(n²)，批量有界），单遍分组
// - 名称字段: 规范化后精确比较（贡献只能是 0.0 或 1.0）
// - 其他字段: 归一化 Levenshtein 相似度 1 - d(a,b) / max(|a|,|b|)
// - 空值不构成身份: 任一侧为空时该字段贡献 0.0
// - 字段命中: 该字段相似度 >= 阈值
// - 判重: 至少一个字段命中 且 平均相似度 >= 阈值
// 红线: 一条记录至多属于一个重复组；uniqueItems 恰为未被归组的记录
// ==========================================

use crate::config::DuplicateOptions;
use crate::domain::import::{DuplicateGroup, DuplicateReport, DuplicateSummary};
use crate::domain::test_case::{CandidateRecord, CanonicalField};
use crate::domain::types::{MatchType, ResolutionStrategy};
use crate::importer::importer_trait::DuplicateDetector;
use tracing::debug;

/// 两条记录的比较结果
#[derive(Debug, Clone, PartialEq)]
pub struct PairComparison {
    pub similarity: f64,
    pub matched_fields: Vec<CanonicalField>,
}

pub struct FuzzyDuplicateDetector;

impl FuzzyDuplicateDetector {
    /// 单字段相似度
    pub fn field_similarity(
        field: CanonicalField,
        a: &str,
        b: &str,
        options: &DuplicateOptions,
    ) -> f64 {
        let a = normalize(a, options);
        let b = normalize(b, options);

        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if field == CanonicalField::Name {
            return if a == b { 1.0 } else { 0.0 };
        }
        strsim::normalized_levenshtein(&a, &b)
    }

    /// 记录级比较：各字段相似度取平均
    pub fn compare(
        a: &CandidateRecord,
        b: &CandidateRecord,
        options: &DuplicateOptions,
    ) -> PairComparison {
        let threshold = options.similarity_threshold.clamp(0.0, 1.0);
        let mut total = 0.0;
        let mut matched_fields = Vec::new();

        for &field in &options.fields {
            let score = Self::field_similarity(field, a.get(field), b.get(field), options);
            if score >= threshold {
                matched_fields.push(field);
            }
            total += score;
        }

        let similarity = if options.fields.is_empty() {
            0.0
        } else {
            total / options.fields.len() as f64
        };

        PairComparison {
            similarity,
            matched_fields,
        }
    }
}

impl DuplicateDetector for FuzzyDuplicateDetector {
    fn detect(&self, records: &[CandidateRecord], options: &DuplicateOptions) -> DuplicateReport {
        let threshold = options.similarity_threshold.clamp(0.0, 1.0);
        let mut consumed = vec![false; records.len()];
        let mut groups = Vec::new();

        for i in 0..records.len() {
            if consumed[i] {
                continue;
            }

            let mut duplicates = Vec::new();
            let mut min_similarity = 1.0_f64;
            let mut matched: Vec<CanonicalField> = Vec::new();

            for j in (i + 1)..records.len() {
                if consumed[j] {
                    continue;
                }
                let cmp = Self::compare(&records[i], &records[j], options);
                if cmp.matched_fields.is_empty() || cmp.similarity < threshold {
                    continue;
                }

                consumed[j] = true;
                duplicates.push(records[j].clone());
                min_similarity = min_similarity.min(cmp.similarity);
                for field in cmp.matched_fields {
                    if !matched.contains(&field) {
                        matched.push(field);
                    }
                }
            }

            if !duplicates.is_empty() {
                consumed[i] = true;
                groups.push(DuplicateGroup {
                    original: records[i].clone(),
                    duplicates,
                    match_type: if min_similarity >= 1.0 {
                        MatchType::Exact
                    } else {
                        MatchType::Fuzzy
                    },
                    similarity: min_similarity,
                    matched_fields: matched.iter().map(|f| f.key().to_string()).collect(),
                });
            }
        }

        let unique_items: Vec<CandidateRecord> = records
            .iter()
            .zip(&consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(r, _)| r.clone())
            .collect();
        let total_duplicates: usize = groups.iter().map(|g: &DuplicateGroup| g.duplicates.len()).sum();

        debug!(
            groups = groups.len(),
            duplicates = total_duplicates,
            unique = unique_items.len(),
            "重复检测完成"
        );

        DuplicateReport {
            summary: DuplicateSummary {
                total_records: records.len(),
                unique_records: unique_items.len(),
                duplicate_groups: groups.len(),
                duplicate_records: total_duplicates,
            },
            duplicate_groups: groups,
            unique_items,
            total_duplicates,
        }
    }
}

fn normalize(value: &str, options: &DuplicateOptions) -> String {
    let value = if options.trim_whitespace { value.trim() } else { value };
    if options.case_sensitive {
        value.to_string()
    } else {
        value.to_lowercase()
    }
}

// ==========================================
// 重复组处理策略（纯函数，仅在调用方指定时使用）
// ==========================================

/// 按策略返回组内保留的记录
pub fn resolve_group(group: &DuplicateGroup, strategy: ResolutionStrategy) -> Vec<CandidateRecord> {
    match strategy {
        ResolutionStrategy::KeepFirst => vec![group.original.clone()],
        ResolutionStrategy::KeepLast => vec![group
            .duplicates
            .last()
            .unwrap_or(&group.original)
            .clone()],
        ResolutionStrategy::MergeFields => vec![merge_fields(group)],
        ResolutionStrategy::SkipAll => Vec::new(),
    }
}

/// 合并组内非空字段（原始记录的非空值优先，其余按组内顺序取第一个非空值）
pub fn merge_fields(group: &DuplicateGroup) -> CandidateRecord {
    let mut merged = group.original.clone();
    for field in CanonicalField::ALL {
        if !merged.get(field).trim().is_empty() {
            continue;
        }
        if let Some(value) = group
            .duplicates
            .iter()
            .map(|d| d.get(field))
            .find(|v| !v.trim().is_empty())
        {
            merged.set(field, value.to_string());
        }
    }
    merged
}
