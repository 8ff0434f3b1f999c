// ==========================================
// 测试用例导入 - 文件解析器实现
// ==========================================
// 阶段: parsing
// 支持: 分隔符文本 (逗号/分号/制表符/竖线) / JSON 对象或对象数组 / 表格（第一个工作表）
// 红线: 致命失败时返回零行 + 一条错误，不抛出
// ==========================================

use crate::domain::import::{CellValue, ParseMeta, ParseOptions, ParseOutput, RawRow};
use crate::domain::types::FileFormat;
use crate::importer::error::ImportError;
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{debug, warn};

/// 候选分隔符
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

// ==========================================
// UniversalFileParser - 通用解析器（自动识别格式）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, content: &[u8], options: &ParseOptions) -> ParseOutput {
        let format = detect_format(content, options);
        debug!(format = %format, bytes = content.len(), "识别文件格式");

        let mut meta = ParseMeta::new(format);
        let mut warnings = Vec::new();

        let table = match format {
            FileFormat::Delimited => parse_delimited(content, options, &mut meta, &mut warnings),
            FileFormat::Structured => parse_structured(content, &mut warnings),
            FileFormat::Spreadsheet => parse_spreadsheet(content, &mut meta),
        };

        match table {
            Ok(table) => finish(table, meta, warnings, options),
            Err(e) => {
                warn!(format = %format, error = %e, "文件解析失败");
                ParseOutput::fatal(meta, e.to_string(), warnings)
            }
        }
    }
}

// ==========================================
// 格式识别: 显式指定 > 扩展名 > 内容嗅探
// ==========================================
pub fn detect_format(content: &[u8], options: &ParseOptions) -> FileFormat {
    if let Some(format) = options.format {
        return format;
    }

    let by_extension = options
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| FileFormat::from_extension(ext));
    if let Some(format) = by_extension {
        return format;
    }

    if content.starts_with(ZIP_MAGIC) || content.starts_with(OLE_MAGIC) {
        return FileFormat::Spreadsheet;
    }

    let body = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => FileFormat::Structured,
        _ => FileFormat::Delimited,
    }
}

// ==========================================
// 分隔符识别（打分制）
// ==========================================
// 规则:
// - 列数在 [2, 50] 内: +10
// - 前两行列数一致: +5
// - 逗号: +1（平局时优先）
pub fn detect_delimiter(text: &str) -> char {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let first = lines.next().unwrap_or("");
    let second = lines.next();

    let mut best = ',';
    let mut best_score = i32::MIN;

    for &candidate in &CANDIDATE_DELIMITERS {
        let columns = count_fields(first, candidate);
        let mut score = 0;

        if (2..=50).contains(&columns) {
            score += 10;
        }
        if let Some(second) = second {
            if columns > 1 && count_fields(second, candidate) == columns {
                score += 5;
            }
        }
        if candidate == ',' {
            score += 1;
        }

        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

/// 统计引号外的字段数
fn count_fields(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut count = 1;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// 表头规范化: trim → 去除非单词字符 → 合并空白
pub fn normalize_header(raw: &str) -> String {
    let stripped = NON_WORD.replace_all(raw.trim(), "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

// ==========================================
// 中间结构
// ==========================================
enum ParsedTable {
    /// 表格型: 表头 + 单元格行
    Grid {
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    },
    /// 对象型: 每个对象一行
    Records(Vec<RawRow>),
}

// ==========================================
// 分隔符文本
// ==========================================
fn parse_delimited(
    content: &[u8],
    options: &ParseOptions,
    meta: &mut ParseMeta,
    warnings: &mut Vec<String>,
) -> Result<ParsedTable, ImportError> {
    let text = decode_text(content, meta, warnings);

    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(&text));
    if !delimiter.is_ascii() {
        return Err(ImportError::UnsupportedFormat(format!(
            "delimiter '{}' is not an ASCII character",
            delimiter
        )));
    }
    meta.delimiter = Some(delimiter);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true) // 允许行长度不一致
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(|h| h.to_string()).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|v| CellValue::Text(v.to_string()))
                .collect(),
        );
    }

    Ok(ParsedTable::Grid { headers, rows })
}

/// 解码文本: 去 BOM；非 UTF-8 按 Windows-1252 解码并告警
fn decode_text(content: &[u8], meta: &mut ParseMeta, warnings: &mut Vec<String>) -> String {
    let body = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(body);
            meta.encoding = "windows-1252".to_string();
            warnings.push("File is not valid UTF-8; decoded as Windows-1252".to_string());
            decoded.into_owned()
        }
    }
}

// ==========================================
// JSON（单对象或对象数组）
// ==========================================
fn parse_structured(content: &[u8], warnings: &mut Vec<String>) -> Result<ParsedTable, ImportError> {
    let body = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let value: Value = serde_json::from_slice(body)?;

    let items = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items,
        _ => {
            return Err(ImportError::ParseError(
                "JSON document must be an object or an array of objects".to_string(),
            ))
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => {
                let row: RawRow = map
                    .into_iter()
                    .map(|(key, value)| (normalize_header(&key), json_to_cell(value)))
                    .collect();
                rows.push(row);
            }
            other => {
                warnings.push(format!(
                    "Element {} is not an object and was ignored ({})",
                    idx + 1,
                    json_kind(&other)
                ));
            }
        }
    }

    Ok(ParsedTable::Records(rows))
}

fn json_to_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        Value::String(s) => CellValue::Text(s),
        // 数组（如 tags）拼接为逗号分隔文本
        Value::Array(items) => CellValue::Text(
            items
                .into_iter()
                .map(|v| json_to_cell(v).to_text())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => CellValue::Text(value.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==========================================
// 表格（仅第一个工作表）
// ==========================================
fn parse_spreadsheet(content: &[u8], meta: &mut ParseMeta) -> Result<ParsedTable, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;

    meta.sheet_name = workbook.sheet_names().first().cloned();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::ParseError("Spreadsheet contains no worksheets".to_string()))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row.iter().map(|cell| cell_to_value(cell).to_text()).collect(),
        None => Vec::new(),
    };
    let rows = rows_iter
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    Ok(ParsedTable::Grid { headers, rows })
}

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

// ==========================================
// 收尾: 表头检查 / 空白行统计 / 无数据告警
// ==========================================
fn finish(
    table: ParsedTable,
    mut meta: ParseMeta,
    mut warnings: Vec<String>,
    options: &ParseOptions,
) -> ParseOutput {
    let all_rows: Vec<RawRow> = match table {
        ParsedTable::Grid { headers, rows } => {
            let headers = prepare_headers(&headers, &mut warnings);
            let mut overflow_rows = 0;
            let built = rows
                .into_iter()
                .map(|cells| {
                    let mut row = RawRow::new();
                    let mut cells = cells.into_iter();
                    for header in &headers {
                        row.insert(header.clone(), cells.next().unwrap_or(CellValue::Empty));
                    }
                    // 表头之外的非空值被丢弃
                    if cells.any(|extra| !extra.is_blank()) {
                        overflow_rows += 1;
                    }
                    row
                })
                .collect();
            if overflow_rows > 0 {
                warnings.push(format!(
                    "{} row(s) have more values than headers; extra values were ignored",
                    overflow_rows
                ));
            }
            meta.headers = headers;
            built
        }
        ParsedTable::Records(rows) => {
            let mut seen = HashSet::new();
            for row in &rows {
                for (key, _) in row.iter() {
                    if seen.insert(key.to_string()) {
                        meta.headers.push(key.to_string());
                    }
                }
            }
            rows
        }
    };

    meta.total_rows = all_rows.len();
    let rows: Vec<RawRow> = all_rows.into_iter().filter(|r| !r.is_blank()).collect();
    meta.empty_rows = meta.total_rows - rows.len();

    if meta.total_rows > 0 {
        let ratio = meta.empty_rows as f64 / meta.total_rows as f64;
        if ratio > options.empty_row_warn_ratio {
            warnings.push(format!(
                "{} of {} data rows are empty",
                meta.empty_rows, meta.total_rows
            ));
        }
    }

    if rows.is_empty() {
        warnings.push("No data rows found".to_string());
    }

    debug!(
        rows = rows.len(),
        empty_rows = meta.empty_rows,
        headers = meta.headers.len(),
        "文件解析完成"
    );

    ParseOutput {
        rows,
        errors: Vec::new(),
        warnings,
        meta,
    }
}

/// 规范化表头: 空表头 → column_N，重复表头加后缀
fn prepare_headers(raw: &[String], warnings: &mut Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (idx, header) in raw.iter().enumerate() {
        let mut name = normalize_header(header);
        if name.is_empty() {
            name = format!("column_{}", idx + 1);
            warnings.push(format!("Empty header in column {}; using '{}'", idx + 1, name));
        }

        if !seen.insert(name.clone()) {
            let mut suffix = 2;
            while seen.contains(&format!("{}_{}", name, suffix)) {
                suffix += 1;
            }
            let renamed = format!("{}_{}", name, suffix);
            warnings.push(format!(
                "Duplicate header '{}' in column {}; renamed to '{}'",
                name,
                idx + 1,
                renamed
            ));
            seen.insert(renamed.clone());
            name = renamed;
        }

        headers.push(name);
    }

    headers
}
