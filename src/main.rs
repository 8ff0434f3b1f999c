// ==========================================
// 测试用例导入 - 命令行入口
// ==========================================
// 用法:
//   case-import import <file>... [选项]
//   case-import history
//   case-import rollback <session_id>
//   case-import export-history [file]
//   case-import import-history <file>
//   case-import clear-history
// 环境变量: CASE_IMPORT_DB_PATH 指定数据库路径
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use case_import::api::{get_default_db_path, ImportApi};
use case_import::domain::types::ResolutionStrategy;
use case_import::{logging, ImportOptions, ImportResult, ProgressReporter};
use std::path::PathBuf;

const USAGE: &str = "\
Usage:
  case-import import <file>... [--project ID] [--suite ID] [--strict] [--no-autofix]
                               [--generate-missing] [--no-dedupe] [--strategy NAME]
                               [--threshold N] [--batch-size N] [--report] [--json]
  case-import history
  case-import rollback <session_id>
  case-import export-history [file]
  case-import import-history <file>
  case-import clear-history

Strategies: keep_first, keep_last, merge_fields, skip_all";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, version = case_import::VERSION, "启动 case-import");

    let api = ImportApi::open(&db_path)
        .await
        .with_context(|| format!("failed to open database {}", db_path))?;

    match command.as_str() {
        "import" => run_import(&api, rest).await,
        "history" => run_history(&api).await,
        "rollback" => {
            let session_id = rest.first().ok_or_else(|| anyhow!("missing session id"))?;
            let outcome = api.rollback(session_id).await?;
            println!(
                "Rolled back {}: deleted {} test case(s){}",
                outcome.session_id,
                outcome.deleted,
                if outcome.stats_restored { ", statistics restored" } else { "" }
            );
            Ok(())
        }
        "export-history" => {
            let json = api.export_history().await?;
            match rest.first() {
                Some(path) => {
                    std::fs::write(path, json).with_context(|| format!("failed to write {}", path))?;
                    println!("History exported to {}", path);
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        "import-history" => {
            let path = rest.first().ok_or_else(|| anyhow!("missing history file"))?;
            let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
            let merged = api.import_history(&json).await?;
            println!("Merged {} session(s) into history", merged);
            Ok(())
        }
        "clear-history" => {
            let removed = api.clear_history().await?;
            println!("Removed {} session(s) from history", removed);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}

// ==========================================
// import 子命令
// ==========================================
struct ImportArgs {
    files: Vec<PathBuf>,
    options: ImportOptions,
    report: bool,
    json: bool,
}

fn parse_import_args(api: &ImportApi, args: &[String]) -> Result<ImportArgs> {
    let mut options = api.default_options();
    let mut files = Vec::new();
    let mut report = false;
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };
        match arg.as_str() {
            "--project" => options.project_id = Some(value("--project")?),
            "--suite" => options.suite_id = Some(value("--suite")?),
            "--strict" => options.strict_mode = true,
            "--no-autofix" => options.auto_fix = false,
            "--generate-missing" => options.generate_missing_fields = true,
            "--no-dedupe" => options.detect_duplicates = false,
            "--strategy" => {
                let raw = value("--strategy")?;
                let strategy = ResolutionStrategy::parse(&raw)
                    .ok_or_else(|| anyhow!("unknown strategy '{}'", raw))?;
                options.duplicate_strategy = Some(strategy);
            }
            "--threshold" => {
                let raw = value("--threshold")?;
                let threshold: f64 = raw
                    .parse()
                    .with_context(|| format!("invalid threshold '{}'", raw))?;
                options.duplicate_options.similarity_threshold = threshold.clamp(0.0, 1.0);
            }
            "--batch-size" => {
                let raw = value("--batch-size")?;
                let size: usize = raw
                    .parse()
                    .with_context(|| format!("invalid batch size '{}'", raw))?;
                options.batch_size = Some(size.max(1));
            }
            "--report" => report = true,
            "--json" => json = true,
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            file => files.push(PathBuf::from(file)),
        }
    }

    if files.is_empty() {
        bail!("no input file given\n\n{}", USAGE);
    }

    Ok(ImportArgs {
        files,
        options,
        report,
        json,
    })
}

async fn run_import(api: &ImportApi, args: &[String]) -> Result<()> {
    let ImportArgs {
        files,
        options,
        report,
        json,
    } = parse_import_args(api, args)?;

    let results = if files.len() == 1 {
        let (reporter, mut rx) = ProgressReporter::channel();
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                eprintln!("[{:>3}%] {}: {}", event.percent, event.stage, event.message);
            }
        });
        let result = api.import_file(&files[0], options, reporter).await;
        // reporter 已随导入结束释放，打印任务自然退出
        printer.await.ok();
        vec![result]
    } else {
        api.batch_import(files.clone(), options).await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for (file, result) in files.iter().zip(&results) {
            print_result(api, file, result, report);
        }
    }

    if results.iter().all(|r| r.success) {
        Ok(())
    } else {
        bail!("{} of {} import(s) failed", results.iter().filter(|r| !r.success).count(), results.len())
    }
}

fn print_result(api: &ImportApi, file: &std::path::Path, result: &ImportResult, report: bool) {
    println!("== {} ==", file.display());
    println!(
        "{}: {} imported, {} skipped, {} error(s), {} warning(s) in {} ms",
        if result.success { "OK" } else { "FAILED" },
        result.summary.successful_imports,
        result.summary.skipped_rows,
        result.summary.error_count,
        result.summary.warning_count,
        result.summary.processing_time_ms
    );
    if let Some(session_id) = &result.session_id {
        println!("Session: {}", session_id);
    }
    for error in &result.errors {
        println!("  error: {}", error);
    }
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }
    for skipped in &result.skipped {
        println!("  skipped row {} ({}): {}", skipped.row_index, skipped.name, skipped.reason);
    }
    for fix in &result.fixes_applied {
        println!("  fixed: {}", fix);
    }
    if report {
        if let Some(validation) = &result.validation {
            println!("{}", api.validation_report(validation));
        }
    }
}

// ==========================================
// history 子命令
// ==========================================
async fn run_history(api: &ImportApi) -> Result<()> {
    let sessions = api.list_history().await;
    if sessions.is_empty() {
        println!("No import sessions recorded");
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {}  {:<11}  {:>5} imported  {:>5} skipped  {}{}",
            session.session_id,
            session.created_at.format("%Y-%m-%d %H:%M:%S"),
            session.status.to_string(),
            session.summary.imported,
            session.summary.skipped,
            session.file_name,
            if session.can_rollback() && !session.status.is_terminal() {
                "  [rollback available]"
            } else {
                ""
            }
        );
    }
    Ok(())
}
