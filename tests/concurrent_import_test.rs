// ==========================================
// 并发导入测试
// ==========================================
// 测试目标: 验证批量导入与并发导入共享同一历史存储时不丢失更新
// ==========================================

mod test_helpers;

use case_import::config::{ImportConfig, ImportOptions};
use case_import::importer::{ProgressReporter, TestCaseImporter};
use case_import::logging;
use case_import::repository::TestCaseStore;
use futures::future::join_all;
use std::time::Instant;

#[tokio::test]
async fn test_batch_import_multiple_files() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let files: Vec<_> = (1..=4)
        .map(|i| {
            test_helpers::write_file(
                dir.path(),
                &format!("batch_{}.csv", i),
                test_helpers::build_valid_csv(&format!("Batch{}", i), 5).as_bytes(),
            )
        })
        .collect();

    let options = ImportOptions {
        project_id: Some("proj-batch".to_string()),
        ..ImportOptions::default()
    };

    let start = Instant::now();
    let results = env.importer.batch_import(files, options).await;
    let elapsed = start.elapsed();
    println!("批量导入 4 个文件耗时: {:?}", elapsed);

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(env.store.count_by_project("proj-batch").await.unwrap(), 20);

    // 每个文件一个会话，名称来自各自路径
    let sessions = env.history.list().await;
    assert_eq!(sessions.len(), 4);
    let mut names: Vec<String> = sessions.into_iter().map(|s| s.file_name).collect();
    names.sort();
    assert_eq!(names, vec!["batch_1.csv", "batch_2.csv", "batch_3.csv", "batch_4.csv"]);
}

#[tokio::test]
async fn test_concurrent_imports_respect_history_capacity() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let config = ImportConfig {
        history_capacity: 3,
        ..ImportConfig::default()
    };
    let env = test_helpers::create_test_env(&db_path, config).await;

    let futures = (0..6).map(|i| {
        let options = ImportOptions {
            file_name: Some(format!("run_{}.csv", i)),
            project_id: Some("proj-cap".to_string()),
            ..ImportOptions::default()
        };
        env.importer.import_bytes(
            test_helpers::build_valid_csv(&format!("Run{}", i), 2).into_bytes(),
            options,
            ProgressReporter::disabled(),
        )
    });
    let results = join_all(futures).await;

    assert!(results.iter().all(|r| r.success));
    assert_eq!(env.history.len().await, 3);

    // 最近优先
    let sessions = env.history.list().await;
    assert!(sessions
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
}
