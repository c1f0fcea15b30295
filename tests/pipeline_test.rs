//! 批处理流程测试：用内存中的假能力替代 OCR / LLM / 输出服务

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nova_ocr::error::{AppError, AppResult, OcrError};
use nova_ocr::infrastructure::{detect_duplicates, validate_folder};
use nova_ocr::models::PAGE_BREAK;
use nova_ocr::{
    BatchOrchestrator, BatchSettings, DocumentWriter, OutputOutcome, RunState, RunStatistics,
    TextCleaner, TextExtractor,
};
use tokio_test::assert_ok;

// ========== 假能力 ==========

enum Page {
    Blank,
    Broken,
}

/// 默认返回 "text of {文件名}"，可以指定某些文件为空白或识别失败
#[derive(Default)]
struct FakeExtractor {
    pages: HashMap<String, Page>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    fn with(mut self, name: &str, page: Page) -> Self {
        self.pages.insert(name.to_string(), page);
        self
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, path: &Path) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        match self.pages.get(&name) {
            Some(Page::Blank) => Ok("  \n ".to_string()),
            Some(Page::Broken) => Err(OcrError::UnsupportedFileType { path: name }.into()),
            None => Ok(format!("text of {}", name)),
        }
    }
}

/// 返回 "CLEAN<原文>"，可以指定第几次调用（从 1 开始）失败或返回空内容
#[derive(Default)]
struct FakeCleaner {
    failing_calls: Vec<usize>,
    blank_calls: Vec<usize>,
    received: Mutex<Vec<String>>,
}

#[async_trait]
impl TextCleaner for FakeCleaner {
    async fn clean(&self, text: &str, _style: &str, _temperature: f32) -> AppResult<String> {
        let call = {
            let mut received = self.received.lock().unwrap();
            received.push(text.to_string());
            received.len()
        };
        if self.failing_calls.contains(&call) {
            return Err(AppError::Other("quota exceeded".to_string()));
        }
        if self.blank_calls.contains(&call) {
            return Ok(String::new());
        }
        Ok(format!("CLEAN<{}>", text))
    }
}

#[derive(Default)]
struct FakeWriter {
    fail: bool,
    written: Mutex<Option<String>>,
}

#[async_trait]
impl DocumentWriter for FakeWriter {
    async fn write(&self, content: &str, destination: &Path) -> AppResult<PathBuf> {
        if self.fail {
            return Err(AppError::Other("disk full".to_string()));
        }
        *self.written.lock().unwrap() = Some(content.to_string());
        Ok(destination.to_path_buf())
    }

    fn format_name(&self) -> &'static str {
        "FAKE"
    }
}

// ========== 辅助函数 ==========

fn inputs(names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| PathBuf::from("/scans").join(name))
        .collect()
}

fn destination() -> PathBuf {
    PathBuf::from("/scans/OUTPUT.docx")
}

fn orchestrator(
    extractor: &Arc<FakeExtractor>,
    cleaner: &Arc<FakeCleaner>,
    writer: &Arc<FakeWriter>,
    batch_size: usize,
) -> BatchOrchestrator {
    BatchOrchestrator::new(
        extractor.clone(),
        cleaner.clone(),
        writer.clone(),
        BatchSettings {
            batch_size,
            ..BatchSettings::default()
        },
    )
}

fn assert_all_accounted(stats: &RunStatistics) {
    assert_eq!(
        stats.succeeded + stats.empty + stats.failed,
        stats.total,
        "完整运行后每个文件都应计入且只计入一个分类: {:?}",
        stats
    );
}

// ========== 测试 ==========

#[tokio::test]
async fn test_batches_follow_input_order() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 3);

    let files = inputs(&["a.png", "b.png", "c.png", "d.png", "e.png", "f.png", "g.png", "h.png"]);
    let stats = orch.process(&files, &destination(), None).await;

    let batches = cleaner.received.lock().unwrap().clone();
    let groups = vec![vec!["a", "b", "c"], vec!["d", "e", "f"], vec!["g", "h"]];
    let expected: Vec<String> = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|n| format!("text of {}.png", n))
                .collect::<Vec<_>>()
                .join(PAGE_BREAK)
        })
        .collect();
    assert_eq!(batches, expected);

    assert_eq!(stats.total, 8);
    assert_eq!(stats.succeeded, 8);
    assert_all_accounted(&stats);
    assert!(stats.is_finished());

    let written = writer.written.lock().unwrap().clone().unwrap();
    let expected_doc: String = expected
        .iter()
        .map(|batch| format!("CLEAN<{}>\n\n", batch))
        .collect();
    assert_eq!(written, expected_doc);
    assert_eq!(orch.last_output(), OutputOutcome::Written(destination()));
    assert_eq!(orch.state(), RunState::Completed);
}

#[tokio::test]
async fn test_empty_run_touches_nothing() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    let stats = orch.process(&[], &destination(), None).await;

    assert_eq!(stats.total, 0);
    assert_eq!(stats.processed(), 0);
    assert!(stats.started_at.is_some());
    assert!(stats.ended_at.is_some());
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert!(cleaner.received.lock().unwrap().is_empty());
    assert!(writer.written.lock().unwrap().is_none());
    assert_eq!(orch.last_output(), OutputOutcome::Skipped);
}

#[tokio::test]
async fn test_cleanup_failure_keeps_raw_text() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner {
        failing_calls: vec![1],
        ..Default::default()
    });
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    let stats = orch
        .process(&inputs(&["a.png", "b.png"]), &destination(), None)
        .await;

    assert_eq!(stats.succeeded, 0);
    assert_eq!(stats.failed, 2);
    assert_all_accounted(&stats);

    // 原始文本按页分隔符拼接，再加段落分隔
    let written = writer.written.lock().unwrap().clone().unwrap();
    assert_eq!(
        written,
        "text of a.png\n\n---PAGE BREAK---\n\ntext of b.png\n\n"
    );
}

#[tokio::test]
async fn test_every_batch_failing_keeps_all_raw_pages_in_order() {
    let extractor = Arc::new(
        FakeExtractor::default()
            .with("c.png", Page::Broken)
            .with("f.png", Page::Blank),
    );
    let cleaner = Arc::new(FakeCleaner {
        failing_calls: vec![1, 2, 3, 4],
        ..Default::default()
    });
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 2);

    let files = inputs(&["a.png", "b.png", "c.png", "d.png", "e.png", "f.png", "g.png"]);
    let stats = orch.process(&files, &destination(), None).await;

    assert_eq!(stats.total, 7);
    assert_eq!(stats.succeeded, 0);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.failed, 6);
    assert_all_accounted(&stats);
    assert_eq!(cleaner.received.lock().unwrap().len(), 3);

    let written = writer.written.lock().unwrap().clone().unwrap();
    let expected = format!(
        "text of a.png{pb}text of b.png\n\ntext of d.png{pb}text of e.png\n\ntext of g.png\n\n",
        pb = PAGE_BREAK
    );
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_blank_cleanup_result_falls_back_to_raw_text() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner {
        blank_calls: vec![2],
        ..Default::default()
    });
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 2);

    let stats = orch
        .process(&inputs(&["a.png", "b.png", "c.png"]), &destination(), None)
        .await;

    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
    assert_all_accounted(&stats);

    let written = writer.written.lock().unwrap().clone().unwrap();
    assert!(written.ends_with("text of c.png\n\n"));
}

#[tokio::test]
async fn test_per_page_credit_follows_batch_outcome() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner {
        failing_calls: vec![2],
        ..Default::default()
    });
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 3);

    let files = inputs(&["1.png", "2.png", "3.png", "4.png", "5.png"]);
    let stats = orch.process(&files, &destination(), None).await;

    // 第一批 3 页成功，第二批 2 页失败
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 2);
    assert_all_accounted(&stats);
}

#[tokio::test]
async fn test_blank_and_broken_pages_are_isolated() {
    let extractor = Arc::new(
        FakeExtractor::default()
            .with("b.png", Page::Blank)
            .with("c.pdf", Page::Broken),
    );
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 2);

    let stats = orch
        .process(
            &inputs(&["a.png", "b.png", "c.pdf", "d.png"]),
            &destination(),
            None,
        )
        .await;

    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.failed, 1);
    assert_all_accounted(&stats);

    let batches = cleaner.received.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], format!("text of a.png{}text of d.png", PAGE_BREAK));
}

#[tokio::test]
async fn test_last_file_failure_still_flushes_buffered_pages() {
    let extractor = Arc::new(FakeExtractor::default().with("b.png", Page::Broken));
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    let stats = orch
        .process(&inputs(&["a.png", "b.png"]), &destination(), None)
        .await;

    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert_all_accounted(&stats);
    assert_eq!(cleaner.received.lock().unwrap().len(), 1);
    assert_eq!(
        writer.written.lock().unwrap().as_deref(),
        Some("CLEAN<text of a.png>\n\n")
    );
}

#[tokio::test]
async fn test_all_blank_pages_skip_output() {
    let extractor = Arc::new(
        FakeExtractor::default()
            .with("a.png", Page::Blank)
            .with("b.png", Page::Blank),
    );
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    let stats = orch
        .process(&inputs(&["a.png", "b.png"]), &destination(), None)
        .await;

    assert_eq!(stats.empty, 2);
    assert_all_accounted(&stats);
    assert!(cleaner.received.lock().unwrap().is_empty());
    assert!(writer.written.lock().unwrap().is_none());
    assert_eq!(orch.last_output(), OutputOutcome::Skipped);
}

#[tokio::test]
async fn test_output_failure_does_not_reclassify_pages() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter {
        fail: true,
        ..Default::default()
    });
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    let stats = orch
        .process(&inputs(&["a.png", "b.png", "c.png"]), &destination(), None)
        .await;

    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 0);
    match orch.last_output() {
        OutputOutcome::Failed(message) => assert!(message.contains("disk full")),
        other => panic!("应该记录输出失败，实际: {:?}", other),
    }
}

#[tokio::test]
async fn test_progress_messages_in_order() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 2);

    // 回调直接借用局部状态
    let events = Mutex::new(Vec::new());
    let record = |current: usize, total: usize, message: &str| {
        events
            .lock()
            .unwrap()
            .push((current, total, message.to_string()));
    };

    orch.process(&inputs(&["a.png", "b.png"]), &destination(), Some(&record))
        .await;

    let events = events.into_inner().unwrap();
    assert_eq!(
        events,
        vec![
            (1, 2, "正在处理: a.png".to_string()),
            (2, 2, "正在处理: b.png".to_string()),
            (2, 2, "AI 清理批次 (2 页)...".to_string()),
            (2, 2, "正在生成输出文件...".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_stop_after_two_of_five() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    // 第 2 个文件开始识别时请求停止，识别本身不会被打断
    let control = orch.control();
    let stop_at_second = move |current: usize, _total: usize, message: &str| {
        if current == 2 && message.starts_with("正在处理") {
            control.stop();
        }
    };

    let files = inputs(&["1.png", "2.png", "3.png", "4.png", "5.png"]);
    let stats = orch
        .process(&files, &destination(), Some(&stop_at_second))
        .await;

    assert_eq!(stats.total, 5);
    assert!(stats.processed() <= 2);
    assert!(stats.ended_at.is_some());
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    assert!(writer.written.lock().unwrap().is_none());
    assert_eq!(orch.last_output(), OutputOutcome::Skipped);
}

#[tokio::test]
async fn test_pause_blocks_until_resumed() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = Arc::new(orchestrator(&extractor, &cleaner, &writer, 7));
    let control = orch.control();

    let worker = {
        let orch = orch.clone();
        let control = control.clone();
        let pause_at_second = move |current: usize, _total: usize, message: &str| {
            if current == 2 && message.starts_with("正在处理") {
                control.pause();
            }
        };
        tokio::spawn(async move {
            let files = inputs(&["1.png", "2.png", "3.png", "4.png"]);
            orch.process(&files, &destination(), Some(&pause_at_second))
                .await
        })
    };

    let mut state = control.subscribe();
    let paused = tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == RunState::Paused),
    )
    .await
    .map(|seen| seen.is_ok());
    assert_eq!(paused, Ok(true), "应该进入暂停状态");

    // 暂停期间不会继续识别
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    assert!(!worker.is_finished());
    assert_eq!(orch.state(), RunState::Paused);

    assert!(control.resume());
    let stats = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("恢复后应该完成")
        .unwrap();

    assert_eq!(stats.succeeded, 4);
    assert_all_accounted(&stats);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_stop_while_paused_ends_run() {
    let extractor = Arc::new(FakeExtractor::default());
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = Arc::new(orchestrator(&extractor, &cleaner, &writer, 7));
    let control = orch.control();

    let worker = {
        let orch = orch.clone();
        let control = control.clone();
        let pause_at_first = move |current: usize, _total: usize, message: &str| {
            if current == 1 && message.starts_with("正在处理") {
                control.pause();
            }
        };
        tokio::spawn(async move {
            let files = inputs(&["1.png", "2.png", "3.png"]);
            orch.process(&files, &destination(), Some(&pause_at_first))
                .await
        })
    };

    let mut state = control.subscribe();
    let paused = tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == RunState::Paused),
    )
    .await
    .map(|seen| seen.is_ok());
    assert_eq!(paused, Ok(true), "应该进入暂停状态");

    assert!(control.stop());
    let stats = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("暂停中停止应该结束运行")
        .unwrap();

    assert_eq!(stats.total, 3);
    assert!(stats.processed() <= 1);
    assert!(writer.written.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_statistics_reset_between_runs() {
    let extractor = Arc::new(FakeExtractor::default().with("x.png", Page::Broken));
    let cleaner = Arc::new(FakeCleaner::default());
    let writer = Arc::new(FakeWriter::default());
    let orch = orchestrator(&extractor, &cleaner, &writer, 7);

    let first = orch.process(&inputs(&["x.png"]), &destination(), None).await;
    assert_eq!(first.failed, 1);

    let second = orch
        .process(&inputs(&["a.png", "b.png"]), &destination(), None)
        .await;
    assert_eq!(second.total, 2);
    assert_eq!(second.failed, 0);
    assert_eq!(second.succeeded, 2);
    assert_eq!(orch.statistics().succeeded, 2);
}

#[tokio::test]
async fn test_folder_scan_reports_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["page10.png", "page2.png", "Page2.PNG", "notes.txt"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }

    let report = assert_ok!(validate_folder(dir.path()).await);
    let names: Vec<String> = report
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names.len(), 3);
    assert_eq!(names.last().map(String::as_str), Some("page10.png"));
    assert_eq!(report.duplicates.len(), 1);
    assert!(report.warning().is_some());
}

#[test]
fn test_detect_duplicates_across_folders() {
    let paths = vec![
        PathBuf::from("/a/scan1.jpg"),
        PathBuf::from("/b/SCAN1.JPG"),
        PathBuf::from("/b/scan2.jpg"),
    ];
    let duplicates = detect_duplicates(&paths);
    assert_eq!(
        duplicates,
        vec![(PathBuf::from("/a/scan1.jpg"), PathBuf::from("/b/SCAN1.JPG"))]
    );
}
