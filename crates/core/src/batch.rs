use crate::config::RenameConfig;
use crate::error::{PatternError, TaskError};
use crate::namer::synthesize_target;
use crate::resolver::resolve_timestamp;
use crate::task::{FileTask, TaskOutcome, TaskStatus};
use anyhow::anyhow;
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum BatchEvent {
    TaskFinished { outcome: TaskOutcome },
    Progress { processed: usize, total: usize },
    Finished { summary: BatchSummary },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRun {
    pub tasks: Vec<FileTask>,
    pub processed: usize,
    pub total: usize,
    pub cancelled: bool,
    pub summary: BatchSummary,
}

pub fn run_batch<F>(
    paths: Vec<PathBuf>,
    config: &RenameConfig,
    cancel: &CancelToken,
    on_event: F,
) -> Result<BatchRun, PatternError>
where
    F: FnMut(BatchEvent),
{
    config.validate()?;
    Ok(run_validated(paths, config, cancel, on_event))
}

pub struct BatchHandle {
    pub events: mpsc::Receiver<BatchEvent>,
    handle: thread::JoinHandle<BatchRun>,
}

impl BatchHandle {
    pub fn join(self) -> anyhow::Result<BatchRun> {
        self.handle
            .join()
            .map_err(|_| anyhow!("バッチワーカーの終了待機に失敗しました"))
    }
}

pub fn spawn_batch(
    paths: Vec<PathBuf>,
    config: RenameConfig,
    cancel: CancelToken,
) -> Result<BatchHandle, PatternError> {
    config.validate()?;
    let (sender, events) = mpsc::channel();
    let handle = thread::spawn(move || {
        run_validated(paths, &config, &cancel, |event| {
            let _ = sender.send(event);
        })
    });
    Ok(BatchHandle { events, handle })
}

fn run_validated<F>(
    paths: Vec<PathBuf>,
    config: &RenameConfig,
    cancel: &CancelToken,
    mut on_event: F,
) -> BatchRun
where
    F: FnMut(BatchEvent),
{
    let mut tasks: Vec<FileTask> = paths.into_iter().map(FileTask::new).collect();
    collapse_duplicates(&mut tasks);

    let total = tasks.len();
    let mut processed = 0usize;
    let mut cancelled = false;

    for task in tasks.iter_mut() {
        if cancel.is_requested() {
            cancelled = true;
            break;
        }
        if !task.is_terminal() {
            process_task(task, config);
        }
        processed += 1;
        on_event(BatchEvent::TaskFinished {
            outcome: task.outcome(),
        });
        on_event(BatchEvent::Progress { processed, total });
    }

    let summary = summarize(&tasks);
    on_event(BatchEvent::Finished { summary });

    BatchRun {
        tasks,
        processed,
        total,
        cancelled,
        summary,
    }
}

fn collapse_duplicates(tasks: &mut [FileTask]) {
    let mut seen = HashSet::<PathBuf>::new();
    for task in tasks.iter_mut() {
        if !seen.insert(task.source_path.clone()) {
            task.status = TaskStatus::Skipped;
        }
    }
}

fn process_task(task: &mut FileTask, config: &RenameConfig) {
    let Some(resolved) = resolve_timestamp(&task.source_path) else {
        fail_task(task, &TaskError::TimestampUnresolvable);
        return;
    };
    task.resolved_timestamp = Some(resolved);

    let (directory, original_name) = match (task.source_path.parent(), task.source_path.file_name())
    {
        (Some(directory), Some(name)) => (directory, name.to_string_lossy().to_string()),
        _ => {
            let err = TaskError::Filesystem {
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "親ディレクトリまたはファイル名を取得できません",
                ),
            };
            fail_task(task, &err);
            return;
        }
    };

    match synthesize_target(
        &resolved.date,
        &config.timestamp_pattern,
        directory,
        &original_name,
    ) {
        Ok(target) => {
            if target == task.source_path {
                task.status = TaskStatus::Skipped;
                task.target_path = Some(target);
            } else {
                match fs::rename(&task.source_path, &target) {
                    Ok(()) => {
                        task.status = TaskStatus::Renamed;
                        task.target_path = Some(target);
                    }
                    Err(source) => fail_task(task, &TaskError::Filesystem { source }),
                }
            }
        }
        Err(err) => fail_task(task, &err),
    }
}

fn fail_task(task: &mut FileTask, err: &TaskError) {
    error!(
        "リネーム処理に失敗しました: {}: {err}",
        task.source_path.display()
    );
    task.status = TaskStatus::Failed;
    task.error_detail = Some(err.to_string());
}

fn summarize(tasks: &[FileTask]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for task in tasks {
        match task.status {
            TaskStatus::Renamed => summary.renamed += 1,
            TaskStatus::Skipped => summary.skipped += 1,
            TaskStatus::Failed => summary.failed += 1,
            TaskStatus::Pending => {}
        }
    }
    summary
}
