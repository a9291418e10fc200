use lmengine_core::LogService;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
}

#[test]
fn two_threads_two_files_one_line_each() {
    let dir = tempfile::tempdir().unwrap();
    let service = LogService::new();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|name| {
            let logger = service.channel(name);
            let barrier = Arc::clone(&barrier);
            let path = dir.path().join(name).join("run.log");
            thread::spawn(move || {
                barrier.wait();
                logger.info(&format!("hello from {name}"), &path);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for name in ["alpha", "beta"] {
        let written = lines(&dir.path().join(name).join("run.log"));
        assert_eq!(written.len(), 1, "{name}: {written:?}");
        assert!(written[0].ends_with(&format!(" - INFO - hello from {name}")));
    }
}

#[test]
fn shared_file_lines_never_interleave() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.log");
    let service = LogService::new();

    let handles: Vec<_> = (0..THREADS)
        .map(|id| {
            let logger = service.channel(format!("worker-{id}"));
            let path = path.clone();
            thread::spawn(move || {
                for seq in 0..PER_THREAD {
                    if seq % 2 == 0 {
                        logger.info(&format!("worker {id} record {seq}"), &path);
                    } else {
                        logger.error(&format!("worker {id} record {seq}"), &path);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let written = lines(&path);
    assert_eq!(written.len(), THREADS * PER_THREAD);
    for line in &written {
        let parts: Vec<&str> = line.splitn(3, " - ").collect();
        assert_eq!(parts.len(), 3, "malformed line {line:?}");
        assert!(parts[1] == "INFO" || parts[1] == "ERROR", "bad level in {line:?}");
        assert!(parts[2].starts_with("worker "), "bad message in {line:?}");
    }
}

#[test]
fn failed_call_does_not_stop_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("log");
    fs::write(&blocker, "file in the way").unwrap();
    let logger = LogService::new().channel("engine");

    logger.error("cannot land", blocker.join("engine_run.log"));
    logger.info("still running", dir.path().join("fallback.log"));

    assert_eq!(lines(&dir.path().join("fallback.log")).len(), 1);
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "file in the way");
}
