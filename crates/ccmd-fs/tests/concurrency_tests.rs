//! Concurrent access tests for the filesystem adapters
//!
//! Verifies that atomic writes never expose interleaved content.

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use ccmd_fs::{FileSystem, MemoryFs, OsFs, io};
use tempfile::tempdir;

#[test]
fn test_concurrent_memory_writes_no_corruption() {
    let memfs = Arc::new(MemoryFs::new());
    let path = Path::new("/shared/state.yaml");
    memfs.create_dir_all(Path::new("/shared")).unwrap();

    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let memfs = Arc::clone(&memfs);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..20 {
                    let content = format!("thread{}:write{}\n", thread_id, i);
                    // Concurrent renames of the shared temp name may race; only
                    // the final content matters here
                    let _ = io::write_atomic(memfs.as_ref(), path, content.as_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    let content = memfs.read_to_string(path).unwrap();
    assert!(content.starts_with("thread"));
    assert_eq!(content.matches("thread").count(), 1, "no interleaving");
}

#[test]
fn test_concurrent_writes_to_different_files_all_succeed() {
    let dir = tempdir().unwrap();
    let num_threads = 5;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let dir_path = dir.path().to_path_buf();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let file_path = dir_path.join(format!("file_{}.txt", thread_id));
                io::write_atomic(&OsFs, &file_path, format!("content {}", thread_id).as_bytes())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    for thread_id in 0..num_threads {
        let content =
            std::fs::read_to_string(dir.path().join(format!("file_{}.txt", thread_id))).unwrap();
        assert_eq!(content, format!("content {}", thread_id));
    }
}
