use std::{collections::BTreeSet, fs, sync::Arc};

use tempfile::tempdir;

use lumber::{
    appenders::{FileAppender, MemoryAppender, RollingFileAppender},
    filters::{LevelFilter, LoggerFilter},
    hashlog::Hashlog,
    layouts::{BinaryLayout, HashLayout, TextLayout},
    processors::{AsyncWaitProcessor, DefaultProcessor, SyncProcessor},
    reader::{open_input, BinaryReader, HashReader},
    Element, Level, Logger, Processor, Record,
};

#[test]
fn binary_log_round_trip() {
    let test_dir = tempdir().unwrap();
    let path = test_dir.path().join("app.bin.log");

    let sink: Arc<dyn Processor> = Arc::new(
        DefaultProcessor::new(BinaryLayout).with_appender(FileAppender::new(&path, true, false)),
    );
    sink.start();

    let logger = Logger::with_sink("pipeline", sink.clone());
    logger.info("plain message");
    lumber::warn!(logger, "{} of {} done ({:.1}%)", 3, 4, 75.0);
    lumber::error!(logger, "user {name} failed", lumber::named("name", &"alice"));
    logger.flush();
    sink.stop();

    let records: Vec<Record> = BinaryReader::new(open_input(&path).unwrap())
        .collect::<Result<_, _>>()
        .unwrap();
    let messages: Vec<String> = records.iter().map(Record::restore_format).collect();
    assert_eq!(
        messages,
        ["plain message", "3 of 4 done (75.0%)", "user alice failed"]
    );
    assert!(records.iter().all(|record| record.logger == "pipeline"));
    assert_eq!(records[1].level, Level::Warn);
    assert!(records[0].timestamp <= records[2].timestamp);

    let text = TextLayout::new("{Level} {Logger} - {Message}").render(&records[2]);
    assert_eq!(text, "ERROR pipeline - user alice failed");
}

#[test]
fn hash_log_resolves_through_hashlog() {
    let test_dir = tempdir().unwrap();
    let binary_path = test_dir.path().join("app.bin.log");
    let hash_path = test_dir.path().join("app.hash.log");

    // One record stream, written both ways by sibling processors
    let sink: Arc<dyn Processor> = Arc::new(
        DefaultProcessor::without_layout()
            .with_processor(
                DefaultProcessor::new(BinaryLayout)
                    .with_appender(FileAppender::new(&binary_path, true, true)),
            )
            .with_processor(
                DefaultProcessor::new(HashLayout)
                    .with_appender(FileAppender::new(&hash_path, true, true)),
            ),
    );
    sink.start();

    let logger = Logger::with_sink("hashed", sink.clone());
    for i in 0..5 {
        lumber::info!(logger, "step {} of {}", i, 5);
    }
    logger.fatal("done");
    sink.stop();

    let mut hashlog = Hashlog::new();
    let mut learned = false;
    for record in BinaryReader::new(open_input(&binary_path).unwrap()) {
        learned |= hashlog.update_from(&record.unwrap()).unwrap();
    }
    assert!(learned);
    assert_eq!(hashlog.len(), 3, "logger name and two distinct messages");

    let map_path = test_dir.path().join(".hashlog");
    hashlog.save(&map_path).unwrap();
    let hashlog = Hashlog::load(&Hashlog::find(test_dir.path()).unwrap()).unwrap();

    let messages: Vec<String> = HashReader::new(open_input(&hash_path).unwrap(), &hashlog)
        .map(|record| {
            let record = record.unwrap();
            assert_eq!(record.logger, "hashed");
            record.restore_format()
        })
        .collect();
    assert_eq!(
        messages,
        ["step 0 of 5", "step 1 of 5", "step 2 of 5", "step 3 of 5", "step 4 of 5", "done"]
    );
}

#[test]
fn async_processor_keeps_order() {
    let memory = Arc::new(MemoryAppender::new());
    let inner = DefaultProcessor::new(TextLayout::new("{Logger}:{Message}\n"))
        .with_filter(LevelFilter::new(Level::Info))
        .with_filter(LoggerFilter::new("worker\\..*", true).unwrap())
        .with_shared_appender(memory.clone());

    let sink: Arc<dyn Processor> = Arc::new(AsyncWaitProcessor::new(inner, false).unwrap());
    assert!(sink.start());

    let threads: Vec<_> = (0..4)
        .map(|t| {
            let logger = Logger::with_sink(format!("worker.{}", t), sink.clone());
            std::thread::spawn(move || {
                for i in 0..25 {
                    lumber::info!(logger, "{}", i);
                    lumber::debug!(logger, "ignored {}", i);
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }
    Logger::with_sink("other", sink.clone()).error("filtered out");

    assert!(sink.stop(), "Stop should drain the queue");

    let output = String::from_utf8(memory.take()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 100);
    for t in 0..4 {
        let prefix = format!("worker.{}:", t);
        let sequence: Vec<usize> = lines
            .iter()
            .filter_map(|line| line.strip_prefix(prefix.as_str()))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(sequence, (0..25).collect::<Vec<_>>(), "Per-thread order is kept");
    }
}

#[test]
fn rolling_archives_are_readable() {
    let test_dir = tempdir().unwrap();
    let appender = Arc::new(
        RollingFileAppender::with_size_policy(
            test_dir.path(),
            "rolled",
            "bin.log",
            256,
            100,
            true,
            true,
            true,
        )
        .unwrap(),
    );

    let sink = SyncProcessor::new(
        DefaultProcessor::new(BinaryLayout).with_shared_appender(appender.clone()),
    );
    sink.start();

    let sink: Arc<dyn Processor> = Arc::new(sink);
    let logger = Logger::with_sink("roll", sink.clone());
    for i in 0..20 {
        lumber::info!(logger, "rolling record {}", i);
    }
    sink.stop();
    appender.wait_archived();

    let mut archives = 0;
    let mut seen = BTreeSet::new();
    for entry in fs::read_dir(test_dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "zst") {
            archives += 1;
        }
        for record in BinaryReader::new(open_input(&path).unwrap()) {
            seen.insert(record.unwrap().restore_format());
        }
    }

    assert!(archives > 0, "Rolled files should be archived");
    let expected: BTreeSet<String> = (0..20).map(|i| format!("rolling record {}", i)).collect();
    assert_eq!(seen, expected);
}
