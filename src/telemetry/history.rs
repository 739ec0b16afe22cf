use std::collections::{HashMap, VecDeque};

use super::types::TelemetryRecord;

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Bounded per-topic record buffer; the oldest record goes first.
#[derive(Debug, Clone)]
pub struct TopicHistory {
    capacity: usize,
    topics: HashMap<String, VecDeque<TelemetryRecord>>,
}

impl Default for TopicHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl TopicHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: HashMap::new(),
        }
    }

    pub fn push(&mut self, record: TelemetryRecord) {
        let buffer = self.topics.entry(record.topic.clone()).or_default();
        while buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(record);
    }

    pub fn records(&self, topic: &str) -> Vec<TelemetryRecord> {
        self.topics
            .get(topic)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self, topic: &str) {
        self.topics.remove(topic);
    }

    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(topic: &str, n: u32) -> TelemetryRecord {
        TelemetryRecord {
            ts: None,
            topic: topic.to_string(),
            level: None,
            data: json!({ "n": n }),
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut history = TopicHistory::default();
        for n in 0..(DEFAULT_HISTORY_CAPACITY as u32 + 20) {
            history.push(record("pid", n));
        }
        let records = history.records("pid");
        assert_eq!(records.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(records[0].data, json!({ "n": 20 }));
        assert_eq!(records.last().unwrap().data, json!({ "n": 519 }));
    }

    #[test]
    fn topics_are_independent() {
        let mut history = TopicHistory::new(2);
        history.push(record("log", 1));
        history.push(record("kf", 1));
        history.push(record("log", 2));
        history.push(record("log", 3));
        assert_eq!(history.len("log"), 2);
        assert_eq!(history.len("kf"), 1);
        assert_eq!(history.topics(), vec!["kf".to_string(), "log".to_string()]);

        history.clear("log");
        assert_eq!(history.len("log"), 0);
        assert!(history.records("log").is_empty());
        assert_eq!(history.len("kf"), 1);
    }
}
