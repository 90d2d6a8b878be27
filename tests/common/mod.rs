//! Shared fixture for integration tests

#![allow(dead_code)]

use fts_compiler::{CompilerConfig, ContentModel, QueryCompiler};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const MODEL_JSON: &str = r#"{
  "namespaces": { "ex": "http://example.com/model/1.0" },
  "properties": [
    { "name": "cm:name", "data_type": "d:text", "tokenization": "tokenized_exact" },
    { "name": "cm:title", "data_type": "d:mltext", "tokenization": "tokenized" },
    { "name": "cm:content", "data_type": "d:content", "tokenization": "tokenized" },
    { "name": "ex:code", "data_type": "d:text", "tokenization": "untokenized" },
    { "name": "ex:pages", "data_type": "d:int", "tokenization": "untokenized" }
  ],
  "classes": [
    { "name": "cm:cmobject", "kind": "type" },
    { "name": "cm:content", "kind": "type", "parent": "cm:cmobject" },
    { "name": "cm:folder", "kind": "type", "parent": "cm:cmobject" },
    { "name": "ex:report", "kind": "type", "parent": "cm:content" },
    { "name": "ex:draft", "kind": "type", "parent": "cm:content", "include_in_super_type_query": false },
    { "name": "cm:titled", "kind": "aspect" }
  ],
  "sites": { "marketing": "/app:company_home/st:sites/cm:marketing" }
}"#;

pub fn model() -> ContentModel {
    ContentModel::from_json_str(MODEL_JSON).expect("fixture model parses")
}

pub fn compiler() -> QueryCompiler {
    compiler_with(CompilerConfig::default())
}

pub fn compiler_with(config: CompilerConfig) -> QueryCompiler {
    QueryCompiler::from_model(model(), config)
}

/// Log sink shared with a test subscriber
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records log lines, returning its result
/// and everything logged
pub fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
