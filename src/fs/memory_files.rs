//! In-Memory Files
//!
//! A flat map of virtual files for redirections and file-reading commands.
//! Every `get_file` hands out a fresh `FileStream` holding the current
//! content; writes through it are stored back into the map as they happen.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::interpreter::FileAccess;
use crate::io::FileStream;

type FileMap = Rc<RefCell<HashMap<String, String>>>;

/// In-memory virtual files, shared by clones.
#[derive(Clone, Default)]
pub struct MemoryFiles {
    data: FileMap,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial files.
    pub fn with_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let fs = Self::new();
        for (name, content) in files {
            fs.write(name.as_ref(), content);
        }
        fs
    }

    /// Current content of `name`, if it exists.
    pub fn read(&self, name: &str) -> Option<String> {
        self.data.borrow().get(&normalize_name(name)).cloned()
    }

    pub fn write(&self, name: &str, content: impl Into<String>) {
        self.data
            .borrow_mut()
            .insert(normalize_name(name), content.into());
    }

    pub fn exists(&self, name: &str) -> bool {
        self.data.borrow().contains_key(&normalize_name(name))
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.data.borrow_mut().remove(&normalize_name(name))
    }

    /// All files, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl FileAccess for MemoryFiles {
    fn get_file(&self, name: &str) -> FileStream {
        let name = normalize_name(name);
        let content = self.data.borrow().get(&name).cloned().unwrap_or_default();
        let data = self.data.clone();
        let key = name.clone();
        FileStream::new(name, &content).with_hook(Rc::new(move |content: &str| {
            data.borrow_mut().insert(key.clone(), content.to_string());
        }))
    }
}

impl std::fmt::Debug for MemoryFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.snapshot()).finish()
    }
}

/// Resolve `.` and `..` segments. Relative names stay relative.
fn normalize_name(name: &str) -> String {
    let absolute = name.starts_with('/');
    let mut resolved: Vec<&str> = Vec::new();
    for part in name.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part == ".." {
            resolved.pop();
        } else {
            resolved.push(part);
        }
    }
    let joined = resolved.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Reader, Writer};

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("out.txt"), "out.txt");
        assert_eq!(normalize_name("./out.txt"), "out.txt");
        assert_eq!(normalize_name("a/../b//c"), "b/c");
        assert_eq!(normalize_name("/tmp/./x"), "/tmp/x");
    }

    #[test]
    fn test_writes_are_stored_back() {
        let fs = MemoryFiles::new();
        let file = fs.get_file("log");
        assert!(!fs.exists("log"));
        file.write("one\n").unwrap();
        file.write("two\n").unwrap();
        assert_eq!(fs.read("log").as_deref(), Some("one\ntwo\n"));
        assert_eq!(fs.read("./log").as_deref(), Some("one\ntwo\n"));
    }

    #[test]
    fn test_clear_truncates() {
        let fs = MemoryFiles::with_files([("log", "old")]);
        let file = fs.get_file("log");
        file.clear().unwrap();
        assert_eq!(fs.read("log").as_deref(), Some(""));
        file.write("new").unwrap();
        assert_eq!(fs.read("log").as_deref(), Some("new"));
        file.close().unwrap();
        assert!(file.clear().is_err());
    }

    #[tokio::test]
    async fn test_existing_content_is_readable() {
        let fs = MemoryFiles::with_files([("in.txt", "hello\n")]);
        let file = fs.get_file("in.txt");
        file.close().unwrap();
        assert_eq!(file.read().await.unwrap(), "hello\n");
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let fs = MemoryFiles::with_files([("b", "2"), ("a", "1")]);
        let names: Vec<String> = fs.snapshot().into_keys().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(fs.remove("a").as_deref(), Some("1"));
        assert!(!fs.exists("a"));
    }
}
