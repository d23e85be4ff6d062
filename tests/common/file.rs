use derive_new::new;
use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use std::path::{Path, PathBuf};

/// A work-tree file a test expects to exist
#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

/// Create `count` files with random names and contents directly under `dir`
pub fn write_generated_files(dir: &Path, count: usize) -> Vec<FileSpec> {
    (0..count)
        .map(|n| {
            let name = format!("{}-{n}.txt", Word().fake::<String>());
            let spec = FileSpec::new(dir.join(name), Words(5..10).fake::<Vec<String>>().join(" "));
            write_file(spec.clone());

            spec
        })
        .collect()
}

/// Write the file, creating missing parent directories
pub fn write_file(spec: FileSpec) {
    if let Some(parent) = spec.path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|error| panic!("cannot create {}: {error}", parent.display()));
    }

    std::fs::write(&spec.path, &spec.content)
        .unwrap_or_else(|error| panic!("cannot write {}: {error}", spec.path.display()));
}
