use crate::error::{Result, ToolError};
use crate::output;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Settings for one concatenation run
#[derive(Debug, Clone)]
pub struct ConcatConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub extension: String,
    pub generated_on: String,
}

impl ConcatConfig {
    pub fn new(root: PathBuf, output: PathBuf, extension: String) -> Self {
        Self {
            root,
            output,
            extension,
            generated_on: Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcatSummary {
    pub files: usize,
    pub bytes: usize,
    pub label: String,
}

/// Language label and line comment prefix for a file extension
pub fn source_kind(extension: &str) -> (String, &'static str) {
    match extension.to_ascii_lowercase().as_str() {
        "js" | "mjs" | "cjs" => ("JavaScript".to_string(), "//"),
        "ts" => ("TypeScript".to_string(), "//"),
        "rs" => ("Rust".to_string(), "//"),
        "py" => ("Python".to_string(), "#"),
        other => (other.to_ascii_uppercase(), "//"),
    }
}

/// All files under `root` with the given extension, sorted by path.
///
/// `exclude` is skipped so a bundle written inside the root never picks
/// itself up on the next run.
pub fn collect_source_files(
    root: &Path,
    extension: &str,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/**/*.{}", escaped_root.trim_end_matches('/'), extension);
    tracing::debug!(%pattern, "collecting source files");

    let excluded = exclude.and_then(|path| path.canonicalize().ok());
    let mut files = Vec::new();
    // hidden files and directories stay out of the bundle
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        if excluded.is_some() && path.canonicalize().ok() == excluded {
            tracing::debug!(path = %path.display(), "skipping output file");
            continue;
        }
        files.push(path);
    }

    files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    Ok(files)
}

pub fn concatenate_files(config: &ConcatConfig) -> Result<ConcatSummary> {
    let (label, comment) = source_kind(&config.extension);
    let files = collect_source_files(&config.root, &config.extension, Some(&config.output))?;

    let mut bundle: Vec<u8> = Vec::new();
    bundle.extend_from_slice(format!("{} Concatenated {} Files\n", comment, label).as_bytes());
    bundle.extend_from_slice(format!("{} Generated on: {}\n\n", comment, config.generated_on).as_bytes());

    for file in &files {
        let relative_path = file.strip_prefix(&config.root).unwrap_or(file);
        bundle.extend_from_slice(
            format!("{} File: {}\n", comment, relative_path.display()).as_bytes(),
        );
        let contents = std::fs::read(file).map_err(|e| ToolError::io(file, e))?;
        bundle.extend_from_slice(&contents);
        bundle.extend_from_slice(b"\n\n");
    }

    output::write_atomically(&config.output, &bundle)?;
    Ok(ConcatSummary {
        files: files.len(),
        bytes: bundle.len(),
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("js");
        fs::create_dir_all(root.join("game")).unwrap();
        fs::create_dir_all(root.join("utils")).unwrap();
        fs::write(root.join("main.js"), "init();").unwrap();
        fs::write(root.join("game").join("loop.js"), "function loop() {}\n").unwrap();
        fs::write(root.join("utils").join("math.js"), "export const PI = 3.14;").unwrap();
        fs::write(root.join("utils").join("notes.txt"), "not a script").unwrap();
        dir
    }

    fn config(dir: &Path) -> ConcatConfig {
        ConcatConfig {
            root: dir.join("js"),
            output: dir.join("bundle.js"),
            extension: "js".to_string(),
            generated_on: "2025-01-02".to_string(),
        }
    }

    #[test]
    fn test_collect_source_files_sorted_and_filtered() {
        let dir = project();
        let root = dir.path().join("js");
        let files = collect_source_files(&root, "js", None).unwrap();
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|file| file.strip_prefix(&root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("game/loop.js"),
                PathBuf::from("main.js"),
                PathBuf::from("utils/math.js"),
            ]
        );
    }

    #[test]
    fn test_collect_source_files_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("js");
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join(".eslintrc.js"), "module.exports = {};").unwrap();
        fs::write(root.join(".cache").join("c.js"), "cached();").unwrap();
        fs::write(root.join("main.js"), "init();").unwrap();

        let files = collect_source_files(&root, "js", None).unwrap();

        assert_eq!(files, vec![root.join("main.js")]);
    }

    #[test]
    fn test_concatenate_files_layout() {
        let dir = project();
        let config = config(dir.path());

        let summary = concatenate_files(&config).unwrap();

        let expected = "// Concatenated JavaScript Files\n\
                        // Generated on: 2025-01-02\n\n\
                        // File: game/loop.js\nfunction loop() {}\n\n\n\
                        // File: main.js\ninit();\n\n\
                        // File: utils/math.js\nexport const PI = 3.14;\n\n";
        let written = fs::read_to_string(&config.output).unwrap();
        assert_eq!(written, expected);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.bytes, expected.len());
        assert_eq!(summary.label, "JavaScript");
    }

    #[test]
    fn test_concatenate_preserves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("js");
        fs::create_dir_all(&root).unwrap();
        let raw = b"const s = '\xc3\xa9';\r\n\tconsole.log(s);";
        fs::write(root.join("a.js"), raw).unwrap();

        let config = config(dir.path());
        concatenate_files(&config).unwrap();

        let written = fs::read(&config.output).unwrap();
        let needle = written.windows(raw.len()).any(|window| window == raw);
        assert!(needle);
    }

    #[test]
    fn test_concatenate_skips_own_output() {
        let dir = project();
        let mut config = config(dir.path());
        config.output = config.root.join("bundle.js");

        concatenate_files(&config).unwrap();
        let summary = concatenate_files(&config).unwrap();

        assert_eq!(summary.files, 3);
        let written = fs::read_to_string(&config.output).unwrap();
        assert!(!written.contains("// File: bundle.js"));
    }

    #[test]
    fn test_concatenate_empty_root_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        let config = config(dir.path());

        let summary = concatenate_files(&config).unwrap();

        assert_eq!(summary.files, 0);
        assert_eq!(
            fs::read_to_string(&config.output).unwrap(),
            "// Concatenated JavaScript Files\n// Generated on: 2025-01-02\n\n"
        );
    }

    #[test]
    fn test_source_kind() {
        assert_eq!(source_kind("py"), ("Python".to_string(), "#"));
        assert_eq!(source_kind("TS"), ("TypeScript".to_string(), "//"));
        assert_eq!(source_kind("lua"), ("LUA".to_string(), "//"));
    }

    #[test]
    fn test_default_generated_on_is_a_date() {
        let config = ConcatConfig::new("js".into(), "out.js".into(), "js".to_string());
        assert!(chrono::NaiveDate::parse_from_str(&config.generated_on, "%Y-%m-%d").is_ok());
    }
}
