use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Extensions always captured as text, regardless of content.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "xml", "html", "htm", "css", "js", "py", "java", "cpp", "c", "h", "hpp",
    "cs", "php", "rb", "go", "rs", "sh", "bat", "ps1", "yml", "yaml", "toml", "ini", "cfg", "conf",
    "log", "csv", "tsv", "sql", "r", "tex", "latex", "rtf", "dockerfile", "makefile", "gitignore",
    "gitattributes", "license", "readme", "dm",
];

/// Extensions always captured as binary.
const BINARY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "ico", "svg", "mp4", "avi", "mov",
    "wmv", "flv", "mkv", "webm", "mp3", "wav", "flac", "ogg", "pdf", "doc", "docx", "ppt", "pptx",
    "xls", "xlsx", "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "exe", "dll", "so", "dylib",
    "bin", "dat", "db", "sqlite", "mrc",
];

const SNIFF_LEN: usize = 1024;

/// Content capture policy: text/binary classification plus the binary-skip
/// (placeholder) switch.
#[derive(Debug, Clone)]
pub struct ContentPolicy {
    skip_binary_content: bool,
    force_text: HashSet<String>,
    force_binary: HashSet<String>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(true, &[], &[])
    }
}

impl ContentPolicy {
    pub fn new(skip_binary_content: bool, force_text: &[String], force_binary: &[String]) -> Self {
        Self {
            skip_binary_content,
            force_text: force_text.iter().map(|e| canon_ext(e)).collect(),
            force_binary: force_binary.iter().map(|e| canon_ext(e)).collect(),
        }
    }

    pub fn skip_binary_content(&self) -> bool {
        self.skip_binary_content
    }

    /// Classify a file as binary. Override sets win over the built-ins;
    /// unknown extensions fall back to sniffing the first 1 KiB.
    pub fn is_binary(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .map(|e| canon_ext(&e.to_string_lossy()))
            .unwrap_or_default();

        if self.force_text.contains(&ext) {
            return false;
        }
        if self.force_binary.contains(&ext) {
            return true;
        }
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return false;
        }
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }

        sniff_binary(path)
    }

    /// A file is stored as a size-only placeholder iff binary-skip is on
    /// and the file classifies as binary.
    pub fn use_placeholder(&self, path: &Path) -> bool {
        self.skip_binary_content && self.is_binary(path)
    }
}

fn canon_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Content sniff for unknown extensions: empty or valid UTF-8 means text,
/// a NUL byte or undecodable bytes mean binary. Unreadable files default
/// to text.
fn sniff_binary(path: &Path) -> bool {
    let mut buf = [0u8; SNIFF_LEN];
    let n = match File::open(path).and_then(|mut f| f.read(&mut buf)) {
        Ok(n) => n,
        Err(_) => return false,
    };
    if n == 0 {
        return false;
    }
    let chunk = &buf[..n];
    if chunk.contains(&0) {
        return true;
    }
    std::str::from_utf8(chunk).is_err()
}
