//! 路径过滤：决定目录树中哪些文件/目录参与指纹
//!
//! 规则只看名字，不读内容：
//! - 以 `.` 开头的隐藏项默认跳过；
//! - 已知的非源码扩展名、文件名与构建/虚拟环境目录默认跳过。

use crate::options::ScanOptions;

/// 跳过的目录名（小写比较）
const FILTERED_DIRS: &[&str] = &[
    "nbproject", "nbbuild", "nbdist", "__pycache__", "venv", "_yardoc", "eggs", "wheels", "htmlcov",
    "__pypackages__",
];

/// 跳过的目录后缀
const FILTERED_DIR_EXT: &[&str] = &[".egg-info"];

/// 跳过的文件后缀（含扩展名与常见文档类文件名结尾）
const FILTERED_EXT: &[&str] = &[
    ".1", ".2", ".3", ".4", ".5", ".6", ".7", ".8", ".9", ".ac", ".adoc", ".am",
    ".asciidoc", ".bmp", ".build", ".cfg", ".chm", ".class", ".cmake", ".cnf",
    ".conf", ".config", ".contributors", ".copying", ".crt", ".csproj", ".css",
    ".csv", ".dat", ".data", ".doc", ".docx", ".dtd", ".dts", ".iws", ".c9", ".c9revisions",
    ".dtsi", ".dump", ".eot", ".eps", ".geojson", ".gdoc", ".gif",
    ".glif", ".gmo", ".gradle", ".guess", ".hex", ".htm", ".html", ".ico", ".iml",
    ".in", ".inc", ".info", ".ini", ".ipynb", ".jpeg", ".jpg", ".json", ".jsonld", ".lock",
    ".log", ".m4", ".map", ".markdown", ".md", ".md5", ".meta", ".mk", ".mxml",
    ".o", ".otf", ".out", ".pbtxt", ".pdf", ".pem", ".phtml", ".plist", ".png",
    ".po", ".ppt", ".prefs", ".properties", ".pyc", ".qdoc", ".result", ".rgb",
    ".rst", ".scss", ".sha", ".sha1", ".sha2", ".sha256", ".sln", ".spec", ".sql",
    ".sub", ".svg", ".svn-base", ".tab", ".template", ".test", ".tex", ".tiff",
    ".toml", ".ttf", ".txt", ".utf-8", ".vim", ".wav", ".whl", ".woff", ".xht",
    ".xhtml", ".xls", ".xlsx", ".xml", ".xpm", ".xsd", ".xul", ".yaml", ".yml", ".wfp",
    ".editorconfig", ".dotcover", ".pid", ".lcov", ".egg", ".manifest", ".cache", ".coverage", ".cover",
    ".gem", ".lst", ".pickle", ".pdb", ".gml", ".pot", ".plt",
    // 文件名结尾
    "-doc", "changelog", "config", "copying", "license", "authors", "news",
    "licenses", "notice",
    "readme", "swiftdoc", "texidoc", "todo", "version", "ignore", "manifest", "sqlite", "sqlite3",
];

/// 跳过的完整文件名
const FILTERED_FILES: &[&str] = &[
    "gradlew", "gradlew.bat", "mvnw", "mvnw.cmd", "gradle-wrapper.jar", "maven-wrapper.jar",
    "thumbs.db", "babel.config.js",
    "license.txt", "license.md", "copying.lib", "makefile",
];

/// 名字过滤器（线程安全，无内部状态）
#[derive(Debug, Clone, Copy, Default)]
pub struct PathFilter {
    pub all_extensions: bool,
    pub all_folders: bool,
    pub all_hidden: bool,
}

impl PathFilter {
    pub fn from_options(opts: &ScanOptions) -> Self {
        Self {
            all_extensions: opts.all_extensions,
            all_folders: opts.all_folders,
            all_hidden: opts.all_hidden,
        }
    }

    /// 文件名（不含目录）是否参与指纹
    pub fn accept_file(&self, name: &str) -> bool {
        if name.starts_with('.') && !self.all_hidden {
            return false;
        }
        if self.all_extensions {
            return true;
        }
        let lower = name.to_lowercase();
        if FILTERED_FILES.contains(&lower.as_str()) {
            return false;
        }
        !FILTERED_EXT.iter().any(|ending| lower.ends_with(ending))
    }

    /// 目录名是否继续下探
    pub fn accept_dir(&self, name: &str) -> bool {
        if name.starts_with('.') && !self.all_hidden {
            return false;
        }
        if self.all_folders {
            return true;
        }
        let lower = name.to_lowercase();
        if FILTERED_DIRS.contains(&lower.as_str()) {
            return false;
        }
        !FILTERED_DIR_EXT.iter().any(|ending| lower.ends_with(ending))
    }
}
