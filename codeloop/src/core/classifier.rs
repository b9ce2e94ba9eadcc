//! Task suitability heuristics.
//!
//! Only tasks whose correctness shows up on stdout can be checked by running
//! test cases. These ordered keyword rules flag tasks that cannot (file I/O,
//! GUIs, servers, ...) so the CLI can warn before spending oracle calls.
//! Matching is case-insensitive substring search; the first matching rule wins.

const NON_OUTPUT_KEYWORDS: &[&str] = &[
    "create file", "write file", "save file", "file in", "write to file",
    "read file", "open file", "delete file", "modify file", "edit file",
    "directory", "folder", "path", "mkdir", "rmdir",
    "database", "sql", "insert into", "create table", "drop table",
    "machine learning", "train model", "save model", "load model",
    "neural network", "deep learning", "tensorflow", "pytorch",
    "plot", "graph", "chart", "visualization", "matplotlib", "pyplot",
    "gui", "interface", "tkinter", "pyqt", "kivy", "streamlit",
    "api", "rest api", "flask", "django", "fastapi",
    "server", "client", "socket", "network", "http",
    "thread", "process", "multiprocessing", "async",
    "install", "pip install", "download", "upload", "request",
    "email", "notification", "send message",
    "web scraping", "scrape", "beautiful soup", "selenium",
    "image processing", "opencv", "pillow", "image",
    "audio", "video", "media", "pygame",
];

const OUTPUT_KEYWORDS: &[&str] = &[
    "return", "output", "print", "display", "show",
    "calculate", "compute", "find", "determine", "get",
    "sum", "add", "subtract", "multiply", "divide",
    "average", "mean", "median", "mode",
    "maximum", "minimum", "max", "min", "largest", "smallest",
    "sort", "arrange", "order", "reverse", "flip",
    "count", "search", "lookup", "index",
    "convert", "transform", "change", "format",
    "check", "validate", "verify", "test", "is",
    "compare", "match", "equal", "different",
    "parse", "extract", "split", "join",
    "palindrome", "anagram", "substring",
    "factorial", "fibonacci", "prime", "perfect",
    "even", "odd", "positive", "negative",
    "length", "size", "contains", "startswith", "endswith",
];

const MATH_KEYWORDS: &[&str] = &["formula", "equation", "algorithm", "logic", "condition"];

/// Suitability rules, evaluated top to bottom. No match means unsuitable.
const SUITABILITY_RULES: &[(&[&str], bool)] = &[
    (NON_OUTPUT_KEYWORDS, false),
    (OUTPUT_KEYWORDS, true),
    (MATH_KEYWORDS, true),
];

/// Broad task family, used to explain why a task was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    FileOperations,
    Database,
    MachineLearning,
    Gui,
    WebApi,
    Visualization,
    WebScraping,
    Concurrency,
    General,
}

const CATEGORY_RULES: &[(&[&str], TaskCategory)] = &[
    (&["file", "directory", "folder", "path"], TaskCategory::FileOperations),
    (&["database", "sql", "table"], TaskCategory::Database),
    (
        &["machine learning", "model", "neural", "tensorflow", "pytorch"],
        TaskCategory::MachineLearning,
    ),
    (&["gui", "interface", "tkinter", "window"], TaskCategory::Gui),
    (&["api", "server", "client", "flask", "django"], TaskCategory::WebApi),
    (&["plot", "graph", "chart", "matplotlib"], TaskCategory::Visualization),
    (
        &["scrape", "scraping", "selenium", "requests"],
        TaskCategory::WebScraping,
    ),
    (
        &["thread", "process", "async", "concurrent"],
        TaskCategory::Concurrency,
    ),
];

impl TaskCategory {
    /// One-line explanation shown when a task is rejected.
    pub fn warning(self) -> &'static str {
        match self {
            TaskCategory::FileOperations => {
                "File operations: file creation, modification, or deletion cannot be verified from program output."
            }
            TaskCategory::Database => {
                "Database operations: database interactions cannot be tested automatically here."
            }
            TaskCategory::MachineLearning => {
                "Machine learning: model training tasks are not suitable for output-based testing."
            }
            TaskCategory::Gui => {
                "GUI applications: graphical interfaces cannot be tested through console output."
            }
            TaskCategory::WebApi => {
                "Web/API development: server and client programs need a different testing approach."
            }
            TaskCategory::Visualization => {
                "Data visualization: plots and charts cannot be verified through text output."
            }
            TaskCategory::WebScraping => {
                "Web scraping: external web requests are not suitable for this environment."
            }
            TaskCategory::Concurrency => {
                "Concurrency: threaded and async programs are hard to test by output alone."
            }
            TaskCategory::General => {
                "Non-computational task: this task does not seem to produce verifiable output."
            }
        }
    }
}

/// Suitability verdict for a task description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub suitable: bool,
    pub category: TaskCategory,
}

pub fn assess(task: &str) -> Assessment {
    Assessment {
        suitable: is_output_based(task),
        category: categorize(task),
    }
}

/// Whether the task is expected to produce checkable stdout output.
pub fn is_output_based(task: &str) -> bool {
    let lower = task.to_lowercase();
    SUITABILITY_RULES
        .iter()
        .find(|(keywords, _)| contains_any(&lower, keywords))
        .is_some_and(|(_, verdict)| *verdict)
}

pub fn categorize(task: &str) -> TaskCategory {
    let lower = task.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| contains_any(&lower, keywords))
        .map_or(TaskCategory::General, |(_, category)| *category)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
