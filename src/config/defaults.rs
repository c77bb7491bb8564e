//! Built-in category table written by `dac init`.
//!
//! Order matters: the classifier walks categories top to bottom.

use super::{
    CONFIG_VERSION, CategoryConfig, DEFAULT_MAX_PUSH_SIZE_BYTES, DacConfig, MISC_CATEGORY,
    ProcessingSettings,
};

struct CategorySeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    extensions: &'static [&'static str],
    patterns: &'static [&'static str],
    batch_size: usize,
    icon: &'static str,
}

const CATEGORY_SEEDS: &[CategorySeed] = &[
    CategorySeed {
        id: "binary",
        name: "Binary Files",
        description: "Executable files, compiled binaries, and machine code",
        extensions: &[".exe", ".dll", ".so", ".dylib", ".bin", ".app"],
        patterns: &["*.exe", "*.dll", "*.so", "*.dylib", "*.bin", "*.app"],
        batch_size: 5,
        icon: "⚙️",
    },
    CategorySeed {
        id: "media",
        name: "Media Files",
        description: "Images, videos, audio, and multimedia content",
        extensions: &[".jpg", ".png", ".gif", ".mp4", ".mp3", ".avi", ".mov", ".wav"],
        patterns: &["*.jpg", "*.png", "*.gif", "*.mp4", "*.mp3", "*.avi", "*.mov", "*.wav"],
        batch_size: 3,
        icon: "🎨",
    },
    CategorySeed {
        id: "assets",
        name: "Asset Files",
        description: "Static assets, fonts, icons, and resources",
        extensions: &[".ttf", ".woff", ".svg", ".ico", ".eot", ".otf"],
        patterns: &["*.ttf", "*.woff*", "*.svg", "*.ico", "*.eot", "*.otf"],
        batch_size: 10,
        icon: "📦",
    },
    CategorySeed {
        id: "archives",
        name: "Archive Files",
        description: "Compressed files and archives",
        extensions: &[".zip", ".rar", ".tar", ".gz", ".7z", ".bz2"],
        patterns: &["*.zip", "*.rar", "*.tar*", "*.gz", "*.7z", "*.bz2"],
        batch_size: 2,
        icon: "📚",
    },
    CategorySeed {
        id: "source",
        name: "Source Code",
        description: "Programming language source files",
        extensions: &[".js", ".ts", ".py", ".java", ".cpp", ".c", ".cs", ".php", ".rs", ".go"],
        patterns: &["*.js", "*.ts", "*.py", "*.java", "*.cpp", "*.c", "*.cs", "*.php", "*.rs", "*.go"],
        batch_size: 15,
        icon: "💻",
    },
    CategorySeed {
        id: "web",
        name: "Web Files",
        description: "HTML, CSS, and web-related files",
        extensions: &[".html", ".css", ".scss", ".sass", ".less", ".jsx", ".vue"],
        patterns: &["*.html", "*.css", "*.scss", "*.sass", "*.less", "*.jsx", "*.vue"],
        batch_size: 12,
        icon: "🌐",
    },
    CategorySeed {
        id: "mobile",
        name: "Mobile Files",
        description: "Mobile development files",
        extensions: &[".swift", ".kt", ".dart", ".xaml"],
        patterns: &["*.swift", "*.kt", "*.dart", "*.xaml"],
        batch_size: 10,
        icon: "📱",
    },
    CategorySeed {
        id: "database",
        name: "Database Files",
        description: "Database files and SQL scripts",
        extensions: &[".sql", ".db", ".sqlite", ".mdb"],
        patterns: &["*.sql", "*.db", "*.sqlite*", "*.mdb"],
        batch_size: 5,
        icon: "🗄️",
    },
    CategorySeed {
        id: "config",
        name: "Configuration",
        description: "Configuration files and settings",
        extensions: &[".json", ".xml", ".yaml", ".yml", ".ini", ".conf", ".cfg", ".toml"],
        patterns: &["*.json", "*.xml", "*.yaml", "*.yml", "*.ini", "*.conf", "*.cfg", "*.toml"],
        batch_size: 8,
        icon: "🔩",
    },
    CategorySeed {
        id: "docs",
        name: "Documentation",
        description: "Documentation and text files",
        extensions: &[".md", ".txt", ".doc", ".docx", ".pdf", ".rtf"],
        patterns: &["*.md", "*.txt", "*.doc*", "*.pdf", "*.rtf"],
        batch_size: 10,
        icon: "📝",
    },
    CategorySeed {
        id: "data",
        name: "Data Files",
        description: "Data files and datasets",
        extensions: &[".csv", ".tsv", ".xls", ".xlsx", ".parquet"],
        patterns: &["*.csv", "*.tsv", "*.xls*", "*.parquet"],
        batch_size: 5,
        icon: "📊",
    },
    CategorySeed {
        id: "system",
        name: "System Files",
        description: "System and hidden files",
        extensions: &[".log", ".tmp", ".cache", ".lock"],
        patterns: &["*.log", "*.tmp", "*.cache", "*.lock", ".*"],
        batch_size: 20,
        icon: "🔧",
    },
    CategorySeed {
        id: MISC_CATEGORY,
        name: "Miscellaneous",
        description: "Other files that don't fit in specific categories",
        extensions: &[],
        patterns: &["*"],
        batch_size: 10,
        icon: "📄",
    },
];

impl CategorySeed {
    fn to_config(&self) -> CategoryConfig {
        CategoryConfig {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            extensions: self.extensions.iter().map(|s| s.to_string()).collect(),
            patterns: self.patterns.iter().map(|s| s.to_string()).collect(),
            batch_size: self.batch_size,
            icon: self.icon.to_string(),
        }
    }
}

/// The built-in category list, in classification order.
pub fn default_categories() -> Vec<CategoryConfig> {
    CATEGORY_SEEDS.iter().map(CategorySeed::to_config).collect()
}

/// Configuration written by `dac init` and `dac config --reset`.
pub fn default_config() -> DacConfig {
    DacConfig {
        version: CONFIG_VERSION.to_string(),
        exclude_patterns: [
            "node_modules/**",
            ".git/**",
            "dist/**",
            "build/**",
            ".cache/**",
            ".tmp/**",
            "*.log",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        max_push_size: DEFAULT_MAX_PUSH_SIZE_BYTES,
        processing: ProcessingSettings::default(),
        file_types: default_categories(),
    }
}
