use std::fmt;

/// Access-method tag as the engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    #[default]
    Normal,
    BTree,
    Hash,
    FullText,
    Spatial,
    Gin,
    Gist,
    Brin,
    SpGist,
    Clustered,
    NonClustered,
    ColumnStore,
    Bitmap,
    Functional,
}

impl IndexType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::BTree => "BTREE",
            Self::Hash => "HASH",
            Self::FullText => "FULLTEXT",
            Self::Spatial => "SPATIAL",
            Self::Gin => "GIN",
            Self::Gist => "GIST",
            Self::Brin => "BRIN",
            Self::SpGist => "SPGIST",
            Self::Clustered => "CLUSTERED",
            Self::NonClustered => "NONCLUSTERED",
            Self::ColumnStore => "COLUMNSTORE",
            Self::Bitmap => "BITMAP",
            Self::Functional => "FUNCTIONAL",
        }
    }

    /// Maps the access-method names the catalogs report. Unrecognised names
    /// fall back to `Normal`.
    #[must_use]
    pub fn from_catalog(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "BTREE" => Self::BTree,
            "HASH" => Self::Hash,
            "FULLTEXT" => Self::FullText,
            "SPATIAL" => Self::Spatial,
            "GIN" => Self::Gin,
            "GIST" => Self::Gist,
            "BRIN" => Self::Brin,
            "SPGIST" => Self::SpGist,
            "CLUSTERED" => Self::Clustered,
            "NONCLUSTERED" => Self::NonClustered,
            "COLUMNSTORE" | "CLUSTERED COLUMNSTORE" | "NONCLUSTERED COLUMNSTORE" => {
                Self::ColumnStore
            }
            "BITMAP" => Self::Bitmap,
            "FUNCTION-BASED NORMAL" | "FUNCTION-BASED BITMAP" | "FUNCTIONAL" => Self::Functional,
            _ => Self::Normal,
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary index. Indexes that back a primary-key or unique constraint are
/// excluded at extraction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub index_type: IndexType,
    pub comment: Option<String>,
}

impl Index {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            unique: false,
            index_type: IndexType::Normal,
            comment: None,
        }
    }
}
