//! 吹き出しの下に表示するフィギュア（AA）

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::CowError;

/// 組み込みのデフォルトの牛
const DEFAULT_COW: &str = r"        \   ^__^
         \  (oo)\_______
            (__)\       )\/\
                ||----w |
                ||     ||";

/// 吹き出しの下に表示するテキストブロック。内容は加工せずそのまま出力する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure(String);

impl Figure {
    pub fn new(art: impl Into<String>) -> Self {
        Self(art.into())
    }

    /// .cow ファイルを読み込む。
    ///
    /// 開けない、または UTF-8 として読めない場合は `CowError::FigureLoad` を返す。
    pub fn load(path: &Path) -> Result<Self, CowError> {
        debug!(path = %path.display(), "Loading cow file");
        match std::fs::read_to_string(path) {
            Ok(art) => {
                debug!(path = %path.display(), bytes = art.len(), "Cow file loaded");
                Ok(Self(art))
            }
            Err(source) => {
                warn!(path = %path.display(), error = %source, "Failed to load cow file");
                Err(CowError::FigureLoad {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(DEFAULT_COW)
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
