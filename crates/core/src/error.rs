use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("日付パターンが空です")]
    Empty,
    #[error("日付パターンに未対応の指定子が含まれています: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("撮影日時をどのソースからも取得できませんでした")]
    TimestampUnresolvable,
    #[error("連番サフィックスが上限({limit})に達しました: {base}")]
    NameSpaceExhausted { base: String, limit: u32 },
    #[error("ファイル操作に失敗しました: {source}")]
    Filesystem {
        #[from]
        source: std::io::Error,
    },
}
