use thiserror::Error;

/// アクティビティ解決で発生するエラー。
///
/// メッセージはそのままユーザーに表示するため、完結した文章で保持する。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ActivityError {
    #[error("'pattern' key is required.")]
    MissingPatternKey,

    #[error(
        "Problem parsing this definition: {definition}. \
         Cannot filter by client only, please include a 'project' key."
    )]
    ClientWithoutProject { definition: String },

    #[error("Unknown match mode '{value}'. Valid modes are 'substring' and 'strict'.")]
    UnknownMatchMode { value: String },

    #[error("A pattern must be a string or a table, got {got}.")]
    UnsupportedPatternType { got: String },

    #[error("'{definition}' did not match any {kind}.\n")]
    NoMatch { definition: String, kind: String },

    #[error(
        "'{definition}' matched the following multiple {kind}:\n{matched}\n\n\
         Please provide an unambiguous pattern."
    )]
    AmbiguousMatch {
        definition: String,
        kind: String,
        matched: String,
    },

    #[error("Detected a cycle when expanding key '{key}': {path}\nPlease check your shortcuts.")]
    ExpansionCycle { key: String, path: String },

    #[error("Activity definition too long, please enter at most 3 items.")]
    ActivityTooLong,

    #[error(
        "Cannot interpret the result of expanding your input: {values},\n\
         The result should have the following items (order matters!): \
         project, service, note (optional)."
    )]
    UnexpectedExpansion { values: String },

    #[error("An activity description must contain at least one item.")]
    EmptyActivity,
}

/// ショートカット定義の検証エラー。
///
/// どのキーの定義が壊れているかを必ず含める。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("Shortcut definitions must be a table, got {got}.")]
    NotATable { got: String },

    #[error("The expansion for shortcut '{key}' is invalid: {source}")]
    Expansion { key: String, source: ExpansionError },
}

/// 1つのショートカット展開に対する検証エラー。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("List expansion cannot be empty.")]
    EmptyList,

    #[error("Shortcut expansions cannot be longer than 3 items, got {0}.")]
    TooManyItems(usize),

    #[error("Unsupported expansion type: {0}.")]
    UnsupportedType(String),
}
