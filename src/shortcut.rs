use std::fmt;

use crate::error::{ActivityError, ExpansionError, ShortcutError};
use crate::pattern::PatternData;

/// 1つのショートカットキーに対する展開。
///
/// 文字列は別のキー・生パターン・ノートのいずれにもなり得る。
/// テーブルは常に終端のパターンで、さらに展開されることはない。
#[derive(Clone, Debug, PartialEq)]
pub enum Expansion {
    Text(String),
    Sequence(Vec<PatternData>),
    Pattern(toml::Table),
}

impl Expansion {
    fn from_value(value: &toml::Value) -> Result<Self, ExpansionError> {
        match value {
            toml::Value::String(s) => Ok(Self::Text(s.clone())),
            toml::Value::Array(items) => {
                if items.is_empty() {
                    return Err(ExpansionError::EmptyList);
                }
                if items.len() > 3 {
                    return Err(ExpansionError::TooManyItems(items.len()));
                }
                let items = items
                    .iter()
                    .map(|item| {
                        PatternData::from_toml(item).map_err(|_| {
                            ExpansionError::UnsupportedType(item.type_str().to_string())
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Sequence(items))
            }
            // テーブルの中身はここでは検証しない。パターンとして使われた時に検証される。
            toml::Value::Table(table) => Ok(Self::Pattern(table.clone())),
            other => Err(ExpansionError::UnsupportedType(other.type_str().to_string())),
        }
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Sequence(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        PatternData::Text(s) => format!("{:?}", s),
                        PatternData::Table(_) => item.definition(),
                    })
                    .collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Self::Pattern(table) => {
                write!(f, "{}", PatternData::Table(table.clone()).definition())
            }
        }
    }
}

/// 設定ファイルから読み込んだショートカット定義の表。
///
/// 読み込み時に各展開の形だけを検証する。循環の検出は展開時まで遅延される。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShortcutTable {
    entries: Vec<(String, Expansion)>,
}

impl ShortcutTable {
    /// TOMLの値からショートカット表を組み立てる。
    ///
    /// 表以外の値、および形の崩れた展開はエラーになる。エラーには
    /// 該当するショートカットキーが含まれる。
    pub fn from_toml(value: &toml::Value) -> Result<Self, ShortcutError> {
        let Some(table) = value.as_table() else {
            return Err(ShortcutError::NotATable {
                got: value.type_str().to_string(),
            });
        };
        let mut entries = Vec::with_capacity(table.len());
        for (key, raw) in table {
            let expansion =
                Expansion::from_value(raw).map_err(|source| ShortcutError::Expansion {
                    key: key.clone(),
                    source,
                })?;
            entries.push((key.clone(), expansion));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Expansion> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, expansion)| expansion)
    }

    /// 定義順のイテレータ。`show shortcuts`の表示に使う。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expansion)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// トークンを再帰的に展開し、終端トークンの列を返す。
    ///
    /// 表に無い文字列とテーブルはそのまま1要素の列になる。展開の履歴に
    /// 既出のキーが再登場した場合は、経路を含むエラーを返す。
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let expanded = table.expand(&PatternData::Text("daily".to_string()))?;
    /// ```
    pub fn expand(&self, token: &PatternData) -> Result<Vec<PatternData>, ActivityError> {
        self.expand_with(token, &[])
    }

    fn expand_with(
        &self,
        token: &PatternData,
        breadcrumbs: &[String],
    ) -> Result<Vec<PatternData>, ActivityError> {
        let key = match token {
            PatternData::Table(_) => return Ok(vec![token.clone()]),
            PatternData::Text(key) => key,
        };
        let Some(expansion) = self.get(key) else {
            return Ok(vec![token.clone()]);
        };
        if breadcrumbs.iter().any(|crumb| crumb == key) {
            let path = breadcrumbs
                .iter()
                .map(String::as_str)
                .chain([key.as_str()])
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ActivityError::ExpansionCycle {
                key: key.clone(),
                path,
            });
        }
        let items: Vec<PatternData> = match expansion {
            Expansion::Text(s) => vec![PatternData::Text(s.clone())],
            Expansion::Sequence(items) => items.clone(),
            Expansion::Pattern(table) => vec![PatternData::Table(table.clone())],
        };
        let mut crumbs = breadcrumbs.to_vec();
        crumbs.push(key.clone());
        let mut expanded = Vec::new();
        for item in &items {
            expanded.extend(self.expand_with(item, &crumbs)?);
        }
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Expansion, ShortcutTable};
    use crate::error::{ActivityError, ExpansionError, ShortcutError};
    use crate::pattern::PatternData;

    fn table_from(toml_src: &str) -> ShortcutTable {
        let value: toml::Value = toml::from_str(toml_src).unwrap();
        ShortcutTable::from_toml(&value).unwrap()
    }

    fn text(s: &str) -> PatternData {
        PatternData::Text(s.to_string())
    }

    #[test]
    fn test_from_toml_accepts_all_expansion_shapes() {
        let table = table_from(
            r#"o = "OCP"
daily = ["o", "c", "daily stand-up"]
q = { pattern = "QA", match = "strict" }"#,
        );
        assert_eq!(table.get("o"), Some(&Expansion::Text("OCP".to_string())));
        assert!(matches!(table.get("daily"), Some(Expansion::Sequence(items)) if items.len() == 3));
        assert!(matches!(table.get("q"), Some(Expansion::Pattern(_))));
    }

    #[rstest]
    #[case::empty_list("bad = []", ExpansionError::EmptyList)]
    #[case::too_long(
        r#"bad = ["a", "b", "c", "d"]"#,
        ExpansionError::TooManyItems(4)
    )]
    #[case::scalar("bad = 7", ExpansionError::UnsupportedType("integer".to_string()))]
    #[case::scalar_item("bad = [7]", ExpansionError::UnsupportedType("integer".to_string()))]
    fn test_from_toml_rejects_malformed_expansions(
        #[case] toml_src: &str,
        #[case] expected: ExpansionError,
    ) {
        let value: toml::Value = toml::from_str(toml_src).unwrap();
        let err = ShortcutTable::from_toml(&value).unwrap_err();
        assert_eq!(
            err,
            ShortcutError::Expansion {
                key: "bad".to_string(),
                source: expected,
            }
        );
    }

    #[test]
    fn test_from_toml_rejects_non_table() {
        let err = ShortcutTable::from_toml(&toml::Value::Integer(3)).unwrap_err();
        assert_eq!(
            err,
            ShortcutError::NotATable {
                got: "integer".to_string()
            }
        );
    }

    /// 検証エラーのメッセージにはキー名と元のエラーが両方含まれる。
    #[test]
    fn test_validation_error_message_names_the_key() {
        let value: toml::Value = toml::from_str("daily = []").unwrap();
        let err = ShortcutTable::from_toml(&value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The expansion for shortcut 'daily' is invalid: List expansion cannot be empty."
        );
    }

    /// 表に無いトークンの展開は恒等写像になる。
    #[rstest]
    #[case::plain_text(text("b"))]
    #[case::empty(text(""))]
    fn test_expand_leaf_is_identity(#[case] token: PatternData) {
        let table = ShortcutTable::default();
        assert_eq!(table.expand(&token).unwrap(), vec![token]);
    }

    /// テーブルのパターンは表にキーがあっても展開されない。
    #[test]
    fn test_expand_does_not_expand_pattern_tables() {
        let table = table_from(r#"QA = "never used""#);
        let pattern: toml::Table = toml::from_str(r#"pattern = "QA""#).unwrap();
        let token = PatternData::Table(pattern);
        assert_eq!(table.expand(&token).unwrap(), vec![token]);
    }

    #[test]
    fn test_expand_flattens_nested_shortcuts() {
        let table = table_from(
            r#"a = "ACME"
d = "Development"
ad = ["a", "d"]
nested = ["ad", "hunting for bugs"]"#,
        );
        assert_eq!(
            table.expand(&text("nested")).unwrap(),
            vec![
                text("ACME"),
                text("Development"),
                text("hunting for bugs")
            ]
        );
    }

    #[test]
    fn test_expand_detects_cycles() {
        let table = table_from(
            r#"a = "b"
b = "a""#,
        );
        let err = table.expand(&text("a")).unwrap_err();
        let ActivityError::ExpansionCycle { key, path } = &err else {
            panic!("expected a cycle");
        };
        assert_eq!(key, "a");
        assert_eq!(path, "a -> b -> a");
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_expand_detects_self_cycle() {
        let table = table_from(r#"a = ["a", "x"]"#);
        let err = table.expand(&text("a")).unwrap_err();
        assert_eq!(
            err,
            ActivityError::ExpansionCycle {
                key: "a".to_string(),
                path: "a -> a".to_string(),
            }
        );
    }

    #[test]
    fn test_display_matches_config_syntax() {
        let table = table_from(
            r#"o = "OCP"
daily = ["o", "c", "daily stand-up"]
q = { pattern = "QA", match = "strict" }"#,
        );
        let rendered: Vec<String> = table
            .iter()
            .map(|(key, expansion)| format!("{} = {}", key, expansion))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "o = OCP",
                r#"daily = ["o", "c", "daily stand-up"]"#,
                r#"q = { pattern = "QA", match = "strict" }"#,
            ]
        );
    }
}
