use crate::error::ActivityError;

/// mite上の名前付きエンティティ(プロジェクト・サービス)への共通インターフェース。
pub trait NamedEntity {
    fn id(&self) -> i64;
    fn name(&self) -> &str;

    /// 顧客名。プロジェクト以外は持たない。
    fn customer_name(&self) -> Option<&str> {
        None
    }

    /// エラーメッセージなどでの表示用の名前。
    fn display_name(&self) -> String {
        match self.customer_name() {
            Some(customer) => format!("{} (Customer: {})", self.name(), customer),
            None => self.name().to_string(),
        }
    }
}

/// ユーザーが記述したままの形のセレクタ。
///
/// 文字列は名前に対する部分一致を意味する。テーブルは`pattern`と`match`、
/// もしくはプロジェクト選択の場合は`project`と`client`の組み合わせを持つ。
#[derive(Clone, Debug, PartialEq)]
pub enum PatternData {
    Text(String),
    Table(toml::Table),
}

impl PatternData {
    pub fn from_toml(value: &toml::Value) -> Result<Self, ActivityError> {
        match value {
            toml::Value::String(s) => Ok(Self::Text(s.clone())),
            toml::Value::Table(t) => Ok(Self::Table(t.clone())),
            other => Err(ActivityError::UnsupportedPatternType {
                got: other.type_str().to_string(),
            }),
        }
    }

    /// エラーメッセージに埋め込むための定義文字列を返す。
    ///
    /// テーブルはキー順を固定したTOMLインラインテーブルとして描画するため、
    /// 同じ定義は常に同じ文字列になる。
    pub fn definition(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Table(table) => render_table(table),
        }
    }
}

// pattern, match, project, client の順で描画し、残りはテーブル内の順に従う。
const CANONICAL_KEY_ORDER: [&str; 4] = ["pattern", "match", "project", "client"];

fn render_table(table: &toml::Table) -> String {
    let mut parts = Vec::new();
    for key in CANONICAL_KEY_ORDER {
        if let Some(value) = table.get(key) {
            parts.push(format!("{} = {}", key, render_value(value)));
        }
    }
    for (key, value) in table {
        if !CANONICAL_KEY_ORDER.contains(&key.as_str()) {
            parts.push(format!("{} = {}", key, render_value(value)));
        }
    }
    format!("{{ {} }}", parts.join(", "))
}

fn render_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => format!("{:?}", s),
        toml::Value::Table(t) => render_table(t),
        other => other.to_string(),
    }
}

/// マッチ対象のフィールド。
#[derive(Clone, Copy, Debug, PartialEq)]
enum Field {
    Name,
    CustomerName,
}

impl Field {
    fn value<'a>(&self, entity: &'a impl NamedEntity) -> Option<&'a str> {
        match self {
            Self::Name => Some(entity.name()),
            Self::CustomerName => entity.customer_name(),
        }
    }
}

/// パース済みの述語。バリアントごとに網羅的にマッチして評価する。
#[derive(Clone, Debug, PartialEq)]
enum Matcher {
    Substring { field: Field, pattern: String },
    Strict { field: Field, pattern: String },
    All(Vec<Matcher>),
}

impl Matcher {
    fn matches(&self, entity: &impl NamedEntity) -> bool {
        match self {
            Self::Substring { field, pattern } => field
                .value(entity)
                .is_some_and(|value| value.contains(pattern)),
            Self::Strict { field, pattern } => {
                field.value(entity).is_some_and(|value| value == pattern)
            }
            Self::All(matchers) => matchers.iter().all(|m| m.matches(entity)),
        }
    }
}

/// セレクタ定義をパースした結果。
///
/// 述語と、エラー表示用の安定した定義文字列を保持する。
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPattern {
    matcher: Matcher,
    definition: String,
}

impl CompiledPattern {
    /// セレクタ定義をパースする。
    ///
    /// `client`のみのテーブル、`pattern`キーの欠落、未知の`match`値は
    /// いずれもエラーとして拒否する。
    pub fn parse(data: &PatternData) -> Result<Self, ActivityError> {
        let definition = data.definition();
        let matcher = match data {
            PatternData::Text(text) => Matcher::Substring {
                field: Field::Name,
                pattern: text.clone(),
            },
            PatternData::Table(table) => {
                if let Some(project) = table.get("project") {
                    let mut predicates = vec![simple_matcher(project, Field::Name)?];
                    if let Some(client) = table.get("client") {
                        predicates.push(simple_matcher(client, Field::CustomerName)?);
                    }
                    match predicates.len() {
                        1 => predicates.remove(0),
                        _ => Matcher::All(predicates),
                    }
                } else if table.contains_key("client") {
                    return Err(ActivityError::ClientWithoutProject { definition });
                } else {
                    simple_matcher(&toml::Value::Table(table.clone()), Field::Name)?
                }
            }
        };
        Ok(Self {
            matcher,
            definition,
        })
    }

    pub fn matches(&self, entity: &impl NamedEntity) -> bool {
        self.matcher.matches(entity)
    }
}

fn simple_matcher(value: &toml::Value, field: Field) -> Result<Matcher, ActivityError> {
    let table = match value {
        toml::Value::String(pattern) => {
            return Ok(Matcher::Substring {
                field,
                pattern: pattern.clone(),
            })
        }
        toml::Value::Table(table) => table,
        other => {
            return Err(ActivityError::UnsupportedPatternType {
                got: other.type_str().to_string(),
            })
        }
    };
    let pattern = table
        .get("pattern")
        .ok_or(ActivityError::MissingPatternKey)?;
    let pattern = pattern
        .as_str()
        .ok_or_else(|| ActivityError::UnsupportedPatternType {
            got: pattern.type_str().to_string(),
        })?
        .to_string();
    match table.get("match") {
        None => Ok(Matcher::Substring { field, pattern }),
        Some(mode) => match mode.as_str() {
            Some("substring") => Ok(Matcher::Substring { field, pattern }),
            Some("strict") => Ok(Matcher::Strict { field, pattern }),
            Some(unknown) => Err(ActivityError::UnknownMatchMode {
                value: unknown.to_string(),
            }),
            None => Err(ActivityError::UnknownMatchMode {
                value: mode.to_string(),
            }),
        },
    }
}

/// パターンにちょうど1件だけマッチするエンティティを探す。
///
/// マッチが0件・複数件の場合は、定義文字列とマッチした名前の一覧を含む
/// エラーを返す。一覧は入力の順序を保つ。
pub fn find_unique<'a, E: NamedEntity>(
    entities: &'a [E],
    kind: &str,
    data: &PatternData,
) -> Result<&'a E, ActivityError> {
    let pattern = CompiledPattern::parse(data)?;
    let matched: Vec<&E> = entities.iter().filter(|e| pattern.matches(*e)).collect();
    match matched.as_slice() {
        [] => Err(ActivityError::NoMatch {
            definition: pattern.definition.clone(),
            kind: kind.to_string(),
        }),
        [unique] => Ok(unique),
        many => Err(ActivityError::AmbiguousMatch {
            definition: pattern.definition.clone(),
            kind: kind.to_string(),
            matched: many
                .iter()
                .map(|e| e.display_name())
                .collect::<Vec<_>>()
                .join("\n"),
        }),
    }
}
