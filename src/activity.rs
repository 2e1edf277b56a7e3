//! コマンドラインで入力されたアクティビティ記述をタイムエントリー仕様へ解決する。
//!
//! アクティビティ記述はショートカットキー・セレクタパターン・ノートの
//! 組み合わせで、ショートカットだけが再帰的に展開される。展開結果は
//! (プロジェクトパターン, サービスパターン, ノート)の3要素に収まる必要があり、
//! 各パターンはちょうど1件のプロジェクト・サービスにマッチしなければならない。

use crate::error::ActivityError;
use crate::mite::{Project, Service};
use crate::pattern::{find_unique, NamedEntity, PatternData};
use crate::shortcut::ShortcutTable;
use crate::time_entry::TimeEntrySpec;

/// アクティビティ記述をタイムエントリー仕様へ変換する。
///
/// 入力は1〜3個のトークン。各トークンをショートカット表で展開し、
/// 結果が2要素なら空のノートを補う。空のパターンは「プロジェクト無し」
/// 「サービス無し」を意味し、マッチングは行わない。
pub fn to_time_entry_spec(
    activity: &[String],
    shortcuts: &ShortcutTable,
    projects: &[Project],
    services: &[Service],
) -> Result<TimeEntrySpec, ActivityError> {
    if activity.is_empty() {
        return Err(ActivityError::EmptyActivity);
    }
    if activity.len() > 3 {
        return Err(ActivityError::ActivityTooLong);
    }

    let mut values = Vec::new();
    for token in activity {
        values.extend(shortcuts.expand(&PatternData::Text(token.clone()))?);
    }
    if values.len() == 2 {
        values.push(PatternData::Text(String::new()));
    }
    if values.len() != 3 {
        return Err(ActivityError::UnexpectedExpansion {
            values: render_values(&values),
        });
    }

    let note = match &values[2] {
        PatternData::Text(note) => note.clone(),
        // ノートの位置にパターンが来るのは展開の組み合わせ間違い。
        PatternData::Table(_) => {
            return Err(ActivityError::UnexpectedExpansion {
                values: render_values(&values),
            })
        }
    };
    let project_id = resolve_selector(&values[0], projects, "projects")?;
    let service_id = resolve_selector(&values[1], services, "services")?;

    Ok(TimeEntrySpec::new(project_id, service_id, &note))
}

fn resolve_selector<E: NamedEntity>(
    selector: &PatternData,
    entities: &[E],
    kind: &str,
) -> Result<Option<i64>, ActivityError> {
    if matches!(selector, PatternData::Text(text) if text.is_empty()) {
        return Ok(None);
    }
    Ok(Some(find_unique(entities, kind, selector)?.id()))
}

fn render_values(values: &[PatternData]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .map(|value| match value {
            PatternData::Text(text) => format!("'{}'", text),
            PatternData::Table(_) => value.definition(),
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}
