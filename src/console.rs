use std::io::{self, Write};

use crate::time_entry::TimeEntry;

/// 端末からの入力を尋ねるためのtrait。
///
/// 設定の初期化とメニュー選択の両方で使う。テストではスクリプト化した
/// 実装に差し替える。
pub trait Prompter {
    /// メッセージを表示して1行の入力を受け取る。
    ///
    /// デフォルト値がある場合、空の入力はデフォルト値として扱う。
    fn prompt(&mut self, text: &str, default: Option<&str>) -> io::Result<String>;
}

/// 標準入出力を使う`Prompter`の実装。
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, text: &str, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(default) => print!("{} [{}]: ", text, default),
            None => print!("{}: ", text),
        }
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let entered = line.trim();
        if entered.is_empty() {
            if let Some(default) = default {
                return Ok(default.to_string());
            }
        }
        Ok(entered.to_string())
    }
}

/// 今日のタイムエントリーから1件を選ぶためのメニュー。
#[derive(Clone, Debug)]
pub struct Menu {
    prompt: String,
    default_key: String,
    entries: Vec<(String, TimeEntry)>,
}

impl Menu {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// デフォルトで選択されるキー。最後に割り当てたキーを使う。
    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn get(&self, key: &str) -> Option<&TimeEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }
}

/// エントリーの一覧からメニューを組み立てる。
///
/// キーは1文字、同じ文字の繰り返し、2文字の組み合わせの順で割り当てる。
/// キーが尽きた場合、残りのエントリーはメニューに載らない。
pub fn build_menu(menu_keys: &str, entries: &[TimeEntry]) -> Menu {
    let keyed: Vec<(String, TimeEntry)> = menu_key_sequence(menu_keys)
        .into_iter()
        .zip(entries.iter().cloned())
        .collect();
    let mut prompt = String::new();
    for (key, entry) in &keyed {
        prompt.push_str(&format!("{}\t{}\n", key, entry.note));
    }
    prompt.push_str("Select an entry please");
    let default_key = keyed
        .last()
        .map(|(key, _)| key.clone())
        .unwrap_or_default();
    Menu {
        prompt,
        default_key,
        entries: keyed,
    }
}

fn menu_key_sequence(menu_keys: &str) -> Vec<String> {
    let chars: Vec<char> = menu_keys.chars().collect();
    let mut keys: Vec<String> = chars.iter().map(|c| c.to_string()).collect();
    keys.extend(chars.iter().map(|c| format!("{}{}", c, c)));
    for (i, a) in chars.iter().enumerate() {
        for b in &chars[i + 1..] {
            keys.push(format!("{}{}", a, b));
        }
    }
    keys
}

/// メニューに載っているキーが入力されるまで尋ね続け、選ばれたエントリーを返す。
pub fn select_entry(prompter: &mut dyn Prompter, menu: &Menu) -> io::Result<TimeEntry> {
    loop {
        let key = prompter.prompt(menu.prompt(), Some(menu.default_key()))?;
        match menu.get(&key) {
            Some(entry) => return Ok(entry.clone()),
            None => eprintln!(
                "The key you entered ({}) is not in the menu. Asking again.",
                key
            ),
        }
    }
}
