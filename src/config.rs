use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::console::Prompter;
use crate::error::ShortcutError;
use crate::shortcut::ShortcutTable;

/// QWERTYのホームポジション。
const DEFAULT_MENU_KEYS: &str = "asdfjkl;";

/// 設定の読み込みで発生するエラー。起動時に表示してそのまま終了する。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key must be exactly 16 characters long, this one is {0}.")]
    ApiKeyLength(usize),

    #[error("API key must only consist of hexadecimal characters.")]
    ApiKeyCharacters,

    #[error("url: {0}")]
    Url(String),

    #[error("url is required in the configuration file.")]
    MissingUrl,

    #[error("menu_keys: {0}")]
    MenuKeys(String),

    #[error("shortcuts: {0}")]
    Shortcuts(#[from] ShortcutError),

    #[error("There was a problem parsing your configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine your home directory.")]
    MissingHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// miteのAPIキー。16文字の16進数文字列。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// 前後の空白を取り除き、小文字に正規化してから検証する。
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let value = raw.trim().to_lowercase();
        if value.len() != 16 {
            return Err(ConfigError::ApiKeyLength(value.len()));
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::ApiKeyCharacters);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーの設定ファイルの内容。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub url: String,
    pub menu_keys: String,
    pub shortcuts: ShortcutTable,
}

impl Config {
    /// TOML文字列から設定を読み取って検証する。
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(raw)?;
        Self::from_table(table)
    }

    fn from_table(mut table: toml::Table) -> Result<Self, ConfigError> {
        let url = match table.remove("url") {
            Some(toml::Value::String(url)) => url,
            Some(other) => {
                return Err(ConfigError::Url(format!(
                    "Expected a string, got {}.",
                    other.type_str()
                )))
            }
            // 旧い設定ではurlの代わりにアカウント名だけを書いていた。
            None => match table.remove("account") {
                Some(toml::Value::String(account)) => {
                    format!("https://{}.mite.yo.lk", account)
                }
                _ => return Err(ConfigError::MissingUrl),
            },
        };
        let url = validate_url(&url)?;

        let menu_keys = match table.remove("menu_keys") {
            None => DEFAULT_MENU_KEYS.to_string(),
            Some(toml::Value::String(keys)) => keys,
            Some(other) => {
                return Err(ConfigError::MenuKeys(format!(
                    "Expected a string, got {}.",
                    other.type_str()
                )))
            }
        };
        let menu_keys = uniq_menu_keys(&menu_keys);
        if menu_keys.is_empty() {
            return Err(ConfigError::MenuKeys(
                "At least one key must be provided.".to_string(),
            ));
        }

        let shortcuts = match table.remove("shortcuts") {
            None => ShortcutTable::default(),
            Some(value) => ShortcutTable::from_toml(&value)?,
        };

        Ok(Self {
            url,
            menu_keys,
            shortcuts,
        })
    }
}

fn validate_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = reqwest::Url::parse(raw).map_err(|err| ConfigError::Url(err.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(ConfigError::Url("HTTPS is required for security.".to_string()));
    }
    let host = parsed
        .host_str()
        .filter(|host| host.ends_with("mite.yo.lk"))
        .ok_or_else(|| ConfigError::Url("Make sure you are using a mite url.".to_string()))?;
    Ok(format!("https://{}", host))
}

// 順序を保ったまま重複したキーを取り除く。
fn uniq_menu_keys(raw: &str) -> String {
    let mut seen = Vec::new();
    raw.chars()
        .filter(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(*c);
                true
            }
        })
        .collect()
}

/// 各ファイルから読み込んだ設定一式。
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_key: ApiKey,
    pub config: Config,
}

/// `~/.config/miite/`から設定を読み込む。
///
/// ディレクトリやファイルが無ければ作成し、足りない値は入力を求める。
pub fn initialize(prompter: &mut dyn Prompter) -> Result<Settings, ConfigError> {
    let config_dir = dirs::home_dir()
        .ok_or(ConfigError::MissingHomeDir)?
        .join(".config")
        .join(env!("CARGO_PKG_NAME"));
    initialize_at(&config_dir, prompter)
}

pub fn initialize_at(config_dir: &Path, prompter: &mut dyn Prompter) -> Result<Settings, ConfigError> {
    fs::create_dir_all(config_dir)?;
    let api_key = load_api_key(&config_dir.join("apikey"), prompter)?;
    let config = load_config(&config_dir.join("config.toml"), prompter)?;
    Ok(Settings { api_key, config })
}

/// APIキーをファイルから読み込む。
///
/// ファイルが無い場合は入力を求め、検証に通ったキーを保存する。
fn load_api_key(path: &Path, prompter: &mut dyn Prompter) -> Result<ApiKey, ConfigError> {
    if path.exists() {
        return ApiKey::parse(&fs::read_to_string(path)?);
    }
    let raw = prompter.prompt("Key not found, please enter it", None)?;
    let key = ApiKey::parse(&raw)?;
    fs::write(path, format!("{}\n", key))?;
    Ok(key)
}

fn load_config(path: &Path, prompter: &mut dyn Prompter) -> Result<Config, ConfigError> {
    if path.exists() {
        return Config::parse(&fs::read_to_string(path)?);
    }
    let url = prompter.prompt("Please copy/paste your mite URL", None)?;
    let config = Config {
        url: validate_url(&url)?,
        menu_keys: DEFAULT_MENU_KEYS.to_string(),
        shortcuts: ShortcutTable::default(),
    };
    fs::write(path, default_config_toml(&config.url))?;
    Ok(config)
}

fn default_config_toml(url: &str) -> String {
    format!(
        "url = \"{}\"\nmenu_keys = \"{}\"\n\n# Add your shortcuts inside this section.\n[shortcuts]\n",
        url, DEFAULT_MENU_KEYS
    )
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::{initialize_at, ApiKey, Config, ConfigError};
    use crate::console::Prompter;
    use crate::shortcut::ShortcutTable;

    struct ScriptedPrompter {
        answers: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().rev().map(|a| a.to_string()).collect(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn prompt(&mut self, _text: &str, _default: Option<&str>) -> io::Result<String> {
            Ok(self.answers.pop().expect("ran out of scripted answers"))
        }
    }

    #[rstest]
    #[case::plain("0123456789abcdef")]
    #[case::padded(" 0123456789abcdef\n")]
    #[case::uppercase("0123456789ABCDEF")]
    fn test_api_key_is_normalized(#[case] raw: &str) {
        let key = ApiKey::parse(raw).unwrap();
        assert_eq!(key.to_string(), "0123456789abcdef");
    }

    #[rstest]
    #[case::too_short("abc123")]
    #[case::too_long("0123456789abcdef0")]
    #[case::not_hex("0123456789abcdeg")]
    fn test_invalid_api_key_is_rejected(#[case] raw: &str) {
        assert!(ApiKey::parse(raw).is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"url = "https://demo.mite.yo.lk"
menu_keys = "asd"

[shortcuts]
o = "OCP"
daily = ["o", "c", "daily stand-up"]"#,
        )
        .unwrap();

        assert_eq!(config.url, "https://demo.mite.yo.lk");
        assert_eq!(config.menu_keys, "asd");
        assert!(config.shortcuts.get("daily").is_some());
    }

    /// menu_keysとshortcutsは省略できる。
    #[test]
    fn test_parse_defaults() {
        let config = Config::parse(r#"url = "https://demo.mite.yo.lk""#).unwrap();
        assert_eq!(config.menu_keys, "asdfjkl;");
        assert_eq!(config.shortcuts, ShortcutTable::default());
    }

    #[test]
    fn test_menu_keys_are_deduplicated_in_order() {
        let config = Config::parse(
            r#"url = "https://demo.mite.yo.lk"
menu_keys = "asdsaf""#,
        )
        .unwrap();
        assert_eq!(config.menu_keys, "asdf");
    }

    #[test]
    fn test_empty_menu_keys_are_rejected() {
        let err = Config::parse(
            r#"url = "https://demo.mite.yo.lk"
menu_keys = """#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "menu_keys: At least one key must be provided."
        );
    }

    #[test]
    fn test_legacy_account_is_converted_to_url() {
        let config = Config::parse(r#"account = "demo""#).unwrap();
        assert_eq!(config.url, "https://demo.mite.yo.lk");
    }

    #[test]
    fn test_url_is_required() {
        assert!(matches!(
            Config::parse(r#"menu_keys = "asd""#).unwrap_err(),
            ConfigError::MissingUrl
        ));
    }

    #[rstest]
    #[case::plain_http("http://demo.mite.yo.lk", "url: HTTPS is required for security.")]
    #[case::foreign_host(
        "https://demo.example.com",
        "url: Make sure you are using a mite url."
    )]
    fn test_invalid_urls_are_rejected(#[case] url: &str, #[case] expected: &str) {
        let err = Config::parse(&format!("url = {:?}", url)).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }

    /// ショートカットの検証エラーにはフィールド名とキーの両方が入る。
    #[test]
    fn test_shortcut_errors_name_the_field_and_key() {
        let err = Config::parse(
            r#"url = "https://demo.mite.yo.lk"

[shortcuts]
daily = []"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "shortcuts: The expansion for shortcut 'daily' is invalid: \
             List expansion cannot be empty."
        );
    }

    #[test]
    fn test_parse_error_is_explained() {
        let err = Config::parse("url = ").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("There was a problem parsing your configuration file:"));
    }

    /// 初回起動ではキーとURLの入力を求め、両方のファイルを作成する。
    #[test]
    fn test_initialize_prompts_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("miite");
        let mut prompter =
            ScriptedPrompter::new(&["0123456789ABCDEF ", "https://demo.mite.yo.lk"]);

        let settings = initialize_at(&config_dir, &mut prompter).unwrap();

        assert_eq!(settings.api_key.to_string(), "0123456789abcdef");
        assert_eq!(settings.config.url, "https://demo.mite.yo.lk");
        assert_eq!(
            std::fs::read_to_string(config_dir.join("apikey")).unwrap(),
            "0123456789abcdef\n"
        );
        let written = std::fs::read_to_string(config_dir.join("config.toml")).unwrap();
        assert!(written.contains("url = \"https://demo.mite.yo.lk\""));
        assert!(written.contains("[shortcuts]"));
    }

    /// 2回目以降はファイルから読み込み、入力は求めない。
    #[test]
    fn test_initialize_reads_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("miite");
        let mut first = ScriptedPrompter::new(&["0123456789abcdef", "https://demo.mite.yo.lk"]);
        initialize_at(&config_dir, &mut first).unwrap();

        // 応答を用意しないPrompterでも成功する。
        let mut second = ScriptedPrompter::new(&[]);
        let settings = initialize_at(&config_dir, &mut second).unwrap();

        assert_eq!(settings.config.url, "https://demo.mite.yo.lk");
    }
}
