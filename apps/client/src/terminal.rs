//! Line-oriented host: reads commands from stdin, drives the `App` and
//! prints the document after every command.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::api::Upload;
use crate::app::{App, Outcome};
use crate::calendar::DayOffset;
use crate::dialogs::Dialogs;
use crate::document::{CalendarItem, Document, PanelBody, PanelPhase, Tab};
use crate::library::ModelForm;
use crate::render::{Action, MSG_LOADING_SLOTS, MSG_NO_SLOTS};

/// Stdin shared between the command loop and confirmation prompts.
pub type SharedInput = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> SharedInput {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

const HELP: &str = "\
Команды:
  day N                 открыть/закрыть день (0-13)
  book N                забронировать N-й слот открытого дня
  cancel ID             отменить своё бронирование
  tab NAME              home | calendar | library | submit | profile | admin
  theme                 переключить тему
  refresh               обновить данные
  submit TITLE FILE [IMAGE]  название может содержать пробелы
  name TEXT | handle TEXT | avatar URL
  approve ID | reject ID | admin-cancel ID | date YYYY-MM-DD
  show | help | quit";

// ── Dialogs ──

pub struct TerminalDialogs {
    input: SharedInput,
}

impl TerminalDialogs {
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Dialogs for TerminalDialogs {
    async fn confirm(&self, message: &str) -> bool {
        println!("? {message} [y/n]");
        let answer = self.input.lock().await.next_line().await;
        match answer {
            Ok(Some(line)) => is_yes(&line),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("failed to read confirmation: {}", e);
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        println!("» {message}");
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "д" | "да"
    )
}

// ── Commands ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Day(DayOffset),
    Book(usize),
    Cancel(i64),
    Tab(Tab),
    Theme,
    Refresh,
    Approve(i64),
    Reject(i64),
    AdminCancel(i64),
    Date(Option<NaiveDate>),
    Submit {
        title: String,
        file: String,
        image: Option<String>,
    },
    Name(String),
    Handle(String),
    Avatar(String),
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "day" => {
                let n: u8 = number(rest)?;
                DayOffset::new(n)
                    .map(Self::Day)
                    .ok_or_else(|| "День должен быть от 0 до 13".to_string())
            }
            "book" => {
                let n: usize = number(rest)?;
                if n == 0 {
                    return Err("Слоты нумеруются с 1".into());
                }
                Ok(Self::Book(n))
            }
            "cancel" => Ok(Self::Cancel(number(rest)?)),
            "tab" => Tab::parse(rest)
                .map(Self::Tab)
                .ok_or_else(|| format!("Неизвестная вкладка: {rest}")),
            "theme" => Ok(Self::Theme),
            "refresh" => Ok(Self::Refresh),
            "approve" => Ok(Self::Approve(number(rest)?)),
            "reject" => Ok(Self::Reject(number(rest)?)),
            "admin-cancel" => Ok(Self::AdminCancel(number(rest)?)),
            "date" if rest.is_empty() => Ok(Self::Date(None)),
            "date" => NaiveDate::parse_from_str(rest, "%Y-%m-%d")
                .map(|d| Self::Date(Some(d)))
                .map_err(|_| format!("Неверная дата: {rest}")),
            "submit" => parse_submit(rest),
            "name" => Ok(Self::Name(rest.to_string())),
            "handle" => Ok(Self::Handle(rest.to_string())),
            "avatar" if rest.is_empty() => Err("Использование: avatar URL".into()),
            "avatar" => Ok(Self::Avatar(rest.to_string())),
            "show" | "" => Ok(Self::Show),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Неизвестная команда: {other}")),
        }
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

fn is_image(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Paths are taken from the end of the line, the rest is the title. A
/// trailing image path is the optional preview.
fn parse_submit(rest: &str) -> Result<Command, String> {
    let mut words: Vec<&str> = rest.split_whitespace().collect();
    let image = if words.len() >= 3 && words.last().is_some_and(|w| is_image(w)) {
        words.pop().map(str::to_string)
    } else {
        None
    };
    match words.pop() {
        Some(file) if !words.is_empty() => Ok(Command::Submit {
            title: words.join(" "),
            file: file.to_string(),
            image,
        }),
        _ => Err("Использование: submit TITLE FILE [IMAGE]".into()),
    }
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("Ожидалось число, получено: {raw:?}"))
}

// ── Loop ──

pub async fn run(app: App, input: SharedInput) -> anyhow::Result<()> {
    println!("{HELP}");
    print!("{}", DocumentView(&app.document()));
    let mut form = ModelForm::default();

    loop {
        let line = input.lock().await.next_line().await?;
        let Some(line) = line else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            command => execute(&app, command, &mut form).await,
        }
        print!("{}", DocumentView(&app.document()));
    }
    Ok(())
}

async fn execute(app: &App, command: Command, form: &mut ModelForm) {
    let outcome = match command {
        Command::Day(offset) => app.dispatch(Action::SelectDay(offset)).await,
        Command::Book(n) => {
            let button = app
                .document()
                .active_panel()
                .and_then(|panel| panel.buttons().get(n - 1).cloned());
            match button {
                Some(button) => match button.on_click {
                    Some(action) => app.dispatch(action).await,
                    None => app.book(&button.slot).await,
                },
                None => {
                    println!("Нет слота с номером {n}");
                    return;
                }
            }
        }
        Command::Cancel(id) => app.dispatch(Action::Cancel(id)).await,
        Command::Tab(tab) => {
            if !app.switch_tab(tab) {
                println!("Вкладка недоступна");
            }
            return;
        }
        Command::Theme => {
            app.toggle_theme();
            return;
        }
        Command::Refresh => {
            app.reconcile().await;
            return;
        }
        Command::Approve(id) => app.dispatch(Action::Approve(id)).await,
        Command::Reject(id) => app.dispatch(Action::Reject(id)).await,
        Command::AdminCancel(id) => app.dispatch(Action::AdminCancel(id)).await,
        Command::Date(date) => {
            let outcome = app.lookup_date(date).await;
            if outcome == Outcome::Done {
                app.switch_tab(Tab::Admin);
            }
            outcome
        }
        Command::Submit { title, file, image } => {
            form.title = title;
            form.file = match read_upload(&file).await {
                Ok(upload) => Some(upload),
                Err(e) => {
                    println!("Не удалось прочитать {file}: {e}");
                    return;
                }
            };
            form.image = match image {
                Some(path) => match read_upload(&path).await {
                    Ok(upload) => Some(upload),
                    Err(e) => {
                        println!("Не удалось прочитать {path}: {e}");
                        return;
                    }
                },
                None => None,
            };
            app.submit(form).await
        }
        Command::Name(name) => {
            app.update_display_name(&name);
            return;
        }
        Command::Handle(handle) => {
            app.update_handle(&handle);
            return;
        }
        Command::Avatar(url) => {
            app.update_avatar(&url);
            return;
        }
        Command::Show | Command::Help | Command::Quit => return,
    };

    if outcome == Outcome::Declined {
        println!("Отменено");
    }
}

async fn read_upload(path: &str) -> std::io::Result<Upload> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(Upload { file_name, bytes })
}

// ── Printing ──

/// Text rendering of the active tab.
pub struct DocumentView<'a>(pub &'a Document);

impl fmt::Display for DocumentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.0;
        writeln!(f)?;
        writeln!(f, "{} {} [{}]", doc.welcome, doc.handle, doc.theme.as_str())?;
        let tabs: Vec<String> = Tab::ALL
            .iter()
            .filter(|tab| **tab != Tab::Admin || doc.admin_tab_visible)
            .map(|tab| {
                if *tab == doc.active_tab {
                    format!("[{}]", tab.as_str())
                } else {
                    tab.as_str().to_string()
                }
            })
            .collect();
        writeln!(f, "{}", tabs.join(" | "))?;

        match doc.active_tab {
            Tab::Home => {
                writeln!(f, "Мои бронирования:")?;
                writeln!(f, "{}", doc.my_bookings)?;
            }
            Tab::Calendar => {
                for item in doc.calendar_layout() {
                    match item {
                        CalendarItem::Day(day) => writeln!(f, "{day}")?,
                        CalendarItem::Panel(panel) if panel.phase == PanelPhase::Leaving => {}
                        CalendarItem::Panel(panel) => match &panel.body {
                            PanelBody::Loading => writeln!(f, "      {MSG_LOADING_SLOTS}")?,
                            PanelBody::Error(text) => writeln!(f, "      ! {text}")?,
                            PanelBody::Slots(buttons) if buttons.is_empty() => {
                                writeln!(f, "      {MSG_NO_SLOTS}")?
                            }
                            PanelBody::Slots(buttons) => {
                                for (i, button) in buttons.iter().enumerate() {
                                    writeln!(f, "      {}) {button}", i + 1)?;
                                }
                            }
                        },
                    }
                }
            }
            Tab::Library => {
                writeln!(f, "Библиотека моделей:")?;
                writeln!(f, "{}", doc.models)?;
            }
            Tab::Submit => {
                if let Some(result) = &doc.submit_result {
                    writeln!(f, "{result}")?;
                }
            }
            Tab::Profile => {
                writeln!(f, "Аватар: {}", doc.avatar_url)?;
            }
            Tab::Admin => {
                writeln!(f, "Все бронирования:")?;
                writeln!(f, "{}", doc.admin_bookings)?;
                writeln!(f, "На модерации:")?;
                writeln!(f, "{}", doc.pending_models)?;
                writeln!(f, "Пользователи:")?;
                writeln!(f, "{}", doc.user_stats)?;
                writeln!(f, "Поиск по дате:")?;
                writeln!(f, "{}", doc.date_lookup)?;
            }
        }
        Ok(())
    }
}

// ── Tests ──
