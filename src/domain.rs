use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://randomuser.me/api/";
pub const BATCH_SIZE: usize = 200;

/// Column labels, in render order.
pub const COLUMN_LABELS: [&str; 6] = ["Ad", "Soyad", "Yaş", "Cinsiyet", "Ülke", "Şehir"];

pub const ROWS_PER_PAGE_OPTIONS: [usize; 6] = [5, 10, 25, 50, 100, 200];

/// User-facing ingestion failure notice, kept verbatim from the directory UI.
pub const FETCH_ERROR_NOTICE: &str =
    "API'den veri çekerken hata oluştu. Lütfen daha sonra tekrar deneyin.";

pub const HELP_TEXT: &str = "\
 udir key bindings

 q          quit
 ?          toggle this help
 /          edit search (Enter keep, Esc cancel)
 1-6        sort by column (again to flip direction)
 Left/Right previous/next page
 g / G      first/last page
 + / -      grow/shrink page size
 d          toggle dense rows
 Up/Down    move row cursor
 y          copy selected row
 r          reload from the directory
 Esc        dismiss error notice / close help
";

#[derive(Debug, Clone)]
pub struct UdirConfig {
    pub endpoint: String,
    pub batch_size: usize,
    pub event_poll_time: u64,
}

impl Default for UdirConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: BATCH_SIZE,
            event_poll_time: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum UdirError {
    #[error("terminal io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory answered with status {status}")]
    BadStatus { status: u16 },
}

/// Everything the controller can ask of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Quit,
    SortByColumn(usize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GrowPageSize,
    ShrinkPageSize,
    ToggleDense,
    MoveUp,
    MoveDown,
    CopyRow,
    EnterSearch,
    RawKey(KeyEvent),
    DismissNotice,
    Help,
    Reload,
}
