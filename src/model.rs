use std::cmp::Ordering;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace, warn};

use crate::domain::{FETCH_ERROR_NOTICE, Message, ROWS_PER_PAGE_OPTIONS, UdirConfig, UdirError};
use crate::inputter::{InputResult, Inputter};

/// One normalized directory entry. Immutable once ingested; the whole
/// collection is swapped atomically when a fetch completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u32,
    pub name: String,
    pub surname: String,
    pub age: u32,
    pub gender: String,
    pub country: String,
    pub state: String,
}

impl Record {
    pub fn cells(&self) -> [String; 6] {
        [
            self.name.clone(),
            self.surname.clone(),
            self.age.to_string(),
            self.gender.clone(),
            self.country.clone(),
            self.state.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Surname,
    Age,
    Gender,
    Country,
    State,
}

impl Field {
    pub fn from_column(idx: usize) -> Option<Field> {
        match idx {
            0 => Some(Field::Name),
            1 => Some(Field::Surname),
            2 => Some(Field::Age),
            3 => Some(Field::Gender),
            4 => Some(Field::Country),
            5 => Some(Field::State),
            _ => None,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Field::Name => 0,
            Field::Surname => 1,
            Field::Age => 2,
            Field::Gender => 3,
            Field::Country => 4,
            Field::State => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn flipped(&self) -> Order {
        match self {
            Order::Asc => Order::Desc,
            Order::Desc => Order::Asc,
        }
    }
}

/// Transient view controls. Reset to defaults on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub order: Order,
    pub order_by: Field,
    pub page: usize,
    pub rows_per_page: usize,
    pub dense: bool,
    pub search: String,
    pub error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            order: Order::Asc,
            order_by: Field::Name,
            page: 0,
            rows_per_page: ROWS_PER_PAGE_OPTIONS[0],
            dense: false,
            search: String::new(),
            error: None,
        }
    }
}

/// Natural per-field ordering: numeric for age, lexicographic otherwise.
pub fn compare(a: &Record, b: &Record, field: Field) -> Ordering {
    match field {
        Field::Name => a.name.cmp(&b.name),
        Field::Surname => a.surname.cmp(&b.surname),
        Field::Age => a.age.cmp(&b.age),
        Field::Gender => a.gender.cmp(&b.gender),
        Field::Country => a.country.cmp(&b.country),
        Field::State => a.state.cmp(&b.state),
    }
}

/// `needle` must already be lowercased. Age, state and id are deliberately
/// not searched; the directory treats them as non-searchable fields.
pub fn matches_search(record: &Record, needle: &str) -> bool {
    needle.is_empty()
        || record.name.to_lowercase().contains(needle)
        || record.surname.to_lowercase().contains(needle)
        || record.gender.to_lowercase().contains(needle)
        || record.country.to_lowercase().contains(needle)
}

/// Filtered then stably sorted view of `records`, as an index mapping so the
/// source collection is never reordered. Ties keep ingestion order in both
/// directions because the index vector starts in that order and slice::sort_by
/// is stable.
pub fn derive_view(records: &[Record], view: &ViewState) -> Vec<usize> {
    let needle = view.search.to_lowercase();
    let mut rows: Vec<usize> = (0..records.len())
        .filter(|&idx| matches_search(&records[idx], &needle))
        .collect();

    rows.sort_by(|&x, &y| {
        let ord = compare(&records[x], &records[y], view.order_by);
        match view.order {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    });
    rows
}

/// Index range of one page within a derived view of length `len`.
pub fn page_bounds(len: usize, page: usize, rows_per_page: usize) -> (usize, usize) {
    let begin = std::cmp::min(page * rows_per_page, len);
    let end = std::cmp::min(begin + rows_per_page, len);
    (begin, end)
}

#[derive(Debug, PartialEq)]
pub enum Status {
    LOADING,
    READY,
    QUITTING,
}

pub struct Model {
    config: UdirConfig,
    pub status: Status,
    records: Vec<Record>,
    view: ViewState,
    cursor: usize,
    input: Inputter,
    last_input: InputResult,
    searching: bool,
    saved_search: String,
    show_help: bool,
    clipboard: Option<Clipboard>,
    status_message: String,
    reload_requested: bool,
}

impl Model {
    pub fn new(config: &UdirConfig) -> Self {
        Self {
            config: config.clone(),
            status: Status::LOADING,
            records: Vec::new(),
            view: ViewState::default(),
            cursor: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            searching: false,
            saved_search: String::new(),
            show_help: false,
            clipboard: None,
            status_message: "Loading ...".to_string(),
            reload_requested: false,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn filtered_len(&self) -> usize {
        derive_view(&self.records, &self.view).len()
    }

    /// Records of the current page, in render order.
    pub fn visible(&self) -> Vec<&Record> {
        let rows = derive_view(&self.records, &self.view);
        let (begin, end) = page_bounds(rows.len(), self.view.page, self.view.rows_per_page);
        rows[begin..end].iter().map(|&idx| &self.records[idx]).collect()
    }

    /// Blank rows padding a trailing short page up to full page height.
    pub fn empty_rows(&self) -> usize {
        if self.view.page == 0 {
            return 0;
        }
        let (begin, end) = page_bounds(
            self.filtered_len(),
            self.view.page,
            self.view.rows_per_page,
        );
        self.view.rows_per_page - (end - begin)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn searching(&self) -> bool {
        self.searching
    }

    pub fn search_input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn raw_keyevents(&self) -> bool {
        self.searching
    }

    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    /// Atomically replace the collection with a completed fetch, or surface
    /// the failure as a dismissible notice. Never retries.
    pub fn ingest(&mut self, batch: Result<Vec<Record>, UdirError>) {
        match batch {
            Ok(records) => {
                info!("Ingested {} records", records.len());
                if records.len() < self.config.batch_size {
                    debug!(
                        "Short batch: {} of {} requested",
                        records.len(),
                        self.config.batch_size
                    );
                }
                self.records = records;
                self.view.error = None;
                self.set_status_message(format!("Loaded {} records", self.records.len()));
            }
            Err(e) => {
                warn!("Ingestion failed: {e}");
                self.records = Vec::new();
                self.view.error = Some(FETCH_ERROR_NOTICE.to_string());
                self.set_status_message("Load failed".to_string());
            }
        }
        self.status = Status::READY;
        self.clamp_page();
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) {
        trace!("Update: {message:?}");
        match message {
            Message::Quit => self.quit(),
            Message::SortByColumn(idx) => self.sort_by_column(idx),
            Message::NextPage => self.set_page(self.view.page + 1),
            Message::PrevPage => self.set_page(self.view.page.saturating_sub(1)),
            Message::FirstPage => self.set_page(0),
            Message::LastPage => self.set_page(self.last_page()),
            Message::GrowPageSize => self.step_rows_per_page(1),
            Message::ShrinkPageSize => self.step_rows_per_page(-1),
            Message::ToggleDense => self.view.dense = !self.view.dense,
            Message::MoveUp => self.move_cursor_up(),
            Message::MoveDown => self.move_cursor_down(),
            Message::CopyRow => self.copy_row(),
            Message::EnterSearch => self.enter_search(),
            Message::RawKey(key) => self.raw_input(key),
            Message::DismissNotice => self.dismiss_notice(),
            Message::Help => self.show_help = !self.show_help,
            Message::Reload => self.reload(),
        }
    }

    // -------------------- transitions ---------------------- //

    /// New column selects ascending; the current column flips direction.
    fn sort_by_column(&mut self, idx: usize) {
        let Some(field) = Field::from_column(idx) else {
            return;
        };
        if self.view.order_by == field {
            self.view.order = self.view.order.flipped();
        } else {
            self.view.order_by = field;
            self.view.order = Order::Asc;
        }
        self.clamp_cursor();
    }

    fn last_page(&self) -> usize {
        self.filtered_len().saturating_sub(1) / self.view.rows_per_page
    }

    fn set_page(&mut self, page: usize) {
        self.view.page = std::cmp::min(page, self.last_page());
        self.clamp_cursor();
    }

    fn step_rows_per_page(&mut self, step: i32) {
        let current = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|&n| n == self.view.rows_per_page)
            .unwrap_or(0);
        let next = if step >= 0 {
            std::cmp::min(current + step as usize, ROWS_PER_PAGE_OPTIONS.len() - 1)
        } else {
            current.saturating_sub((-step) as usize)
        };
        if ROWS_PER_PAGE_OPTIONS[next] != self.view.rows_per_page {
            self.view.rows_per_page = ROWS_PER_PAGE_OPTIONS[next];
            // Page size changes always jump back to the first page.
            self.view.page = 0;
            self.cursor = 0;
            self.set_status_message(format!("{} rows per page", self.view.rows_per_page));
        }
    }

    /// The page start must never point beyond the filtered collection.
    fn clamp_page(&mut self) {
        self.view.page = std::cmp::min(self.view.page, self.last_page());
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let (begin, end) = page_bounds(
            self.filtered_len(),
            self.view.page,
            self.view.rows_per_page,
        );
        let page_len = end - begin;
        if page_len == 0 {
            self.cursor = 0;
        } else {
            self.cursor = std::cmp::min(self.cursor, page_len - 1);
        }
    }

    fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_cursor_down(&mut self) {
        self.cursor += 1;
        self.clamp_cursor();
    }

    fn dismiss_notice(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else {
            self.view.error = None;
        }
    }

    fn reload(&mut self) {
        debug!("Reload requested");
        self.records = Vec::new();
        self.view = ViewState::default();
        self.cursor = 0;
        self.status = Status::LOADING;
        self.reload_requested = true;
        self.set_status_message("Loading ...".to_string());
    }

    fn set_status_message(&mut self, message: String) {
        self.status_message = message;
    }

    // -------------------- search input ---------------------- //

    fn enter_search(&mut self) {
        self.searching = true;
        self.saved_search = self.view.search.clone();
        self.input.clear();
        self.input.set(&self.view.search);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.searching {
            return;
        }
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.searching = false;
            if self.last_input.canceled {
                self.view.search = self.saved_search.clone();
            }
        } else {
            // Live filtering: every keystroke narrows the view.
            self.view.search = self.last_input.input.clone();
        }
        self.clamp_page();
    }

    // -------------------- clipboard ---------------------- //

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn copy_row(&mut self) {
        let content = {
            let visible = self.visible();
            let Some(record) = visible.get(self.cursor) else {
                return;
            };
            record
                .cells()
                .iter()
                .map(|c| Self::wrap_cell_content(c))
                .collect::<Vec<String>>()
                .join(",")
        };

        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new().ok();
        }
        match self.clipboard.as_mut().map(|cb| cb.set_text(content)) {
            Some(Ok(_)) => self.set_status_message("Copied row".to_string()),
            _ => self.set_status_message("Clipboard unavailable".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyCode;

    fn record(id: u32, name: &str, surname: &str, age: u32, gender: &str, country: &str, state: &str) -> Record {
        Record {
            id,
            name: name.to_string(),
            surname: surname.to_string(),
            age,
            gender: gender.to_string(),
            country: country.to_string(),
            state: state.to_string(),
        }
    }

    fn fixture() -> Vec<Record> {
        vec![
            record(1, "Ana", "Lee", 30, "female", "Norway", "Troms"),
            record(2, "Bob", "Zed", 25, "male", "Chile", "Biobio"),
            record(3, "Cem", "Ak", 25, "male", "Turkey", "Ankara"),
            record(4, "Dina", "Ose", 41, "female", "Norway", "Oslo"),
            record(5, "Eli", "Ray", 25, "female", "Chile", "Santiago"),
        ]
    }

    fn model_with(records: Vec<Record>) -> Model {
        let mut model = Model::new(&UdirConfig::default());
        model.ingest(Ok(records));
        model
    }

    fn view_ids(records: &[Record], view: &ViewState) -> Vec<u32> {
        derive_view(records, view)
            .iter()
            .map(|&idx| records[idx].id)
            .collect()
    }

    #[test]
    fn ascending_then_descending_reverses_distinct_keys() {
        let records = fixture();
        let mut view = ViewState {
            order_by: Field::Name,
            ..ViewState::default()
        };
        let asc = view_ids(&records, &view);
        view.order = Order::Desc;
        let mut desc = view_ids(&records, &view);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn ties_keep_ingestion_order_in_both_directions() {
        let records = fixture();
        let mut view = ViewState {
            order_by: Field::Age,
            ..ViewState::default()
        };
        // Ages: 30, 25, 25, 41, 25. The three 25s must stay in id order.
        assert_eq!(view_ids(&records, &view), vec![2, 3, 5, 1, 4]);
        view.order = Order::Desc;
        assert_eq!(view_ids(&records, &view), vec![4, 1, 2, 3, 5]);
    }

    #[test]
    fn sort_never_reorders_the_source_collection() {
        let records = fixture();
        let before = records.clone();
        let view = ViewState {
            order_by: Field::Age,
            order: Order::Desc,
            ..ViewState::default()
        };
        let _ = derive_view(&records, &view);
        assert_eq!(records, before);
    }

    #[test]
    fn age_scenario_matches_the_directory_contract() {
        let records = vec![
            record(1, "Ana", "Lee", 30, "female", "Norway", "Troms"),
            record(2, "Bob", "Zed", 25, "male", "Chile", "Biobio"),
        ];
        let mut view = ViewState {
            order_by: Field::Age,
            ..ViewState::default()
        };
        assert_eq!(view_ids(&records, &view), vec![2, 1]);
        view.order = Order::Desc;
        assert_eq!(view_ids(&records, &view), vec![1, 2]);
    }

    #[test]
    fn filter_is_a_case_insensitive_subset_over_the_searchable_fields() {
        let records = fixture();
        let view = ViewState {
            search: "NOR".to_string(),
            ..ViewState::default()
        };
        let rows = derive_view(&records, &view);
        assert!(!rows.is_empty());
        for &idx in &rows {
            let r = &records[idx];
            assert!(
                r.name.to_lowercase().contains("nor")
                    || r.surname.to_lowercase().contains("nor")
                    || r.gender.to_lowercase().contains("nor")
                    || r.country.to_lowercase().contains("nor")
            );
        }
        // Both Norway records match, nothing else does.
        assert_eq!(view_ids(&records, &view), vec![1, 4]);
    }

    #[test]
    fn age_and_state_are_not_searchable() {
        let records = fixture();
        let by_age = ViewState {
            search: "25".to_string(),
            ..ViewState::default()
        };
        assert!(derive_view(&records, &by_age).is_empty());

        let by_state = ViewState {
            search: "oslo".to_string(),
            ..ViewState::default()
        };
        assert!(derive_view(&records, &by_state).is_empty());
    }

    #[test]
    fn empty_search_matches_everything() {
        let records = fixture();
        let view = ViewState::default();
        assert_eq!(derive_view(&records, &view).len(), records.len());
    }

    #[test]
    fn concatenated_pages_reconstruct_the_filtered_sorted_sequence() {
        let records = fixture();
        let view = ViewState {
            order_by: Field::Age,
            rows_per_page: 2,
            ..ViewState::default()
        };
        let full = derive_view(&records, &view);

        let mut concatenated = Vec::new();
        let mut page = 0;
        loop {
            let (begin, end) = page_bounds(full.len(), page, view.rows_per_page);
            if begin == end {
                break;
            }
            assert!(end - begin <= view.rows_per_page);
            if end < full.len() {
                assert_eq!(end - begin, view.rows_per_page);
            }
            concatenated.extend_from_slice(&full[begin..end]);
            page += 1;
        }
        assert_eq!(concatenated, full);
    }

    #[test]
    fn changing_rows_per_page_resets_page() {
        let mut model = model_with(fixture());
        model.update(Message::NextPage);
        assert_eq!(model.view().page, 0); // 5 records fit one default page
        model.update(Message::GrowPageSize);
        assert_eq!(model.view().rows_per_page, 10);
        assert_eq!(model.view().page, 0);

        model.update(Message::ShrinkPageSize);
        assert_eq!(model.view().rows_per_page, 5);
        assert_eq!(model.view().page, 0);
    }

    #[test]
    fn double_toggle_returns_to_the_initial_ascending_order() {
        let mut model = model_with(fixture());
        model.update(Message::SortByColumn(2));
        let initial: Vec<u32> = model.visible().iter().map(|r| r.id).collect();
        assert_eq!(model.view().order, Order::Asc);

        model.update(Message::SortByColumn(2));
        assert_eq!(model.view().order, Order::Desc);
        model.update(Message::SortByColumn(2));
        assert_eq!(model.view().order, Order::Asc);
        let again: Vec<u32> = model.visible().iter().map(|r| r.id).collect();
        assert_eq!(initial, again);
    }

    #[test]
    fn selecting_a_new_column_starts_ascending() {
        let mut model = model_with(fixture());
        model.update(Message::SortByColumn(2));
        model.update(Message::SortByColumn(2));
        assert_eq!(model.view().order, Order::Desc);
        model.update(Message::SortByColumn(4));
        assert_eq!(model.view().order_by, Field::Country);
        assert_eq!(model.view().order, Order::Asc);
    }

    #[test]
    fn failed_fetch_leaves_records_empty_and_sets_the_notice() {
        let mut model = Model::new(&UdirConfig::default());
        model.ingest(Err(UdirError::BadStatus { status: 500 }));
        assert_eq!(model.total(), 0);
        assert_eq!(model.view().error.as_deref(), Some(FETCH_ERROR_NOTICE));
        assert!(model.visible().is_empty());
        assert_eq!(model.status, Status::READY);
    }

    #[test]
    fn shrinking_filter_clamps_the_page() {
        // 5 records, 2 per page, jump to the last page, then filter down to
        // two matches. The page start must stay inside the filtered set.
        let mut model = model_with(fixture());
        model.view.rows_per_page = 2;
        model.update(Message::LastPage);
        assert_eq!(model.view().page, 2);

        model.update(Message::EnterSearch);
        for c in "norway".chars() {
            model.update(Message::RawKey(KeyCode::Char(c).into()));
        }
        assert_eq!(model.filtered_len(), 2);
        assert!(model.view().page * model.view().rows_per_page < model.filtered_len());
    }

    #[test]
    fn canceled_search_restores_the_previous_filter() {
        let mut model = model_with(fixture());
        model.update(Message::EnterSearch);
        for c in "chile".chars() {
            model.update(Message::RawKey(KeyCode::Char(c).into()));
        }
        model.update(Message::RawKey(KeyCode::Enter.into()));
        assert_eq!(model.view().search, "chile");

        model.update(Message::EnterSearch);
        for c in "xyz".chars() {
            model.update(Message::RawKey(KeyCode::Char(c).into()));
        }
        model.update(Message::RawKey(KeyCode::Esc.into()));
        assert_eq!(model.view().search, "chile");
        assert!(!model.searching());
    }

    #[test]
    fn trailing_short_page_is_padded() {
        let mut model = model_with(fixture());
        model.view.rows_per_page = 2;
        model.update(Message::LastPage);
        // Page 2 holds one of five records; one blank row pads it.
        assert_eq!(model.visible().len(), 1);
        assert_eq!(model.empty_rows(), 1);
    }

    #[test]
    fn reload_resets_view_state_to_defaults() {
        let mut model = model_with(fixture());
        model.update(Message::SortByColumn(2));
        model.update(Message::ToggleDense);
        model.update(Message::Reload);
        assert_eq!(*model.view(), ViewState::default());
        assert_eq!(model.total(), 0);
        assert_eq!(model.status, Status::LOADING);
        assert!(model.take_reload_request());
        assert!(!model.take_reload_request());
    }

    #[test]
    fn csv_cells_are_escaped_and_wrapped() {
        assert_eq!(Model::wrap_cell_content("plain"), "plain");
        assert_eq!(Model::wrap_cell_content("two words"), "\"two words\"");
        assert_eq!(Model::wrap_cell_content("a,b"), "\"a,b\"");
        assert_eq!(Model::wrap_cell_content("say \"hi\" now"), "\"say \"\"hi\"\" now\"");
    }
}
